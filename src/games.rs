//! Games played through [`crate::session::Session`].

pub mod mastermind;
pub mod rps;
pub mod trivia;
