pub mod challenge;
pub mod collector;
pub mod config;
pub mod cooldown;
pub mod error;
pub mod events;
pub mod games;
pub mod handlers;
pub mod lobby;
pub mod pagination;
pub mod participant;
pub mod seats;
pub mod session;
pub mod surface;
pub mod table;

#[cfg(test)]
mod testing;
