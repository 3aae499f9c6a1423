use derive_more::{Display, From};
use teloxide::RequestError;

#[derive(Debug, Display, From)]
pub enum GameError {
    #[display(fmt = "Telegram request failed: {}", _0)]
    Request(RequestError),
    #[display(fmt = "Configuration error: {}", _0)]
    #[from(ignore)]
    Config(String),
    #[display(fmt = "Internal error: {}", _0)]
    #[from(ignore)]
    Internal(&'static str),
}

impl std::error::Error for GameError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GameError::Request(err) => Some(err),
            GameError::Config(_) | GameError::Internal(_) => None,
        }
    }
}

pub type GameResult<T> = Result<T, GameError>;
