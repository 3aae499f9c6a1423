pub mod telegram_surface;

use std::{fmt, sync::Arc};

use async_trait::async_trait;
use teloxide::types::{ChatId, MessageId};

use crate::error::GameResult;

/// One inline button. `data` comes back verbatim in [`crate::events::Event::Button`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Control {
    pub label: String,
    pub data: String,
}

impl Control {
    pub fn new(label: impl Into<String>, data: impl Into<String>) -> Control {
        Control {
            label: label.into(),
            data: data.into(),
        }
    }
}

/// A message body plus rows of buttons under it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Prompt {
    pub text: String,
    pub controls: Vec<Vec<Control>>,
}

impl Prompt {
    pub fn new(text: impl Into<String>) -> Prompt {
        Prompt {
            text: text.into(),
            controls: Vec::new(),
        }
    }

    pub fn with_row(mut self, row: Vec<Control>) -> Prompt {
        self.push_row(row);
        self
    }

    pub fn push_row(&mut self, row: Vec<Control>) {
        if !row.is_empty() {
            self.controls.push(row);
        }
    }

    pub fn has_control(&self, data: &str) -> bool {
        self.controls.iter().flatten().any(|c| c.data == data)
    }
}

/// Framing of a rendered game message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Status {
    #[default]
    Primary,
    Secondary,
    Success,
    Error,
    Warning,
}

impl Status {
    pub fn badge(self) -> &'static str {
        match self {
            Status::Primary => "🟡",
            Status::Secondary => "🔵",
            Status::Success => "🟢",
            Status::Error => "🔴",
            Status::Warning => "🟠",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.badge())
    }
}

/// What the games need from the chat platform.
#[async_trait]
pub trait Surface: Send + Sync {
    /// Posts `prompt`, or replaces the content of `message` when given.
    /// Returns the id of the message now showing the prompt.
    async fn render(&self, chat_id: ChatId, message: Option<MessageId>, prompt: &Prompt) -> GameResult<MessageId>;

    /// Posts a standalone notice.
    async fn notify(&self, chat_id: ChatId, text: &str) -> GameResult<()>;

    /// Removes a message.
    async fn dismiss(&self, chat_id: ChatId, message: MessageId) -> GameResult<()>;
}

pub type SharedSurface = Arc<dyn Surface>;
