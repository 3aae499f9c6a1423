use teloxide::types::{ChatId, MessageId, UserId};

use crate::{
    error::GameResult,
    events::EventHub,
    seats::{lock_seats, SharedSeats},
    surface::{Prompt, SharedSurface},
};

/// Where a game is played: one chat plus everything needed to talk to it.
#[derive(Clone)]
pub struct Table {
    pub chat_id: ChatId,
    pub surface: SharedSurface,
    pub hub: EventHub,
    pub seats: SharedSeats,
}

impl Table {
    pub fn new(chat_id: ChatId, surface: SharedSurface, hub: EventHub, seats: SharedSeats) -> Table {
        Table {
            chat_id,
            surface,
            hub,
            seats,
        }
    }

    pub async fn render(&self, message: Option<MessageId>, prompt: &Prompt) -> GameResult<MessageId> {
        self.surface.render(self.chat_id, message, prompt).await
    }

    pub async fn notify(&self, text: &str) -> GameResult<()> {
        self.surface.notify(self.chat_id, text).await
    }

    pub async fn dismiss(&self, message: MessageId) -> GameResult<()> {
        self.surface.dismiss(self.chat_id, message).await
    }

    pub fn is_seated(&self, user_id: UserId) -> bool {
        lock_seats(&self.seats).is_seated(self.chat_id, user_id)
    }
}
