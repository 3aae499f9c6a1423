use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use teloxide::types::{ChatId, MessageId, UserId};

use crate::{
    error::{GameError, GameResult},
    events::{Event, EventHub},
    participant::Identity,
    seats::{new_shared_seats, SharedSeats},
    surface::{Prompt, Surface},
    table::Table,
};

pub const CHAT: ChatId = ChatId(-1001);

#[derive(Clone, Debug)]
pub struct Rendered {
    pub message: MessageId,
    pub edited: bool,
    pub prompt: Prompt,
}

#[derive(Default)]
struct Record {
    next_id: i32,
    renders: Vec<Rendered>,
    notices: Vec<String>,
    dismissed: Vec<MessageId>,
    fail_renders: bool,
}

/// Keeps everything the games would have sent to the chat.
#[derive(Clone, Default)]
pub struct RecordingSurface {
    record: Arc<Mutex<Record>>,
}

impl RecordingSurface {
    pub fn new() -> RecordingSurface {
        RecordingSurface::default()
    }

    pub fn failing() -> RecordingSurface {
        let surface = RecordingSurface::default();
        surface.record.lock().unwrap().fail_renders = true;
        surface
    }

    pub fn renders(&self) -> Vec<Rendered> {
        self.record.lock().unwrap().renders.clone()
    }

    pub fn last_text(&self) -> String {
        self.renders().last().map(|r| r.prompt.text.clone()).unwrap_or_default()
    }

    pub fn notices(&self) -> Vec<String> {
        self.record.lock().unwrap().notices.clone()
    }

    pub fn dismissed(&self) -> Vec<MessageId> {
        self.record.lock().unwrap().dismissed.clone()
    }
}

#[async_trait]
impl Surface for RecordingSurface {
    async fn render(&self, _chat_id: ChatId, message: Option<MessageId>, prompt: &Prompt) -> GameResult<MessageId> {
        let mut record = self.record.lock().unwrap();
        if record.fail_renders {
            return Err(GameError::Internal("render refused"));
        }
        let id = match message {
            Some(id) => id,
            None => {
                record.next_id += 1;
                MessageId(record.next_id)
            }
        };
        record.renders.push(Rendered {
            message: id,
            edited: message.is_some(),
            prompt: prompt.clone(),
        });
        Ok(id)
    }

    async fn notify(&self, _chat_id: ChatId, text: &str) -> GameResult<()> {
        self.record.lock().unwrap().notices.push(text.to_string());
        Ok(())
    }

    async fn dismiss(&self, _chat_id: ChatId, message: MessageId) -> GameResult<()> {
        self.record.lock().unwrap().dismissed.push(message);
        Ok(())
    }
}

pub fn table(surface: &RecordingSurface) -> Table {
    table_with(surface, EventHub::new(), new_shared_seats())
}

pub fn table_with(surface: &RecordingSurface, hub: EventHub, seats: SharedSeats) -> Table {
    Table::new(CHAT, Arc::new(surface.clone()), hub, seats)
}

pub fn identity(id: u64, name: &str) -> Identity {
    Identity::new(UserId(id), name)
}

pub fn button(user: Identity, message: i32, data: &str) -> Event {
    Event::Button {
        user,
        message: MessageId(message),
        data: data.to_string(),
    }
}

pub fn text(user: Identity, text: &str) -> Event {
    Event::Text {
        user,
        text: text.to_string(),
        mentioned: Vec::new(),
    }
}

pub fn command(user: Identity, text: &str, target: Identity) -> Event {
    Event::Text {
        user,
        text: text.to_string(),
        mentioned: vec![target],
    }
}

/// Yields until something is listening on the chat, so published events are not lost.
pub async fn until_listening(hub: &EventHub, chat_id: ChatId) {
    while hub.subscriber_count(chat_id) == 0 {
        tokio::task::yield_now().await;
    }
}

/// Yields until the surface has recorded at least `count` renders.
pub async fn until_rendered(surface: &RecordingSurface, count: usize) {
    while surface.renders().len() < count {
        tokio::task::yield_now().await;
    }
}
