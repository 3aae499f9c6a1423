use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use teloxide::types::{ChatId, MessageId};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::participant::Identity;

/// Something a user did in a chat that a running game might care about.
#[derive(Clone, Debug)]
pub enum Event {
    /// An inline keyboard button was pressed on `message`.
    Button {
        user: Identity,
        message: MessageId,
        data: String,
    },
    /// A plain message. `mentioned` holds users named through text mentions
    /// or the author of the message being replied to.
    Text {
        user: Identity,
        text: String,
        mentioned: Vec<Identity>,
    },
}

impl Event {
    pub fn user(&self) -> &Identity {
        match self {
            Event::Button { user, .. } | Event::Text { user, .. } => user,
        }
    }

    /// True for button presses on the given message.
    pub fn is_on(&self, message_id: MessageId) -> bool {
        matches!(self, Event::Button { message, .. } if *message == message_id)
    }

    pub fn button_data(&self) -> Option<&str> {
        match self {
            Event::Button { data, .. } => Some(data),
            Event::Text { .. } => None,
        }
    }

    pub fn text(&self) -> Option<&str> {
        match self {
            Event::Text { text, .. } => Some(text),
            Event::Button { .. } => None,
        }
    }
}

type Subscribers = HashMap<ChatId, Vec<UnboundedSender<Event>>>;

/// Fans incoming events out to every collector listening on a chat.
#[derive(Clone, Default)]
pub struct EventHub {
    subscribers: Arc<Mutex<Subscribers>>,
}

impl EventHub {
    pub fn new() -> EventHub {
        EventHub::default()
    }

    fn lock(&self) -> MutexGuard<'_, Subscribers> {
        self.subscribers.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Also drops subscribers of any chat whose receiver is gone, so chats
    /// that went quiet do not keep dead senders around.
    pub fn subscribe(&self, chat_id: ChatId) -> UnboundedReceiver<Event> {
        let (sender, receiver) = mpsc::unbounded_channel();
        let mut subscribers = self.lock();
        subscribers.retain(|_, senders| {
            senders.retain(|s| !s.is_closed());
            !senders.is_empty()
        });
        subscribers.entry(chat_id).or_default().push(sender);
        receiver
    }

    /// Delivers the event to every live subscriber of the chat and returns how
    /// many received it. Subscribers whose receiver was dropped are pruned.
    pub fn publish(&self, chat_id: ChatId, event: Event) -> usize {
        let mut subscribers = self.lock();
        let Some(senders) = subscribers.get_mut(&chat_id) else {
            return 0;
        };

        senders.retain(|sender| sender.send(event.clone()).is_ok());
        let delivered = senders.len();
        if senders.is_empty() {
            subscribers.remove(&chat_id);
        }
        delivered
    }

    pub fn subscriber_count(&self, chat_id: ChatId) -> usize {
        self.lock()
            .get(&chat_id)
            .map_or(0, |senders| senders.iter().filter(|s| !s.is_closed()).count())
    }
}
