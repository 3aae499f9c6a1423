use std::collections::{HashMap, HashSet};

use teloxide::types::{ChatId, UserId};

use crate::seats::SeatRegistry;

pub struct LocalSeatRegistry {
    chats: HashMap<ChatId, HashSet<UserId>>,
}

impl LocalSeatRegistry {
    pub fn new() -> LocalSeatRegistry {
        LocalSeatRegistry {
            chats: HashMap::new(),
        }
    }
}

impl Default for LocalSeatRegistry {
    fn default() -> Self {
        LocalSeatRegistry::new()
    }
}

impl SeatRegistry for LocalSeatRegistry {
    fn reserve(&mut self, chat_id: ChatId, user_id: UserId) -> bool {
        self.chats.entry(chat_id).or_default().insert(user_id)
    }

    fn is_seated(&self, chat_id: ChatId, user_id: UserId) -> bool {
        self.chats
            .get(&chat_id)
            .map_or(false, |seated| seated.contains(&user_id))
    }

    fn release(&mut self, chat_id: ChatId, user_id: UserId) {
        if let Some(seated) = self.chats.get_mut(&chat_id) {
            seated.remove(&user_id);
            if seated.is_empty() {
                self.chats.remove(&chat_id);
            }
        }
    }

    fn clear_all(&mut self) {
        self.chats.clear();
    }

    fn seated(&self, chat_id: ChatId) -> usize {
        self.chats.get(&chat_id).map_or(0, HashSet::len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reserve_is_idempotent() {
        let mut registry = LocalSeatRegistry::new();
        let chat = ChatId(1);

        assert!(registry.reserve(chat, UserId(10)));
        assert!(!registry.reserve(chat, UserId(10)));
        assert_eq!(registry.seated(chat), 1);
        assert!(registry.is_seated(chat, UserId(10)));
    }

    #[test]
    fn seats_are_scoped_to_the_chat() {
        let mut registry = LocalSeatRegistry::new();
        registry.reserve(ChatId(1), UserId(10));

        assert!(!registry.is_seated(ChatId(2), UserId(10)));
        assert!(registry.reserve(ChatId(2), UserId(10)));
    }

    #[test]
    fn release_from_unknown_chat_is_a_no_op() {
        let mut registry = LocalSeatRegistry::new();
        registry.release(ChatId(404), UserId(1));
        registry.release_all(ChatId(404), &[UserId(1), UserId(2)]);
        assert_eq!(registry.seated(ChatId(404)), 0);
    }

    #[test]
    fn release_all_and_clear_all() {
        let mut registry = LocalSeatRegistry::new();
        registry.reserve(ChatId(1), UserId(1));
        registry.reserve(ChatId(1), UserId(2));
        registry.reserve(ChatId(1), UserId(3));
        registry.reserve(ChatId(2), UserId(4));

        registry.release_all(ChatId(1), &[UserId(1), UserId(2)]);
        assert_eq!(registry.seated(ChatId(1)), 1);
        assert!(registry.is_seated(ChatId(1), UserId(3)));

        registry.clear_all();
        assert_eq!(registry.seated(ChatId(1)), 0);
        assert_eq!(registry.seated(ChatId(2)), 0);
    }
}
