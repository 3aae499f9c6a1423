use std::{collections::HashMap, time::Duration};

use teloxide::types::UserId;
use tokio::time::Instant;

/// Tracks when each user last ran each rate-limited command.
#[derive(Default)]
pub struct CooldownHandler {
    last_used: HashMap<(&'static str, UserId), Instant>,
}

impl CooldownHandler {
    pub fn new() -> CooldownHandler {
        CooldownHandler::default()
    }

    /// Time left before `user_id` may run `command` again, if any.
    pub fn remaining(&self, command: &'static str, user_id: UserId, cooldown: Duration) -> Option<Duration> {
        let last = self.last_used.get(&(command, user_id))?;
        let expires = *last + cooldown;
        let now = Instant::now();
        (now < expires).then(|| expires - now)
    }

    pub fn record(&mut self, command: &'static str, user_id: UserId) {
        self.last_used.insert((command, user_id), Instant::now());
    }
}
