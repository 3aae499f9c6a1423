pub mod clear_timer;
pub mod local_seat_registry;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use teloxide::types::{ChatId, UserId};

use local_seat_registry::LocalSeatRegistry;

/// Bookkeeping of which users are busy with a game, per chat.
pub trait SeatRegistry {
    /// Seats the user in the chat. Returns false if they were already seated.
    fn reserve(&mut self, chat_id: ChatId, user_id: UserId) -> bool;

    fn is_seated(&self, chat_id: ChatId, user_id: UserId) -> bool;

    fn release(&mut self, chat_id: ChatId, user_id: UserId);

    fn release_all(&mut self, chat_id: ChatId, user_ids: &[UserId]) {
        for user_id in user_ids {
            self.release(chat_id, *user_id);
        }
    }

    fn clear_all(&mut self);

    fn seated(&self, chat_id: ChatId) -> usize;
}

pub type SharedSeats = Arc<Mutex<dyn SeatRegistry + Send>>;

pub fn new_shared_seats() -> SharedSeats {
    Arc::new(Mutex::new(LocalSeatRegistry::new()))
}

// Seat bookkeeping stays usable even if a game task panicked mid-update.
pub fn lock_seats(seats: &SharedSeats) -> MutexGuard<'_, dyn SeatRegistry + Send + 'static> {
    seats.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Releases every seat it took when dropped, however the owning game ends.
pub struct SeatGuard {
    seats: SharedSeats,
    chat_id: ChatId,
    taken: Vec<UserId>,
}

impl SeatGuard {
    pub fn new(seats: SharedSeats, chat_id: ChatId) -> SeatGuard {
        SeatGuard {
            seats,
            chat_id,
            taken: Vec::new(),
        }
    }

    /// Returns false, and records nothing, if the user already holds a seat here.
    pub fn seat(&mut self, user_id: UserId) -> bool {
        let newly_seated = lock_seats(&self.seats).reserve(self.chat_id, user_id);
        if newly_seated {
            self.taken.push(user_id);
        }
        newly_seated
    }

    pub fn taken(&self) -> &[UserId] {
        &self.taken
    }
}

impl Drop for SeatGuard {
    fn drop(&mut self) {
        if self.taken.is_empty() {
            return;
        }
        log::debug!(
            "Releasing {} seat(s) in chat {}",
            self.taken.len(),
            self.chat_id
        );
        lock_seats(&self.seats).release_all(self.chat_id, &self.taken);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guard_releases_only_what_it_took() {
        let seats = new_shared_seats();
        let chat = ChatId(-100);
        lock_seats(&seats).reserve(chat, UserId(9));

        {
            let mut guard = SeatGuard::new(seats.clone(), chat);
            assert!(guard.seat(UserId(1)));
            assert!(!guard.seat(UserId(9)));
            assert_eq!(guard.taken(), &[UserId(1)]);
            assert_eq!(lock_seats(&seats).seated(chat), 2);
        }

        let registry = lock_seats(&seats);
        assert!(!registry.is_seated(chat, UserId(1)));
        assert!(registry.is_seated(chat, UserId(9)));
    }

    #[test]
    fn guard_releases_on_panic() {
        let seats = new_shared_seats();
        let chat = ChatId(5);
        let moved = seats.clone();

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(move || {
            let mut guard = SeatGuard::new(moved, chat);
            guard.seat(UserId(3));
            panic!("game blew up");
        }));

        assert!(result.is_err());
        assert_eq!(lock_seats(&seats).seated(chat), 0);
    }
}
