use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use teloxide::{types::ChatId, Bot};

use crate::{
    config::BotConfig,
    events::EventHub,
    seats::{clear_timer::ClearTimer, new_shared_seats, SharedSeats},
    surface::{telegram_surface::TelegramSurface, SharedSurface},
    table::Table,
};

pub struct BotState {
    pub seats: SharedSeats,
    pub hub: EventHub,
    pub config: BotConfig,
    pub surface: SharedSurface,
    clear_timer: Mutex<ClearTimer>,
}

pub type AsyncBotState = Arc<BotState>;

pub fn new_async_bot_state(bot: Bot, config: BotConfig) -> AsyncBotState {
    let seats = new_shared_seats();
    Arc::new(BotState {
        clear_timer: Mutex::new(ClearTimer::new(seats.clone())),
        seats,
        hub: EventHub::new(),
        config,
        surface: Arc::new(TelegramSurface::new(bot)),
    })
}

impl BotState {
    /// Everything a game needs to run in `chat_id`.
    pub fn table(&self, chat_id: ChatId) -> Table {
        Table::new(chat_id, self.surface.clone(), self.hub.clone(), self.seats.clone())
    }

    pub fn clear_timer(&self) -> MutexGuard<'_, ClearTimer> {
        self.clear_timer.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

pub mod event_handler;
pub mod game_handler;
pub mod owner_handler;
pub mod utility_handler;
