use std::time::Duration;

use tokio::{
    task::JoinHandle,
    time::{self, Instant},
};

use crate::seats::{lock_seats, SharedSeats};

/// Periodically wipes every seat in every chat. Games already running are
/// left alone; only the bookkeeping is reset.
pub struct ClearTimer {
    seats: SharedSeats,
    period: Option<Duration>,
    handle: Option<JoinHandle<()>>,
}

impl ClearTimer {
    pub fn new(seats: SharedSeats) -> ClearTimer {
        ClearTimer {
            seats,
            period: None,
            handle: None,
        }
    }

    pub fn period(&self) -> Option<Duration> {
        self.period
    }

    /// Starts clearing every `period`, replacing any timer already running.
    pub fn start(&mut self, period: Duration) {
        self.stop();

        let seats = self.seats.clone();
        self.period = Some(period);
        self.handle = Some(tokio::spawn(async move {
            let mut interval = time::interval_at(Instant::now() + period, period);
            loop {
                interval.tick().await;
                lock_seats(&seats).clear_all();
                log::info!("Cleared all seats (every {}s)", period.as_secs());
            }
        }));
    }

    pub fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
        self.period = None;
    }
}

impl Drop for ClearTimer {
    fn drop(&mut self) {
        self.stop();
    }
}
