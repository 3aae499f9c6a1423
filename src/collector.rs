//! Waiting for user input with a deadline.
//!
//! A [`Collector`] listens to one chat on the [`EventHub`], keeps the events
//! its filter accepts, and gives up once its timer runs out. Games await it
//! once per round; negotiations await it once per setup step.

use std::time::Duration;

use teloxide::types::ChatId;
use tokio::{
    sync::mpsc::UnboundedReceiver,
    time::{self, Instant},
};

use crate::events::{Event, EventHub};

#[derive(Clone, Copy, Debug)]
pub struct CollectorOptions {
    pub time_limit: Duration,
    /// Push the deadline out every time an event is accepted.
    pub reset_on_collect: bool,
    /// Stop after this many accepted events.
    pub max: Option<usize>,
}

impl CollectorOptions {
    pub fn new(time_limit: Duration) -> CollectorOptions {
        CollectorOptions {
            time_limit,
            reset_on_collect: false,
            max: None,
        }
    }

    pub fn reset_on_collect(mut self) -> CollectorOptions {
        self.reset_on_collect = true;
        self
    }

    pub fn max(mut self, max: usize) -> CollectorOptions {
        self.max = Some(max);
        self
    }
}

/// What a collection handler wants after seeing an event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Stop,
}

/// Everything accepted before collection ended, and why it ended.
#[derive(Debug)]
pub enum Collected {
    /// The handler stopped collection or the `max` was reached.
    Stopped(Vec<Event>),
    /// The timer ran out (or the hub went away).
    TimedOut(Vec<Event>),
}

impl Collected {
    pub fn events(&self) -> &[Event] {
        match self {
            Collected::Stopped(events) | Collected::TimedOut(events) => events,
        }
    }

    pub fn into_events(self) -> Vec<Event> {
        match self {
            Collected::Stopped(events) | Collected::TimedOut(events) => events,
        }
    }

    /// Timed out without a single accepted event.
    pub fn is_inactive(&self) -> bool {
        matches!(self, Collected::TimedOut(events) if events.is_empty())
    }
}

pub struct Collector<F> {
    receiver: UnboundedReceiver<Event>,
    filter: F,
    options: CollectorOptions,
    deadline: Instant,
    accepted: usize,
    expired: bool,
}

impl<F> Collector<F>
where
    F: FnMut(&Event) -> bool,
{
    /// Starts listening immediately; the timer starts now too.
    pub fn new(hub: &EventHub, chat_id: ChatId, filter: F, options: CollectorOptions) -> Self {
        Collector {
            receiver: hub.subscribe(chat_id),
            filter,
            options,
            deadline: Instant::now() + options.time_limit,
            accepted: 0,
            expired: false,
        }
    }

    pub fn reset_timer(&mut self) {
        self.deadline = Instant::now() + self.options.time_limit;
    }

    pub fn has_expired(&self) -> bool {
        self.expired
    }

    pub fn accepted(&self) -> usize {
        self.accepted
    }

    fn is_full(&self) -> bool {
        self.options.max.map_or(false, |max| self.accepted >= max)
    }

    /// Waits for the next event the filter accepts. Returns `None` once the
    /// timer runs out or `max` events have been accepted.
    pub async fn next(&mut self) -> Option<Event> {
        if self.expired || self.is_full() {
            return None;
        }

        loop {
            match time::timeout_at(self.deadline, self.receiver.recv()).await {
                Ok(Some(event)) => {
                    if !(self.filter)(&event) {
                        continue;
                    }
                    self.accepted += 1;
                    if self.options.reset_on_collect {
                        self.reset_timer();
                    }
                    return Some(event);
                }
                Ok(None) | Err(_) => {
                    self.expired = true;
                    return None;
                }
            }
        }
    }

    /// Feeds accepted events to `handler` in arrival order until it returns
    /// [`Flow::Stop`], `max` is reached, or time runs out.
    pub async fn collect<H>(mut self, mut handler: H) -> Collected
    where
        H: FnMut(&Event) -> Flow,
    {
        let mut events = Vec::new();
        while let Some(event) = self.next().await {
            let flow = handler(&event);
            events.push(event);
            if flow == Flow::Stop {
                return Collected::Stopped(events);
            }
        }

        if self.expired {
            Collected::TimedOut(events)
        } else {
            Collected::Stopped(events)
        }
    }
}
