//! Control-thread polling
//!
//! A [`Poller`] checks one [`ScrapeHandle`] on a fixed interval and hands the
//! outcome to a completion callback. A [`ControlLoop`] drives any number of
//! pollers from a single thread. Nothing here blocks except [`ControlLoop::run`],
//! which sleeps between ticks.

use std::thread;
use std::time::{Duration, Instant};

use tracing::trace;

use crate::config::DEFAULT_POLL_INTERVAL_MS;
use crate::request::Outcome;
use crate::runner::ScrapeHandle;

pub const POLL_INTERVAL: Duration = Duration::from_millis(DEFAULT_POLL_INTERVAL_MS);

type Completion = Box<dyn FnOnce(Outcome)>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollStatus {
    /// Check again at this instant
    Pending(Instant),
    /// Outcome handed to the callback; no further checks
    Complete,
}

pub struct Poller {
    handle: ScrapeHandle,
    interval: Duration,
    next_due: Instant,
    on_complete: Option<Completion>,
}

impl Poller {
    /// First check is due one interval after `now`.
    pub fn new(
        handle: ScrapeHandle,
        interval: Duration,
        now: Instant,
        on_complete: impl FnOnce(Outcome) + 'static,
    ) -> Self {
        Self {
            handle,
            interval,
            next_due: now + interval,
            on_complete: Some(Box::new(on_complete)),
        }
    }

    pub fn id(&self) -> u64 {
        self.handle.id()
    }

    /// Check the channel if a check is due.
    ///
    /// An empty channel reschedules one interval after `now`. A message is
    /// taken, passed to the callback, and ends polling for good.
    pub fn poll(&mut self, now: Instant) -> PollStatus {
        if self.on_complete.is_none() {
            return PollStatus::Complete;
        }
        if now < self.next_due {
            return PollStatus::Pending(self.next_due);
        }

        match self.handle.try_take() {
            Some(outcome) => {
                trace!(id = self.id(), "outcome received");
                if let Some(on_complete) = self.on_complete.take() {
                    on_complete(outcome);
                }
                PollStatus::Complete
            }
            None => {
                self.next_due = now + self.interval;
                PollStatus::Pending(self.next_due)
            }
        }
    }
}

/// Single-threaded scheduler for pollers
pub struct ControlLoop {
    interval: Duration,
    pollers: Vec<Poller>,
}

impl ControlLoop {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            pollers: Vec::new(),
        }
    }

    /// Start polling `handle`; returns its id for [`ControlLoop::abandon`].
    pub fn watch(&mut self, handle: ScrapeHandle, on_complete: impl FnOnce(Outcome) + 'static) -> u64 {
        let poller = Poller::new(handle, self.interval, Instant::now(), on_complete);
        let id = poller.id();
        self.pollers.push(poller);
        id
    }

    /// Stop polling a scrape. Its worker keeps running; the outcome is dropped.
    pub fn abandon(&mut self, id: u64) -> bool {
        let before = self.pollers.len();
        self.pollers.retain(|p| p.id() != id);
        self.pollers.len() != before
    }

    pub fn pending(&self) -> usize {
        self.pollers.len()
    }

    pub fn is_idle(&self) -> bool {
        self.pollers.is_empty()
    }

    /// Poll everything that is due. Returns the earliest next due instant,
    /// or `None` once nothing is left to watch.
    pub fn tick(&mut self, now: Instant) -> Option<Instant> {
        let mut next: Option<Instant> = None;
        self.pollers.retain_mut(|poller| match poller.poll(now) {
            PollStatus::Complete => false,
            PollStatus::Pending(due) => {
                next = Some(next.map_or(due, |n| n.min(due)));
                true
            }
        });
        next
    }

    /// Tick until every watched scrape has completed or been abandoned.
    pub fn run(&mut self) {
        while let Some(due) = self.tick(Instant::now()) {
            let wait = due.saturating_duration_since(Instant::now());
            if !wait.is_zero() {
                thread::sleep(wait);
            }
        }
    }
}

impl Default for ControlLoop {
    fn default() -> Self {
        Self::new(POLL_INTERVAL)
    }
}
