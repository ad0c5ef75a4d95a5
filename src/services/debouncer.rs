//! Deadline-based debouncing.
//!
//! A `Debouncer` owns at most one pending payload and the deadline at which
//! it becomes due. Arming replaces both; the previous payload is dropped, not
//! queued. Firing hands the payload out and clears the slot.

use std::time::{Duration, Instant};

#[derive(Debug)]
struct Pending<T> {
    deadline: Instant,
    payload: T,
}

#[derive(Debug)]
pub struct Debouncer<T> {
    delay: Duration,
    pending: Option<Pending<T>>,
    superseded: u64,
}

impl<T> Debouncer<T> {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
            superseded: 0,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Schedules `payload` for `now + delay`, replacing anything pending.
    /// Returns `true` when a pending payload was superseded.
    pub fn arm(&mut self, payload: T, now: Instant) -> bool {
        let replaced = self.pending.is_some();
        if replaced {
            self.superseded += 1;
        }
        self.pending = Some(Pending {
            deadline: now + self.delay,
            payload,
        });
        replaced
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|p| p.deadline)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Takes the payload if its deadline has passed.
    pub fn take_due(&mut self, now: Instant) -> Option<T> {
        if self.deadline()? <= now {
            self.take()
        } else {
            None
        }
    }

    /// Takes the payload regardless of its deadline.
    pub fn take(&mut self) -> Option<T> {
        self.pending.take().map(|p| p.payload)
    }

    /// How many payloads were replaced before firing.
    pub fn superseded(&self) -> u64 {
        self.superseded
    }
}
