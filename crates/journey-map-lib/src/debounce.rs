//! Cancellable delayed-task primitive
//!
//! At most one deadline is outstanding per `Debouncer`; scheduling again
//! replaces it. The clock is injected, so callers decide what "now" means
//! and tests never sleep.

use instant::Instant;
use std::time::Duration;

#[derive(Debug)]
pub struct Debouncer {
    delay: Duration,
    deadline: Option<Instant>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            deadline: None,
        }
    }

    /// Schedule (or restart) the deadline at `now + delay`, cancelling any
    /// previously pending one.
    pub fn schedule(&mut self, now: Instant) {
        self.deadline = Some(now + self.delay);
    }

    /// Cancel the pending deadline; it will never fire.
    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// The pending deadline, if any. Lets the UI schedule a wakeup instead
    /// of polling blindly.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Returns true exactly once when the deadline has elapsed, clearing it.
    pub fn fire(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}
