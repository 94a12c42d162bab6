//! Single-slot deferred task register.
//!
//! Scheduling replaces whatever was pending, so a burst of requests inside the
//! window collapses into one firing `delay` after the last request.

use std::time::Duration;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DeferredTask {
    deadline: Option<Duration>,
}

impl DeferredTask {
    pub const fn new() -> Self {
        Self { deadline: None }
    }

    /// Arms the register to fire at `now + delay`, replacing any pending timer.
    pub fn schedule(&mut self, now: Duration, delay: Duration) {
        self.deadline = Some(now + delay);
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn deadline(&self) -> Option<Duration> {
        self.deadline
    }

    /// Returns true and disarms if the deadline has passed.
    pub fn take_due(&mut self, now: Duration) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}
