//! Platform abstraction for time.
//!
//! Debounce windows, scroll-end detection and measurement batching all read
//! time through [`Clock`], so hosts with their own frame clock (and tests) can
//! drive the pipeline deterministically.

use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

/// Provides monotonic time for the pipeline.
pub trait Clock {
    /// Time elapsed since an arbitrary, fixed origin.
    fn now(&self) -> Duration;

    /// Milliseconds elapsed since `since`, saturating at zero.
    fn elapsed_millis(&self, since: Duration) -> u64 {
        self.now().saturating_sub(since).as_millis() as u64
    }
}

/// Wall clock backed by `web_time::Instant`.
#[derive(Clone, Copy, Debug)]
pub struct SystemClock {
    origin: web_time::Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: web_time::Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// Clock that only moves when told to. Clones share the same time.
#[derive(Clone, Debug, Default)]
pub struct ManualClock {
    now: Rc<Cell<Duration>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }

    pub fn advance_millis(&self, millis: u64) {
        self.advance(Duration::from_millis(millis));
    }

    pub fn set(&self, now: Duration) {
        self.now.set(now);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        self.now.get()
    }
}
