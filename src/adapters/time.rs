//! Monotonic clock adapter.
//!
//! Reads `embassy_time::Instant`, the same time base that drives the
//! actor's `async_io_mini` timers.  Milliseconds count from construction.

use embassy_time::Instant;

use crate::app::ports::ClockPort;

pub struct MonotonicClock {
    start: Instant,
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self { start: Instant::now() }
    }
}

impl ClockPort for MonotonicClock {
    fn now_ms(&self) -> u64 {
        self.start.elapsed().as_millis()
    }
}
