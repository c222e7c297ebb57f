//! Time management for the publish loop
//!
//! Provides the clock and delay implementations the scheduler is driven by:
//! - [`MonotonicTime`] / [`StdDelay`]: host clock and blocking sleep (std only)
//! - [`SimClock`]: simulated clock whose delays advance time instantly, so
//!   reconnection and cadence logic can be exercised without real sleeps
//!
//! On a microcontroller, implement [`TimeSource`] over the tick counter and
//! [`Delay`] over the HAL delay provider.

use core::cell::Cell;

pub use crate::traits::time::{Delay, TimeSource};

/// Timestamp in milliseconds since device boot (monotonic)
pub type Timestamp = u64;

/// Monotonic host clock, zero at construction
#[cfg(feature = "std")]
#[derive(Debug, Clone)]
pub struct MonotonicTime {
    start: std::time::Instant,
}

#[cfg(feature = "std")]
impl MonotonicTime {
    /// Start counting from now
    pub fn new() -> Self {
        Self { start: std::time::Instant::now() }
    }
}

#[cfg(feature = "std")]
impl Default for MonotonicTime {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "std")]
impl TimeSource for MonotonicTime {
    fn now(&self) -> Timestamp {
        self.start.elapsed().as_millis() as Timestamp
    }
}

/// Blocking delay backed by `std::thread::sleep`
#[cfg(feature = "std")]
#[derive(Debug, Clone, Copy, Default)]
pub struct StdDelay;

#[cfg(feature = "std")]
impl Delay for StdDelay {
    fn delay_ms(&mut self, ms: u64) {
        std::thread::sleep(std::time::Duration::from_millis(ms));
    }
}

/// Simulated clock for tests and replay
///
/// Time only moves when [`advance`](Self::advance) is called or when a delay
/// is taken through `&SimClock`. Share one clock between the scheduler's time
/// source and delay by passing `&clock` for both.
#[derive(Debug, Default)]
pub struct SimClock {
    now: Cell<Timestamp>,
}

impl SimClock {
    /// Clock reading `start`
    pub const fn new(start: Timestamp) -> Self {
        Self { now: Cell::new(start) }
    }

    /// Jump to `timestamp`; may go backwards
    pub fn set(&self, timestamp: Timestamp) {
        self.now.set(timestamp);
    }

    /// Move forward by `ms`
    pub fn advance(&self, ms: u64) {
        self.now.set(self.now.get().saturating_add(ms));
    }
}

impl TimeSource for SimClock {
    fn now(&self) -> Timestamp {
        self.now.get()
    }
}

impl TimeSource for &SimClock {
    fn now(&self) -> Timestamp {
        self.now.get()
    }
}

impl Delay for &SimClock {
    fn delay_ms(&mut self, ms: u64) {
        self.advance(ms);
    }
}

/// Milliseconds elapsed between two timestamps, zero if time went backwards
pub fn elapsed_ms(earlier: Timestamp, later: Timestamp) -> u64 {
    later.saturating_sub(earlier)
}
