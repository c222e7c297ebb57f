//! Time Source and Delay Abstractions for Embedded Systems
//!
//! The scheduler never reads a clock or sleeps directly; it goes through
//! these two traits so the same loop runs on bare metal, on a host, and in
//! tests driven by a simulated clock.
//!
//! ## Example Implementation
//!
//! ```rust
//! use soilcast_core::traits::{Delay, TimeSource};
//! use soilcast_core::time::Timestamp;
//!
//! struct TickCounter {
//!     ticks: u64,
//! }
//!
//! impl TimeSource for TickCounter {
//!     fn now(&self) -> Timestamp {
//!         self.ticks // 1 kHz tick, already milliseconds
//!     }
//! }
//!
//! struct BusyWait;
//!
//! impl Delay for BusyWait {
//!     fn delay_ms(&mut self, _ms: u64) {
//!         // spin on the cycle counter
//!     }
//! }
//! ```

use crate::time::Timestamp;

/// Source of monotonic time for the loop
///
/// `now()` must never decrease. The epoch is arbitrary (usually boot).
pub trait TimeSource {
    /// Get current timestamp in milliseconds
    fn now(&self) -> Timestamp;
}

/// Blocking delay provider
///
/// This is the only suspension point of the loop: during a delay no other
/// work proceeds.
pub trait Delay {
    /// Block for `ms` milliseconds
    fn delay_ms(&mut self, ms: u64);
}
