//! Time-Related Constants
//!
//! This module defines the scheduling cadence and retry delays of the
//! cooperative publish loop. All values are in milliseconds.

// ===== TIME UNIT CONVERSIONS =====

/// Milliseconds per second.
pub const MS_PER_SECOND: u64 = 1000;

// ===== PUBLISH CADENCE =====

/// Interval between two publish attempts (milliseconds).
///
/// One reading every 10 seconds. The cadence is measured from the previous
/// attempt, whether or not it was delivered.
pub const PUBLISH_INTERVAL_MS: u64 = 10 * MS_PER_SECOND;

/// Idle delay at the end of every scheduler tick (milliseconds).
///
/// Bounds the poll rate of the loop while still servicing the session far
/// more often than the keep-alive window requires.
pub const IDLE_DELAY_MS: u64 = 100;

// ===== RETRY DELAYS =====

/// Delay between two link association attempts (milliseconds).
pub const LINK_RETRY_DELAY_MS: u64 = 500;

/// Delay between two session handshake attempts (milliseconds).
pub const SESSION_RETRY_DELAY_MS: u64 = 5 * MS_PER_SECOND;
