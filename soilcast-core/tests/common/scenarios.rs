//! Node configurations shared by the integration tests
//!
//! Timings are the firmware defaults unless a scenario says otherwise:
//! 100 ms ticks, 500 ms link retries, 5 s session retries.

use fugit::MillisDurationU64;
use soilcast_core::{Calibration, NodeConfig, ReportMode};

pub const IDLE_MS: u64 = 100;
pub const LINK_RETRY_MS: u64 = 500;
pub const SESSION_RETRY_MS: u64 = 5000;

/// Defaults with a short publish interval so runs stay small
pub fn fast(interval_ms: u64) -> NodeConfig {
    NodeConfig::default()
        .device_id("esp32_1")
        .publish_interval(MillisDurationU64::millis(interval_ms))
        .idle_delay(MillisDurationU64::millis(IDLE_MS))
        .retry_delays(
            MillisDurationU64::millis(LINK_RETRY_MS),
            MillisDurationU64::millis(SESSION_RETRY_MS),
        )
}

/// Percent reporting with a resistive probe (dry reads high)
pub fn percent(interval_ms: u64) -> NodeConfig {
    fast(interval_ms).report_mode(ReportMode::Percent(Calibration::new(4095, 0)))
}
