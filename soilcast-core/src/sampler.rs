//! Moisture Sampler
//!
//! Reads the probe's analog channel and turns the raw conversion into the
//! value that gets reported.
//!
//! ## Reporting Modes
//!
//! ### Raw
//! The ADC count is passed through, clamped to `[0, max_adc_value]` so a
//! misbehaving driver can never report more than the converter can produce.
//!
//! ### Percent
//! A two-point linear map through the calibration pair:
//!
//! ```text
//! percent = round((raw - dry_raw) * 100 / (wet_raw - dry_raw))
//! ```
//!
//! clamped to `[0, 100]`. Resistive probes read *high* when dry, so the
//! usual calibration has `dry_raw > wet_raw`; the map handles both
//! orientations. Rounding is to the nearest integer (half away from dry),
//! which puts the midpoint of a 12-bit span at exactly 50%.
//!
//! ## Example
//!
//! ```rust
//! use soilcast_core::config::Calibration;
//! use soilcast_core::sampler::raw_to_percent;
//!
//! let calibration = Calibration::new(4095, 0);
//! assert_eq!(raw_to_percent(4095, calibration), 0);
//! assert_eq!(raw_to_percent(2048, calibration), 50);
//! assert_eq!(raw_to_percent(0, calibration), 100);
//! ```

use core::fmt;

use crate::config::{Calibration, NodeConfig, ReportMode};
use crate::constants::adc::PERCENT_MAX;
use crate::traits::AnalogInput;

/// Unit of a reported value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unit {
    /// Raw ADC counts
    RawCount,
    /// Percent of the calibrated span
    Percent,
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RawCount => f.write_str("counts"),
            Self::Percent => f.write_str("%"),
        }
    }
}

/// One sampled reading, valid for a single scheduler tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reading {
    /// Identity of the node that took it
    pub device_id: &'static str,
    /// Raw count or percent, depending on `unit`
    pub value: u16,
    /// Unit of `value`
    pub unit: Unit,
}

#[cfg(feature = "defmt")]
impl defmt::Format for Reading {
    fn format(&self, fmt: defmt::Formatter) {
        match self.unit {
            Unit::RawCount => defmt::write!(fmt, "{}: {} counts", self.device_id, self.value),
            Unit::Percent => defmt::write!(fmt, "{}: {}%", self.device_id, self.value),
        }
    }
}

/// Map a raw conversion onto 0-100% through a calibration pair
///
/// A degenerate calibration (`dry_raw == wet_raw`) reports 0; configurations
/// are validated against it before the loop starts.
pub fn raw_to_percent(raw: u16, calibration: Calibration) -> u16 {
    let dry = i32::from(calibration.dry_raw);
    let wet = i32::from(calibration.wet_raw);

    let mut numerator = (i32::from(raw) - dry) * i32::from(PERCENT_MAX);
    let mut span = wet - dry;
    if span == 0 {
        return 0;
    }
    if span < 0 {
        numerator = -numerator;
        span = -span;
    }
    // On the dry side of the calibration point
    if numerator <= 0 {
        return 0;
    }

    let percent = (numerator + span / 2) / span;
    percent.min(i32::from(PERCENT_MAX)) as u16
}

/// Reads the probe and produces [`Reading`]s
pub struct Sampler<A: AnalogInput> {
    input: A,
    device_id: &'static str,
    mode: ReportMode,
    max_adc_value: u16,
}

impl<A: AnalogInput> Sampler<A> {
    /// Sampler reading `input`, clamped to `max_adc_value`
    pub fn new(input: A, device_id: &'static str, mode: ReportMode, max_adc_value: u16) -> Self {
        Self {
            input,
            device_id,
            mode,
            max_adc_value,
        }
    }

    /// Build a sampler from the node configuration
    pub fn from_config(input: A, config: &NodeConfig) -> Self {
        Self::new(input, config.device_id, config.report_mode, config.max_adc_value())
    }

    /// Sample the channel once
    pub fn read(&mut self) -> Reading {
        let raw = self.input.read_raw().min(self.max_adc_value);
        let (value, unit) = match self.mode {
            ReportMode::Raw => (raw, Unit::RawCount),
            ReportMode::Percent(calibration) => (raw_to_percent(raw, calibration), Unit::Percent),
        };

        log_info!("soil moisture: {} {} (raw {})", value, unit, raw);

        Reading {
            device_id: self.device_id,
            value,
            unit,
        }
    }

    /// How readings are reported
    pub fn mode(&self) -> ReportMode {
        self.mode
    }
}
