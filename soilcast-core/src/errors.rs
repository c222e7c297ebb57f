//! Error Types for the Telemetry Loop
//!
//! ## Design Philosophy
//!
//! Errors are returned from the hot path of a microcontroller loop, so they
//! follow the same rules as everything else the loop touches:
//!
//! 1. **No Heap Allocation**: only integers and `&'static str` payloads.
//! 2. **Copy Semantics**: errors are cheap to return, log and keep as the
//!    last error in [`ConnectionStats`](crate::session::ConnectionStats).
//! 3. **Nothing Is Fatal**: every runtime error is scoped to one step of one
//!    tick. The loop keeps running; availability wins over delivery.
//!
//! ## Error Categories
//!
//! | Variant                   | Raised by             | Recovery                           |
//! |---------------------------|-----------------------|------------------------------------|
//! | `LinkFailure`             | ConnectionSupervisor  | retried after the link delay       |
//! | `SessionHandshakeFailure` | ConnectionSupervisor  | retried after the session delay    |
//! | `EncodingOverflow`        | PayloadEncoder        | reading dropped for this tick      |
//! | `EncodingFailure`         | PayloadEncoder        | reading dropped for this tick      |
//! | `DeliveryFailure`         | TransportSession      | reading dropped, no retry          |
//!
//! Retries carry no ceiling and no backoff growth; the attempt counter is
//! reported so operators can spot a node stuck in a retry loop.
//!
//! [`ConfigError`] is separate: it is raised once, before the loop starts,
//! by [`NodeConfig::validate`](crate::config::NodeConfig::validate).

use thiserror_no_std::Error;

/// Result type for telemetry operations
pub type TelemetryResult<T> = Result<T, TelemetryError>;

/// Runtime failures of one step of the publish loop
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TelemetryError {
    /// Network link could not be established (or is still associating)
    #[error("Link failure on attempt {attempt}")]
    LinkFailure {
        /// Consecutive link attempts so far, including this one
        attempt: u32,
    },

    /// Session handshake with the collector was refused or timed out
    #[error("Session handshake failure on attempt {attempt}")]
    SessionHandshakeFailure {
        /// Consecutive handshake attempts so far, including this one
        attempt: u32,
    },

    /// Serialized reading does not fit the fixed payload buffer
    #[error("Encoded payload needs {required} bytes, capacity is {capacity}")]
    EncodingOverflow {
        /// Bytes the serialized reading needs
        required: usize,
        /// Bytes the payload buffer holds
        capacity: usize,
    },

    /// Serializer rejected the reading for a reason other than its size
    #[error("Encoding failed: {reason}")]
    EncodingFailure {
        /// Serializer's description of the failure
        reason: &'static str,
    },

    /// Transport failed to hand the payload off
    #[error("Delivery failed: {reason}")]
    DeliveryFailure {
        /// Short description of the transport error
        reason: &'static str,
    },
}

/// Configuration rejected before the loop starts
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// Device identity is empty
    #[error("Device id must not be empty")]
    EmptyDeviceId,

    /// Publish interval is zero
    #[error("Publish interval must be greater than zero")]
    ZeroInterval,

    /// Dry and wet calibration points coincide
    #[error("Calibration points must differ (dry = wet = {raw})")]
    DegenerateCalibration {
        /// The shared raw count
        raw: u16,
    },

    /// Calibration point outside the ADC range
    #[error("Calibration point {raw} exceeds ADC maximum {max}")]
    CalibrationOutOfRange {
        /// Offending calibration point
        raw: u16,
        /// Highest count the ADC can report
        max: u16,
    },

    /// A fixed-capacity identifier (topic or client id) would not fit
    #[error("{what} needs {required} bytes, capacity is {capacity}")]
    IdentifierTooLong {
        /// Which identifier overflowed
        what: &'static str,
        /// Bytes needed
        required: usize,
        /// Bytes available
        capacity: usize,
    },

    /// Device id holds a topic wildcard or level separator
    #[error("Device id must not contain '{character}' when publishing to a topic")]
    ReservedTopicCharacter {
        /// First offending character
        character: char,
    },
}

#[cfg(feature = "defmt")]
impl defmt::Format for TelemetryError {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Self::LinkFailure { attempt } =>
                defmt::write!(fmt, "Link failure (attempt {})", attempt),
            Self::SessionHandshakeFailure { attempt } =>
                defmt::write!(fmt, "Session handshake failure (attempt {})", attempt),
            Self::EncodingOverflow { required, capacity } =>
                defmt::write!(fmt, "Payload needs {} bytes, capacity {}", required, capacity),
            Self::EncodingFailure { reason } =>
                defmt::write!(fmt, "Encoding failed: {}", reason),
            Self::DeliveryFailure { reason } =>
                defmt::write!(fmt, "Delivery failed: {}", reason),
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for ConfigError {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Self::EmptyDeviceId => defmt::write!(fmt, "Empty device id"),
            Self::ZeroInterval => defmt::write!(fmt, "Zero publish interval"),
            Self::DegenerateCalibration { raw } =>
                defmt::write!(fmt, "Calibration points coincide at {}", raw),
            Self::CalibrationOutOfRange { raw, max } =>
                defmt::write!(fmt, "Calibration point {} exceeds {}", raw, max),
            Self::IdentifierTooLong { what, required, capacity } =>
                defmt::write!(fmt, "{} needs {} bytes, capacity {}", what, required, capacity),
            Self::ReservedTopicCharacter { character } =>
                defmt::write!(fmt, "Reserved topic character {} in device id", character),
        }
    }
}
