//! Core publish loop for SoilCast moisture nodes
//!
//! Samples a soil-moisture probe on a fixed cadence and hands each reading
//! to a collector over an unreliable wireless link, either as a stateless
//! HTTP-style request or over a persistent publish/subscribe session.
//!
//! Key constraints:
//! - Runs on a single-core microcontroller without an RTOS
//! - No heap allocation: payloads are serialized straight into fixed
//!   `heapless` buffers, as are topics and client ids
//! - Never blocks except in the idle delay between ticks
//! - Never gives up: link and session failures are retried indefinitely
//!
//! ```no_run
//! use soilcast_core::{NodeConfig, Scheduler};
//! use soilcast_core::time::{MonotonicTime, StdDelay};
//! # use soilcast_core::config::NetworkCredentials;
//! # use soilcast_core::traits::{Link, Transport, TransportMode};
//! # struct Wired;
//! # impl Link for Wired {
//! #     type Error = &'static str;
//! #     fn connect(&mut self, _: &NetworkCredentials) -> nb::Result<(), Self::Error> { Ok(()) }
//! #     fn is_up(&mut self) -> bool { true }
//! #     fn disconnect(&mut self) {}
//! # }
//! # struct Console;
//! # impl Transport for Console {
//! #     type Error = &'static str;
//! #     fn mode(&self) -> TransportMode { TransportMode::RequestResponse }
//! #     fn deliver(&mut self, _: &str, _: &[u8]) -> Result<u16, Self::Error> { Ok(200) }
//! # }
//!
//! let probe = || 2048u16;
//! let mut node = Scheduler::new(
//!     &NodeConfig::default(),
//!     probe,
//!     Wired,
//!     Console,
//!     MonotonicTime::new(),
//!     StdDelay,
//! )
//! .expect("valid configuration");
//!
//! node.run();
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![deny(unsafe_code)]
#![warn(missing_docs)]

#[macro_use]
mod logging;

pub mod config;
pub mod constants;
pub mod errors;
pub mod payload;
pub mod sampler;
pub mod scheduler;
pub mod session;
pub mod supervisor;
pub mod time;
pub mod traits;

// Public API
pub use config::{Calibration, NodeConfig, ReportMode};
pub use errors::{ConfigError, TelemetryError, TelemetryResult};
pub use payload::{Payload, PayloadEncoder};
pub use sampler::{Reading, Sampler, Unit};
pub use scheduler::{PublishOutcome, ScheduleState, Scheduler, TickOutcome};
pub use session::{ConnectionStats, DeliveryResult, TransportSession};
pub use supervisor::{ConnectionSupervisor, LinkState};
pub use traits::{AnalogInput, Delay, Link, TimeSource, Transport, TransportMode};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
