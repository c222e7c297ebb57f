//! Constants for SoilCast Core
//!
//! Every compile-time setting of the node lives here, with units in the name
//! and a short note on where the value comes from.
//!
//! ## Organization
//!
//! - **Adc**: probe channel, resolution and calibration points
//! - **Network**: device identity, link and collector credentials
//! - **Time**: publish cadence and retry delays
//! - **Buffers**: fixed payload and topic capacities
//!
//! [`NodeConfig::default`](crate::config::NodeConfig::default) is assembled
//! from these values.

/// Analog front-end channel, resolution and calibration.
pub mod adc;

/// Device identity, link credentials and collector addresses.
pub mod network;

/// Publish cadence, idle and retry delays.
pub mod time;

/// Fixed capacities of stack buffers.
pub mod buffers;

pub use adc::{ADC_MAX_VALUE, ADC_RESOLUTION_BITS, CALIBRATION_DRY_RAW, CALIBRATION_WET_RAW};

pub use network::{DEVICE_ID, HTTP_CONTENT_TYPE, HTTP_ENDPOINT, TOPIC_PREFIX};

pub use time::{IDLE_DELAY_MS, LINK_RETRY_DELAY_MS, PUBLISH_INTERVAL_MS, SESSION_RETRY_DELAY_MS};

pub use buffers::{CLIENT_ID_CAPACITY, PAYLOAD_CAPACITY, TOPIC_CAPACITY};
