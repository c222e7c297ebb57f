//! Host-side Collaborators for SoilCast Nodes
//!
//! ## Overview
//!
//! `soilcast-core` drives a node through three collaborator traits:
//! [`Link`](soilcast_core::Link), [`Transport`](soilcast_core::Transport)
//! and the hardware/time traits. On a microcontroller those are backed by
//! the radio driver and the vendor network stack. This crate backs them with
//! ordinary sockets so the same loop can be run and debugged on a PC.
//!
//! ## Transport Selection Guide
//!
//! ### MQTT (publish session)
//!
//! **When to use:**
//! - A broker already fans readings out to dashboards and stores
//! - Late subscribers should see the last value (retained publishes)
//!
//! **Characteristics:**
//! - One handshake, then a persistent session kept alive every tick
//! - Identity carried by the topic `sensors/moisture/<device_id>`
//! - QoS 0: at most once, no broker acknowledgement
//!
//! ### HTTP (request/response)
//!
//! **When to use:**
//! - The collector is a plain web service
//! - No broker is available on the network
//!
//! **Characteristics:**
//! - One POST per reading, nothing to keep alive
//! - Identity carried in the body
//! - Any response status counts as delivered; non-2xx is logged
//!
//! ## Link
//!
//! [`HostLink`] stands in for wireless association: it probes a TCP
//! endpoint (usually the collector itself) and reports the link up when the
//! probe connects. It re-probes periodically so pulling a cable or stopping
//! the collector is seen as a lost link.
//!
//! ## Security Considerations
//!
//! Both transports speak plain TCP. Credentials are sent in the clear and
//! server certificates are not validated; run them on a trusted segment.
//!
//! ## Example Usage
//!
//! ```no_run
//! use soilcast_connectors::{HostLink, MqttConfig, MqttSession};
//! use soilcast_core::time::{MonotonicTime, StdDelay};
//! use soilcast_core::{NodeConfig, Scheduler};
//!
//! let config = NodeConfig::default();
//! let link = HostLink::new("192.168.0.102:1883")?;
//! let broker = MqttSession::new(MqttConfig::from_node(&config))?;
//!
//! let mut node = Scheduler::new(&config, || 2048u16, link, broker, MonotonicTime::new(), StdDelay)?;
//! node.run();
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod link;

#[cfg(feature = "mqtt")]
pub mod mqtt;

#[cfg(feature = "http")]
pub mod http;

// Re-export common types
pub use link::{HostLink, LinkError};

#[cfg(feature = "mqtt")]
pub use mqtt::{MqttConfig, MqttError, MqttSession};

#[cfg(feature = "http")]
pub use http::{HttpConfig, HttpError, HttpTransport};
