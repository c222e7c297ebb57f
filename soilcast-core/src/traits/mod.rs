//! Collaborator Traits for SoilCast
//!
//! The loop itself is pure control flow; everything that touches hardware or
//! the network sits behind one of these traits, owned by the component that
//! drives it.
//!
//! ## Module Organization
//!
//! - [`hardware`] - analog input sampled by the Sampler
//! - [`link`] - network link (wireless association) owned by the supervisor
//! - [`transport`] - request/response or publish-session transport
//! - [`time`] - time source and blocking delay used by the scheduler
//!
//! ## Design Philosophy
//!
//! All traits take `&mut self` and carry no `Send`/`Sync` bounds: there is
//! exactly one thread of control, and each collaborator has exactly one
//! owner. Generic parameters keep dispatch static, which matters on a
//! microcontroller with a few hundred kilobytes of flash.

pub mod hardware;
pub mod link;
pub mod time;
pub mod transport;

pub use hardware::AnalogInput;
pub use link::Link;
pub use time::{Delay, TimeSource};
pub use transport::{Transport, TransportMode};
