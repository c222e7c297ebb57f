//! Network link abstraction
//!
//! The link is the connectivity underneath any session protocol (on the
//! ESP32, the WiFi association). Association takes several radio round trips,
//! so [`Link::connect`] is non-blocking in the `nb` style: it reports
//! `WouldBlock` while the association is still in progress and the caller
//! polls again later.

use core::fmt;

use crate::config::NetworkCredentials;

/// Underlying network connectivity
pub trait Link {
    /// Driver-specific failure
    type Error: fmt::Display;

    /// Start or continue establishing the link
    ///
    /// - `Ok(())`: the link is up
    /// - `Err(nb::Error::WouldBlock)`: association in progress
    /// - `Err(nb::Error::Other(e))`: association failed
    fn connect(&mut self, credentials: &NetworkCredentials) -> nb::Result<(), Self::Error>;

    /// Whether the link is currently up
    fn is_up(&mut self) -> bool;

    /// Tear the link down
    fn disconnect(&mut self);
}
