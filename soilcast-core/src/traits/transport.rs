//! Transport abstraction
//!
//! A transport hands one payload to the collector. Two shapes exist:
//!
//! - **Request/response**: stateless. Every delivery opens a connection,
//!   sends the body to a target URL and returns the response status.
//!   Session methods keep their no-op defaults.
//! - **Publish session**: stateful. A handshake opens the session, which
//!   must then be serviced every tick (keep-alive, inbound control frames).
//!   Deliveries publish to a destination topic.
//!
//! Transports are driven exclusively by the
//! [`ConnectionSupervisor`](crate::supervisor::ConnectionSupervisor), which
//! guarantees `deliver` is only called when the session (if any) is up.

use core::fmt;

use crate::config::SessionCredentials;

/// Shape of a transport
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportMode {
    /// Stateless one-shot call per reading
    RequestResponse,
    /// Persistent publish/subscribe session with keep-alive
    PublishSession,
}

impl TransportMode {
    /// Whether a session handshake and keep-alive are required
    pub fn has_session(self) -> bool {
        matches!(self, Self::PublishSession)
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for TransportMode {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Self::RequestResponse => defmt::write!(fmt, "request/response"),
            Self::PublishSession => defmt::write!(fmt, "publish-session"),
        }
    }
}

/// Delivers payloads to the collector
pub trait Transport {
    /// Transport-specific failure
    type Error: fmt::Display;

    /// Which shape this transport has
    fn mode(&self) -> TransportMode;

    /// Perform the session handshake
    fn open_session(&mut self, _credentials: &SessionCredentials) -> Result<(), Self::Error> {
        Ok(())
    }

    /// Service a live session: keep-alive and inbound control frames
    fn service(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    /// Hand one payload to the collector
    ///
    /// `target` is the endpoint URL (request/response) or the destination
    /// topic (publish session). Returns the collector's status code: the
    /// response status for request/response, `0` for an accepted publish.
    fn deliver(&mut self, target: &str, payload: &[u8]) -> Result<u16, Self::Error>;

    /// Close the session, if any
    fn close(&mut self) {}
}
