//! Transport session
//!
//! [`TransportSession`] binds a [`Transport`] to its fixed delivery target
//! and keeps the [`ConnectionStats`]. It is owned by the
//! [`ConnectionSupervisor`](crate::supervisor::ConnectionSupervisor), which
//! only lends it out for publishing when the connection is ready.
//!
//! ## Delivery Guarantee
//!
//! At-most-once, best-effort. A payload is handed to the transport exactly
//! once; on failure it is logged and dropped. Nothing is queued past the
//! tick it was sampled in.

use heapless::String;

use crate::config::{NodeConfig, SessionCredentials};
use crate::constants::buffers::TOPIC_CAPACITY;
use crate::errors::{ConfigError, TelemetryError};
use crate::payload::Payload;
use crate::traits::{Transport, TransportMode};

/// Outcome of one publish: `Ok(code)` is a delivery with the collector's
/// status code, `Err` is a [`TelemetryError::DeliveryFailure`]
pub type DeliveryResult = Result<u16, TelemetryError>;

/// Counters kept across the life of the node
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ConnectionStats {
    /// Payloads the transport accepted
    pub messages_sent: u64,
    /// Payloads the transport rejected
    pub messages_failed: u64,
    /// Total payload bytes accepted
    pub bytes_sent: u64,
    /// Link association attempts
    pub link_attempts: u32,
    /// Session handshake attempts
    pub session_attempts: u32,
    /// Times the connection came back after being lost
    pub reconnections: u32,
    /// Readings dropped because they did not fit the payload buffer
    pub encoding_overflows: u32,
    /// Most recent failure, if any
    pub last_error: Option<TelemetryError>,
}

impl ConnectionStats {
    pub(crate) fn record_error(&mut self, error: TelemetryError) {
        if let TelemetryError::EncodingOverflow { .. } = error {
            self.encoding_overflows += 1;
        }
        self.last_error = Some(error);
    }
}

/// Fixed delivery target
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// Endpoint URL of a request/response collector
    Endpoint(&'static str),
    /// Destination topic of a publish session
    Topic(String<TOPIC_CAPACITY>),
}

impl Target {
    /// URL or topic the transport delivers to
    pub fn as_str(&self) -> &str {
        match self {
            Self::Endpoint(url) => url,
            Self::Topic(topic) => topic.as_str(),
        }
    }
}

/// A transport bound to its delivery target
pub struct TransportSession<T: Transport> {
    transport: T,
    target: Target,
    stats: ConnectionStats,
}

impl<T: Transport> TransportSession<T> {
    /// Bind `transport` to the target the configuration derives for its mode
    pub fn new(transport: T, config: &NodeConfig) -> Result<Self, ConfigError> {
        let target = match transport.mode() {
            TransportMode::RequestResponse => Target::Endpoint(config.http_endpoint),
            TransportMode::PublishSession => Target::Topic(config.destination_topic()?),
        };
        Ok(Self {
            transport,
            target,
            stats: ConnectionStats::default(),
        })
    }

    /// Shape of the bound transport
    pub fn mode(&self) -> TransportMode {
        self.transport.mode()
    }

    /// Where payloads are delivered
    pub fn target(&self) -> &Target {
        &self.target
    }

    /// Delivery and connection counters
    pub fn stats(&self) -> &ConnectionStats {
        &self.stats
    }

    pub(crate) fn stats_mut(&mut self) -> &mut ConnectionStats {
        &mut self.stats
    }

    /// The bound transport
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// The bound transport, mutably
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub(crate) fn open(&mut self, credentials: &SessionCredentials) -> Result<(), T::Error> {
        self.transport.open_session(credentials)
    }

    pub(crate) fn service(&mut self) -> Result<(), T::Error> {
        self.transport.service()
    }

    pub(crate) fn close(&mut self) {
        self.transport.close();
    }

    /// Hand one payload to the collector
    pub fn publish(&mut self, payload: &Payload) -> DeliveryResult {
        let mode = self.transport.mode();
        match self.transport.deliver(self.target.as_str(), payload) {
            Ok(code) => {
                self.stats.messages_sent += 1;
                self.stats.bytes_sent += payload.len() as u64;
                match mode {
                    TransportMode::RequestResponse if !(200..300).contains(&code) => {
                        log_warn!("response code: {} from {}", code, self.target.as_str());
                    }
                    TransportMode::RequestResponse => {
                        log_info!("response code: {}", code);
                    }
                    TransportMode::PublishSession => {
                        log_debug!("published {} bytes to {}", payload.len(), self.target.as_str());
                    }
                }
                Ok(code)
            }
            Err(e) => {
                log_warn!("delivery to {} failed: {}", self.target.as_str(), e);
                let error = TelemetryError::DeliveryFailure {
                    reason: match mode {
                        TransportMode::RequestResponse => "request failed",
                        TransportMode::PublishSession => "publish rejected",
                    },
                };
                self.stats.messages_failed += 1;
                self.stats.record_error(error);
                Err(error)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Collector {
        mode: TransportMode,
        status: Result<u16, &'static str>,
        delivered: Option<(std::string::String, std::vec::Vec<u8>)>,
    }

    impl Transport for Collector {
        type Error = &'static str;

        fn mode(&self) -> TransportMode {
            self.mode
        }

        fn deliver(&mut self, target: &str, payload: &[u8]) -> Result<u16, Self::Error> {
            self.delivered = Some((target.into(), payload.to_vec()));
            self.status
        }
    }

    fn collector(mode: TransportMode, status: Result<u16, &'static str>) -> Collector {
        Collector { mode, status, delivered: None }
    }

    #[test]
    fn request_mode_targets_endpoint() {
        let config = NodeConfig::default().http_endpoint("http://collector.local/moisture");
        let mut session =
            TransportSession::new(collector(TransportMode::RequestResponse, Ok(201)), &config)
                .unwrap();

        let payload = Payload::from_slice(b"{}").unwrap();
        assert_eq!(session.publish(&payload), Ok(201));

        let (target, body) = session.transport().delivered.clone().unwrap();
        assert_eq!(target, "http://collector.local/moisture");
        assert_eq!(body, b"{}");
        assert_eq!(session.stats().messages_sent, 1);
        assert_eq!(session.stats().bytes_sent, 2);
    }

    #[test]
    fn publish_mode_targets_device_topic() {
        let config = NodeConfig::default().device_id("bed_2");
        let session =
            TransportSession::new(collector(TransportMode::PublishSession, Ok(0)), &config)
                .unwrap();
        assert_eq!(session.target().as_str(), "sensors/moisture/bed_2");
    }

    #[test]
    fn error_status_still_counts_as_delivered() {
        let config = NodeConfig::default();
        let mut session =
            TransportSession::new(collector(TransportMode::RequestResponse, Ok(500)), &config)
                .unwrap();
        let payload = Payload::from_slice(b"{}").unwrap();
        assert_eq!(session.publish(&payload), Ok(500));
        assert_eq!(session.stats().messages_failed, 0);
    }

    #[test]
    fn transport_error_is_a_delivery_failure() {
        let config = NodeConfig::default();
        let mut session = TransportSession::new(
            collector(TransportMode::RequestResponse, Err("connection refused")),
            &config,
        )
        .unwrap();
        let payload = Payload::from_slice(b"{}").unwrap();

        let err = session.publish(&payload).unwrap_err();
        assert_eq!(err, TelemetryError::DeliveryFailure { reason: "request failed" });
        assert_eq!(session.stats().messages_failed, 1);
        assert_eq!(session.stats().last_error, Some(err));
    }
}
