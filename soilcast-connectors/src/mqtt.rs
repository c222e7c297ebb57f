//! MQTT publish session for SoilCast
//!
//! Wraps the blocking `rumqttc` client. The core loop never blocks outside
//! its idle delay, so every call here is bounded:
//!
//! - `open_session` waits at most `handshake_timeout` for the broker's
//!   CONNACK
//! - `service` drains pending events, waiting at most `poll_timeout` for
//!   each and handling at most `max_events_per_service` per tick
//! - `deliver` queues one QoS 0 publish and flushes it with a `service`
//!
//! Keep-alive pings are sent by the event loop while it is being drained, so
//! the supervisor servicing the session every tick keeps it alive.

use std::time::{Duration, Instant};

use rumqttc::{
    Client, ConnectReturnCode, Connection, Event, MqttOptions, Packet, QoS, RecvTimeoutError,
};
use soilcast_core::config::{NodeConfig, SessionCredentials};
use soilcast_core::constants::network::{MQTT_BROKER_HOST, MQTT_BROKER_PORT};
use soilcast_core::{Transport, TransportMode};
use thiserror::Error;

/// MQTT-specific errors
#[derive(Debug, Error)]
pub enum MqttError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(&'static str),

    /// No session is open
    #[error("Not connected")]
    NotConnected,

    /// Broker did not answer the handshake in time
    #[error("No CONNACK within {0:?}")]
    HandshakeTimeout(Duration),

    /// Broker answered the handshake with a refusal
    #[error("Connection refused: {0:?}")]
    Refused(ConnectReturnCode),

    /// Network or protocol error on the session
    #[error("Connection error: {0}")]
    Connection(String),

    /// Publish could not be queued
    #[error("Publish failed: {0}")]
    Publish(String),
}

/// Broker configuration
#[derive(Debug, Clone)]
pub struct MqttConfig {
    pub host: String,
    pub port: u16,
    /// Publish readings retained
    pub retain: bool,
    pub handshake_timeout: Duration,
    pub poll_timeout: Duration,
    pub max_events_per_service: usize,
    /// Capacity of the request channel between client and event loop
    pub channel_capacity: usize,
}

impl MqttConfig {
    /// Create new configuration for `host:port`
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            retain: true,
            handshake_timeout: Duration::from_secs(5),
            poll_timeout: Duration::from_millis(10),
            max_events_per_service: 32,
            channel_capacity: 10,
        }
    }

    /// Broker from the build-time constants, retain flag from the node
    pub fn from_node(node: &NodeConfig) -> Self {
        Self::new(MQTT_BROKER_HOST, MQTT_BROKER_PORT).retain(node.retain)
    }

    pub fn retain(mut self, retain: bool) -> Self {
        self.retain = retain;
        self
    }

    /// Set the handshake timeout in milliseconds
    pub fn handshake_timeout_ms(mut self, ms: u64) -> Self {
        self.handshake_timeout = Duration::from_millis(ms);
        self
    }

    /// Set the per-event wait while servicing, in milliseconds
    pub fn poll_timeout_ms(mut self, ms: u64) -> Self {
        self.poll_timeout = Duration::from_millis(ms);
        self
    }

    fn validate(&self) -> Result<(), MqttError> {
        if self.host.is_empty() {
            return Err(MqttError::Config("broker host must not be empty"));
        }
        if self.port == 0 {
            return Err(MqttError::Config("broker port must not be zero"));
        }
        if self.max_events_per_service == 0 {
            return Err(MqttError::Config("must handle at least one event per service"));
        }
        Ok(())
    }

    fn options(&self, credentials: &SessionCredentials) -> MqttOptions {
        let mut options = MqttOptions::new(credentials.client_id.as_str(), &self.host, self.port);
        options.set_keep_alive(Duration::from_secs(u64::from(credentials.keep_alive_secs)));
        options.set_clean_session(true);
        if !credentials.username.is_empty() {
            options.set_credentials(credentials.username, credentials.password);
        }
        options
    }
}

/// Publish session over a blocking MQTT client
pub struct MqttSession {
    config: MqttConfig,
    session: Option<(Client, Connection)>,
}

impl MqttSession {
    pub fn new(config: MqttConfig) -> Result<Self, MqttError> {
        config.validate()?;
        Ok(Self { config, session: None })
    }

    pub fn config(&self) -> &MqttConfig {
        &self.config
    }

    pub fn is_open(&self) -> bool {
        self.session.is_some()
    }

    fn await_connack(connection: &mut Connection, timeout: Duration) -> Result<(), MqttError> {
        let deadline = Instant::now() + timeout;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(MqttError::HandshakeTimeout(timeout));
            }
            match connection.recv_timeout(remaining) {
                Ok(Ok(Event::Incoming(Packet::ConnAck(ack)))) => {
                    return match ack.code {
                        ConnectReturnCode::Success => Ok(()),
                        code => Err(MqttError::Refused(code)),
                    };
                }
                Ok(Ok(event)) => log::trace!("mqtt handshake: {:?}", event),
                Ok(Err(e)) => return Err(MqttError::Connection(e.to_string())),
                Err(RecvTimeoutError::Timeout) => return Err(MqttError::HandshakeTimeout(timeout)),
                Err(RecvTimeoutError::Disconnected) => {
                    return Err(MqttError::Connection("event loop stopped".into()))
                }
            }
        }
    }
}

impl Transport for MqttSession {
    type Error = MqttError;

    fn mode(&self) -> TransportMode {
        TransportMode::PublishSession
    }

    fn open_session(&mut self, credentials: &SessionCredentials) -> Result<(), Self::Error> {
        self.close();

        log::info!(
            "connecting to mqtt://{}:{} as {}",
            self.config.host,
            self.config.port,
            credentials.client_id
        );
        let (client, mut connection) =
            Client::new(self.config.options(credentials), self.config.channel_capacity);
        Self::await_connack(&mut connection, self.config.handshake_timeout)?;

        self.session = Some((client, connection));
        Ok(())
    }

    fn service(&mut self) -> Result<(), Self::Error> {
        let (_, connection) = self.session.as_mut().ok_or(MqttError::NotConnected)?;

        for _ in 0..self.config.max_events_per_service {
            match connection.recv_timeout(self.config.poll_timeout) {
                Ok(Ok(Event::Incoming(Packet::Disconnect))) => {
                    self.session = None;
                    return Err(MqttError::Connection("broker sent DISCONNECT".into()));
                }
                Ok(Ok(event)) => log::trace!("mqtt: {:?}", event),
                Ok(Err(e)) => {
                    self.session = None;
                    return Err(MqttError::Connection(e.to_string()));
                }
                Err(RecvTimeoutError::Timeout) => return Ok(()),
                Err(RecvTimeoutError::Disconnected) => {
                    self.session = None;
                    return Err(MqttError::Connection("event loop stopped".into()));
                }
            }
        }
        Ok(())
    }

    fn deliver(&mut self, target: &str, payload: &[u8]) -> Result<u16, Self::Error> {
        let (client, _) = self.session.as_mut().ok_or(MqttError::NotConnected)?;
        client
            .try_publish(target, QoS::AtMostOnce, self.config.retain, payload.to_vec())
            .map_err(|e| MqttError::Publish(e.to_string()))?;

        // Push the publish out now rather than on the next tick
        self.service()?;
        Ok(0)
    }

    fn close(&mut self) {
        if let Some((client, _)) = self.session.take() {
            if let Err(e) = client.try_disconnect() {
                log::debug!("mqtt disconnect: {}", e);
            }
        }
    }
}

impl Drop for MqttSession {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;

    fn credentials() -> SessionCredentials {
        NodeConfig::default().device_id("esp32_1").session_credentials().unwrap()
    }

    #[test]
    fn test_config_builder() {
        let config = MqttConfig::new("broker.local", 1884)
            .retain(false)
            .handshake_timeout_ms(2500)
            .poll_timeout_ms(5);

        assert_eq!(config.host, "broker.local");
        assert_eq!(config.port, 1884);
        assert!(!config.retain);
        assert_eq!(config.handshake_timeout, Duration::from_millis(2500));
        assert_eq!(config.poll_timeout, Duration::from_millis(5));
    }

    #[test]
    fn node_config_controls_retain() {
        let config = MqttConfig::from_node(&NodeConfig::default().retain(false));
        assert!(!config.retain);
        assert_eq!(config.port, MQTT_BROKER_PORT);
    }

    #[test]
    fn test_config_validation() {
        assert!(matches!(MqttSession::new(MqttConfig::new("", 1883)), Err(MqttError::Config(_))));
        assert!(matches!(
            MqttSession::new(MqttConfig::new("broker.local", 0)),
            Err(MqttError::Config(_))
        ));
        assert!(MqttSession::new(MqttConfig::new("broker.local", 1883)).is_ok());
    }

    #[test]
    fn options_carry_session_identity() {
        let config = MqttConfig::new("broker.local", 1883);
        let options = config.options(&credentials());
        assert_eq!(options.client_id(), "sensor-esp32_1");
        assert_eq!(options.keep_alive(), Duration::from_secs(60));
    }

    #[test]
    fn closed_session_cannot_publish_or_service() {
        let mut session = MqttSession::new(MqttConfig::new("broker.local", 1883)).unwrap();
        assert!(matches!(session.deliver("sensors/moisture/x", b"{}"), Err(MqttError::NotConnected)));
        assert!(matches!(session.service(), Err(MqttError::NotConnected)));
    }

    #[test]
    fn unreachable_broker_fails_handshake() {
        let port = TcpListener::bind("127.0.0.1:0").unwrap().local_addr().unwrap().port();
        let mut session = MqttSession::new(
            MqttConfig::new("127.0.0.1", port).handshake_timeout_ms(1000),
        )
        .unwrap();

        assert!(session.open_session(&credentials()).is_err());
        assert!(!session.is_open());
    }
}
