//! Node configuration
//!
//! Everything the node needs is known at build time; [`NodeConfig::default`]
//! assembles it from [`constants`](crate::constants). The builder methods
//! exist for other boards, host demos and tests.
//!
//! ```rust
//! use soilcast_core::config::{Calibration, NodeConfig, ReportMode};
//! use soilcast_core::TransportMode;
//! use fugit::MillisDurationU64;
//!
//! let config = NodeConfig::default()
//!     .device_id("greenhouse_3")
//!     .report_mode(ReportMode::Percent(Calibration::new(3100, 1300)))
//!     .publish_interval(MillisDurationU64::secs(30));
//!
//! config.validate(TransportMode::PublishSession)?;
//! # Ok::<(), soilcast_core::errors::ConfigError>(())
//! ```

use core::fmt::Write;

use fugit::MillisDurationU64;
use heapless::String;

use crate::constants::{adc, buffers, network, time};
use crate::errors::ConfigError;
use crate::traits::TransportMode;

/// Characters a device id cannot carry into a destination topic: the
/// wildcards and the level separator
pub const TOPIC_RESERVED_CHARS: [char; 3] = ['+', '#', '/'];

/// Wireless network credentials handed to the [`Link`](crate::traits::Link)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetworkCredentials {
    /// Network name
    pub ssid: &'static str,
    /// Passphrase; empty for open networks
    pub password: &'static str,
}

/// Credentials presented in the session handshake
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionCredentials {
    /// Client identifier, `sensor-<device_id>` by default
    pub client_id: String<{ buffers::CLIENT_ID_CAPACITY }>,
    /// User name; empty disables authentication
    pub username: &'static str,
    /// Password sent along with `username`
    pub password: &'static str,
    /// Keep-alive window negotiated with the broker
    pub keep_alive_secs: u16,
}

/// Calibration pair for percent mode
///
/// `dry_raw` maps to 0% and `wet_raw` to 100%. Either may be the larger one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Calibration {
    /// Raw count of the probe in dry soil
    pub dry_raw: u16,
    /// Raw count of the probe in saturated soil
    pub wet_raw: u16,
}

impl Calibration {
    /// Calibration from its dry and wet raw counts
    pub const fn new(dry_raw: u16, wet_raw: u16) -> Self {
        Self { dry_raw, wet_raw }
    }
}

impl Default for Calibration {
    fn default() -> Self {
        Self::new(adc::CALIBRATION_DRY_RAW, adc::CALIBRATION_WET_RAW)
    }
}

/// How a raw conversion is reported
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportMode {
    /// Raw ADC counts, clamped to the ADC range
    Raw,
    /// Linear rescale to 0-100%
    Percent(Calibration),
}

/// Complete configuration of one node
#[derive(Debug, Clone)]
pub struct NodeConfig {
    /// Identity reported with each reading
    pub device_id: &'static str,
    /// Credentials handed to the link
    pub network: NetworkCredentials,
    /// Request/response collector endpoint
    pub http_endpoint: &'static str,
    /// Declared type of request bodies
    pub content_type: &'static str,
    /// Broker user name; empty disables authentication
    pub mqtt_username: &'static str,
    /// Broker password
    pub mqtt_password: &'static str,
    /// Keep-alive window requested in the session handshake
    pub keep_alive_secs: u16,
    /// Set the retain flag on session publishes
    pub retain: bool,
    /// GPIO the probe is wired to.
    ///
    /// Board bring-up information: the loop only ever sees an
    /// [`AnalogInput`](crate::traits::AnalogInput), so whoever constructs
    /// that input reads this field to pick the pin.
    pub adc_channel: u8,
    /// Width of an ADC conversion
    pub adc_resolution_bits: u8,
    /// Raw counts or calibrated percent
    pub report_mode: ReportMode,
    /// Minimum time between publish attempts
    pub publish_interval: MillisDurationU64,
    /// Pause at the end of every tick
    pub idle_delay: MillisDurationU64,
    /// Wait before re-trying the link
    pub link_retry_delay: MillisDurationU64,
    /// Wait before re-trying a failed handshake
    pub session_retry_delay: MillisDurationU64,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            device_id: network::DEVICE_ID,
            network: NetworkCredentials {
                ssid: network::WIFI_SSID,
                password: network::WIFI_PASSWORD,
            },
            http_endpoint: network::HTTP_ENDPOINT,
            content_type: network::HTTP_CONTENT_TYPE,
            mqtt_username: network::MQTT_USERNAME,
            mqtt_password: network::MQTT_PASSWORD,
            keep_alive_secs: network::MQTT_KEEP_ALIVE_SECS,
            retain: network::RETAIN_READINGS,
            adc_channel: adc::MOISTURE_ADC_CHANNEL,
            adc_resolution_bits: adc::ADC_RESOLUTION_BITS,
            report_mode: ReportMode::Raw,
            publish_interval: MillisDurationU64::millis(time::PUBLISH_INTERVAL_MS),
            idle_delay: MillisDurationU64::millis(time::IDLE_DELAY_MS),
            link_retry_delay: MillisDurationU64::millis(time::LINK_RETRY_DELAY_MS),
            session_retry_delay: MillisDurationU64::millis(time::SESSION_RETRY_DELAY_MS),
        }
    }
}

impl NodeConfig {
    /// Set the device identity
    pub fn device_id(mut self, device_id: &'static str) -> Self {
        self.device_id = device_id;
        self
    }

    /// Set the wireless credentials
    pub fn network(mut self, ssid: &'static str, password: &'static str) -> Self {
        self.network = NetworkCredentials { ssid, password };
        self
    }

    /// Set the request/response endpoint URL
    pub fn http_endpoint(mut self, url: &'static str) -> Self {
        self.http_endpoint = url;
        self
    }

    /// Set broker authentication
    pub fn mqtt_auth(mut self, username: &'static str, password: &'static str) -> Self {
        self.mqtt_username = username;
        self.mqtt_password = password;
        self
    }

    /// Set the retain flag on session publishes
    pub fn retain(mut self, retain: bool) -> Self {
        self.retain = retain;
        self
    }

    /// Report raw counts or calibrated percent
    pub fn report_mode(mut self, mode: ReportMode) -> Self {
        self.report_mode = mode;
        self
    }

    /// Set the GPIO the probe is wired to
    pub fn adc_channel(mut self, channel: u8) -> Self {
        self.adc_channel = channel;
        self
    }

    /// Set the ADC conversion width
    pub fn adc_resolution_bits(mut self, bits: u8) -> Self {
        self.adc_resolution_bits = bits;
        self
    }

    /// Set the minimum time between publish attempts
    pub fn publish_interval(mut self, interval: MillisDurationU64) -> Self {
        self.publish_interval = interval;
        self
    }

    /// Set the pause at the end of every tick
    pub fn idle_delay(mut self, delay: MillisDurationU64) -> Self {
        self.idle_delay = delay;
        self
    }

    /// Set the fixed link and session retry delays
    pub fn retry_delays(mut self, link: MillisDurationU64, session: MillisDurationU64) -> Self {
        self.link_retry_delay = link;
        self.session_retry_delay = session;
        self
    }

    /// Highest count the configured ADC can report
    pub fn max_adc_value(&self) -> u16 {
        adc::max_adc_value(self.adc_resolution_bits)
    }

    /// Session credentials derived from the device identity
    pub fn session_credentials(&self) -> Result<SessionCredentials, ConfigError> {
        Ok(SessionCredentials {
            client_id: prefixed(network::CLIENT_ID_PREFIX, self.device_id, "client id")?,
            username: self.mqtt_username,
            password: self.mqtt_password,
            keep_alive_secs: self.keep_alive_secs,
        })
    }

    /// Destination topic derived from the device identity
    pub fn destination_topic(&self) -> Result<String<{ buffers::TOPIC_CAPACITY }>, ConfigError> {
        prefixed(network::TOPIC_PREFIX, self.device_id, "destination topic")
    }

    /// Reject configurations the loop cannot run with over `mode`
    ///
    /// The topic and client id only exist for publish sessions, so their
    /// capacity and character limits are not applied to request/response
    /// nodes. Their identity travels in the payload, which reports its own
    /// overflow.
    pub fn validate(&self, mode: TransportMode) -> Result<(), ConfigError> {
        if self.device_id.is_empty() {
            return Err(ConfigError::EmptyDeviceId);
        }
        if self.publish_interval.to_millis() == 0 {
            return Err(ConfigError::ZeroInterval);
        }
        if let ReportMode::Percent(calibration) = self.report_mode {
            if calibration.dry_raw == calibration.wet_raw {
                return Err(ConfigError::DegenerateCalibration { raw: calibration.dry_raw });
            }
            let max = self.max_adc_value();
            for raw in [calibration.dry_raw, calibration.wet_raw] {
                if raw > max {
                    return Err(ConfigError::CalibrationOutOfRange { raw, max });
                }
            }
        }
        if mode.has_session() {
            let reserved = self.device_id.chars().find(|c| TOPIC_RESERVED_CHARS.contains(c));
            if let Some(character) = reserved {
                return Err(ConfigError::ReservedTopicCharacter { character });
            }
            self.destination_topic()?;
            self.session_credentials()?;
        }
        Ok(())
    }
}

fn prefixed<const N: usize>(
    prefix: &str,
    device_id: &str,
    what: &'static str,
) -> Result<String<N>, ConfigError> {
    let mut out = String::new();
    write!(out, "{}{}", prefix, device_id).map_err(|_| ConfigError::IdentifierTooLong {
        what,
        required: prefix.len() + device_id.len(),
        capacity: N,
    })?;
    Ok(out)
}
