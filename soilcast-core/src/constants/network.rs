//! Network, Collector and Session Constants
//!
//! Values are fixed at build time. String constants can be overridden by
//! exporting the matching `SOILCAST_*` environment variable when compiling,
//! which keeps credentials out of the source tree.

macro_rules! build_env_or {
    ($name:literal, $default:expr) => {
        match option_env!($name) {
            Some(value) => value,
            None => $default,
        }
    };
}

// ===== DEVICE IDENTITY =====

/// Device identity reported with every reading.
pub const DEVICE_ID: &str = build_env_or!("SOILCAST_DEVICE_ID", "esp32_1");

// ===== WIRELESS LINK =====

/// Wireless network name.
pub const WIFI_SSID: &str = build_env_or!("SOILCAST_WIFI_SSID", "soilcast");

/// Wireless network passphrase.
pub const WIFI_PASSWORD: &str = build_env_or!("SOILCAST_WIFI_PASSWORD", "");

// ===== REQUEST/RESPONSE COLLECTOR =====

/// Collector endpoint accepting one JSON reading per POST.
pub const HTTP_ENDPOINT: &str =
    build_env_or!("SOILCAST_HTTP_ENDPOINT", "http://192.168.0.102:3000/moisture");

/// Content type declared on request/response deliveries.
pub const HTTP_CONTENT_TYPE: &str = "application/json";

// ===== PUBLISH/SUBSCRIBE BROKER =====

/// Broker host name or address.
pub const MQTT_BROKER_HOST: &str = build_env_or!("SOILCAST_MQTT_HOST", "192.168.0.102");

/// Broker TCP port (plain MQTT).
pub const MQTT_BROKER_PORT: u16 = 1883;

/// Broker user name. Empty disables authentication.
pub const MQTT_USERNAME: &str = build_env_or!("SOILCAST_MQTT_USERNAME", "");

/// Broker password.
pub const MQTT_PASSWORD: &str = build_env_or!("SOILCAST_MQTT_PASSWORD", "");

/// Keep-alive negotiated with the broker (seconds).
///
/// The session must be serviced well within this window or the broker drops it.
pub const MQTT_KEEP_ALIVE_SECS: u16 = 60;

/// Prefix of the per-device destination topic.
pub const TOPIC_PREFIX: &str = "sensors/moisture/";

/// Prefix of the session client identifier.
pub const CLIENT_ID_PREFIX: &str = "sensor-";

/// Publish readings with the retain flag so late subscribers see the last value.
pub const RETAIN_READINGS: bool = true;
