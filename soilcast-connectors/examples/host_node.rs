//! Bench run of a SoilCast node on a PC
//!
//! Runs the real publish loop against a real collector, with a simulated
//! probe standing in for the ADC.
//!
//! ```text
//! cargo run -p soilcast-connectors --features http --example host_node -- mqtt
//! cargo run -p soilcast-connectors --features http --example host_node -- http
//! ```
//!
//! The probe address the link checks is the broker (`mqtt`) or the HTTP
//! endpoint's host (`http`). Set `RUST_LOG=debug` for connection details.

use std::error::Error;

use soilcast_connectors::{HostLink, HttpConfig, HttpTransport, MqttConfig, MqttSession};
use soilcast_core::constants::network::{MQTT_BROKER_HOST, MQTT_BROKER_PORT};
use soilcast_core::time::{MonotonicTime, StdDelay};
use soilcast_core::{AnalogInput, NodeConfig, Scheduler};

/// Probe that slowly dries out, then gets watered
struct DryingProbe {
    raw: u16,
}

impl AnalogInput for DryingProbe {
    fn read_raw(&mut self) -> u16 {
        self.raw = if self.raw >= 3900 { 1400 } else { self.raw + 35 };
        self.raw
    }
}

/// `host:port` of an `http://host[:port]/path` URL
fn authority(url: &str) -> String {
    let rest = url.split_once("://").map_or(url, |(_, rest)| rest);
    let host = rest.split('/').next().unwrap_or(rest);
    if host.contains(':') {
        host.to_owned()
    } else {
        format!("{}:80", host)
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = NodeConfig::default();
    // On the board this GPIO feeds the ADC; here the readings are simulated
    log::info!("simulating ADC input on GPIO {}", config.adc_channel);
    let probe = DryingProbe { raw: 1400 };

    match std::env::args().nth(1).as_deref() {
        Some("http") => {
            let link = HostLink::new(&authority(config.http_endpoint))?;
            let transport = HttpTransport::new(HttpConfig::from_node(&config))?;
            Scheduler::new(&config, probe, link, transport, MonotonicTime::new(), StdDelay)?.run()
        }
        Some("mqtt") | None => {
            let link = HostLink::new(&format!("{}:{}", MQTT_BROKER_HOST, MQTT_BROKER_PORT))?;
            let transport = MqttSession::new(MqttConfig::from_node(&config))?;
            Scheduler::new(&config, probe, link, transport, MonotonicTime::new(), StdDelay)?.run()
        }
        Some(other) => Err(format!("unknown transport {:?}, expected mqtt or http", other).into()),
    }
}
