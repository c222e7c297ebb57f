//! TCP reachability link for host runs
//!
//! There is no radio on a PC, so "associating" means opening a TCP
//! connection to a probe address within a timeout. Once up, the link is
//! re-probed every `recheck` so a collector that goes away shows up as a
//! lost link and the supervisor starts over from `Disconnected`.

use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::time::{Duration, Instant};

use soilcast_core::config::NetworkCredentials;
use soilcast_core::Link;
use thiserror::Error;

/// Link errors
#[derive(Debug, Error)]
pub enum LinkError {
    /// Probe address could not be resolved
    #[error("Cannot resolve probe address {0}")]
    Resolve(String),

    /// Probe address did not accept a connection in time
    #[error("Probe {addr} unreachable: {reason}")]
    Unreachable { addr: SocketAddr, reason: String },
}

/// Link that is up while a TCP endpoint accepts connections
pub struct HostLink {
    probe: SocketAddr,
    timeout: Duration,
    recheck: Duration,
    up: bool,
    last_probe: Option<Instant>,
}

impl HostLink {
    /// Probe `addr` (`host:port`) with a 2 s timeout, re-checking every 10 s
    pub fn new(addr: &str) -> Result<Self, LinkError> {
        let probe = addr
            .to_socket_addrs()
            .map_err(|e| LinkError::Resolve(format!("{}: {}", addr, e)))?
            .next()
            .ok_or_else(|| LinkError::Resolve(addr.to_owned()))?;

        Ok(Self {
            probe,
            timeout: Duration::from_secs(2),
            recheck: Duration::from_secs(10),
            up: false,
            last_probe: None,
        })
    }

    /// Set the probe connect timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set how often a live link is re-probed
    pub fn recheck_every(mut self, interval: Duration) -> Self {
        self.recheck = interval;
        self
    }

    pub fn probe_addr(&self) -> SocketAddr {
        self.probe
    }

    fn probe(&mut self) -> Result<(), LinkError> {
        self.last_probe = Some(Instant::now());
        TcpStream::connect_timeout(&self.probe, self.timeout)
            .map(drop)
            .map_err(|e| LinkError::Unreachable {
                addr: self.probe,
                reason: e.to_string(),
            })
    }
}

impl Link for HostLink {
    type Error = LinkError;

    fn connect(&mut self, credentials: &NetworkCredentials) -> nb::Result<(), Self::Error> {
        log::debug!("joining {} via probe {}", credentials.ssid, self.probe);
        self.probe().map_err(nb::Error::Other)?;
        self.up = true;
        log::info!("link up, probe {} reachable", self.probe);
        Ok(())
    }

    fn is_up(&mut self) -> bool {
        let due = self
            .last_probe
            .map_or(true, |at| at.elapsed() >= self.recheck);
        if self.up && due {
            if let Err(e) = self.probe() {
                log::warn!("{}", e);
                self.up = false;
            }
        }
        self.up
    }

    fn disconnect(&mut self) {
        self.up = false;
    }
}
