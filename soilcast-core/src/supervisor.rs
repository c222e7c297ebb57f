//! Connection Supervisor
//!
//! Owns the network link and the transport session and keeps them alive
//! across an unreliable wireless link.
//!
//! ## State Machine
//!
//! ```text
//!                 link ok                 handshake ok
//!  Disconnected ──────────▶ LinkUp ───────────────────▶ SessionUp
//!   ▲   │  ▲                 │  ▲                           │
//!   │   └──┘ link failure    │  └───────────────────────────┘
//!   │        (retry after    │     service failure / handshake
//!   │         link delay)    │     failure (retry after session delay)
//!   └────────────────────────┴───────── link lost ──────────┘
//! ```
//!
//! - `Disconnected → SessionUp` never happens directly; the session is only
//!   ever opened from `LinkUp`.
//! - Request/response transports have no session: `LinkUp` is their ready
//!   state.
//! - Retries are unbounded and use fixed delays.
//!
//! ## Tick Model
//!
//! [`ensure_connected`](ConnectionSupervisor::ensure_connected) is called
//! once per scheduler tick and never blocks: it performs at most one step of
//! the machine (one link attempt, one handshake, or one keep-alive service).
//! Retry delays are deadlines compared against the tick timestamp, so the
//! waiting happens in the scheduler's idle delay rather than in a nested
//! sleep loop.

use crate::config::{NetworkCredentials, NodeConfig, SessionCredentials};
use crate::errors::{ConfigError, TelemetryError, TelemetryResult};
use crate::session::{ConnectionStats, TransportSession};
use crate::time::Timestamp;
use crate::traits::{Link, Transport, TransportMode};

/// Connection lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    /// No network link
    Disconnected,
    /// Link up, no session (ready for request/response)
    LinkUp,
    /// Publish session established (ready for publish-session)
    SessionUp,
}

#[cfg(feature = "defmt")]
impl defmt::Format for LinkState {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Self::Disconnected => defmt::write!(fmt, "Disconnected"),
            Self::LinkUp => defmt::write!(fmt, "LinkUp"),
            Self::SessionUp => defmt::write!(fmt, "SessionUp"),
        }
    }
}

/// Owns the link and session lifecycle
pub struct ConnectionSupervisor<L: Link, T: Transport> {
    link: L,
    session: TransportSession<T>,
    network: NetworkCredentials,
    /// Handshake credentials; `None` for transports without a session
    credentials: Option<SessionCredentials>,
    state: LinkState,
    link_retry_delay_ms: u64,
    session_retry_delay_ms: u64,
    /// Earliest time of the next link attempt; `None` means now
    next_link_attempt: Option<Timestamp>,
    next_session_attempt: Option<Timestamp>,
    /// Consecutive failures, reset on success
    link_failures: u32,
    session_failures: u32,
    ever_ready: bool,
}

impl<L: Link, T: Transport> ConnectionSupervisor<L, T> {
    /// Supervise `link` and `transport`, starting `Disconnected`
    pub fn new(link: L, transport: T, config: &NodeConfig) -> Result<Self, ConfigError> {
        let credentials = if transport.mode().has_session() {
            Some(config.session_credentials()?)
        } else {
            None
        };
        Ok(Self {
            link,
            session: TransportSession::new(transport, config)?,
            network: config.network,
            credentials,
            state: LinkState::Disconnected,
            link_retry_delay_ms: config.link_retry_delay.to_millis(),
            session_retry_delay_ms: config.session_retry_delay.to_millis(),
            next_link_attempt: None,
            next_session_attempt: None,
            link_failures: 0,
            session_failures: 0,
            ever_ready: false,
        })
    }

    /// Current lifecycle state
    pub fn state(&self) -> LinkState {
        self.state
    }

    /// Shape of the supervised transport
    pub fn mode(&self) -> TransportMode {
        self.session.mode()
    }

    /// Counters kept since the node started
    pub fn stats(&self) -> &ConnectionStats {
        self.session.stats()
    }

    /// The transport session, whatever the state
    pub fn session(&self) -> &TransportSession<T> {
        &self.session
    }

    /// The supervised link
    pub fn link(&self) -> &L {
        &self.link
    }

    /// The supervised link, mutably
    pub fn link_mut(&mut self) -> &mut L {
        &mut self.link
    }

    /// Whether a payload can be published right now
    pub fn is_ready(&self) -> bool {
        match self.mode() {
            TransportMode::RequestResponse => self.state == LinkState::LinkUp,
            TransportMode::PublishSession => self.state == LinkState::SessionUp,
        }
    }

    /// The transport session, only when ready to publish
    pub fn session_mut(&mut self) -> Option<&mut TransportSession<T>> {
        if self.is_ready() {
            Some(&mut self.session)
        } else {
            None
        }
    }

    /// Advance the connection by one step
    ///
    /// Returns the state after the step, or the failure of the attempt made
    /// during this call. A failed attempt is retried after its fixed delay.
    pub fn ensure_connected(&mut self, now: Timestamp) -> TelemetryResult<LinkState> {
        if self.state != LinkState::Disconnected && !self.link.is_up() {
            log_warn!("link lost");
            if self.state == LinkState::SessionUp {
                self.session.close();
            }
            self.transition(LinkState::Disconnected);
            self.next_link_attempt = None;
        }

        match self.state {
            LinkState::Disconnected => self.attempt_link(now),
            LinkState::LinkUp if self.mode().has_session() => self.attempt_session(now),
            LinkState::LinkUp => Ok(self.state),
            LinkState::SessionUp => {
                self.service_session();
                Ok(self.state)
            }
        }
    }

    fn attempt_link(&mut self, now: Timestamp) -> TelemetryResult<LinkState> {
        if self.next_link_attempt.is_some_and(|at| now < at) {
            return Ok(self.state);
        }

        self.session.stats_mut().link_attempts += 1;
        match self.link.connect(&self.network) {
            Ok(()) => {
                self.link_failures = 0;
                self.next_link_attempt = None;
                self.next_session_attempt = None;
                self.transition(LinkState::LinkUp);
                if !self.mode().has_session() {
                    self.mark_ready();
                }
                Ok(self.state)
            }
            Err(nb::Error::WouldBlock) => {
                log_debug!("link association in progress");
                self.next_link_attempt = Some(now.saturating_add(self.link_retry_delay_ms));
                Ok(self.state)
            }
            Err(nb::Error::Other(e)) => {
                self.link_failures += 1;
                log_warn!("link attempt {} failed: {}", self.link_failures, e);
                self.link.disconnect();
                self.next_link_attempt = Some(now.saturating_add(self.link_retry_delay_ms));
                let error = TelemetryError::LinkFailure { attempt: self.link_failures };
                self.session.stats_mut().record_error(error);
                Err(error)
            }
        }
    }

    fn attempt_session(&mut self, now: Timestamp) -> TelemetryResult<LinkState> {
        if self.next_session_attempt.is_some_and(|at| now < at) {
            return Ok(self.state);
        }

        let Some(credentials) = self.credentials.as_ref() else {
            return Ok(self.state);
        };

        self.session.stats_mut().session_attempts += 1;
        match self.session.open(credentials) {
            Ok(()) => {
                self.session_failures = 0;
                self.next_session_attempt = None;
                self.transition(LinkState::SessionUp);
                self.mark_ready();
                Ok(self.state)
            }
            Err(e) => {
                self.session_failures += 1;
                log_warn!(
                    "session handshake {} failed: {}, retrying in {} ms",
                    self.session_failures,
                    e,
                    self.session_retry_delay_ms
                );
                self.next_session_attempt = Some(now.saturating_add(self.session_retry_delay_ms));
                let error = TelemetryError::SessionHandshakeFailure { attempt: self.session_failures };
                self.session.stats_mut().record_error(error);
                Err(error)
            }
        }
    }

    fn service_session(&mut self) {
        if let Err(e) = self.session.service() {
            log_warn!("session lost: {}", e);
            self.session.close();
            self.next_session_attempt = None;
            self.transition(LinkState::LinkUp);
        }
    }

    fn mark_ready(&mut self) {
        if self.ever_ready {
            self.session.stats_mut().reconnections += 1;
        }
        self.ever_ready = true;
    }

    fn transition(&mut self, next: LinkState) {
        debug_assert!(
            !(self.state == LinkState::Disconnected && next == LinkState::SessionUp),
            "session opened without a link"
        );
        log_info!("connection: {:?} -> {:?}", self.state, next);
        self.state = next;
    }
}
