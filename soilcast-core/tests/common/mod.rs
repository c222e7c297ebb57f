//! Scripted collaborators for integration tests
//!
//! This module provides:
//! - A link whose availability follows outage windows on a simulated clock
//! - A publish-session broker and a request/response collector that record
//!   every delivery with its timestamp
//! - A probe that replays a fixed sequence of raw conversions
//!
//! Everything reads time from a shared [`SimClock`], so the scheduler's idle
//! delay is the only thing that moves time forward.

#![allow(dead_code)]

pub mod scenarios;

use core::ops::Range;

use soilcast_core::{
    config::{NetworkCredentials, SessionCredentials},
    time::{SimClock, TimeSource, Timestamp},
    traits::{AnalogInput, Link, Transport, TransportMode},
    LinkState, NodeConfig, Scheduler, TickOutcome,
};

fn within(windows: &[Range<Timestamp>], now: Timestamp) -> bool {
    windows.iter().any(|window| window.contains(&now))
}

/// Link that is unavailable during its outage windows
pub struct ScriptedLink<'a> {
    clock: &'a SimClock,
    outages: Vec<Range<Timestamp>>,
    up: bool,
    /// Time of every association attempt
    pub attempts: Vec<Timestamp>,
    pub disconnects: u32,
}

impl<'a> ScriptedLink<'a> {
    pub fn always_up(clock: &'a SimClock) -> Self {
        Self::with_outages(clock, Vec::new())
    }

    /// Link that only becomes available at `at`
    pub fn available_from(clock: &'a SimClock, at: Timestamp) -> Self {
        Self::with_outages(clock, vec![0..at])
    }

    pub fn with_outages(clock: &'a SimClock, outages: Vec<Range<Timestamp>>) -> Self {
        Self {
            clock,
            outages,
            up: false,
            attempts: Vec::new(),
            disconnects: 0,
        }
    }
}

impl Link for ScriptedLink<'_> {
    type Error = &'static str;

    fn connect(&mut self, _credentials: &NetworkCredentials) -> nb::Result<(), Self::Error> {
        let now = self.clock.now();
        self.attempts.push(now);
        if within(&self.outages, now) {
            return Err(nb::Error::Other("access point not found"));
        }
        self.up = true;
        Ok(())
    }

    fn is_up(&mut self) -> bool {
        if within(&self.outages, self.clock.now()) {
            self.up = false;
        }
        self.up
    }

    fn disconnect(&mut self) {
        self.disconnects += 1;
        self.up = false;
    }
}

/// One payload as the collector saw it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub at: Timestamp,
    pub target: String,
    pub body: String,
}

/// Publish-session broker
pub struct ScriptedBroker<'a> {
    clock: &'a SimClock,
    refusals_left: u32,
    service_outages: Vec<Range<Timestamp>>,
    open: bool,
    pub reject_publishes: bool,
    /// Time of every handshake attempt
    pub handshakes: Vec<Timestamp>,
    pub client_ids: Vec<String>,
    pub services: u32,
    pub deliveries: Vec<Delivery>,
}

impl<'a> ScriptedBroker<'a> {
    pub fn new(clock: &'a SimClock) -> Self {
        Self {
            clock,
            refusals_left: 0,
            service_outages: Vec::new(),
            open: false,
            reject_publishes: false,
            handshakes: Vec::new(),
            client_ids: Vec::new(),
            services: 0,
            deliveries: Vec::new(),
        }
    }

    /// Refuse the first `count` handshakes
    pub fn refusing(mut self, count: u32) -> Self {
        self.refusals_left = count;
        self
    }

    /// Fail keep-alive servicing during the given windows
    pub fn service_outages(mut self, outages: Vec<Range<Timestamp>>) -> Self {
        self.service_outages = outages;
        self
    }

    pub fn is_open(&self) -> bool {
        self.open
    }
}

impl Transport for ScriptedBroker<'_> {
    type Error = &'static str;

    fn mode(&self) -> TransportMode {
        TransportMode::PublishSession
    }

    fn open_session(&mut self, credentials: &SessionCredentials) -> Result<(), Self::Error> {
        self.handshakes.push(self.clock.now());
        self.client_ids.push(credentials.client_id.as_str().to_owned());
        if self.refusals_left > 0 {
            self.refusals_left -= 1;
            return Err("connection refused: not authorized");
        }
        self.open = true;
        Ok(())
    }

    fn service(&mut self) -> Result<(), Self::Error> {
        assert!(self.open, "serviced a closed session");
        self.services += 1;
        if within(&self.service_outages, self.clock.now()) {
            return Err("keep-alive timeout");
        }
        Ok(())
    }

    fn deliver(&mut self, target: &str, payload: &[u8]) -> Result<u16, Self::Error> {
        assert!(self.open, "published without a session");
        if self.reject_publishes {
            return Err("outgoing queue full");
        }
        self.deliveries.push(Delivery {
            at: self.clock.now(),
            target: target.to_owned(),
            body: String::from_utf8_lossy(payload).into_owned(),
        });
        Ok(0)
    }

    fn close(&mut self) {
        self.open = false;
    }
}

/// Request/response collector answering with scripted statuses
pub struct ScriptedCollector<'a> {
    clock: &'a SimClock,
    /// Status per request, cycled; `None` is a transport error
    statuses: Vec<Option<u16>>,
    pub requests: u32,
    pub deliveries: Vec<Delivery>,
}

impl<'a> ScriptedCollector<'a> {
    pub fn answering(clock: &'a SimClock, statuses: Vec<Option<u16>>) -> Self {
        Self {
            clock,
            statuses,
            requests: 0,
            deliveries: Vec::new(),
        }
    }

    pub fn ok(clock: &'a SimClock) -> Self {
        Self::answering(clock, vec![Some(200)])
    }
}

impl Transport for ScriptedCollector<'_> {
    type Error = &'static str;

    fn mode(&self) -> TransportMode {
        TransportMode::RequestResponse
    }

    fn deliver(&mut self, target: &str, payload: &[u8]) -> Result<u16, Self::Error> {
        let status = self.statuses[self.requests as usize % self.statuses.len()];
        self.requests += 1;
        let status = status.ok_or("connection refused")?;
        self.deliveries.push(Delivery {
            at: self.clock.now(),
            target: target.to_owned(),
            body: String::from_utf8_lossy(payload).into_owned(),
        });
        Ok(status)
    }
}

/// Probe replaying raw conversions, repeating the last one
pub struct ReplayProbe {
    values: Vec<u16>,
    reads: usize,
}

impl ReplayProbe {
    pub fn new(values: Vec<u16>) -> Self {
        Self { values, reads: 0 }
    }

    pub fn fixed(raw: u16) -> Self {
        Self::new(vec![raw])
    }
}

impl AnalogInput for ReplayProbe {
    fn read_raw(&mut self) -> u16 {
        let index = self.reads.min(self.values.len() - 1);
        self.reads += 1;
        self.values[index]
    }
}

/// Node wired to scripted collaborators and one simulated clock
pub type Node<'a, T> = Scheduler<ReplayProbe, ScriptedLink<'a>, T, &'a SimClock, &'a SimClock>;

pub fn node<'a, T: Transport>(
    clock: &'a SimClock,
    config: &NodeConfig,
    probe: ReplayProbe,
    link: ScriptedLink<'a>,
    transport: T,
) -> Node<'a, T> {
    Scheduler::new(config, probe, link, transport, clock, clock).expect("valid test configuration")
}

/// Tick until the simulated clock reaches `end`
pub fn run_until<T: Transport>(node: &mut Node<'_, T>, end: Timestamp) -> Vec<TickOutcome> {
    let mut outcomes = Vec::new();
    while node.clock().now() < end {
        outcomes.push(node.tick());
    }
    outcomes
}

/// Ticks at which a publish was attempted
pub fn attempt_times(outcomes: &[TickOutcome]) -> Vec<Timestamp> {
    outcomes
        .iter()
        .filter(|outcome| outcome.publish.attempted())
        .map(|outcome| outcome.at)
        .collect()
}

/// Distinct consecutive connection states, starting from `Disconnected`
pub fn state_path(outcomes: &[TickOutcome]) -> Vec<LinkState> {
    let mut path = vec![LinkState::Disconnected];
    for outcome in outcomes {
        if path.last() != Some(&outcome.link) {
            path.push(outcome.link);
        }
    }
    path
}
