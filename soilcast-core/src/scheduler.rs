//! Publish Scheduler
//!
//! A single cooperative loop. Each tick:
//!
//! 1. advances the [`ConnectionSupervisor`] (link attempts, handshakes,
//!    keep-alive servicing of a live session);
//! 2. if a publish is due and the connection is ready, samples, encodes and
//!    publishes exactly one reading;
//! 3. yields for the idle delay.
//!
//! ## Cadence
//!
//! A publish is due when none has happened yet, or when at least one
//! interval has elapsed since the last attempt. The timestamp moves on every
//! *attempt*, whether it was delivered, rejected by the collector or dropped
//! by the encoder, so failures never shift the cadence. When a publish is due
//! but the connection is not ready the reading is deferred: nothing is
//! sampled and the first ready tick publishes.
//!
//! With idle delay `d`, over `T` ticks spanning `k` intervals the loop makes
//! `k ± 1` publish attempts; jitter is bounded by `d`.

use crate::config::NodeConfig;
use crate::errors::{ConfigError, TelemetryError};
use crate::payload::PayloadEncoder;
use crate::sampler::Sampler;
use crate::session::ConnectionStats;
use crate::supervisor::{ConnectionSupervisor, LinkState};
use crate::time::{elapsed_ms, Timestamp};
use crate::traits::{AnalogInput, Delay, Link, TimeSource, Transport};

/// When the last publish was attempted, and how often to attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleState {
    last_publish: Option<Timestamp>,
    interval_ms: u64,
}

impl ScheduleState {
    /// Nothing published yet; attempts every `interval_ms`
    pub fn new(interval_ms: u64) -> Self {
        Self {
            last_publish: None,
            interval_ms,
        }
    }

    /// Time of the last publish attempt
    pub fn last_publish(&self) -> Option<Timestamp> {
        self.last_publish
    }

    /// Minimum time between attempts
    pub fn interval_ms(&self) -> u64 {
        self.interval_ms
    }

    /// Whether a publish attempt is due at `now`
    pub fn is_due(&self, now: Timestamp) -> bool {
        self.last_publish
            .map_or(true, |last| elapsed_ms(last, now) >= self.interval_ms)
    }

    fn record_attempt(&mut self, now: Timestamp) {
        self.last_publish = Some(now);
    }
}

/// What the publish step of a tick did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishOutcome {
    /// Interval has not elapsed
    NotDue,
    /// Due, but the connection is not ready
    Deferred,
    /// Handed off; carries the collector's status code
    Delivered(u16),
    /// Attempted and lost (encoding or delivery failure)
    Dropped(TelemetryError),
}

impl PublishOutcome {
    /// Whether a publish was attempted this tick
    pub fn attempted(&self) -> bool {
        matches!(self, Self::Delivered(_) | Self::Dropped(_))
    }
}

/// Result of one tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickOutcome {
    /// Clock reading at the start of the tick
    pub at: Timestamp,
    /// Connection state after the supervisor step
    pub link: LinkState,
    /// What the publish step did
    pub publish: PublishOutcome,
}

/// Owns every collaborator of the node and runs the loop
pub struct Scheduler<A, L, T, C, D>
where
    A: AnalogInput,
    L: Link,
    T: Transport,
    C: TimeSource,
    D: Delay,
{
    sampler: Sampler<A>,
    encoder: PayloadEncoder,
    supervisor: ConnectionSupervisor<L, T>,
    clock: C,
    delay: D,
    schedule: ScheduleState,
    idle_delay_ms: u64,
    deferring: bool,
}

impl<A, L, T, C, D> Scheduler<A, L, T, C, D>
where
    A: AnalogInput,
    L: Link,
    T: Transport,
    C: TimeSource,
    D: Delay,
{
    /// Validate `config` and wire the collaborators together
    pub fn new(
        config: &NodeConfig,
        input: A,
        link: L,
        transport: T,
        clock: C,
        delay: D,
    ) -> Result<Self, ConfigError> {
        config.validate(transport.mode())?;

        let encoder = PayloadEncoder::for_mode(transport.mode());
        Ok(Self {
            sampler: Sampler::from_config(input, config),
            encoder,
            supervisor: ConnectionSupervisor::new(link, transport, config)?,
            clock,
            delay,
            schedule: ScheduleState::new(config.publish_interval.to_millis()),
            idle_delay_ms: config.idle_delay.to_millis(),
            deferring: false,
        })
    }

    /// Replace the payload encoder, e.g. to enforce a tighter payload budget
    pub fn with_encoder(mut self, encoder: PayloadEncoder) -> Self {
        self.encoder = encoder;
        self
    }

    /// Publish cadence state
    pub fn schedule(&self) -> &ScheduleState {
        &self.schedule
    }

    /// Connection supervisor
    pub fn supervisor(&self) -> &ConnectionSupervisor<L, T> {
        &self.supervisor
    }

    /// Connection supervisor, mutably
    pub fn supervisor_mut(&mut self) -> &mut ConnectionSupervisor<L, T> {
        &mut self.supervisor
    }

    /// Counters kept since the node started
    pub fn stats(&self) -> &ConnectionStats {
        self.supervisor.stats()
    }

    /// Time source driving the loop
    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Run one iteration of the loop
    pub fn tick(&mut self) -> TickOutcome {
        let now = self.clock.now();

        // Failures are logged and counted by the supervisor
        let link = self
            .supervisor
            .ensure_connected(now)
            .unwrap_or_else(|_| self.supervisor.state());
        let publish = self.publish_if_due(now);

        self.delay.delay_ms(self.idle_delay_ms);

        TickOutcome { at: now, link, publish }
    }

    /// Run forever
    pub fn run(&mut self) -> ! {
        log_info!(
            "publishing every {} ms over {:?}",
            self.schedule.interval_ms(),
            self.supervisor.mode()
        );
        loop {
            self.tick();
        }
    }

    fn publish_if_due(&mut self, now: Timestamp) -> PublishOutcome {
        if !self.schedule.is_due(now) {
            return PublishOutcome::NotDue;
        }

        let Some(session) = self.supervisor.session_mut() else {
            if !self.deferring {
                log_warn!("link not ready, deferring reading");
                self.deferring = true;
            }
            return PublishOutcome::Deferred;
        };
        self.deferring = false;

        let reading = self.sampler.read();
        let outcome = match self.encoder.encode(&reading) {
            Ok(payload) => match session.publish(&payload) {
                Ok(code) => PublishOutcome::Delivered(code),
                Err(e) => PublishOutcome::Dropped(e),
            },
            Err(e) => {
                log_error!("reading dropped: {}", e);
                session.stats_mut().record_error(e);
                PublishOutcome::Dropped(e)
            }
        };

        self.schedule.record_attempt(now);
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{NetworkCredentials, ReportMode};
    use crate::payload::IdentityPlacement;
    use crate::time::SimClock;
    use crate::traits::TransportMode;
    use fugit::MillisDurationU64;

    struct Wired;

    impl Link for Wired {
        type Error = &'static str;

        fn connect(&mut self, _credentials: &NetworkCredentials) -> nb::Result<(), Self::Error> {
            Ok(())
        }

        fn is_up(&mut self) -> bool {
            true
        }

        fn disconnect(&mut self) {}
    }

    #[derive(Default)]
    struct Endpoint {
        deliveries: u32,
        reject: bool,
    }

    impl Transport for Endpoint {
        type Error = &'static str;

        fn mode(&self) -> TransportMode {
            TransportMode::RequestResponse
        }

        fn deliver(&mut self, _target: &str, _payload: &[u8]) -> Result<u16, Self::Error> {
            self.deliveries += 1;
            if self.reject {
                Err("connection reset")
            } else {
                Ok(200)
            }
        }
    }

    fn config() -> NodeConfig {
        NodeConfig::default()
            .report_mode(ReportMode::Raw)
            .publish_interval(MillisDurationU64::millis(1000))
            .idle_delay(MillisDurationU64::millis(100))
    }

    fn scheduler(
        clock: &SimClock,
        endpoint: Endpoint,
    ) -> Scheduler<fn() -> u16, Wired, Endpoint, &SimClock, &SimClock> {
        let input: fn() -> u16 = || 1800;
        Scheduler::new(&config(), input, Wired, endpoint, clock, clock).unwrap()
    }

    #[test]
    fn schedule_is_due_immediately_then_every_interval() {
        let mut schedule = ScheduleState::new(1000);
        assert!(schedule.is_due(0));
        schedule.record_attempt(0);
        assert!(!schedule.is_due(999));
        assert!(schedule.is_due(1000));
    }

    #[test]
    fn first_ready_tick_publishes() {
        let clock = SimClock::new(0);
        let mut node = scheduler(&clock, Endpoint::default());

        let outcome = node.tick();
        assert_eq!(outcome.link, LinkState::LinkUp);
        assert_eq!(outcome.publish, PublishOutcome::Delivered(200));
        assert_eq!(clock.now(), 100);
    }

    #[test]
    fn publishes_once_per_interval() {
        let clock = SimClock::new(0);
        let mut node = scheduler(&clock, Endpoint::default());

        let attempts = (0..100).filter(|_| node.tick().publish.attempted()).count();
        assert_eq!(attempts, 10);
        assert_eq!(node.supervisor().deliveries(), 10);
    }

    #[test]
    fn rejected_deliveries_keep_the_cadence() {
        let clock = SimClock::new(0);
        let mut node = scheduler(&clock, Endpoint { deliveries: 0, reject: true });

        let attempts = (0..100).filter(|_| node.tick().publish.attempted()).count();
        assert_eq!(attempts, 10);
        assert_eq!(node.stats().messages_failed, 10);
        assert_eq!(node.schedule().last_publish(), Some(9000));
    }

    #[test]
    fn overflow_skips_delivery_but_counts_as_attempt() {
        let clock = SimClock::new(0);
        let mut node = scheduler(&clock, Endpoint::default())
            .with_encoder(PayloadEncoder::with_capacity(IdentityPlacement::Body, 16));

        let outcome = node.tick();
        assert!(matches!(
            outcome.publish,
            PublishOutcome::Dropped(TelemetryError::EncodingOverflow { capacity: 16, .. })
        ));
        assert_eq!(node.supervisor().deliveries(), 0);
        assert_eq!(node.stats().encoding_overflows, 1);
        assert_eq!(node.schedule().last_publish(), Some(0));
        assert_eq!(node.tick().publish, PublishOutcome::NotDue);
    }

    #[test]
    fn invalid_config_is_rejected_before_the_loop() {
        let clock = SimClock::new(0);
        let input: fn() -> u16 = || 0;
        let result = Scheduler::new(
            &config().device_id(""),
            input,
            Wired,
            Endpoint::default(),
            &clock,
            &clock,
        );
        assert!(matches!(result, Err(ConfigError::EmptyDeviceId)));
    }

    #[test]
    fn request_response_node_accepts_identity_longer_than_a_topic() {
        let clock = SimClock::new(0);
        let input: fn() -> u16 = || 1800;
        let id = "greenhouse-north-bench-07-capacitive-sensor-revb";
        assert_eq!(id.len(), 48);

        let mut node = Scheduler::new(
            &config().device_id(id),
            input,
            Wired,
            Endpoint::default(),
            &clock,
            &clock,
        )
        .unwrap();

        assert_eq!(node.tick().publish, PublishOutcome::Delivered(200));
        assert_eq!(node.supervisor().deliveries(), 1);
    }

    impl ConnectionSupervisor<Wired, Endpoint> {
        fn deliveries(&self) -> u32 {
            self.session().transport().deliveries
        }
    }
}
