//! The device control loop.
//!
//! ```text
//!  tick(now)
//!    ├─ threshold-sync due?   → ThresholdSync ─────────────► ThresholdStore
//!    ├─ sense-and-report due? → SensorReader → AnomalyDetector → indicator
//!    │                                      └► ReportingClient → ActuationController
//!    └─ disconnected?         → ConnectivityManager::reconnect (blocking)
//! ```
//!
//! Everything runs on one thread. Every component absorbs its own failures,
//! so a tick always completes.

use std::time::Duration;

use log::{info, warn};

use crate::{
    actuation::ActuationController,
    anomaly::AnomalyDetector,
    config::{RuntimeConfig, TimingConfig},
    connectivity::ConnectivityManager,
    error::NodeError,
    ports::{Actuator, ClimateSensor, Clock, HttpTransport, Indicator, WifiLink},
    reporting::ReportingClient,
    scheduler::Scheduler,
    sensor::SensorReader,
    thresholds::{SyncOutcome, ThresholdStore, ThresholdSync},
    types::{ActuatorPosition, ConnectionState, Sample, ServerVerdict},
};

/// Result of one sense-and-report cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CycleOutcome {
    /// Read failed; alarm forced on, nothing reported.
    SensorFault,
    /// Read succeeded but the network was down.
    Offline,
    /// Report sent but no usable verdict came back.
    NoVerdict,
    Actuated(ActuatorPosition),
    /// Verdict received but the actuator rejected the command.
    ActuatorFault,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NodeStats {
    pub cycles: u64,
    pub sensor_faults: u64,
    pub reports_delivered: u64,
    pub reports_failed: u64,
    pub syncs_applied: u64,
    pub syncs_kept: u64,
    pub syncs_skipped: u64,
    pub reconnect_failures: u64,
}

/// All mutable device state, owned in one place.
#[derive(Debug, Clone)]
pub struct DeviceState {
    pub thresholds: ThresholdStore,
    pub connection: ConnectionState,
    pub position: ActuatorPosition,
    pub alarm: bool,
    pub last_sample: Option<Sample>,
    pub last_verdict: Option<ServerVerdict>,
    pub last_cycle: Option<CycleOutcome>,
    pub stats: NodeStats,
}

/// The drivers a node is assembled from.
pub struct NodeParts<S, A, I, L, T, C> {
    pub sensor: S,
    pub actuator: A,
    pub indicator: I,
    pub link: L,
    pub transport: T,
    pub clock: C,
}

pub struct ClimateNode<S, A, I, L, T, C> {
    timing: TimingConfig,
    scheduler: Scheduler,
    reader: SensorReader<S>,
    detector: AnomalyDetector<I>,
    actuation: ActuationController<A>,
    connectivity: ConnectivityManager<L>,
    threshold_sync: ThresholdSync,
    reporter: ReportingClient,
    transport: T,
    clock: C,
    state: DeviceState,
}

impl<S, A, I, L, T, C> ClimateNode<S, A, I, L, T, C>
where
    S: ClimateSensor,
    A: Actuator,
    I: Indicator,
    L: WifiLink,
    T: HttpTransport,
    C: Clock,
{
    pub fn new(config: &RuntimeConfig, parts: NodeParts<S, A, I, L, T, C>) -> Self {
        let timing = config.timing.clone();
        let timeout = Duration::from_millis(timing.request_timeout_ms);

        Self {
            scheduler: Scheduler::new(timing.threshold_sync_interval_ms, timing.report_interval_ms),
            reader: SensorReader::new(parts.sensor),
            detector: AnomalyDetector::new(parts.indicator),
            actuation: ActuationController::new(parts.actuator),
            connectivity: ConnectivityManager::new(
                parts.link,
                timing.reconnect_attempts,
                timing.reconnect_delay_ms,
            ),
            threshold_sync: ThresholdSync::new(&config.node.base_url, config.node.room_id, timeout),
            reporter: ReportingClient::new(&config.node.base_url, config.node.sensor_id, timeout),
            transport: parts.transport,
            clock: parts.clock,
            state: DeviceState {
                thresholds: ThresholdStore::new(config.thresholds),
                connection: ConnectionState::Disconnected,
                position: ActuatorPosition::Neutral,
                alarm: false,
                last_sample: None,
                last_verdict: None,
                last_cycle: None,
                stats: NodeStats::default(),
            },
            timing,
        }
    }

    pub fn state(&self) -> &DeviceState {
        &self.state
    }

    pub fn stats(&self) -> NodeStats {
        self.state.stats
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn clock_mut(&mut self) -> &mut C {
        &mut self.clock
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn indicator(&self) -> &I {
        self.detector.indicator()
    }

    pub fn actuator(&self) -> &A {
        self.actuation.actuator()
    }

    pub fn link(&self) -> &L {
        self.connectivity.link()
    }

    /// Safe outputs, first association, and an immediate threshold sync.
    pub fn start(&mut self) {
        info!(
            "climate node starting: report -> {}, thresholds <- {}",
            self.reporter.url(),
            self.threshold_sync.url()
        );

        self.detector.drive(false);
        self.state.alarm = false;
        if self.actuation.command(ActuatorPosition::Neutral).is_ok() {
            self.state.position = ActuatorPosition::Neutral;
        }

        self.ensure_connected();

        if self.state.connection.is_connected() {
            let now = self.clock.now_ms();
            self.run_threshold_sync();
            self.scheduler.threshold_sync.mark_run(now);
        }
    }

    /// One scheduler iteration without the trailing sleep.
    pub fn tick(&mut self) {
        let now = self.clock.now_ms();
        let due = self.scheduler.poll(now);

        if due.threshold_sync {
            self.run_threshold_sync();
        }

        if due.sense_and_report {
            let outcome = self.sense_and_report();
            self.state.last_cycle = Some(outcome);
        }

        self.ensure_connected();
    }

    pub fn run(&mut self) -> ! {
        loop {
            self.tick();
            self.clock.sleep_ms(self.timing.tick_quantum_ms);
        }
    }

    /// Runs `ticks` loop iterations, sleeping one quantum after each.
    pub fn run_for(&mut self, ticks: u64) {
        for _ in 0..ticks {
            self.tick();
            self.clock.sleep_ms(self.timing.tick_quantum_ms);
        }
    }

    fn run_threshold_sync(&mut self) -> SyncOutcome {
        self.connectivity.status(&mut self.state.connection);
        let outcome = self.threshold_sync.sync(
            &mut self.transport,
            self.state.connection,
            &mut self.state.thresholds,
        );

        match outcome {
            SyncOutcome::Applied(_) => self.state.stats.syncs_applied += 1,
            SyncOutcome::Kept => self.state.stats.syncs_kept += 1,
            SyncOutcome::Skipped => self.state.stats.syncs_skipped += 1,
        }
        outcome
    }

    fn sense(&mut self) -> Result<Sample, NodeError> {
        let sample = self.reader.read();
        let thresholds = self.state.thresholds.get();

        self.state.alarm = self.detector.check(&sample, &thresholds);
        self.state.last_sample = Some(sample);

        if sample.is_failed() {
            return Err(NodeError::SensorFault);
        }
        Ok(sample)
    }

    fn sense_and_report(&mut self) -> CycleOutcome {
        self.state.stats.cycles += 1;

        let sample = match self.sense() {
            Ok(sample) => sample,
            Err(err) => {
                warn!("sense cycle aborted: {err}");
                self.state.stats.sensor_faults += 1;
                return CycleOutcome::SensorFault;
            }
        };

        if !self
            .connectivity
            .status(&mut self.state.connection)
            .is_connected()
        {
            warn!("sense cycle: {}; reading not reported", NodeError::NetworkUnavailable);
            return CycleOutcome::Offline;
        }

        let Some(verdict) = self.reporter.report(&mut self.transport, &sample) else {
            self.state.stats.reports_failed += 1;
            return CycleOutcome::NoVerdict;
        };
        self.state.stats.reports_delivered += 1;
        self.state.last_verdict = Some(verdict);

        let thresholds = self.state.thresholds.get();
        match self.actuation.actuate(&sample, &thresholds) {
            Ok(position) => {
                self.state.position = position;
                CycleOutcome::Actuated(position)
            }
            Err(_) => CycleOutcome::ActuatorFault,
        }
    }

    fn ensure_connected(&mut self) {
        if self
            .connectivity
            .status(&mut self.state.connection)
            .is_connected()
        {
            return;
        }

        if let Err(err) = self
            .connectivity
            .reconnect(&mut self.state.connection, &mut self.clock)
        {
            warn!("{err}; will retry on a later tick");
            self.state.stats.reconnect_failures += 1;
        }
    }
}
