//! Everything the tasks share, created once per runtime.

use crate::config::MonitorConfig;
use crate::error::PipelineResult;
use crate::relay::{RelayCounters, VibrationRegister};
use crate::state::{EventKind, SystemState};
use std::fmt;
use std::sync::Arc;
use turbine_monitor::{FatalHandler, HeapBudget, TaskRegistry};
use turbine_scheduler::Clock;
use turbine_sync::{BoundedChannel, ReadinessGroup, ReadyBits, ShutdownSignal, StateLock};
use turbine_types::{AlertMessage, RawSample, SensorReading, TaskId, ThresholdConfig, Tick};

/// Shared handles passed to every task.
///
/// Owned by the runtime behind an `Arc`. Tasks reach shared state only
/// through the two locks and the channels held here.
pub struct PipelineContext {
    /// Validated configuration.
    pub config: MonitorConfig,
    /// The system state.
    pub state: StateLock<SystemState>,
    /// Alarm thresholds, under their own lock.
    pub thresholds: StateLock<ThresholdConfig>,
    /// Start-up readiness bits.
    pub readiness: ReadinessGroup,
    /// Relay to sensor task.
    pub raw_samples: BoundedChannel<RawSample>,
    /// Sensor task to anomaly task.
    pub sensor_data: BoundedChannel<SensorReading>,
    /// Anomaly task to network task.
    pub alerts: BoundedChannel<AlertMessage>,
    /// Simulated heap.
    pub heap: HeapBudget,
    /// Per-task counters.
    pub registry: TaskRegistry,
    /// Register read by the relay.
    pub register: Arc<VibrationRegister>,
    /// Counters written by the relay.
    pub relay_counters: Arc<RelayCounters>,
    /// Tick source.
    pub clock: Arc<dyn Clock>,
    /// Stack overflow handler.
    pub fatal: Arc<dyn FatalHandler>,
    /// Cooperative shutdown.
    pub shutdown: ShutdownSignal,
}

impl fmt::Debug for PipelineContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineContext")
            .field("state", &self.state)
            .field("thresholds", &self.thresholds)
            .field("readiness", &self.readiness)
            .field("raw_samples", &self.raw_samples)
            .field("sensor_data", &self.sensor_data)
            .field("alerts", &self.alerts)
            .field("heap", &self.heap)
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

impl PipelineContext {
    /// Build the shared context from a configuration.
    ///
    /// The network starts connected, so `NETWORK_CONNECTED` is set here.
    ///
    /// # Errors
    ///
    /// Returns the validation error of `config`, or the construction error
    /// of a channel or the registry.
    pub fn new(
        config: MonitorConfig,
        clock: Arc<dyn Clock>,
        fatal: Arc<dyn FatalHandler>,
    ) -> PipelineResult<Self> {
        config.validate()?;

        let now = clock.now();
        let registry = TaskRegistry::new(
            TaskId::APPLICATION
                .into_iter()
                .map(|task| (task, config.stacks.words(task))),
            now,
        )?;
        let readiness = ReadinessGroup::new();
        let _bits = readiness.set(ReadyBits::NETWORK_CONNECTED);

        Ok(Self {
            state: StateLock::new(
                "system_state",
                SystemState::new(config.health.stack, config.health.heap_bytes),
            ),
            thresholds: StateLock::new("thresholds", config.thresholds),
            readiness,
            raw_samples: BoundedChannel::new("raw_samples", config.queues.raw_samples)?,
            sensor_data: BoundedChannel::new("sensor_data", config.queues.sensor_data)?,
            alerts: BoundedChannel::new("alerts", config.queues.alerts)?,
            heap: HeapBudget::new(config.health.heap_bytes),
            registry,
            register: Arc::new(VibrationRegister::default()),
            relay_counters: Arc::new(RelayCounters::default()),
            clock,
            fatal,
            shutdown: ShutdownSignal::new(),
            config,
        })
    }

    /// Current tick.
    #[inline]
    #[must_use]
    pub fn now(&self) -> Tick {
        self.clock.now()
    }

    /// Run `f` on the system state, or skip it when the lock is contended.
    ///
    /// A timeout is already counted and logged by the lock; callers treat
    /// `None` as "skip this update".
    pub fn update_state<R>(&self, f: impl FnOnce(&mut SystemState) -> R) -> Option<R> {
        self.state
            .with_lock(self.config.locks.state_timeout(), f)
            .ok()
    }

    /// Copy of the thresholds, or `None` when the lock is contended.
    #[must_use]
    pub fn read_thresholds(&self) -> Option<ThresholdConfig> {
        self.thresholds
            .snapshot(self.config.locks.state_timeout())
            .ok()
    }

    /// Replace the thresholds.
    ///
    /// # Errors
    ///
    /// Returns the validation error, or [`LockTimeout`](turbine_sync::LockTimeout)
    /// wrapped in [`PipelineError`](crate::PipelineError).
    pub fn set_thresholds(&self, thresholds: ThresholdConfig) -> PipelineResult<()> {
        thresholds.validate()?;
        self.thresholds
            .with_lock(self.config.locks.state_timeout(), |t| *t = thresholds)?;
        tracing::info!(?thresholds, "thresholds updated");
        Ok(())
    }

    /// Append a scheduling event; skipped when the lock is contended.
    pub fn record_event(&self, task: TaskId, kind: EventKind) -> bool {
        let at = self.now();
        self.update_state(|state| state.record_event(at, task, kind))
            .is_some()
    }
}
