//! Thread ownership and lifecycle.
//!
//! [`MonitorRuntime::start`] builds the shared context, spawns the relay
//! timer and one named thread per task, and hands back a handle. Dropping
//! the handle, or calling [`MonitorRuntime::shutdown`], raises the shutdown
//! signal, cancels the readiness group and joins every thread.

use crate::config::MonitorConfig;
use crate::context::PipelineContext;
use crate::error::{PipelineError, PipelineResult};
use crate::relay::InterruptRelay;
use crate::state::{EventKind, SystemState};
use crate::tasks::{
    AnomalyTask, CycleInfo, DashboardTask, NetworkTask, PipelineTask, SafetyTask, SensorTask,
    TaskFlow,
};
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, trace, warn};
use turbine_monitor::{
    CycleReport, FatalHandler, HaltOnFatal, StackProbe, TaskState, TaskStatus, probe::WORD_BYTES,
};
use turbine_scheduler::{Clock, MonotonicClock, PeriodicTicker, TickOutcome};
use turbine_sync::{ChannelSnapshot, IsrSend, LockSnapshot, ReadinessSnapshot};
use turbine_types::{TaskId, Tick};

/// Counters of the three channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelReport {
    /// Relay to sensor task.
    pub raw_samples: ChannelSnapshot,
    /// Sensor task to anomaly task.
    pub sensor_data: ChannelSnapshot,
    /// Anomaly task to network task.
    pub alerts: ChannelSnapshot,
}

/// Counters of the two locks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockReport {
    /// System state lock.
    pub state: LockSnapshot,
    /// Threshold lock.
    pub thresholds: LockSnapshot,
}

/// Everything observable about a running monitor at one instant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorSnapshot {
    /// When the snapshot was taken.
    pub taken_at: Tick,
    /// Seed of the random sources.
    pub seed: u64,
    /// Copy of the system state.
    pub state: SystemState,
    /// Per-task counters read straight from the registry.
    pub tasks: Vec<TaskStatus>,
    /// Channel counters.
    pub channels: ChannelReport,
    /// Lock counters.
    pub locks: LockReport,
    /// Readiness counters.
    pub readiness: ReadinessSnapshot,
}

/// Handle to a running monitor.
#[derive(Debug)]
pub struct MonitorRuntime {
    ctx: Arc<PipelineContext>,
    handles: Vec<(TaskId, JoinHandle<()>)>,
    seed: u64,
}

fn stack_bytes(words: u32) -> usize {
    usize::try_from(words)
        .unwrap_or(usize::MAX)
        .saturating_mul(WORD_BYTES)
}

impl MonitorRuntime {
    /// Start a monitor on the host clock with the aborting fatal handler.
    ///
    /// # Errors
    ///
    /// See [`start_with`](Self::start_with).
    pub fn start(config: MonitorConfig) -> PipelineResult<Self> {
        Self::start_with(config, Arc::new(MonotonicClock::new()), Arc::new(HaltOnFatal))
    }

    /// Start a monitor with an explicit clock and fatal handler.
    ///
    /// Without a configured seed one is drawn and logged so the run can be
    /// repeated.
    ///
    /// # Errors
    ///
    /// - configuration errors from validation
    /// - [`PipelineError::Spawn`] if a thread could not be created; threads
    ///   already running are stopped before returning
    pub fn start_with(
        config: MonitorConfig,
        clock: Arc<dyn Clock>,
        fatal: Arc<dyn FatalHandler>,
    ) -> PipelineResult<Self> {
        let seed = config.simulation.seed.unwrap_or_else(rand::random);
        let ctx = Arc::new(PipelineContext::new(config, clock, fatal)?);
        info!(seed, "starting turbine monitor");

        let tasks: Vec<Box<dyn PipelineTask>> = vec![
            Box::new(SafetyTask::new(&ctx)),
            Box::new(SensorTask::new(&ctx, StdRng::seed_from_u64(seed))),
            Box::new(AnomalyTask::new(&ctx)?),
            Box::new(NetworkTask::new(&ctx, StdRng::seed_from_u64(seed.wrapping_add(2)))),
            Box::new(DashboardTask::new()),
        ];

        let mut runtime = Self {
            ctx,
            handles: Vec::with_capacity(tasks.len().saturating_add(1)),
            seed,
        };
        runtime.spawn_relay(StdRng::seed_from_u64(seed.wrapping_add(1)))?;
        for task in tasks {
            runtime.spawn_task(task)?;
        }
        info!(threads = runtime.handles.len(), "turbine monitor started");
        Ok(runtime)
    }

    fn spawn_relay(&mut self, rng: StdRng) -> PipelineResult<()> {
        let id = TaskId::Interrupt;
        let ctx = &self.ctx;
        let mut ticker = PeriodicTicker::new(
            id.name(),
            ctx.config.periods.period(id),
            ctx.shutdown.clone(),
        )?;
        let mut relay = InterruptRelay::new(
            ctx.raw_samples.isr_handle(),
            Arc::clone(&ctx.register),
            Arc::clone(&ctx.clock),
            Arc::clone(&ctx.relay_counters),
            rng,
        );

        let handle = thread::Builder::new()
            .name(id.name().to_string())
            .stack_size(stack_bytes(ctx.config.stacks.words(id)))
            .spawn(move || {
                while let TickOutcome::Due { .. } = ticker.wait_next() {
                    if let IsrSend::Dropped(sample) = relay.fire() {
                        trace!(sequence = sample.sequence, "raw sample dropped");
                    }
                }
                debug!(fired = relay.sequence(), "relay stopped");
            })
            .map_err(|source| PipelineError::Spawn {
                task: id.name(),
                source,
            })?;
        self.handles.push((id, handle));
        Ok(())
    }

    fn spawn_task(&mut self, task: Box<dyn PipelineTask>) -> PipelineResult<()> {
        let id = task.id();
        let ctx = Arc::clone(&self.ctx);
        let ticker = PeriodicTicker::new(
            id.name(),
            ctx.config.periods.period(id),
            ctx.shutdown.clone(),
        )?;
        let handle = thread::Builder::new()
            .name(id.name().to_string())
            .stack_size(stack_bytes(ctx.config.stacks.words(id)))
            .spawn(move || drive(&ctx, task, ticker))
            .map_err(|source| PipelineError::Spawn {
                task: id.name(),
                source,
            })?;
        debug!(task = %id, priority = id.priority().0, "task spawned");
        self.handles.push((id, handle));
        Ok(())
    }

    /// Shared context, for inspection and threshold updates.
    #[must_use]
    pub fn context(&self) -> &Arc<PipelineContext> {
        &self.ctx
    }

    /// Seed of the random sources.
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Whether the threads are still owned by this handle.
    #[must_use]
    pub fn is_running(&self) -> bool {
        !self.handles.is_empty()
    }

    /// Copy the observable state.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Snapshot`] when the state lock stays held past
    /// the snapshot timeout.
    pub fn snapshot(&self) -> PipelineResult<MonitorSnapshot> {
        let ctx = &self.ctx;
        let timeout = Duration::from_millis(ctx.config.locks.snapshot_timeout_ms);
        let state = ctx.state.snapshot(timeout)?;
        Ok(MonitorSnapshot {
            taken_at: ctx.now(),
            seed: self.seed,
            state,
            tasks: ctx.registry.statuses(),
            channels: ChannelReport {
                raw_samples: ctx.raw_samples.stats(),
                sensor_data: ctx.sensor_data.stats(),
                alerts: ctx.alerts.stats(),
            },
            locks: LockReport {
                state: ctx.state.stats(),
                thresholds: ctx.thresholds.stats(),
            },
            readiness: ctx.readiness.stats(),
        })
    }

    /// Stop every thread and return the final snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::TaskPanicked`] for the first thread that
    /// panicked, or the snapshot error.
    pub fn shutdown(mut self) -> PipelineResult<MonitorSnapshot> {
        self.stop()?;
        self.snapshot()
    }

    fn stop(&mut self) -> PipelineResult<()> {
        if self.handles.is_empty() {
            return Ok(());
        }
        info!("stopping turbine monitor");
        self.ctx.shutdown.trigger();
        self.ctx.readiness.cancel();

        let mut first_panic = None;
        for (task, handle) in self.handles.drain(..) {
            if handle.join().is_err() {
                error!(%task, "task thread panicked");
                first_panic.get_or_insert(task);
            }
        }
        info!("turbine monitor stopped");
        match first_panic {
            Some(task) => Err(PipelineError::TaskPanicked { task: task.name() }),
            None => Ok(()),
        }
    }
}

impl Drop for MonitorRuntime {
    fn drop(&mut self) {
        if let Err(err) = self.stop() {
            warn!(error = %err, "monitor stopped with errors");
        }
    }
}

/// Body of a task thread.
fn drive(ctx: &PipelineContext, mut task: Box<dyn PipelineTask>, mut ticker: PeriodicTicker) {
    let id = task.id();
    let probe = StackProbe::anchor(ctx.config.stacks.words(id));
    let period = ticker.period();

    ctx.registry.set_state(id, TaskState::Waiting);
    if task.start(ctx) == TaskFlow::Continue {
        // Time spent in `start` is not lateness.
        ticker.resync();
        while let TickOutcome::Due {
            cycle,
            lateness,
            parked,
        } = ticker.wait_next()
        {
            if lateness >= period {
                let late_by_us = u64::try_from(lateness.as_micros()).unwrap_or(u64::MAX);
                ctx.registry.record_deadline_miss(id);
                let _recorded = ctx.record_event(id, EventKind::DeadlineMissed { late_by_us });
                debug!(task = %id, cycle, late_by_us, "deadline missed");
            }

            ctx.registry.set_state(id, TaskState::Running);
            let started = Instant::now();
            let info = CycleInfo {
                number: cycle,
                now: ctx.now(),
                probe: &probe,
            };
            task.run_cycle(ctx, &info);
            ctx.registry.record_cycle(
                id,
                CycleReport {
                    busy: started.elapsed(),
                    finished_at: ctx.now(),
                    free_stack_words: probe.take_free_words(),
                    parked,
                },
            );
            let metrics = ticker.metrics_mut();
            let max_us = metrics.snapshot().max_lateness_us;
            ctx.registry.record_lateness(id, max_us, metrics.p99_us());
        }
    }
    ctx.registry.set_state(id, TaskState::Stopped);
    debug!(task = %id, "task stopped");
}
