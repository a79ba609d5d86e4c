//! Relay drain, sensor simulation and publication.

use super::{CycleInfo, PipelineTask};
use crate::context::PipelineContext;
use crate::relay::drain_samples;
use crate::sim::SensorSimulator;
use rand::rngs::StdRng;
use std::thread;
use std::time::Duration;
use turbine_sync::ReadyBits;
use turbine_types::TaskId;

const YIELD_EVERY: u64 = 10;

/// Drains the relay, merges the simulated channels and publishes a reading.
#[derive(Debug, Clone)]
pub struct SensorTask {
    simulator: SensorSimulator,
    calibrated: bool,
    send_timeout: Duration,
    emergency_vibration: f32,
}

impl SensorTask {
    /// Create the task with its own random source.
    #[must_use]
    pub fn new(ctx: &PipelineContext, rng: StdRng) -> Self {
        Self {
            simulator: SensorSimulator::new(ctx.config.simulation, rng),
            calibrated: false,
            send_timeout: Duration::from_millis(ctx.config.locks.sensor_send_timeout_ms),
            emergency_vibration: ctx.config.simulation.isr_emergency_vibration,
        }
    }

    /// Whether calibration has completed.
    #[must_use]
    pub fn calibrated(&self) -> bool {
        self.calibrated
    }
}

impl PipelineTask for SensorTask {
    fn id(&self) -> TaskId {
        TaskId::Sensor
    }

    fn run_cycle(&mut self, ctx: &PipelineContext, cycle: &CycleInfo<'_>) {
        let _depth = cycle.probe.sample();
        let now = cycle.now;

        let drained = drain_samples(ctx.raw_samples.drain(), now, self.emergency_vibration);
        let reading = self.simulator.step(drained.latest_vibration, now);
        ctx.register.store(self.simulator.vibration());

        if !self.calibrated && self.simulator.calibrated() {
            self.calibrated = true;
            let bits = ctx.readiness.set(ReadyBits::SENSORS_CALIBRATED);
            tracing::info!(cycle = cycle.number, ?bits, "sensors calibrated");
        }

        let interrupts = ctx.relay_counters.interrupts();
        let dropped = ctx.relay_counters.dropped();
        let newly_raised = ctx.update_state(|state| {
            state.sensors = reading;
            state.isr.interrupt_count = interrupts;
            state.isr.dropped_count = dropped;
            state.isr.processed_count = state.isr.processed_count.saturating_add(drained.processed);
            if let Some(latency) = drained.min_latency_us {
                state.isr.last_min_latency_us = latency;
            }
            state.isr.emergency_triggers = state
                .isr
                .emergency_triggers
                .saturating_add(drained.emergency_samples);

            let raise = drained.emergency() && !state.emergency_stop;
            if raise {
                state.raise_emergency(now, TaskId::Sensor);
            }
            raise
        });
        if newly_raised == Some(true) {
            tracing::warn!(
                samples = drained.emergency_samples,
                limit = self.emergency_vibration,
                "relay vibration above emergency level, emergency stop raised"
            );
        }

        if let Err(err) = ctx.sensor_data.try_send(reading, self.send_timeout) {
            tracing::trace!(error = %err, cycle = cycle.number, "sensor reading dropped");
            let _counted = ctx.update_state(|state| {
                state.sensor_send_failures = state.sensor_send_failures.saturating_add(1);
            });
        }

        tracing::debug!(
            cycle = cycle.number,
            processed = drained.processed,
            vibration = reading.vibration,
            temperature = reading.temperature,
            rpm = reading.rpm,
            current = reading.current,
            "sensor cycle"
        );

        if cycle.number.is_multiple_of(YIELD_EVERY) {
            thread::yield_now();
        }
    }
}
