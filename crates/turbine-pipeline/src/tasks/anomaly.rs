//! Anomaly detection and alert generation.

use super::{CycleInfo, PipelineTask};
use crate::context::PipelineContext;
use crate::error::PipelineResult;
use std::fmt;
use std::thread;
use std::time::Duration;
use turbine_anomaly::{
    AlertThrottle, AnomalyDetector, DetectionContext, SensorHistory, StatisticalDetector,
};
use turbine_sync::ReadyBits;
use turbine_types::{TaskId, ThresholdConfig};

const YIELD_EVERY: u64 = 5;

/// Consumes sensor readings, runs the detector and raises alerts.
///
/// Odd cycles take up to two readings, even cycles one, so the sensor-data
/// channel visibly fills and drains. The detector only runs on cycles that
/// received something.
pub struct AnomalyTask {
    history: SensorHistory,
    detector: Box<dyn AnomalyDetector>,
    throttle: AlertThrottle,
    thresholds: ThresholdConfig,
    window: usize,
    ready: bool,
    evaluations: u64,
}

impl fmt::Debug for AnomalyTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnomalyTask")
            .field("detector", &self.detector.name())
            .field("samples", &self.history.len())
            .field("ready", &self.ready)
            .field("evaluations", &self.evaluations)
            .finish_non_exhaustive()
    }
}

impl AnomalyTask {
    /// Create the task with the statistical detector.
    ///
    /// # Errors
    ///
    /// Returns the detector configuration error.
    pub fn new(ctx: &PipelineContext) -> PipelineResult<Self> {
        let detector = StatisticalDetector::new(ctx.config.detector)?;
        Self::with_detector(ctx, Box::new(detector))
    }

    /// Create the task around any detector.
    ///
    /// # Errors
    ///
    /// Returns the history or throttle configuration error.
    pub fn with_detector(
        ctx: &PipelineContext,
        detector: Box<dyn AnomalyDetector>,
    ) -> PipelineResult<Self> {
        let config = &ctx.config.detector;
        Ok(Self {
            history: SensorHistory::with_capacity(config.history_len)?,
            detector,
            throttle: AlertThrottle::new(config.alert_every_cycles)?,
            thresholds: ctx.config.thresholds,
            window: config.window,
            ready: false,
            evaluations: 0,
        })
    }

    /// Whether the baseline window has filled.
    #[must_use]
    pub fn ready(&self) -> bool {
        self.ready
    }

    /// Detector runs so far.
    #[must_use]
    pub fn evaluations(&self) -> u64 {
        self.evaluations
    }

    /// Samples held in the history.
    #[must_use]
    pub fn samples(&self) -> usize {
        self.history.len()
    }
}

impl PipelineTask for AnomalyTask {
    fn id(&self) -> TaskId {
        TaskId::Anomaly
    }

    fn run_cycle(&mut self, ctx: &PipelineContext, cycle: &CycleInfo<'_>) {
        let _depth = cycle.probe.sample();

        let wanted = if cycle.number.is_multiple_of(2) { 1 } else { 2 };
        let mut received = 0usize;
        for _ in 0..wanted {
            match ctx.sensor_data.try_receive(Duration::ZERO) {
                Ok(reading) => {
                    self.history.push(&reading);
                    received += 1;
                }
                Err(_) => break,
            }
        }

        if received > 0 {
            self.evaluate(ctx, cycle);
        }

        if cycle.number.is_multiple_of(YIELD_EVERY) {
            thread::yield_now();
        }
    }
}

impl AnomalyTask {
    fn evaluate(&mut self, ctx: &PipelineContext, cycle: &CycleInfo<'_>) {
        if let Some(thresholds) = ctx.read_thresholds() {
            self.thresholds = thresholds;
        }
        let Some(emergency) = ctx.update_state(|state| state.emergency_stop) else {
            return;
        };

        let detection = DetectionContext {
            thresholds: self.thresholds,
            emergency,
        };
        let result = self.detector.evaluate(&self.history.window(), &detection);
        self.evaluations = self.evaluations.saturating_add(1);
        let _stored = ctx.update_state(|state| state.store_anomalies(result));

        if !self.ready && self.history.len() >= self.window {
            self.ready = true;
            let bits = ctx.readiness.set(ReadyBits::ANOMALY_READY);
            tracing::info!(
                samples = self.history.len(),
                detector = self.detector.name(),
                ?bits,
                "anomaly baseline ready"
            );
        }

        tracing::debug!(
            cycle = cycle.number,
            health = result.health_score,
            vibration = result.vibration_flag,
            temperature = result.temperature_flag,
            rpm = result.rpm_flag,
            "anomaly evaluation"
        );

        let Some(alert) = self.throttle.alert_for(cycle.number, &result, cycle.now) else {
            return;
        };
        match ctx.alerts.try_send(alert, Duration::ZERO) {
            Ok(()) => {
                tracing::debug!(kind = %alert.kind, severity = alert.severity, "alert raised");
            }
            Err(err) => {
                tracing::trace!(error = %err, kind = %alert.kind, "alert channel full");
                let _counted = ctx.update_state(|state| {
                    state.alert_backpressure = state.alert_backpressure.saturating_add(1);
                });
            }
        }
    }
}
