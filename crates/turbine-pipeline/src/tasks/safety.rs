//! Alarm evaluation and the emergency stop.

use super::{CycleInfo, PipelineTask, TaskFlow};
use crate::context::PipelineContext;
use crate::state::EventKind;
use std::time::Duration;
use turbine_sync::{ReadyBits, WaitError};
use turbine_types::{SensorReading, TaskId, ThresholdConfig, Tick};

/// Critical alarms active in one evaluation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActiveAlarms {
    /// Vibration above its critical level.
    pub vibration: bool,
    /// Temperature above its critical level.
    pub temperature: bool,
    /// Rotor speed outside its band.
    pub rpm: bool,
    /// Generator current above its limit.
    pub current: bool,
}

impl ActiveAlarms {
    /// Evaluate `reading` against `thresholds`.
    #[must_use]
    pub fn evaluate(reading: &SensorReading, thresholds: &ThresholdConfig) -> Self {
        Self {
            vibration: reading.vibration > thresholds.vibration_crit,
            temperature: reading.temperature > thresholds.temp_crit,
            rpm: thresholds.rpm_out_of_band(reading.rpm),
            current: reading.current > thresholds.current_max,
        }
    }

    /// Number of active alarms.
    #[must_use]
    pub fn count(&self) -> u32 {
        u32::from(self.vibration)
            + u32::from(self.temperature)
            + u32::from(self.rpm)
            + u32::from(self.current)
    }

    /// Alarms active here but not in `previous`.
    #[must_use]
    pub fn raised_since(&self, previous: &Self) -> u32 {
        u32::from(self.vibration && !previous.vibration)
            + u32::from(self.temperature && !previous.temperature)
            + u32::from(self.rpm && !previous.rpm)
            + u32::from(self.current && !previous.current)
    }
}

/// The highest-priority task.
///
/// Waits once for every readiness bit, then evaluates the critical alarms
/// each cycle. The emergency stop is raised while enough alarms are active
/// and is held for at least the dwell time; it is cleared on the first cycle
/// after the dwell with fewer active alarms than the raise level.
#[derive(Debug, Clone)]
pub struct SafetyTask {
    alarms: ActiveAlarms,
    alarm_edges: u64,
    raised_at: Option<Tick>,
    dwell: Duration,
    alarms_for_emergency: u32,
}

impl SafetyTask {
    /// Create the task from the safety settings in `ctx`.
    #[must_use]
    pub fn new(ctx: &PipelineContext) -> Self {
        Self {
            alarms: ActiveAlarms::default(),
            alarm_edges: 0,
            raised_at: None,
            dwell: Duration::from_millis(ctx.config.safety.emergency_dwell_ms),
            alarms_for_emergency: ctx.config.safety.alarms_for_emergency,
        }
    }

    /// Alarms active at the latest evaluation.
    #[must_use]
    pub fn alarms(&self) -> ActiveAlarms {
        self.alarms
    }

    /// Alarm activations counted so far.
    #[must_use]
    pub fn alarm_edges(&self) -> u64 {
        self.alarm_edges
    }

    /// When the current emergency was first seen, if one is active.
    #[must_use]
    pub fn raised_at(&self) -> Option<Tick> {
        self.raised_at
    }
}

impl PipelineTask for SafetyTask {
    fn id(&self) -> TaskId {
        TaskId::Safety
    }

    fn start(&mut self, ctx: &PipelineContext) -> TaskFlow {
        tracing::info!("waiting for all systems to be ready");
        let timeout = ctx
            .config
            .safety
            .readiness_timeout_ms
            .map(Duration::from_millis);
        match ctx.readiness.wait_all(ReadyBits::ALL, timeout) {
            Ok(bits) => {
                let now = ctx.now();
                let stats = ctx.readiness.stats();
                let _updated = ctx.update_state(|state| {
                    state.readiness.system_ready_at = Some(now);
                    state.readiness.wait_ops = stats.wait_ops;
                    state.record_event(now, TaskId::Safety, EventKind::SystemReady);
                });
                tracing::info!(?bits, at = %now, "all systems ready, safety monitoring started");
                TaskFlow::Continue
            }
            Err(WaitError::TimedOut { observed }) => {
                tracing::warn!(
                    ?observed,
                    "readiness wait timed out, safety monitoring started anyway"
                );
                TaskFlow::Continue
            }
            Err(WaitError::Cancelled) => {
                tracing::info!("readiness wait cancelled");
                TaskFlow::Stop
            }
        }
    }

    fn run_cycle(&mut self, ctx: &PipelineContext, cycle: &CycleInfo<'_>) {
        let _depth = cycle.probe.sample();

        let Some(thresholds) = ctx.read_thresholds() else {
            return;
        };
        let Some((reading, emergency)) =
            ctx.update_state(|state| (state.sensors, state.emergency_stop))
        else {
            return;
        };

        let alarms = ActiveAlarms::evaluate(&reading, &thresholds);
        let new_edges = alarms.raised_since(&self.alarms);
        if new_edges > 0 {
            self.alarm_edges = self.alarm_edges.saturating_add(u64::from(new_edges));
            tracing::debug!(?alarms, cycle = cycle.number, "critical alarm raised");
        }
        self.alarms = alarms;

        let active = alarms.count();
        let now = cycle.now;

        if emergency {
            // Raised elsewhere, e.g. by the sensor task.
            let raised_at = *self.raised_at.get_or_insert(now);
            let held = now.saturating_since(raised_at);
            if held >= self.dwell && active < self.alarms_for_emergency {
                let cleared = ctx.update_state(|state| {
                    state.emergency_stop = false;
                    state.record_event(now, TaskId::Safety, EventKind::EmergencyCleared);
                });
                if cleared.is_some() {
                    self.raised_at = None;
                    tracing::info!(
                        held_ms = u64::try_from(held.as_millis()).unwrap_or(u64::MAX),
                        active_alarms = active,
                        "emergency stop cleared"
                    );
                }
            }
        } else if active >= self.alarms_for_emergency {
            let raised = ctx.update_state(|state| state.raise_emergency(now, TaskId::Safety));
            if raised.is_some() {
                self.raised_at = Some(now);
                tracing::warn!(
                    ?alarms,
                    active_alarms = active,
                    vibration = reading.vibration,
                    temperature = reading.temperature,
                    rpm = reading.rpm,
                    current = reading.current,
                    "emergency stop raised"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reading(vibration: f32, temperature: f32, rpm: f32, current: f32) -> SensorReading {
        SensorReading {
            vibration,
            temperature,
            rpm,
            current,
            capture_time: Tick::ZERO,
        }
    }

    #[test]
    fn test_nominal_reading_has_no_alarms() {
        let alarms = ActiveAlarms::evaluate(&SensorReading::INITIAL, &ThresholdConfig::default());
        assert_eq!(alarms, ActiveAlarms::default());
        assert_eq!(alarms.count(), 0);
    }

    #[test]
    fn test_each_channel_alarms() {
        let t = ThresholdConfig::default();
        let all = ActiveAlarms::evaluate(&reading(10.5, 86.0, 31.0, 101.0), &t);
        assert_eq!(all.count(), 4);
        let low_rpm = ActiveAlarms::evaluate(&reading(2.0, 45.0, 9.0, 50.0), &t);
        assert!(low_rpm.rpm);
        assert_eq!(low_rpm.count(), 1);
    }

    #[test]
    fn test_boundaries_are_not_alarms() {
        let t = ThresholdConfig::default();
        let edge = ActiveAlarms::evaluate(&reading(10.0, 85.0, 10.0, 100.0), &t);
        assert_eq!(edge.count(), 0);
    }

    #[test]
    fn test_raised_since_counts_new_alarms_only() {
        let before = ActiveAlarms {
            vibration: true,
            ..ActiveAlarms::default()
        };
        let after = ActiveAlarms {
            vibration: true,
            current: true,
            ..ActiveAlarms::default()
        };
        assert_eq!(after.raised_since(&before), 1);
        assert_eq!(before.raised_since(&after), 0);
    }
}
