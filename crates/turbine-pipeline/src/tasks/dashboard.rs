//! Statistics refresh and resource health checks.

use super::{CycleInfo, PipelineTask};
use crate::context::PipelineContext;
use crate::state::{HeapHealth, ReadinessStats, TaskStats};
use std::time::Duration;
use turbine_monitor::{HeapLevel, PowerEstimator, TaskStatus};
use turbine_types::TaskId;

const SUMMARY_EVERY: u64 = 10;

/// Lowest-priority task: reads counters and folds them into the state.
#[derive(Debug, Clone)]
pub struct DashboardTask {
    power: PowerEstimator,
    heap_level: HeapLevel,
}

impl Default for DashboardTask {
    fn default() -> Self {
        Self::new()
    }
}

impl DashboardTask {
    /// Create the task.
    #[must_use]
    pub fn new() -> Self {
        Self {
            power: PowerEstimator::new(),
            heap_level: HeapLevel::Normal,
        }
    }
}

/// Share of `elapsed` spent in a task, in percent.
#[expect(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    reason = "a display percentage; precision loss on huge counters is irrelevant"
)]
fn cpu_percent(runtime_us: u64, elapsed: Duration) -> f32 {
    let elapsed_us = elapsed.as_micros();
    if elapsed_us == 0 {
        return 0.0;
    }
    let percent = runtime_us as f64 * 100.0 / elapsed_us as f64;
    percent.clamp(0.0, 100.0) as f32
}

fn task_stats(status: &TaskStatus, elapsed: Duration) -> TaskStats {
    TaskStats {
        task: status.task,
        priority: status.priority,
        state: status.state,
        cycles: status.cycles,
        runtime_us: status.runtime_us,
        cpu_percent: cpu_percent(status.runtime_us, elapsed),
        stack_high_water_words: status.stack_high_water_words,
        deadline_misses: status.deadline_misses,
        max_lateness_us: status.max_lateness_us,
        p99_lateness_us: status.p99_lateness_us,
    }
}

impl PipelineTask for DashboardTask {
    fn id(&self) -> TaskId {
        TaskId::Dashboard
    }

    fn run_cycle(&mut self, ctx: &PipelineContext, cycle: &CycleInfo<'_>) {
        let _depth = cycle.probe.sample();
        let now = cycle.now;
        let health = &ctx.config.health;

        let elapsed = now.saturating_since(ctx.registry.started_at());
        let statuses = ctx.registry.statuses();
        let tasks: Vec<TaskStats> = statuses.iter().map(|s| task_stats(s, elapsed)).collect();
        let windows: Vec<(TaskId, u32, u32)> = TaskId::APPLICATION
            .into_iter()
            .filter_map(|task| {
                ctx.registry
                    .take_stack_window(task)
                    .map(|(configured, free)| (task, configured, free))
            })
            .collect();
        let stale = ctx.registry.check_liveness(now, health.liveness_timeout());
        let power = self.power.update(
            ctx.registry.total_runtime(),
            elapsed,
            ctx.registry.idle_entries(),
        );

        let heap_level = ctx
            .heap
            .level(health.heap_warn_percent, health.heap_critical_percent);
        let heap_used = ctx.heap.used_percent();
        if heap_level != self.heap_level {
            if heap_level > HeapLevel::Normal {
                tracing::warn!(
                    ?heap_level,
                    used_percent = heap_used,
                    free_bytes = ctx.heap.free_bytes(),
                    "heap usage high"
                );
            } else {
                tracing::info!(used_percent = heap_used, "heap usage back to normal");
            }
            self.heap_level = heap_level;
        }

        let readiness = ctx.readiness.stats();
        let bits = ctx.readiness.bits();
        let interrupts = ctx.relay_counters.interrupts();
        let dropped = ctx.relay_counters.dropped();
        let fatal = &*ctx.fatal;

        let Some(summary) = ctx.update_state(|state| {
            for (task, configured, free) in &windows {
                let _observation = state.stack.observe(task.name(), *configured, *free, now, fatal);
            }
            state.tasks = tasks;
            state.power = power;
            state.health = HeapHealth {
                level: heap_level,
                used_percent: heap_used,
                stale_tasks: u32::try_from(stale.len()).unwrap_or(u32::MAX),
            };
            state.readiness = ReadinessStats {
                bits,
                system_ready_at: state.readiness.system_ready_at,
                set_ops: readiness.set_ops,
                clear_ops: readiness.clear_ops,
                wait_ops: readiness.wait_ops,
            };
            state.isr.interrupt_count = interrupts;
            state.isr.dropped_count = dropped;
            (
                state.sensors,
                state.anomalies,
                state.emergency_stop,
                state.network_connected,
                state.network,
                state.memory,
                state.stack.stats().clone(),
                state.events.total(),
            )
        }) else {
            return;
        };
        let (sensors, anomalies, emergency, connected, network, memory, stack, events) = summary;

        tracing::debug!(
            cycle = cycle.number,
            vibration = sensors.vibration,
            temperature = sensors.temperature,
            rpm = sensors.rpm,
            current = sensors.current,
            health = anomalies.health_score,
            emergency,
            connected,
            ?bits,
            idle_percent = power.idle_percent,
            heap_free = memory.current_free,
            "dashboard snapshot"
        );

        if cycle.number.is_multiple_of(SUMMARY_EVERY) {
            tracing::info!(
                uptime_s = elapsed.as_secs(),
                health = anomalies.health_score,
                anomalies = anomalies.anomaly_count,
                emergency,
                connected,
                packets_sent = network.packets_sent,
                packets_failed = network.packets_failed,
                alerts_forwarded = network.alerts_forwarded,
                interrupts,
                isr_dropped = dropped,
                heap_min_free = memory.minimum_free,
                stack_warnings = stack.warnings_issued,
                stale_tasks = stale.len(),
                idle_percent = power.idle_percent,
                power_savings_percent = power.power_savings_percent,
                events,
                "system summary"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cpu_percent() {
        assert!((cpu_percent(250_000, Duration::from_secs(1)) - 25.0).abs() < 1e-4);
        assert!(cpu_percent(1, Duration::ZERO).abs() < f32::EPSILON);
        assert!((cpu_percent(5_000_000, Duration::from_secs(1)) - 100.0).abs() < f32::EPSILON);
    }
}
