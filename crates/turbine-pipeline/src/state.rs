//! The shared system state and its statistics records.
//!
//! One [`SystemState`] exists per runtime. It lives inside a
//! [`StateLock`](turbine_sync::StateLock) owned by the pipeline context and
//! is only ever touched inside a `with_lock` closure.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use turbine_monitor::{
    HeapLevel, MemoryStats, PowerStats, StackMonitor, StackThresholds, TaskState,
};
use turbine_sync::ReadyBits;
use turbine_types::{AnomalyResult, SensorReading, TaskId, TaskPriority, Tick};

/// Events kept in the scheduling ring.
pub const EVENT_RING_CAPACITY: usize = 10;

/// What happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventKind {
    /// Every readiness bit was observed set.
    SystemReady,
    /// The emergency stop was raised.
    EmergencyRaised,
    /// The emergency stop was cleared.
    EmergencyCleared,
    /// A task was released a full period or more past its deadline.
    DeadlineMissed {
        /// Lateness in microseconds.
        late_by_us: u64,
    },
    /// A transmission failed and the link dropped.
    NetworkLost,
    /// A reconnect attempt succeeded.
    NetworkRestored,
}

/// A timestamped event attributed to a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulingEvent {
    /// When the event was recorded.
    pub at: Tick,
    /// Task that recorded it.
    pub task: TaskId,
    /// What happened.
    pub kind: EventKind,
}

/// The most recent scheduling events plus a running total.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRing {
    events: VecDeque<SchedulingEvent>,
    total: u64,
}

impl Default for EventRing {
    fn default() -> Self {
        Self {
            events: VecDeque::with_capacity(EVENT_RING_CAPACITY),
            total: 0,
        }
    }
}

impl EventRing {
    /// Record an event, evicting the oldest when full.
    pub fn push(&mut self, event: SchedulingEvent) {
        if self.events.len() == EVENT_RING_CAPACITY {
            self.events.pop_front();
        }
        self.events.push_back(event);
        self.total = self.total.saturating_add(1);
    }

    /// Retained events, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &SchedulingEvent> {
        self.events.iter()
    }

    /// Most recent event.
    #[must_use]
    pub fn latest(&self) -> Option<&SchedulingEvent> {
        self.events.back()
    }

    /// Retained events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Events ever recorded.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.total
    }
}

/// Transport counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkStats {
    /// Packets delivered.
    pub packets_sent: u64,
    /// Transmissions that failed.
    pub packets_failed: u64,
    /// Bytes delivered, headers included.
    pub bytes_sent: u64,
    /// Alerts taken off the alert channel.
    pub alerts_forwarded: u64,
    /// Reconnect attempts.
    pub reconnect_attempts: u64,
    /// Cycles skipped because the packet buffer could not be reserved.
    pub allocation_skips: u64,
    /// Packets whose body did not fit its size class.
    pub oversize_packets: u64,
    /// Time of the latest transmission attempt.
    pub last_transmission: Option<Tick>,
}

/// Interrupt relay counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IsrStats {
    /// Samples captured.
    pub interrupt_count: u64,
    /// Samples lost to a full raw-sample channel.
    pub dropped_count: u64,
    /// Samples drained by the sensor task.
    pub processed_count: u64,
    /// Smallest capture-to-drain latency of the latest drain.
    pub last_min_latency_us: u64,
    /// Samples above the emergency vibration level.
    pub emergency_triggers: u64,
}

/// Readiness bookkeeping.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadinessStats {
    /// Bits at the latest dashboard refresh.
    pub bits: ReadyBits,
    /// When the safety task first saw every bit set.
    pub system_ready_at: Option<Tick>,
    /// Bit set operations.
    pub set_ops: u64,
    /// Bit clear operations.
    pub clear_ops: u64,
    /// Wait operations.
    pub wait_ops: u64,
}

/// Per-task figures refreshed by the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TaskStats {
    /// Task identity.
    pub task: TaskId,
    /// Fixed priority.
    pub priority: TaskPriority,
    /// Lifecycle state.
    pub state: TaskState,
    /// Completed cycles.
    pub cycles: u64,
    /// Summed busy time in microseconds.
    pub runtime_us: u64,
    /// Share of wall time spent in this task, in percent.
    pub cpu_percent: f32,
    /// Fewest free stack words ever reported.
    pub stack_high_water_words: u32,
    /// Deadlines missed.
    pub deadline_misses: u64,
    /// Worst release lateness, in microseconds.
    pub max_lateness_us: u64,
    /// 99th percentile release lateness, in microseconds.
    pub p99_lateness_us: u64,
}

/// Health summary refreshed by the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeapHealth {
    /// Usage level.
    pub level: HeapLevel,
    /// Used share of the heap, in percent.
    pub used_percent: u32,
    /// Tasks currently past their liveness deadline.
    pub stale_tasks: u32,
}

impl Default for HeapHealth {
    fn default() -> Self {
        Self {
            level: HeapLevel::Normal,
            used_percent: 0,
            stale_tasks: 0,
        }
    }
}

/// Everything the tasks share.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemState {
    /// Latest published reading.
    pub sensors: SensorReading,
    /// Latest detector result.
    pub anomalies: AnomalyResult,
    /// Emergency stop flag.
    pub emergency_stop: bool,
    /// Simulated link state.
    pub network_connected: bool,
    /// Per-task figures.
    pub tasks: Vec<TaskStats>,
    /// Stack table and counters.
    pub stack: StackMonitor,
    /// Heap allocation counters.
    pub memory: MemoryStats,
    /// Heap level and liveness summary.
    pub health: HeapHealth,
    /// Idle and power estimate.
    pub power: PowerStats,
    /// Relay counters.
    pub isr: IsrStats,
    /// Transport counters.
    pub network: NetworkStats,
    /// Readiness bookkeeping.
    pub readiness: ReadinessStats,
    /// Sensor readings that did not fit the sensor-data channel in time.
    pub sensor_send_failures: u64,
    /// Alerts that did not fit the alert channel.
    pub alert_backpressure: u64,
    /// Recent scheduling events.
    pub events: EventRing,
}

impl SystemState {
    /// Boot state for a heap of `heap_bytes`.
    #[must_use]
    pub fn new(stack_thresholds: StackThresholds, heap_bytes: usize) -> Self {
        Self {
            sensors: SensorReading::INITIAL,
            anomalies: AnomalyResult::HEALTHY,
            emergency_stop: false,
            network_connected: true,
            tasks: Vec::new(),
            stack: StackMonitor::new(stack_thresholds),
            memory: MemoryStats::for_capacity(heap_bytes),
            health: HeapHealth::default(),
            power: PowerStats::default(),
            isr: IsrStats::default(),
            network: NetworkStats::default(),
            readiness: ReadinessStats::default(),
            sensor_send_failures: 0,
            alert_backpressure: 0,
            events: EventRing::default(),
        }
    }

    /// Append a scheduling event.
    pub fn record_event(&mut self, at: Tick, task: TaskId, kind: EventKind) {
        self.events.push(SchedulingEvent { at, task, kind });
    }

    /// Raise the emergency stop on behalf of `task`.
    ///
    /// The health score is zero for as long as the emergency holds.
    pub fn raise_emergency(&mut self, at: Tick, task: TaskId) {
        self.emergency_stop = true;
        self.anomalies.health_score = 0.0;
        self.record_event(at, task, EventKind::EmergencyRaised);
    }

    /// Publish a detector result, zeroing its health under an emergency.
    pub fn store_anomalies(&mut self, result: AnomalyResult) {
        self.anomalies = result;
        if self.emergency_stop {
            self.anomalies.health_score = 0.0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(ms: u64) -> SchedulingEvent {
        SchedulingEvent {
            at: Tick::from_millis(ms),
            task: TaskId::Safety,
            kind: EventKind::EmergencyRaised,
        }
    }

    #[test]
    fn test_ring_keeps_most_recent() {
        let mut ring = EventRing::default();
        for ms in 0..25 {
            ring.push(event(ms));
        }
        assert_eq!(ring.len(), EVENT_RING_CAPACITY);
        assert_eq!(ring.total(), 25);
        let first = ring.iter().next().map(|e| e.at);
        assert_eq!(first, Some(Tick::from_millis(15)));
        assert_eq!(ring.latest().map(|e| e.at), Some(Tick::from_millis(24)));
    }

    #[test]
    fn test_emergency_zeroes_health() {
        let mut state = SystemState::new(StackThresholds::default(), 1024);
        state.raise_emergency(Tick::from_millis(5), TaskId::Sensor);
        assert!(state.emergency_stop);
        assert!(state.anomalies.health_score.abs() < f32::EPSILON);

        state.store_anomalies(AnomalyResult::HEALTHY);
        assert!(state.anomalies.health_score.abs() < f32::EPSILON);

        state.emergency_stop = false;
        state.store_anomalies(AnomalyResult::HEALTHY);
        assert!((state.anomalies.health_score - 100.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_boot_state() {
        let state = SystemState::new(StackThresholds::default(), 1024);
        assert!(state.network_connected);
        assert!(!state.emergency_stop);
        assert_eq!(state.sensors, SensorReading::INITIAL);
        assert_eq!(state.anomalies, AnomalyResult::HEALTHY);
        assert_eq!(state.memory.current_free, 1024);
        assert!(state.events.is_empty());
    }

    #[test]
    fn test_state_serializes() -> Result<(), Box<dyn std::error::Error>> {
        let mut state = SystemState::new(StackThresholds::default(), 1024);
        state.record_event(
            Tick::from_millis(3),
            TaskId::Network,
            EventKind::DeadlineMissed { late_by_us: 1500 },
        );
        let json = serde_json::to_value(&state)?;
        assert_eq!(
            json.get("network_connected"),
            Some(&serde_json::Value::Bool(true))
        );
        assert_eq!(
            json.pointer("/events/total"),
            Some(&serde_json::json!(1))
        );
        Ok(())
    }
}
