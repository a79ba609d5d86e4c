//! Task cycles driven by hand against a manual clock.
//!
//! Every test builds a fresh context, calls `start`/`run_cycle` directly and
//! inspects the shared state afterwards. Transport timing and failure rolls
//! are pinned through the configuration so outcomes are deterministic.

use rand::SeedableRng;
use rand::rngs::StdRng;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use turbine_monitor::{CycleReport, HaltOnFatal, HealthConfig, HeapLevel, StackProbe};
use turbine_pipeline::{
    AnomalyTask, CycleInfo, DashboardTask, EventKind, MonitorConfig, NetworkConfig,
    NetworkTask, PipelineContext, PipelineError, PipelineTask, SafetyConfig, SafetyTask,
    SensorTask, SimulationConfig, SystemState, TaskFlow,
};
use turbine_scheduler::{Clock, ManualClock};
use turbine_sync::{LockTimeout, ReadyBits};
use turbine_types::{AlertKind, RawSample, SensorReading, TaskId, Tick};

type TestResult = Result<(), Box<dyn std::error::Error>>;

const WAIT: Duration = Duration::from_millis(50);

struct Harness {
    clock: Arc<ManualClock>,
    ctx: PipelineContext,
    probe: StackProbe,
}

impl Harness {
    fn new(config: MonitorConfig) -> Result<Self, PipelineError> {
        let clock = Arc::new(ManualClock::default());
        let ctx = PipelineContext::new(
            config,
            Arc::clone(&clock) as Arc<dyn Clock>,
            Arc::new(HaltOnFatal),
        )?;
        Ok(Self {
            clock,
            ctx,
            probe: StackProbe::anchor(64 * 1024),
        })
    }

    fn cycle(&self, number: u64) -> CycleInfo<'_> {
        CycleInfo {
            number,
            now: self.clock.now(),
            probe: &self.probe,
        }
    }

    fn state(&self) -> Result<SystemState, LockTimeout> {
        self.ctx.state.snapshot(WAIT)
    }

    fn set_sensors(&self, reading: SensorReading) -> Result<(), LockTimeout> {
        self.ctx.state.with_lock(WAIT, |state| state.sensors = reading)
    }
}

fn deterministic_network(failure_rate: f64) -> NetworkConfig {
    NetworkConfig {
        transmission_ms: 0,
        failure_rate,
        reconnect_probability: 1.0,
        ..NetworkConfig::default()
    }
}

fn config_with_network(network: NetworkConfig) -> Result<MonitorConfig, PipelineError> {
    MonitorConfig::builder()
        .with_seed(11)
        .with_network(network)
        .build()
}

fn reading(vibration: f32, temperature: f32) -> SensorReading {
    SensorReading {
        vibration,
        temperature,
        ..SensorReading::INITIAL
    }
}

// ---------------------------------------------------------------------------
// Sensor task
// ---------------------------------------------------------------------------

#[test]
fn test_sensor_task_publishes_and_calibrates() -> TestResult {
    let config = MonitorConfig::builder()
        .with_seed(3)
        .with_simulation(SimulationConfig {
            calibration_cycles: 3,
            ..SimulationConfig::default()
        })
        .build()?;
    let h = Harness::new(config)?;
    let mut task = SensorTask::new(&h.ctx, StdRng::seed_from_u64(3));

    for n in 1..=2 {
        h.clock.advance(Duration::from_millis(100));
        task.run_cycle(&h.ctx, &h.cycle(n));
    }
    assert!(!task.calibrated());
    assert!(!h.ctx.readiness.bits().contains(ReadyBits::SENSORS_CALIBRATED));

    h.clock.advance(Duration::from_millis(100));
    task.run_cycle(&h.ctx, &h.cycle(3));
    assert!(task.calibrated());
    assert!(h.ctx.readiness.bits().contains(ReadyBits::SENSORS_CALIBRATED));

    assert_eq!(h.ctx.sensor_data.len(), 3);
    let state = h.state()?;
    assert_eq!(state.sensors.capture_time, Tick::from_millis(300));
    assert!(!state.emergency_stop);
    assert_eq!(state.sensor_send_failures, 0);
    Ok(())
}

#[test]
fn test_sensor_task_drains_relay_and_raises_emergency() -> TestResult {
    let h = Harness::new(MonitorConfig::builder().with_seed(5).build()?)?;
    let mut task = SensorTask::new(&h.ctx, StdRng::seed_from_u64(5));

    h.ctx.raw_samples.try_send(
        RawSample {
            vibration: 3.0,
            sequence: 0,
            capture_time: Tick::from_millis(0),
        },
        Duration::ZERO,
    )?;
    h.ctx.raw_samples.try_send(
        RawSample {
            vibration: 90.0,
            sequence: 1,
            capture_time: Tick::from_millis(3),
        },
        Duration::ZERO,
    )?;
    h.clock.set(Tick::from_millis(5));
    task.run_cycle(&h.ctx, &h.cycle(1));

    assert!(h.ctx.raw_samples.is_empty());
    let state = h.state()?;
    assert!(state.emergency_stop);
    assert_eq!(state.isr.processed_count, 2);
    assert_eq!(state.isr.emergency_triggers, 1);
    assert_eq!(state.isr.last_min_latency_us, 2_000);
    assert!((state.sensors.vibration - 90.0).abs() < f32::EPSILON);
    let latest = state.events.latest();
    assert_eq!(
        latest.map(|e| (e.task, e.kind)),
        Some((TaskId::Sensor, EventKind::EmergencyRaised))
    );
    Ok(())
}

#[test]
fn test_sensor_task_counts_full_channel() -> TestResult {
    let mut config = MonitorConfig::builder().with_seed(9).build()?;
    config.queues.sensor_data = 1;
    config.locks.sensor_send_timeout_ms = 1;
    let h = Harness::new(config)?;
    let mut task = SensorTask::new(&h.ctx, StdRng::seed_from_u64(9));

    task.run_cycle(&h.ctx, &h.cycle(1));
    task.run_cycle(&h.ctx, &h.cycle(2));

    assert_eq!(h.ctx.sensor_data.len(), 1);
    assert_eq!(h.state()?.sensor_send_failures, 1);
    assert_eq!(h.ctx.sensor_data.stats().send_timeouts, 1);
    Ok(())
}

// ---------------------------------------------------------------------------
// Anomaly task
// ---------------------------------------------------------------------------

fn anomaly_config(window: usize, alert_every_cycles: u32) -> Result<MonitorConfig, PipelineError> {
    let mut config = MonitorConfig::builder().with_seed(1).build()?;
    config.detector.window = window;
    config.detector.alert_every_cycles = alert_every_cycles;
    config.validate()?;
    Ok(config)
}

#[test]
fn test_anomaly_task_alternates_consumption() -> TestResult {
    let h = Harness::new(anomaly_config(4, 2)?)?;
    let mut task = AnomalyTask::new(&h.ctx)?;
    for _ in 0..5 {
        h.ctx.sensor_data.try_send(SensorReading::INITIAL, Duration::ZERO)?;
    }

    task.run_cycle(&h.ctx, &h.cycle(1));
    assert_eq!(task.samples(), 2);
    task.run_cycle(&h.ctx, &h.cycle(2));
    assert_eq!(task.samples(), 3);
    assert!(!task.ready());
    assert!(!h.ctx.readiness.bits().contains(ReadyBits::ANOMALY_READY));

    task.run_cycle(&h.ctx, &h.cycle(3));
    assert_eq!(task.samples(), 5);
    assert!(task.ready());
    assert!(h.ctx.readiness.bits().contains(ReadyBits::ANOMALY_READY));
    assert_eq!(task.evaluations(), 3);

    // Nothing left to consume: no evaluation.
    task.run_cycle(&h.ctx, &h.cycle(4));
    assert_eq!(task.evaluations(), 3);
    Ok(())
}

#[test]
fn test_anomaly_task_raises_vibration_alert() -> TestResult {
    let h = Harness::new(anomaly_config(4, 1)?)?;
    let mut task = AnomalyTask::new(&h.ctx)?;
    for _ in 0..3 {
        h.ctx.sensor_data.try_send(SensorReading::INITIAL, Duration::ZERO)?;
    }
    task.run_cycle(&h.ctx, &h.cycle(1));
    task.run_cycle(&h.ctx, &h.cycle(2));
    assert!(h.ctx.alerts.is_empty());

    h.ctx.sensor_data.try_send(SensorReading::INITIAL, Duration::ZERO)?;
    h.ctx.sensor_data.try_send(reading(12.0, 45.0), Duration::ZERO)?;
    h.clock.set(Tick::from_millis(600));
    task.run_cycle(&h.ctx, &h.cycle(3));

    let state = h.state()?;
    assert!(state.anomalies.vibration_flag);
    assert!(state.anomalies.health_score < 100.0);
    let alert = h.ctx.alerts.try_receive(Duration::ZERO)?;
    assert_eq!(alert.kind, AlertKind::Vibration);
    assert_eq!(alert.raised_at, Tick::from_millis(600));
    Ok(())
}

#[test]
fn test_anomaly_task_counts_alert_backpressure() -> TestResult {
    let mut config = anomaly_config(1, 1)?;
    config.queues.alerts = 1;
    let h = Harness::new(config)?;
    let mut task = AnomalyTask::new(&h.ctx)?;

    for n in 1..=3 {
        h.ctx.sensor_data.try_send(reading(12.0, 45.0), Duration::ZERO)?;
        task.run_cycle(&h.ctx, &h.cycle(n));
    }

    assert_eq!(h.ctx.alerts.len(), 1);
    assert_eq!(h.state()?.alert_backpressure, 2);
    Ok(())
}

#[test]
fn test_anomaly_health_zero_during_emergency() -> TestResult {
    let h = Harness::new(anomaly_config(4, 2)?)?;
    let mut task = AnomalyTask::new(&h.ctx)?;
    h.ctx.state.with_lock(WAIT, |state| state.emergency_stop = true)?;
    h.ctx.sensor_data.try_send(SensorReading::INITIAL, Duration::ZERO)?;

    task.run_cycle(&h.ctx, &h.cycle(1));
    assert!(h.state()?.anomalies.health_score.abs() < f32::EPSILON);
    Ok(())
}

// ---------------------------------------------------------------------------
// Safety task
// ---------------------------------------------------------------------------

fn safety_config(readiness_timeout_ms: Option<u64>) -> Result<MonitorConfig, PipelineError> {
    MonitorConfig::builder()
        .with_seed(2)
        .with_safety(SafetyConfig {
            readiness_timeout_ms,
            ..SafetyConfig::default()
        })
        .build()
}

#[test]
fn test_safety_start_waits_for_all_bits() -> TestResult {
    let h = Harness::new(safety_config(Some(1_000))?)?;
    let mut task = SafetyTask::new(&h.ctx);
    let _bits = h
        .ctx
        .readiness
        .set(ReadyBits::SENSORS_CALIBRATED | ReadyBits::ANOMALY_READY);
    h.clock.set(Tick::from_millis(2_500));

    assert_eq!(task.start(&h.ctx), TaskFlow::Continue);
    let state = h.state()?;
    assert_eq!(state.readiness.system_ready_at, Some(Tick::from_millis(2_500)));
    assert_eq!(state.readiness.wait_ops, 1);
    assert_eq!(state.events.latest().map(|e| e.kind), Some(EventKind::SystemReady));
    Ok(())
}

#[test]
fn test_safety_start_continues_after_timeout() -> TestResult {
    let h = Harness::new(safety_config(Some(5))?)?;
    let mut task = SafetyTask::new(&h.ctx);

    assert_eq!(task.start(&h.ctx), TaskFlow::Continue);
    assert_eq!(h.state()?.readiness.system_ready_at, None);
    assert_eq!(h.ctx.readiness.stats().wait_timeouts, 1);
    Ok(())
}

#[test]
fn test_safety_start_stops_when_cancelled() -> TestResult {
    let h = Harness::new(safety_config(None)?)?;
    let mut task = SafetyTask::new(&h.ctx);
    h.ctx.readiness.cancel();

    assert_eq!(task.start(&h.ctx), TaskFlow::Stop);
    assert!(h.state()?.events.is_empty());
    Ok(())
}

#[test]
fn test_single_alarm_does_not_raise_emergency() -> TestResult {
    let h = Harness::new(safety_config(None)?)?;
    let mut task = SafetyTask::new(&h.ctx);
    h.set_sensors(reading(11.0, 45.0))?;

    task.run_cycle(&h.ctx, &h.cycle(1));
    assert_eq!(task.alarms().count(), 1);
    assert_eq!(task.alarm_edges(), 1);
    assert!(!h.state()?.emergency_stop);
    Ok(())
}

#[test]
fn test_emergency_held_for_dwell_then_cleared() -> TestResult {
    let h = Harness::new(safety_config(None)?)?;
    let mut task = SafetyTask::new(&h.ctx);

    h.clock.set(Tick::from_millis(1_000));
    h.set_sensors(reading(11.0, 90.0))?;
    task.run_cycle(&h.ctx, &h.cycle(1));
    assert!(h.state()?.emergency_stop);
    assert_eq!(task.raised_at(), Some(Tick::from_millis(1_000)));

    // Conditions recover, but the dwell has not elapsed.
    h.set_sensors(SensorReading::INITIAL)?;
    h.clock.advance(Duration::from_millis(4_000));
    task.run_cycle(&h.ctx, &h.cycle(2));
    assert!(h.state()?.emergency_stop);

    h.clock.advance(Duration::from_millis(1_000));
    task.run_cycle(&h.ctx, &h.cycle(3));
    let state = h.state()?;
    assert!(!state.emergency_stop);
    assert_eq!(task.raised_at(), None);
    let kinds: Vec<EventKind> = state.events.iter().map(|e| e.kind).collect();
    assert_eq!(kinds, vec![EventKind::EmergencyRaised, EventKind::EmergencyCleared]);
    Ok(())
}

#[test]
fn test_emergency_stays_while_alarms_persist() -> TestResult {
    let h = Harness::new(safety_config(None)?)?;
    let mut task = SafetyTask::new(&h.ctx);
    h.set_sensors(reading(11.0, 90.0))?;

    task.run_cycle(&h.ctx, &h.cycle(1));
    h.clock.advance(Duration::from_secs(60));
    task.run_cycle(&h.ctx, &h.cycle(2));

    let state = h.state()?;
    assert!(state.emergency_stop);
    assert_eq!(state.events.total(), 1);
    Ok(())
}

#[test]
fn test_emergency_from_safety_zeroes_health() -> TestResult {
    let h = Harness::new(safety_config(None)?)?;
    let mut anomaly = AnomalyTask::new(&h.ctx)?;
    let mut safety = SafetyTask::new(&h.ctx);

    h.ctx.sensor_data.try_send(SensorReading::INITIAL, Duration::ZERO)?;
    anomaly.run_cycle(&h.ctx, &h.cycle(1));
    assert!((h.state()?.anomalies.health_score - 100.0).abs() < f32::EPSILON);

    h.set_sensors(reading(11.0, 90.0))?;
    safety.run_cycle(&h.ctx, &h.cycle(1));
    let state = h.state()?;
    assert!(state.emergency_stop);
    assert!(state.anomalies.health_score.abs() < f32::EPSILON);

    // A later evaluation publishes under the emergency, still at zero.
    h.ctx.sensor_data.try_send(SensorReading::INITIAL, Duration::ZERO)?;
    anomaly.run_cycle(&h.ctx, &h.cycle(2));
    assert!(h.state()?.anomalies.health_score.abs() < f32::EPSILON);
    Ok(())
}

#[test]
fn test_safety_adopts_emergency_raised_elsewhere() -> TestResult {
    let h = Harness::new(safety_config(None)?)?;
    let mut task = SafetyTask::new(&h.ctx);
    h.ctx.state.with_lock(WAIT, |state| state.emergency_stop = true)?;
    h.clock.set(Tick::from_millis(200));

    task.run_cycle(&h.ctx, &h.cycle(1));
    assert_eq!(task.raised_at(), Some(Tick::from_millis(200)));
    assert!(h.state()?.emergency_stop);

    h.clock.advance(Duration::from_millis(5_000));
    task.run_cycle(&h.ctx, &h.cycle(2));
    assert!(!h.state()?.emergency_stop);
    Ok(())
}

#[test]
fn test_lowered_thresholds_apply_next_cycle() -> TestResult {
    let h = Harness::new(safety_config(None)?)?;
    let mut task = SafetyTask::new(&h.ctx);
    h.set_sensors(reading(8.0, 80.0))?;

    task.run_cycle(&h.ctx, &h.cycle(1));
    assert_eq!(task.alarms().count(), 0);

    let mut tighter = h.ctx.config.thresholds;
    tighter.vibration_crit = 7.0;
    tighter.temp_crit = 75.0;
    h.ctx.set_thresholds(tighter)?;
    task.run_cycle(&h.ctx, &h.cycle(2));
    assert_eq!(task.alarms().count(), 2);
    assert!(h.state()?.emergency_stop);
    Ok(())
}

// ---------------------------------------------------------------------------
// Network task
// ---------------------------------------------------------------------------

#[test]
fn test_network_delivers_and_forwards_alerts() -> TestResult {
    let h = Harness::new(config_with_network(deterministic_network(0.0))?)?;
    let mut task = NetworkTask::new(&h.ctx, StdRng::seed_from_u64(4));
    let heap_bytes = h.ctx.heap.free_bytes();

    h.ctx.alerts.try_send(
        turbine_types::AlertMessage {
            severity: AlertKind::Vibration.severity(),
            kind: AlertKind::Vibration,
            raised_at: Tick::ZERO,
        },
        Duration::ZERO,
    )?;
    task.run_cycle(&h.ctx, &h.cycle(1));
    task.run_cycle(&h.ctx, &h.cycle(10));

    let state = h.state()?;
    assert_eq!(state.network.packets_sent, 2);
    assert_eq!(state.network.packets_failed, 0);
    assert_eq!(state.network.alerts_forwarded, 1);
    assert!(state.network.bytes_sent > 2 * 16);
    assert_eq!(state.memory.allocations, 2);
    assert_eq!(state.memory.deallocations, 2);
    assert_eq!(state.memory.active_allocations, 0);
    assert_eq!(h.ctx.heap.free_bytes(), heap_bytes);
    assert!(h.ctx.alerts.is_empty());
    Ok(())
}

#[test]
fn test_network_failure_disconnects_and_reconnects() -> TestResult {
    let h = Harness::new(config_with_network(deterministic_network(1.0))?)?;
    let mut task = NetworkTask::new(&h.ctx, StdRng::seed_from_u64(4));

    task.run_cycle(&h.ctx, &h.cycle(1));
    let state = h.state()?;
    assert!(!state.network_connected);
    assert_eq!(state.network.packets_failed, 1);
    assert!(!h.ctx.readiness.bits().contains(ReadyBits::NETWORK_CONNECTED));
    assert_eq!(state.events.latest().map(|e| e.kind), Some(EventKind::NetworkLost));

    // Reconnect always succeeds, the transmission after it fails again.
    task.run_cycle(&h.ctx, &h.cycle(2));
    let state = h.state()?;
    assert_eq!(state.network.reconnect_attempts, 1);
    assert_eq!(state.network.packets_failed, 2);
    let kinds: Vec<EventKind> = state.events.iter().map(|e| e.kind).collect();
    assert_eq!(
        kinds,
        vec![EventKind::NetworkLost, EventKind::NetworkRestored, EventKind::NetworkLost]
    );
    Ok(())
}

#[test]
fn test_network_stays_down_when_reconnect_fails() -> TestResult {
    let network = NetworkConfig {
        reconnect_probability: 0.0,
        ..deterministic_network(1.0)
    };
    let h = Harness::new(config_with_network(network)?)?;
    let mut task = NetworkTask::new(&h.ctx, StdRng::seed_from_u64(4));

    for n in 1..=4 {
        task.run_cycle(&h.ctx, &h.cycle(n));
    }
    let state = h.state()?;
    assert!(!state.network_connected);
    assert_eq!(state.network.packets_failed, 1);
    assert_eq!(state.network.reconnect_attempts, 3);
    Ok(())
}

#[test]
fn test_network_skips_cycle_when_heap_exhausted() -> TestResult {
    let config = MonitorConfig::builder()
        .with_seed(1)
        .with_network(deterministic_network(0.0))
        .with_health(HealthConfig {
            heap_bytes: 32,
            ..HealthConfig::default()
        })
        .build()?;
    let h = Harness::new(config)?;
    let mut task = NetworkTask::new(&h.ctx, StdRng::seed_from_u64(4));

    task.run_cycle(&h.ctx, &h.cycle(1));
    let state = h.state()?;
    assert_eq!(state.network.allocation_skips, 1);
    assert_eq!(state.network.packets_sent, 0);
    assert_eq!(state.memory.allocation_failures, 1);
    assert!(state.network_connected);
    Ok(())
}

#[test]
fn test_network_heap_stats_consistent_under_lock_contention() -> TestResult {
    let network = NetworkConfig {
        transmission_ms: 200,
        ..deterministic_network(0.0)
    };
    let h = Harness::new(config_with_network(network)?)?;
    let mut task = NetworkTask::new(&h.ctx, StdRng::seed_from_u64(4));
    let heap_bytes = h.ctx.heap.free_bytes();
    let ctx = &h.ctx;

    // The state lock is taken mid-transmission and held past the release.
    thread::scope(|scope| -> TestResult {
        let holder = scope.spawn(move || {
            thread::sleep(Duration::from_millis(50));
            ctx.state.with_lock(Duration::from_secs(1), |_| {
                thread::sleep(Duration::from_millis(300));
            })
        });
        task.run_cycle(ctx, &h.cycle(2));
        holder
            .join()
            .map_err(|e| format!("lock holder panicked: {e:?}"))??;
        Ok(())
    })?;

    let state = h.state()?;
    assert_eq!(state.memory.allocations, 1);
    assert_eq!(state.memory.deallocations, 0);
    assert_eq!(task.unrecorded_frees(), 1);
    assert_eq!(h.ctx.heap.free_bytes(), heap_bytes);

    // The next cycle settles the missed release before allocating again.
    task.run_cycle(&h.ctx, &h.cycle(3));
    let state = h.state()?;
    assert_eq!(task.unrecorded_frees(), 0);
    assert_eq!(state.memory.allocations, 2);
    assert_eq!(state.memory.deallocations, 2);
    assert_eq!(state.memory.active_allocations, 0);
    assert_eq!(state.memory.bytes_allocated, 0);
    assert!(state.memory.deallocations <= state.memory.allocations);
    Ok(())
}

#[test]
fn test_network_allocates_nothing_while_state_locked() -> TestResult {
    let h = Harness::new(config_with_network(deterministic_network(0.0))?)?;
    let mut task = NetworkTask::new(&h.ctx, StdRng::seed_from_u64(4));
    let heap_bytes = h.ctx.heap.free_bytes();

    let free_during = h.ctx.state.with_lock(WAIT, |_| {
        task.run_cycle(&h.ctx, &h.cycle(1));
        h.ctx.heap.free_bytes()
    })?;
    assert_eq!(free_during, heap_bytes);

    let state = h.state()?;
    assert_eq!(state.memory.allocations, 0);
    assert_eq!(state.memory.deallocations, 0);
    assert_eq!(state.network.packets_sent, 0);
    Ok(())
}

// ---------------------------------------------------------------------------
// Dashboard task
// ---------------------------------------------------------------------------

#[test]
fn test_dashboard_folds_counters_into_state() -> TestResult {
    let h = Harness::new(MonitorConfig::builder().with_seed(1).build()?)?;
    let mut task = DashboardTask::new();

    h.clock.set(Tick::from_millis(1_000));
    h.ctx.registry.record_cycle(
        TaskId::Sensor,
        CycleReport {
            busy: Duration::from_millis(100),
            finished_at: h.clock.now(),
            free_stack_words: 30_000,
            parked: true,
        },
    );
    h.ctx.registry.record_deadline_miss(TaskId::Sensor);
    task.run_cycle(&h.ctx, &h.cycle(1));

    let state = h.state()?;
    assert_eq!(state.tasks.len(), 5);
    let sensor = state.tasks.iter().find(|t| t.task == TaskId::Sensor);
    assert_eq!(sensor.map(|t| t.cycles), Some(1));
    assert_eq!(sensor.map(|t| t.deadline_misses), Some(1));
    let cpu = sensor.map_or(0.0, |t| t.cpu_percent);
    assert!((cpu - 10.0).abs() < 0.01, "cpu {cpu}");

    let entry = state.stack.entry("SensorTask");
    assert_eq!(entry.map(|e| e.current_free_words), Some(30_000));
    assert_eq!(state.stack.stats().proactive_checks, 5);
    assert_eq!(state.health.level, HeapLevel::Normal);
    assert_eq!(state.health.stale_tasks, 0);
    assert!(state.readiness.bits.contains(ReadyBits::NETWORK_CONNECTED));
    Ok(())
}

#[test]
fn test_dashboard_reports_stale_tasks() -> TestResult {
    let h = Harness::new(MonitorConfig::builder().with_seed(1).build()?)?;
    let mut task = DashboardTask::new();

    h.clock.set(Tick::from_millis(6_000));
    task.run_cycle(&h.ctx, &h.cycle(1));
    assert_eq!(h.state()?.health.stale_tasks, 5);
    Ok(())
}
