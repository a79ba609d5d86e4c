//! Runtime configuration.
//!
//! Every section has serde defaults, so a JSON file only needs the values it
//! changes. [`MonitorConfig::validate`] runs the section validators in turn
//! and is called by [`MonitorConfigBuilder::build`] and by the runtime before
//! any thread is spawned.

use crate::error::{PipelineError, PipelineResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use turbine_anomaly::DetectorConfig;
use turbine_monitor::HealthConfig;
use turbine_types::{TaskId, ThresholdConfig};

/// Task periods in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PeriodConfig {
    /// Safety task.
    pub safety_ms: u64,
    /// Sensor task.
    pub sensor_ms: u64,
    /// Anomaly task.
    pub anomaly_ms: u64,
    /// Network task.
    pub network_ms: u64,
    /// Dashboard task.
    pub dashboard_ms: u64,
    /// Interrupt relay timer.
    pub interrupt_ms: u64,
}

impl Default for PeriodConfig {
    fn default() -> Self {
        Self {
            safety_ms: 50,
            sensor_ms: 100,
            anomaly_ms: 200,
            network_ms: 1000,
            dashboard_ms: 1000,
            interrupt_ms: 10,
        }
    }
}

impl PeriodConfig {
    /// Period of `task`.
    #[must_use]
    pub fn period(&self, task: TaskId) -> Duration {
        Duration::from_millis(match task {
            TaskId::Safety => self.safety_ms,
            TaskId::Sensor => self.sensor_ms,
            TaskId::Anomaly => self.anomaly_ms,
            TaskId::Network => self.network_ms,
            TaskId::Dashboard => self.dashboard_ms,
            TaskId::Interrupt => self.interrupt_ms,
        })
    }
}

/// Channel capacities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    /// Relay to sensor task.
    pub raw_samples: usize,
    /// Sensor task to anomaly task.
    pub sensor_data: usize,
    /// Anomaly task to network task.
    pub alerts: usize,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            raw_samples: 10,
            sensor_data: 10,
            alerts: 5,
        }
    }
}

/// Bounded waits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LockConfig {
    /// Longest wait for either state lock.
    pub state_timeout_ms: u64,
    /// Longest wait for space on the sensor-data channel.
    pub sensor_send_timeout_ms: u64,
    /// Longest wait for the final snapshot.
    pub snapshot_timeout_ms: u64,
}

impl Default for LockConfig {
    fn default() -> Self {
        Self {
            state_timeout_ms: 10,
            sensor_send_timeout_ms: 10,
            snapshot_timeout_ms: 100,
        }
    }
}

impl LockConfig {
    /// State lock timeout.
    #[must_use]
    pub fn state_timeout(&self) -> Duration {
        Duration::from_millis(self.state_timeout_ms)
    }
}

/// Safety task settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SafetyConfig {
    /// Minimum time an emergency stop stays raised.
    pub emergency_dwell_ms: u64,
    /// Simultaneous critical alarms that raise the emergency stop.
    pub alarms_for_emergency: u32,
    /// Longest wait for every readiness bit; `None` waits until shutdown.
    pub readiness_timeout_ms: Option<u64>,
}

impl Default for SafetyConfig {
    fn default() -> Self {
        Self {
            emergency_dwell_ms: 5000,
            alarms_for_emergency: 2,
            readiness_timeout_ms: None,
        }
    }
}

/// Simulated transport.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Time one transmission takes.
    pub transmission_ms: u64,
    /// Probability that a transmission fails.
    pub failure_rate: f64,
    /// Probability that a reconnect attempt succeeds.
    pub reconnect_probability: f64,
    /// Every n-th network cycle sends a heartbeat.
    pub heartbeat_every: u64,
    /// Header bytes added to every packet.
    pub header_bytes: usize,
    /// Heartbeat body size.
    pub heartbeat_body_bytes: usize,
    /// Sensor data body size.
    pub sensor_body_bytes: usize,
    /// Anomaly report body size.
    pub anomaly_body_bytes: usize,
    /// Health score below which an anomaly report is sent.
    pub report_below_health: f32,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            transmission_ms: 50,
            failure_rate: 0.05,
            reconnect_probability: 0.5,
            heartbeat_every: 10,
            header_bytes: 16,
            heartbeat_body_bytes: 64,
            sensor_body_bytes: 256,
            anomaly_body_bytes: 512,
            report_below_health: 50.0,
        }
    }
}

/// Thread stack sizes in words.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StackConfig {
    /// Safety task.
    pub safety_words: u32,
    /// Sensor task.
    pub sensor_words: u32,
    /// Anomaly task.
    pub anomaly_words: u32,
    /// Network task.
    pub network_words: u32,
    /// Dashboard task.
    pub dashboard_words: u32,
    /// Interrupt relay thread.
    pub interrupt_words: u32,
}

impl Default for StackConfig {
    fn default() -> Self {
        Self {
            safety_words: 32 * 1024,
            sensor_words: 32 * 1024,
            anomaly_words: 64 * 1024,
            network_words: 64 * 1024,
            dashboard_words: 64 * 1024,
            interrupt_words: 16 * 1024,
        }
    }
}

impl StackConfig {
    /// Stack size of `task` in words.
    #[must_use]
    pub fn words(&self, task: TaskId) -> u32 {
        match task {
            TaskId::Safety => self.safety_words,
            TaskId::Sensor => self.sensor_words,
            TaskId::Anomaly => self.anomaly_words,
            TaskId::Network => self.network_words,
            TaskId::Dashboard => self.dashboard_words,
            TaskId::Interrupt => self.interrupt_words,
        }
    }
}

/// Sensor simulation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Seed for every random source; `None` draws one at start-up.
    pub seed: Option<u64>,
    /// Sensor cycles before calibration completes.
    pub calibration_cycles: u64,
    /// Raw vibration above which the sensor task raises the emergency stop.
    pub isr_emergency_vibration: f32,
    /// Sensor cycles between target changes and fault injections.
    pub scenario_every: u64,
    /// Probability of new drift targets at a scenario point.
    pub target_change_probability: f64,
    /// Probability of a vibration step at a scenario point.
    pub vibration_step_probability: f64,
    /// Size of the injected vibration step.
    pub vibration_step: f32,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            seed: None,
            calibration_cycles: 20,
            isr_emergency_vibration: 80.0,
            scenario_every: 50,
            target_change_probability: 0.3,
            vibration_step_probability: 0.4,
            vibration_step: 3.0,
        }
    }
}

/// Complete runtime configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Task periods.
    pub periods: PeriodConfig,
    /// Channel capacities.
    pub queues: QueueConfig,
    /// Bounded waits.
    pub locks: LockConfig,
    /// Safety task.
    pub safety: SafetyConfig,
    /// Alarm thresholds.
    pub thresholds: ThresholdConfig,
    /// Anomaly detector.
    pub detector: DetectorConfig,
    /// Simulated transport.
    pub network: NetworkConfig,
    /// Thread stacks.
    pub stacks: StackConfig,
    /// Sensor simulation.
    pub simulation: SimulationConfig,
    /// Health monitors.
    pub health: HealthConfig,
}

fn probability(name: &str, value: f64) -> PipelineResult<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(PipelineError::invalid_config(format!(
            "{name} must be within 0..=1, got {value}"
        )))
    }
}

impl MonitorConfig {
    /// Start a builder from the defaults.
    #[must_use]
    pub fn builder() -> MonitorConfigBuilder {
        MonitorConfigBuilder::default()
    }

    /// Validate every section.
    ///
    /// # Errors
    ///
    /// Returns the first problem found.
    pub fn validate(&self) -> PipelineResult<()> {
        for task in TaskId::APPLICATION.into_iter().chain([TaskId::Interrupt]) {
            if self.periods.period(task).is_zero() {
                return Err(PipelineError::invalid_config(format!(
                    "period of {task} must be greater than 0"
                )));
            }
            if self.stacks.words(task) == 0 {
                return Err(PipelineError::invalid_config(format!(
                    "stack of {task} must be greater than 0"
                )));
            }
        }
        if self.queues.raw_samples == 0 || self.queues.sensor_data == 0 || self.queues.alerts == 0
        {
            return Err(PipelineError::invalid_config(
                "queue capacities must be greater than 0",
            ));
        }
        if self.locks.state_timeout_ms == 0 {
            return Err(PipelineError::invalid_config(
                "locks.state_timeout_ms must be greater than 0",
            ));
        }
        if self.safety.alarms_for_emergency == 0 {
            return Err(PipelineError::invalid_config(
                "safety.alarms_for_emergency must be greater than 0",
            ));
        }
        if self.network.heartbeat_every == 0 {
            return Err(PipelineError::invalid_config(
                "network.heartbeat_every must be greater than 0",
            ));
        }
        probability("network.failure_rate", self.network.failure_rate)?;
        probability(
            "network.reconnect_probability",
            self.network.reconnect_probability,
        )?;
        probability(
            "simulation.target_change_probability",
            self.simulation.target_change_probability,
        )?;
        probability(
            "simulation.vibration_step_probability",
            self.simulation.vibration_step_probability,
        )?;
        if self.simulation.scenario_every == 0 {
            return Err(PipelineError::invalid_config(
                "simulation.scenario_every must be greater than 0",
            ));
        }
        if !self.simulation.isr_emergency_vibration.is_finite() {
            return Err(PipelineError::invalid_config(
                "simulation.isr_emergency_vibration must be finite",
            ));
        }
        self.thresholds.validate()?;
        self.detector.validate()?;
        self.health.validate()?;
        Ok(())
    }
}

/// Builder for [`MonitorConfig`].
#[derive(Debug, Clone, Default)]
pub struct MonitorConfigBuilder {
    config: MonitorConfig,
}

impl MonitorConfigBuilder {
    /// Start from an existing configuration.
    #[must_use]
    pub fn from_config(config: MonitorConfig) -> Self {
        Self { config }
    }

    /// Set the random seed.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.config.simulation.seed = Some(seed);
        self
    }

    /// Replace the task periods.
    #[must_use]
    pub fn with_periods(mut self, periods: PeriodConfig) -> Self {
        self.config.periods = periods;
        self
    }

    /// Replace the channel capacities.
    #[must_use]
    pub fn with_queues(mut self, queues: QueueConfig) -> Self {
        self.config.queues = queues;
        self
    }

    /// Replace the safety settings.
    #[must_use]
    pub fn with_safety(mut self, safety: SafetyConfig) -> Self {
        self.config.safety = safety;
        self
    }

    /// Replace the alarm thresholds.
    #[must_use]
    pub fn with_thresholds(mut self, thresholds: ThresholdConfig) -> Self {
        self.config.thresholds = thresholds;
        self
    }

    /// Replace the transport settings.
    #[must_use]
    pub fn with_network(mut self, network: NetworkConfig) -> Self {
        self.config.network = network;
        self
    }

    /// Replace the simulation settings, keeping the seed if `simulation` has none.
    #[must_use]
    pub fn with_simulation(mut self, simulation: SimulationConfig) -> Self {
        let seed = simulation.seed.or(self.config.simulation.seed);
        self.config.simulation = SimulationConfig { seed, ..simulation };
        self
    }

    /// Replace the health monitor settings.
    #[must_use]
    pub fn with_health(mut self, health: HealthConfig) -> Self {
        self.config.health = health;
        self
    }

    /// Validate and return the configuration.
    ///
    /// # Errors
    ///
    /// Returns the first validation failure.
    pub fn build(self) -> PipelineResult<MonitorConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
