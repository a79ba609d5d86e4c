//! Simulated nacelle sensors.
//!
//! Temperature, rotor speed and generator current are generated here; the
//! vibration channel follows the latest relay sample when one arrived and
//! otherwise keeps its own drifting value. Every `scenario_every` cycles the
//! simulator may pick new drift targets and may inject a vibration step so
//! the detector has something to find.

use crate::config::SimulationConfig;
use rand::Rng;
use rand::rngs::StdRng;
use turbine_types::{SensorReading, Tick};

const BASE_VIBRATION: f32 = 2.5;
const BASE_TEMPERATURE: f32 = 45.0;
const BASE_RPM: f32 = 20.0;

const VIBRATION_DRIFT_RATE: f32 = 0.02;
const TEMPERATURE_DRIFT_RATE: f32 = 0.01;

const TEMPERATURE_NOISE: f32 = 0.1;
const RPM_NOISE: f32 = 0.5;
const CURRENT_NOISE: f32 = 2.0;

/// Seedable sensor model advanced once per sensor cycle.
#[derive(Debug, Clone)]
pub struct SensorSimulator {
    config: SimulationConfig,
    rng: StdRng,
    cycle: u64,
    vibration: f32,
    temperature: f32,
    rpm: f32,
    current: f32,
    target_vibration: f32,
    target_temperature: f32,
    steps_injected: u64,
}

impl SensorSimulator {
    /// Create a simulator drawing from `rng`.
    #[must_use]
    pub fn new(config: SimulationConfig, rng: StdRng) -> Self {
        Self {
            config,
            rng,
            cycle: 0,
            vibration: BASE_VIBRATION,
            temperature: BASE_TEMPERATURE,
            rpm: BASE_RPM,
            current: current_for(BASE_RPM),
            target_vibration: BASE_VIBRATION,
            target_temperature: BASE_TEMPERATURE,
            steps_injected: 0,
        }
    }

    /// Produce the reading for the next cycle, then advance the model.
    ///
    /// `relay_vibration` is the newest relay sample drained this cycle.
    pub fn step(&mut self, relay_vibration: Option<f32>, now: Tick) -> SensorReading {
        self.cycle = self.cycle.saturating_add(1);
        if let Some(vibration) = relay_vibration {
            self.vibration = vibration;
        }

        let reading = SensorReading {
            vibration: self.vibration,
            temperature: self.noisy(self.temperature, TEMPERATURE_NOISE),
            rpm: self.noisy(self.rpm, RPM_NOISE),
            current: self.noisy(self.current, CURRENT_NOISE),
            capture_time: now,
        };

        let scenario_point = self.cycle.is_multiple_of(self.config.scenario_every.max(1));
        if scenario_point && self.rng.random_bool(self.config.target_change_probability) {
            self.target_vibration = 1.0 + f32::from(self.rng.random_range(0u8..80)) / 10.0;
            self.target_temperature = 40.0 + f32::from(self.rng.random_range(0u16..400)) / 10.0;
            tracing::debug!(
                cycle = self.cycle,
                target_vibration = self.target_vibration,
                target_temperature = self.target_temperature,
                "new drift targets"
            );
        }

        self.vibration = drift(self.vibration, self.target_vibration, VIBRATION_DRIFT_RATE);
        self.temperature = drift(
            self.temperature,
            self.target_temperature,
            TEMPERATURE_DRIFT_RATE,
        );

        if scenario_point && self.rng.random_bool(self.config.vibration_step_probability) {
            self.vibration += self.config.vibration_step;
            self.steps_injected = self.steps_injected.saturating_add(1);
            tracing::debug!(
                cycle = self.cycle,
                vibration = self.vibration,
                "vibration step injected"
            );
        }

        self.rpm = rpm_at(self.cycle);
        self.current = current_for(self.rpm);

        reading
    }

    /// Vibration the model holds after the latest step.
    #[must_use]
    pub fn vibration(&self) -> f32 {
        self.vibration
    }

    /// Cycles simulated so far.
    #[must_use]
    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    /// Whether enough cycles have passed for the sensors to count as calibrated.
    #[must_use]
    pub fn calibrated(&self) -> bool {
        self.cycle >= self.config.calibration_cycles
    }

    /// Vibration steps injected so far.
    #[must_use]
    pub fn steps_injected(&self) -> u64 {
        self.steps_injected
    }

    fn noisy(&mut self, base: f32, level: f32) -> f32 {
        base + self.rng.random_range(-level..=level)
    }
}

fn drift(current: f32, target: f32, rate: f32) -> f32 {
    current + (target - current) * rate
}

/// Generator current tracks rotor speed.
fn current_for(rpm: f32) -> f32 {
    40.0 + rpm * 2.0
}

/// Rotor speed on a slow sinusoid between 15 and 25 rpm.
#[expect(
    clippy::cast_precision_loss,
    reason = "cycle counts stay far below f32 precision limits in any realistic run"
)]
fn rpm_at(cycle: u64) -> f32 {
    let phase = (cycle as f32 * 0.01).sin() * 0.5 + 0.5;
    15.0 + phase * 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn simulator(seed: u64) -> SensorSimulator {
        SensorSimulator::new(SimulationConfig::default(), StdRng::seed_from_u64(seed))
    }

    #[test]
    fn test_relay_vibration_is_published() {
        let mut sim = simulator(1);
        let reading = sim.step(Some(7.5), Tick::from_millis(100));
        assert!((reading.vibration - 7.5).abs() < f32::EPSILON);
        assert_eq!(reading.capture_time, Tick::from_millis(100));
    }

    #[test]
    fn test_channels_stay_in_range() {
        let mut sim = simulator(9);
        for cycle in 0..1_000u64 {
            let reading = sim.step(None, Tick::from_millis(cycle * 100));
            assert!((14.5..=25.5).contains(&reading.rpm), "rpm {}", reading.rpm);
            assert!((68.0..=92.0).contains(&reading.current), "current {}", reading.current);
            assert!(
                (39.5..=80.5).contains(&reading.temperature),
                "temperature {}",
                reading.temperature
            );
            assert!(reading.vibration.is_finite());
        }
    }

    #[test]
    fn test_calibration_after_configured_cycles() {
        let mut sim = simulator(3);
        for _ in 0..19 {
            let _reading = sim.step(None, Tick::ZERO);
        }
        assert!(!sim.calibrated());
        let _reading = sim.step(None, Tick::ZERO);
        assert!(sim.calibrated());
        assert_eq!(sim.cycle(), 20);
    }

    #[test]
    fn test_same_seed_same_readings() {
        let mut a = simulator(42);
        let mut b = simulator(42);
        for cycle in 0..200u64 {
            let now = Tick::from_millis(cycle);
            assert_eq!(a.step(None, now), b.step(None, now));
        }
    }

    #[test]
    fn test_certain_step_injection() {
        let config = SimulationConfig {
            scenario_every: 5,
            target_change_probability: 0.0,
            vibration_step_probability: 1.0,
            ..SimulationConfig::default()
        };
        let mut sim = SensorSimulator::new(config, StdRng::seed_from_u64(0));
        for _ in 0..4 {
            let _reading = sim.step(None, Tick::ZERO);
        }
        let before = sim.vibration();
        let _reading = sim.step(None, Tick::ZERO);
        assert_eq!(sim.steps_injected(), 1);
        assert!(sim.vibration() > before + 2.5);
    }

    #[test]
    fn test_vibration_drifts_toward_target() {
        let config = SimulationConfig {
            target_change_probability: 0.0,
            vibration_step_probability: 0.0,
            ..SimulationConfig::default()
        };
        let mut sim = SensorSimulator::new(config, StdRng::seed_from_u64(5));
        let _reading = sim.step(Some(12.5), Tick::ZERO);
        let first = sim.vibration();
        for _ in 0..100 {
            let _reading = sim.step(None, Tick::ZERO);
        }
        assert!(first < 12.5);
        assert!(sim.vibration() < first);
        assert!(sim.vibration() > BASE_VIBRATION);
    }
}
