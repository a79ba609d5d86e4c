//! End-to-end detector scenarios over realistic reading streams.

use approx::assert_abs_diff_eq;
use turbine_anomaly::prelude::*;
use turbine_types::{AlertKind, SensorReading, ThresholdConfig, Tick};

type TestResult = Result<(), Box<dyn std::error::Error>>;

struct Harness {
    history: SensorHistory,
    detector: StatisticalDetector,
    ctx: DetectionContext,
}

impl Harness {
    fn new() -> Result<Self, DetectorError> {
        let config = DetectorConfig::default();
        Ok(Self {
            history: SensorHistory::with_capacity(config.history_len)?,
            detector: StatisticalDetector::new(config)?,
            ctx: DetectionContext {
                thresholds: ThresholdConfig::default(),
                emergency: false,
            },
        })
    }

    fn feed(&mut self, reading: SensorReading) -> turbine_types::AnomalyResult {
        self.history.push(&reading);
        self.detector.evaluate(&self.history.window(), &self.ctx)
    }
}

fn steady(vibration: f32) -> SensorReading {
    SensorReading {
        vibration,
        temperature: 50.0,
        rpm: 20.0,
        current: 80.0,
        capture_time: Tick::ZERO,
    }
}

#[test]
fn test_spike_after_steady_stream_flags_vibration() -> TestResult {
    let mut harness = Harness::new()?;
    for _ in 0..25 {
        let result = harness.feed(steady(2.5));
        assert!(!result.vibration_flag);
    }
    let spike = harness.feed(steady(9.0));
    assert!(spike.vibration_flag);
    assert!(!spike.temperature_flag);
    assert!(!spike.rpm_flag);
    assert!(spike.health_score < 100.0);
    assert!(spike.health_score >= 70.0);
    Ok(())
}

#[test]
fn test_large_inputs_ignored_until_twenty_samples() -> TestResult {
    let mut harness = Harness::new()?;
    for i in 0..19u8 {
        let result = harness.feed(SensorReading {
            vibration: 500.0 * f32::from(i),
            temperature: 200.0,
            rpm: 0.0,
            current: 1_000.0,
            capture_time: Tick::ZERO,
        });
        assert!(!result.any_flag(), "sample {i}");
    }
    Ok(())
}

#[test]
fn test_gradual_drift_stays_healthy() -> TestResult {
    let mut harness = Harness::new()?;
    let mut last = None;
    for i in 0..150u16 {
        let reading = SensorReading {
            vibration: 2.0 + f32::from(i % 10) * 0.05,
            temperature: 45.0 + f32::from(i % 7) * 0.1,
            rpm: 20.0 + f32::from(i % 5) * 0.2,
            current: 80.0,
            capture_time: Tick::from_millis(u64::from(i) * 200),
        };
        last = Some(harness.feed(reading));
    }
    let last = last.ok_or("no evaluation")?;
    assert!(!last.vibration_flag);
    assert!(!last.temperature_flag);
    assert!(last.health_score > 0.0);
    Ok(())
}

#[test]
fn test_penalty_weights_cap_total_loss() -> TestResult {
    let mut harness = Harness::new()?;
    for _ in 0..30 {
        harness.feed(steady(2.5));
    }
    let wild = harness.feed(SensorReading {
        vibration: 40.0,
        temperature: 84.0,
        rpm: 29.0,
        current: 80.0,
        capture_time: Tick::ZERO,
    });
    // Each channel saturates at its weight: 100 - 30 - 25 - 25.
    assert_abs_diff_eq!(wild.health_score, 20.0, epsilon = 1e-4);
    assert_eq!(wild.flagged_channels(), 3);
    Ok(())
}

#[test]
fn test_throttled_alerts_follow_flags() -> TestResult {
    let mut harness = Harness::new()?;
    let mut throttle = AlertThrottle::new(DetectorConfig::default().alert_every_cycles)?;
    let mut alerts = Vec::new();

    for cycle in 1..=40u64 {
        let reading = if cycle > 30 { steady(7.0) } else { steady(2.5) };
        let result = harness.feed(reading);
        if let Some(alert) = throttle.alert_for(cycle, &result, Tick::from_millis(cycle * 200)) {
            assert!(result.vibration_flag || result.temperature_flag);
            alerts.push(alert);
        }
    }

    assert!(!alerts.is_empty());
    assert!(alerts.iter().all(|a| a.kind == AlertKind::Vibration));
    assert!(alerts.iter().all(|a| a.raised_at.as_millis() % 400 == 0));
    Ok(())
}
