//! Anomaly detectors.
//!
//! The pipeline depends only on the [`AnomalyDetector`] trait, so a
//! different strategy can replace [`StatisticalDetector`] without touching
//! the tasks.

use crate::config::DetectorConfig;
use crate::error::DetectorResult;
use crate::history::{Baseline, ChannelHistory, SampleWindow};
use turbine_types::anomaly::MAX_HEALTH;
use turbine_types::{AnomalyResult, ThresholdConfig};

/// Inputs a detector needs besides the sample histories.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectionContext {
    /// Static alarm thresholds.
    pub thresholds: ThresholdConfig,
    /// Whether the emergency stop is active.
    pub emergency: bool,
}

/// A strategy that turns sample histories into an [`AnomalyResult`].
pub trait AnomalyDetector: Send {
    /// Evaluate the newest sample of each channel against its history.
    fn evaluate(&mut self, window: &SampleWindow<'_>, ctx: &DetectionContext) -> AnomalyResult;

    /// Detector name for logs.
    fn name(&self) -> &'static str;
}

/// Rolling-baseline detector with static threshold floors.
///
/// A channel is flagged when its newest sample leaves the deviation band of
/// the rolling baseline or crosses its static threshold. Flags stay clear
/// until the window is full. The health score is computed on every
/// evaluation.
#[derive(Debug, Clone)]
pub struct StatisticalDetector {
    config: DetectorConfig,
    anomaly_count: u32,
}

#[derive(Debug, Clone, Copy)]
struct ChannelVerdict {
    flagged: bool,
    penalty: f32,
}

impl StatisticalDetector {
    /// Create a detector.
    ///
    /// # Errors
    ///
    /// Returns the configuration error if `config` is invalid.
    pub fn new(config: DetectorConfig) -> DetectorResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            anomaly_count: 0,
        })
    }

    /// Detector configuration.
    #[must_use]
    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Running total of flagged channels.
    #[must_use]
    pub fn anomaly_count(&self) -> u32 {
        self.anomaly_count
    }

    fn judge(
        &self,
        history: &ChannelHistory,
        armed: bool,
        weight: f32,
        breaches_threshold: impl Fn(f32) -> bool,
    ) -> ChannelVerdict {
        let sigmas = self.config.sigma_multiplier;
        let (Some(value), Some(baseline)) = (history.latest(), history.baseline(self.config.window))
        else {
            return ChannelVerdict {
                flagged: false,
                penalty: 0.0,
            };
        };
        ChannelVerdict {
            flagged: armed && (baseline.exceeds(value, sigmas) || breaches_threshold(value)),
            penalty: Self::penalty(&baseline, value, sigmas, weight),
        }
    }

    fn penalty(baseline: &Baseline, value: f32, sigmas: f32, weight: f32) -> f32 {
        baseline.band_ratio(value, sigmas) * weight
    }
}

impl AnomalyDetector for StatisticalDetector {
    fn evaluate(&mut self, window: &SampleWindow<'_>, ctx: &DetectionContext) -> AnomalyResult {
        let armed = window.len() >= self.config.window;
        let limits = &ctx.thresholds;
        let weights = self.config.weights;

        let vibration = self.judge(window.vibration, armed, weights.vibration, |v| {
            v > limits.vibration_warn
        });
        let temperature = self.judge(window.temperature, armed, weights.temperature, |t| {
            t > limits.temp_warn
        });
        let rpm = self.judge(window.rpm, armed, weights.rpm, |r| limits.rpm_out_of_band(r));

        let health_score = if ctx.emergency {
            0.0
        } else {
            (MAX_HEALTH - vibration.penalty - temperature.penalty - rpm.penalty)
                .clamp(0.0, MAX_HEALTH)
        };

        let mut result = AnomalyResult {
            vibration_flag: vibration.flagged,
            temperature_flag: temperature.flagged,
            rpm_flag: rpm.flagged,
            health_score,
            anomaly_count: 0,
        };
        let flagged = result.flagged_channels();
        self.anomaly_count = self.anomaly_count.saturating_add(flagged);
        result.anomaly_count = self.anomaly_count;

        if flagged > 0 {
            tracing::debug!(
                detector = self.name(),
                vibration = result.vibration_flag,
                temperature = result.temperature_flag,
                rpm = result.rpm_flag,
                health = result.health_score,
                "anomaly flagged"
            );
        }
        result
    }

    fn name(&self) -> &'static str {
        "statistical"
    }
}
