//! Detector tuning.

use crate::error::{DetectorError, DetectorResult};
use serde::{Deserialize, Serialize};
use turbine_types::anomaly::MAX_HEALTH;

/// Maximum health penalty per channel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelWeights {
    /// Vibration penalty weight.
    pub vibration: f32,
    /// Temperature penalty weight.
    pub temperature: f32,
    /// Rotor speed penalty weight.
    pub rpm: f32,
}

impl Default for ChannelWeights {
    fn default() -> Self {
        Self {
            vibration: 30.0,
            temperature: 25.0,
            rpm: 25.0,
        }
    }
}

impl ChannelWeights {
    /// Sum of all weights.
    #[must_use]
    pub fn total(&self) -> f32 {
        self.vibration + self.temperature + self.rpm
    }
}

/// Configuration of the statistical detector and alert throttle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Samples kept per channel.
    pub history_len: usize,
    /// Samples in the rolling baseline; also the sample count at which
    /// detection starts.
    pub window: usize,
    /// Width of the deviation band in standard deviations.
    pub sigma_multiplier: f32,
    /// Health penalty weights.
    pub weights: ChannelWeights,
    /// Alerts are considered on every n-th anomaly cycle.
    pub alert_every_cycles: u32,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            history_len: 100,
            window: 20,
            sigma_multiplier: 3.0,
            weights: ChannelWeights::default(),
            alert_every_cycles: 2,
        }
    }
}

impl DetectorConfig {
    /// Check the configuration.
    ///
    /// # Errors
    ///
    /// Returns the first invalid setting found.
    pub fn validate(&self) -> DetectorResult<()> {
        if self.history_len == 0 {
            return Err(DetectorError::ZeroCapacity);
        }
        if self.window == 0 {
            return Err(DetectorError::ZeroWindow);
        }
        if self.window > self.history_len {
            return Err(DetectorError::WindowTooLarge {
                window: self.window,
                history: self.history_len,
            });
        }
        if !self.sigma_multiplier.is_finite() || self.sigma_multiplier <= 0.0 {
            return Err(DetectorError::InvalidSigma(self.sigma_multiplier));
        }
        for (channel, value) in [
            ("vibration", self.weights.vibration),
            ("temperature", self.weights.temperature),
            ("rpm", self.weights.rpm),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(DetectorError::invalid_weight(channel, value));
            }
        }
        let total = self.weights.total();
        if total > MAX_HEALTH {
            return Err(DetectorError::WeightsExceedHealth { total });
        }
        if self.alert_every_cycles == 0 {
            return Err(DetectorError::ZeroAlertInterval);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_valid() {
        assert_eq!(DetectorConfig::default().validate(), Ok(()));
    }

    #[test]
    fn test_window_longer_than_history() {
        let config = DetectorConfig {
            history_len: 10,
            window: 11,
            ..DetectorConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(DetectorError::WindowTooLarge {
                window: 11,
                history: 10
            })
        );
    }

    #[test]
    fn test_weights_bounded_by_health() {
        let config = DetectorConfig {
            weights: ChannelWeights {
                vibration: 60.0,
                temperature: 30.0,
                rpm: 20.0,
            },
            ..DetectorConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(DetectorError::WeightsExceedHealth { .. })
        ));

        let negative = DetectorConfig {
            weights: ChannelWeights {
                rpm: -1.0,
                ..ChannelWeights::default()
            },
            ..DetectorConfig::default()
        };
        assert!(matches!(
            negative.validate(),
            Err(DetectorError::InvalidWeight { channel: "rpm", .. })
        ));
    }

    #[test]
    fn test_sigma_and_interval() {
        let sigma = DetectorConfig {
            sigma_multiplier: 0.0,
            ..DetectorConfig::default()
        };
        assert!(matches!(
            sigma.validate(),
            Err(DetectorError::InvalidSigma(_))
        ));
        let interval = DetectorConfig {
            alert_every_cycles: 0,
            ..DetectorConfig::default()
        };
        assert_eq!(interval.validate(), Err(DetectorError::ZeroAlertInterval));
    }
}
