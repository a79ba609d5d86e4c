//! Static alarm thresholds shared by the safety and anomaly tasks.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors reported by [`ThresholdConfig::validate`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ThresholdError {
    /// A threshold is NaN or infinite.
    #[error("threshold {name} must be finite, got {value}")]
    NotFinite {
        /// Field name.
        name: &'static str,
        /// Offending value.
        value: f32,
    },

    /// A warning level sits above its critical level.
    #[error("{channel} warning level {warn} exceeds critical level {crit}")]
    WarnAboveCritical {
        /// Sensor channel.
        channel: &'static str,
        /// Warning level.
        warn: f32,
        /// Critical level.
        crit: f32,
    },

    /// The rpm band is empty.
    #[error("rpm_min {min} must be below rpm_max {max}")]
    EmptyRpmBand {
        /// Lower bound.
        min: f32,
        /// Upper bound.
        max: f32,
    },

    /// A limit that must be positive is not.
    #[error("threshold {name} must be positive, got {value}")]
    NotPositive {
        /// Field name.
        name: &'static str,
        /// Offending value.
        value: f32,
    },
}

/// Alarm thresholds for every monitored channel.
///
/// Mutated only at start-up in the current design; the dedicated lock that
/// guards it at runtime keeps later reconfiguration safe.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThresholdConfig {
    /// Vibration warning level (mm/s).
    pub vibration_warn: f32,
    /// Vibration critical level (mm/s).
    pub vibration_crit: f32,
    /// Temperature warning level (°C).
    pub temp_warn: f32,
    /// Temperature critical level (°C).
    pub temp_crit: f32,
    /// Lowest acceptable rotor speed (rpm).
    pub rpm_min: f32,
    /// Highest acceptable rotor speed (rpm).
    pub rpm_max: f32,
    /// Highest acceptable generator current (A).
    pub current_max: f32,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            vibration_warn: 5.0,
            vibration_crit: 10.0,
            temp_warn: 70.0,
            temp_crit: 85.0,
            rpm_min: 10.0,
            rpm_max: 30.0,
            current_max: 100.0,
        }
    }
}

impl ThresholdConfig {
    /// Check the thresholds for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns the first inconsistency found.
    pub fn validate(&self) -> Result<(), ThresholdError> {
        let fields = [
            ("vibration_warn", self.vibration_warn),
            ("vibration_crit", self.vibration_crit),
            ("temp_warn", self.temp_warn),
            ("temp_crit", self.temp_crit),
            ("rpm_min", self.rpm_min),
            ("rpm_max", self.rpm_max),
            ("current_max", self.current_max),
        ];
        for (name, value) in fields {
            if !value.is_finite() {
                return Err(ThresholdError::NotFinite { name, value });
            }
        }

        if self.vibration_warn > self.vibration_crit {
            return Err(ThresholdError::WarnAboveCritical {
                channel: "vibration",
                warn: self.vibration_warn,
                crit: self.vibration_crit,
            });
        }
        if self.temp_warn > self.temp_crit {
            return Err(ThresholdError::WarnAboveCritical {
                channel: "temperature",
                warn: self.temp_warn,
                crit: self.temp_crit,
            });
        }
        if self.rpm_min >= self.rpm_max {
            return Err(ThresholdError::EmptyRpmBand {
                min: self.rpm_min,
                max: self.rpm_max,
            });
        }
        if self.current_max <= 0.0 {
            return Err(ThresholdError::NotPositive {
                name: "current_max",
                value: self.current_max,
            });
        }
        Ok(())
    }

    /// Whether `rpm` lies outside the acceptable band.
    #[must_use]
    pub fn rpm_out_of_band(&self, rpm: f32) -> bool {
        rpm < self.rpm_min || rpm > self.rpm_max
    }
}
