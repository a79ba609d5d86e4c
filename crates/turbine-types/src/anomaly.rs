//! Detector output and the alerts derived from it.

use crate::tick::Tick;
use core::fmt;
use serde::{Deserialize, Serialize};

/// Upper bound of the health score.
pub const MAX_HEALTH: f32 = 100.0;

/// Result of one anomaly-detector evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnomalyResult {
    /// Vibration deviates from its baseline or exceeds the warning level.
    pub vibration_flag: bool,
    /// Temperature deviates from its baseline or exceeds the warning level.
    pub temperature_flag: bool,
    /// Rotor speed deviates from its baseline or leaves the allowed band.
    pub rpm_flag: bool,
    /// Composite condition score in `[0, 100]`.
    pub health_score: f32,
    /// Running total of flagged channels across all evaluations.
    pub anomaly_count: u32,
}

impl AnomalyResult {
    /// Result the system boots with: healthy, nothing flagged.
    pub const HEALTHY: Self = Self {
        vibration_flag: false,
        temperature_flag: false,
        rpm_flag: false,
        health_score: MAX_HEALTH,
        anomaly_count: 0,
    };

    /// Number of channels flagged in this result.
    #[must_use]
    pub fn flagged_channels(&self) -> u32 {
        u32::from(self.vibration_flag) + u32::from(self.temperature_flag) + u32::from(self.rpm_flag)
    }

    /// Whether any channel is flagged.
    #[must_use]
    pub fn any_flag(&self) -> bool {
        self.vibration_flag || self.temperature_flag || self.rpm_flag
    }

    /// Build the alert this result warrants, if any.
    ///
    /// Only vibration and temperature anomalies raise alerts. Vibration takes
    /// precedence and carries the higher severity.
    #[must_use]
    pub fn alert(&self, raised_at: Tick) -> Option<AlertMessage> {
        let kind = if self.vibration_flag {
            AlertKind::Vibration
        } else if self.temperature_flag {
            AlertKind::Temperature
        } else {
            return None;
        };
        Some(AlertMessage {
            severity: kind.severity(),
            kind,
            raised_at,
        })
    }
}

impl Default for AnomalyResult {
    fn default() -> Self {
        Self::HEALTHY
    }
}

/// Which channel raised an alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AlertKind {
    /// Vibration anomaly; the safety-critical channel.
    Vibration,
    /// Temperature anomaly.
    Temperature,
}

impl AlertKind {
    /// Severity assigned to alerts of this kind.
    #[must_use]
    pub const fn severity(self) -> f32 {
        match self {
            AlertKind::Vibration => 8.0,
            AlertKind::Temperature => 5.0,
        }
    }
}

impl fmt::Display for AlertKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlertKind::Vibration => f.write_str("vibration"),
            AlertKind::Temperature => f.write_str("temperature"),
        }
    }
}

/// Alert forwarded from the anomaly task to the network task.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AlertMessage {
    /// Alert severity.
    pub severity: f32,
    /// Originating channel.
    pub kind: AlertKind,
    /// Time the alert was raised.
    pub raised_at: Tick,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_alert_without_flag() {
        let rpm_only = AnomalyResult {
            rpm_flag: true,
            ..AnomalyResult::HEALTHY
        };
        assert_eq!(AnomalyResult::HEALTHY.alert(Tick::ZERO), None);
        assert_eq!(rpm_only.alert(Tick::ZERO), None);
    }

    #[test]
    fn test_vibration_takes_precedence() {
        let both = AnomalyResult {
            vibration_flag: true,
            temperature_flag: true,
            ..AnomalyResult::HEALTHY
        };
        let alert = both.alert(Tick::from_millis(3));
        assert!(matches!(
            alert,
            Some(AlertMessage {
                kind: AlertKind::Vibration,
                ..
            })
        ));
        assert!(alert.is_some_and(|a| (a.severity - 8.0).abs() < f32::EPSILON));
    }

    #[test]
    fn test_temperature_alert_severity() {
        let temp = AnomalyResult {
            temperature_flag: true,
            ..AnomalyResult::HEALTHY
        };
        let alert = temp.alert(Tick::ZERO);
        assert!(alert.is_some_and(|a| a.kind == AlertKind::Temperature));
        assert!(alert.is_some_and(|a| (a.severity - 5.0).abs() < f32::EPSILON));
        assert_eq!(temp.flagged_channels(), 1);
    }
}
