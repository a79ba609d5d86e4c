//! Alert throttling.

use crate::error::{DetectorError, DetectorResult};
use std::num::NonZeroU32;
use turbine_types::{AlertMessage, AnomalyResult, Tick};

/// Limits alerts to every n-th anomaly cycle.
///
/// On a permitted cycle an alert is built from the current result if it
/// flags vibration or temperature; rpm-only anomalies never raise alerts.
#[derive(Debug, Clone)]
pub struct AlertThrottle {
    every: NonZeroU32,
    raised: u64,
    suppressed: u64,
}

impl AlertThrottle {
    /// Permit alerts on cycles divisible by `every`.
    ///
    /// # Errors
    ///
    /// Returns [`DetectorError::ZeroAlertInterval`] when `every` is zero.
    pub fn new(every: u32) -> DetectorResult<Self> {
        let every = NonZeroU32::new(every).ok_or(DetectorError::ZeroAlertInterval)?;
        Ok(Self {
            every,
            raised: 0,
            suppressed: 0,
        })
    }

    /// Whether `cycle` is an alert cycle.
    #[must_use]
    pub fn permits(&self, cycle: u64) -> bool {
        cycle.is_multiple_of(u64::from(self.every.get()))
    }

    /// The alert to send on `cycle`, if any.
    pub fn alert_for(
        &mut self,
        cycle: u64,
        result: &AnomalyResult,
        now: Tick,
    ) -> Option<AlertMessage> {
        let candidate = result.alert(now)?;
        if self.permits(cycle) {
            self.raised = self.raised.saturating_add(1);
            Some(candidate)
        } else {
            self.suppressed = self.suppressed.saturating_add(1);
            None
        }
    }

    /// Alerts released so far.
    #[must_use]
    pub fn raised(&self) -> u64 {
        self.raised
    }

    /// Alert-worthy results withheld by throttling.
    #[must_use]
    pub fn suppressed(&self) -> u64 {
        self.suppressed
    }
}

impl Default for AlertThrottle {
    fn default() -> Self {
        Self {
            every: NonZeroU32::MIN.saturating_add(1),
            raised: 0,
            suppressed: 0,
        }
    }
}
