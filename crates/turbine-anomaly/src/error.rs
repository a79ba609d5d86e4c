//! Detector configuration errors.

use thiserror::Error;

/// Errors raised while building a detector or its histories.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DetectorError {
    /// A history must hold at least one sample.
    #[error("history capacity must be non-zero")]
    ZeroCapacity,

    /// The baseline window must hold at least one sample.
    #[error("baseline window must be non-zero")]
    ZeroWindow,

    /// The baseline window cannot be longer than the history backing it.
    #[error("baseline window {window} exceeds history length {history}")]
    WindowTooLarge {
        /// Configured window.
        window: usize,
        /// Configured history length.
        history: usize,
    },

    /// The deviation band multiplier must be a positive finite number.
    #[error("sigma multiplier must be positive and finite, got {0}")]
    InvalidSigma(f32),

    /// A channel weight is negative or not finite.
    #[error("weight for {channel} must be non-negative and finite, got {value}")]
    InvalidWeight {
        /// Channel name.
        channel: &'static str,
        /// Offending weight.
        value: f32,
    },

    /// The weights could drive the score below zero on their own.
    #[error("channel weights sum to {total}, above the maximum health of 100")]
    WeightsExceedHealth {
        /// Sum of the weights.
        total: f32,
    },

    /// Alerts must be considered on some cycles.
    #[error("alert interval must be at least one cycle")]
    ZeroAlertInterval,
}

impl DetectorError {
    /// Create an invalid-weight error.
    #[must_use]
    pub fn invalid_weight(channel: &'static str, value: f32) -> Self {
        Self::InvalidWeight { channel, value }
    }
}

/// Result type for detector construction.
pub type DetectorResult<T> = Result<T, DetectorError>;
