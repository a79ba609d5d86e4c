//! Prelude for turbine-anomaly.

pub use crate::config::{ChannelWeights, DetectorConfig};
pub use crate::detector::{AnomalyDetector, DetectionContext, StatisticalDetector};
pub use crate::error::{DetectorError, DetectorResult};
pub use crate::history::{Baseline, ChannelHistory, SampleWindow, SensorHistory};
pub use crate::throttle::AlertThrottle;
