//! Prelude for common scheduler types.

pub use crate::clock::{Clock, ManualClock, MonotonicClock};
pub use crate::error::{SchedulerError, SchedulerResult};
pub use crate::jitter::{DeadlineMetrics, DeadlineSnapshot};
pub use crate::ticker::{PeriodicTicker, TickOutcome};
