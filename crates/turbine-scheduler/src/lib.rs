//! Monotonic time and periodic scheduling for the turbine monitor.
//!
//! Every task of the monitor runs on a fixed period. This crate provides:
//!
//! - **Clock**: the monotonic tick source consumed by the pipeline, with a
//!   real [`MonotonicClock`] and a hand-driven [`ManualClock`] for tests
//! - **PeriodicTicker**: absolute-deadline wake-ups that do not accumulate
//!   drift, ending early when the shared [`ShutdownSignal`] is raised
//! - **DeadlineMetrics**: lateness tracking with percentile estimation
//!
//! # Timing model
//!
//! Deadlines are computed as `start + n * period`. A task that overruns its
//! period records a deadline miss and is resynchronised to the next future
//! deadline instead of firing a burst of catch-up cycles.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use turbine_scheduler::{PeriodicTicker, TickOutcome};
//! use turbine_sync::ShutdownSignal;
//!
//! # fn main() -> Result<(), turbine_scheduler::SchedulerError> {
//! let shutdown = ShutdownSignal::new();
//! let mut ticker = PeriodicTicker::new("example", Duration::from_millis(100), shutdown)?;
//! while let TickOutcome::Due { cycle, .. } = ticker.wait_next() {
//!     if cycle == 10 {
//!         break;
//!     }
//! }
//! # Ok(())
//! # }
//! ```
//!
//! [`ShutdownSignal`]: turbine_sync::ShutdownSignal

#![deny(
    unsafe_op_in_unsafe_fn,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    missing_docs,
    missing_debug_implementations
)]
#![warn(clippy::pedantic)]

pub mod clock;
pub mod error;
pub mod jitter;
pub mod ticker;

pub mod prelude;

pub use clock::{Clock, ManualClock, MonotonicClock};
pub use error::{SchedulerError, SchedulerResult};
pub use jitter::{DeadlineMetrics, DeadlineSnapshot};
pub use ticker::{PeriodicTicker, TickOutcome};
