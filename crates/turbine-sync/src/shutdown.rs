//! Cooperative stop signal.

use parking_lot::{Condvar, Mutex};
use std::sync::Arc;
use std::time::Instant;

#[derive(Debug, Default)]
struct Inner {
    stopped: Mutex<bool>,
    wake: Condvar,
}

/// A cloneable stop flag whose sleeps end early when it is raised.
///
/// Periodic tasks park in [`sleep_until`](Self::sleep_until) between cycles,
/// so raising the signal stops every task within one wake-up.
#[derive(Debug, Clone, Default)]
pub struct ShutdownSignal {
    inner: Arc<Inner>,
}

impl ShutdownSignal {
    /// Create a signal in the running state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Raise the signal and wake every sleeper.
    pub fn trigger(&self) {
        *self.inner.stopped.lock() = true;
        self.inner.wake.notify_all();
    }

    /// Whether the signal has been raised.
    #[must_use]
    pub fn is_triggered(&self) -> bool {
        *self.inner.stopped.lock()
    }

    /// Sleep until `deadline` or until the signal is raised.
    ///
    /// Returns `true` if the deadline was reached while still running.
    #[must_use]
    pub fn sleep_until(&self, deadline: Instant) -> bool {
        let mut stopped = self.inner.stopped.lock();
        while !*stopped {
            if self.inner.wake.wait_until(&mut stopped, deadline).timed_out() {
                return !*stopped;
            }
        }
        false
    }
}
