//! Timeout-bounded access to shared mutable state.
//!
//! [`StateLock::with_lock`] is the only way to reach the protected value.
//! There is no guard type in the public API, so a critical section cannot
//! outlive the closure that defines it and no task can hold two locks
//! across a suspension point by accident.
//!
//! # Contention policy
//!
//! An acquisition that does not succeed within its timeout is abandoned: the
//! timeout counter is incremented and [`LockTimeout`] is returned. Callers
//! skip the update for that cycle instead of retrying, which bounds the worst
//! case seen by the highest-priority task.
//!
//! The underlying `parking_lot::Mutex` hands the lock directly to a waiting
//! thread when fairness is due, so a waiter cannot be starved indefinitely
//! by a stream of short critical sections. Thread priorities themselves are
//! owned by the host scheduler.

use crate::counters::{LockCounters, LockSnapshot};
use crate::error::LockTimeout;
use parking_lot::Mutex;
use std::fmt;
use std::time::Duration;

/// A named value guarded by a mutex with bounded acquisition.
///
/// # Example
///
/// ```rust
/// use std::time::Duration;
/// use turbine_sync::StateLock;
///
/// let thresholds = StateLock::new("thresholds", 5.0f32);
/// let warn = thresholds.with_lock(Duration::from_millis(10), |t| *t)?;
/// assert!((warn - 5.0).abs() < f32::EPSILON);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct StateLock<T> {
    name: &'static str,
    inner: Mutex<T>,
    counters: LockCounters,
}

impl<T> StateLock<T> {
    /// Wrap `value` in a new lock.
    pub fn new(name: &'static str, value: T) -> Self {
        Self {
            name,
            inner: Mutex::new(value),
            counters: LockCounters::new(),
        }
    }

    /// Run `f` with exclusive access to the value.
    ///
    /// Waits at most `timeout` for the lock. The closure should be short; it
    /// runs while every other accessor is excluded.
    ///
    /// # Errors
    ///
    /// Returns [`LockTimeout`] if the lock was not acquired in time. The
    /// closure is not run in that case.
    pub fn with_lock<R>(
        &self,
        timeout: Duration,
        f: impl FnOnce(&mut T) -> R,
    ) -> Result<R, LockTimeout> {
        let Some(mut guard) = self.inner.try_lock_for(timeout) else {
            self.counters.record_timeout();
            tracing::trace!(
                lock = self.name,
                timeout_us = u64::try_from(timeout.as_micros()).unwrap_or(u64::MAX),
                "lock acquisition timed out"
            );
            return Err(LockTimeout {
                name: self.name,
                timeout,
            });
        };

        self.counters.record_take();
        let result = f(&mut guard);
        drop(guard);
        self.counters.record_give();
        Ok(result)
    }

    /// Lock name used in logs.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Acquisition counters.
    #[must_use]
    pub fn stats(&self) -> LockSnapshot {
        self.counters.snapshot()
    }

    /// Consume the lock and return the value.
    pub fn into_inner(self) -> T {
        self.inner.into_inner()
    }
}

impl<T: Clone> StateLock<T> {
    /// Clone the value out under the lock.
    ///
    /// # Errors
    ///
    /// Returns [`LockTimeout`] if the lock was not acquired in time.
    pub fn snapshot(&self, timeout: Duration) -> Result<T, LockTimeout> {
        self.with_lock(timeout, |value| value.clone())
    }
}

impl<T> fmt::Debug for StateLock<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateLock")
            .field("name", &self.name)
            .field("stats", &self.counters.snapshot())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::mpsc;
    use std::thread;

    type TestResult = Result<(), Box<dyn std::error::Error>>;

    #[test]
    fn test_with_lock_counts_take_and_give() -> TestResult {
        let lock = StateLock::new("state", vec![1, 2]);
        let len = lock.with_lock(Duration::from_millis(10), |v| {
            v.push(3);
            v.len()
        })?;
        assert_eq!(len, 3);
        let stats = lock.stats();
        assert_eq!(stats.takes, 1);
        assert_eq!(stats.gives, 1);
        assert_eq!(stats.timeouts, 0);
        Ok(())
    }

    #[test]
    fn test_timeout_skips_closure() -> TestResult {
        let lock = Arc::new(StateLock::new("state", 0u32));
        let holder = Arc::clone(&lock);
        let (locked_tx, locked_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel::<()>();

        let handle = thread::spawn(move || {
            holder.with_lock(Duration::from_secs(1), |_| {
                let signalled = locked_tx.send(()).is_ok();
                signalled && release_rx.recv_timeout(Duration::from_secs(5)).is_ok()
            })
        });

        locked_rx.recv_timeout(Duration::from_secs(5))?;
        let mut ran = false;
        let result = lock.with_lock(Duration::from_millis(5), |_| ran = true);
        assert_eq!(
            result,
            Err(LockTimeout {
                name: "state",
                timeout: Duration::from_millis(5)
            })
        );
        assert!(!ran);
        assert_eq!(lock.stats().timeouts, 1);

        release_tx.send(())?;
        let held = handle.join().map_err(|e| format!("holder panicked: {e:?}"))?;
        assert_eq!(held, Ok(true));
        Ok(())
    }
}
