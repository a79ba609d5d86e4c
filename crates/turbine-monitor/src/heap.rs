//! Simulated bounded heap and allocation statistics.
//!
//! [`HeapBudget`] stands in for the target's fixed heap: reservations draw
//! from a fixed byte budget and fail cleanly when it runs out. The returned
//! [`HeapLease`] gives the bytes back when dropped. [`MemoryStats`] is the
//! record kept in shared state; callers update it under the state lock
//! around each reservation and release.

use crate::error::{MonitorError, MonitorResult};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Default heap budget: 256 KiB.
pub const DEFAULT_HEAP_BYTES: usize = 256 * 1024;

/// Heap usage level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum HeapLevel {
    /// Below the warning level.
    Normal,
    /// At or above the warning level.
    Warning,
    /// At or above the critical level.
    Critical,
}

/// A fixed byte budget shared by every allocating task.
#[derive(Debug)]
pub struct HeapBudget {
    capacity: usize,
    free: AtomicUsize,
    minimum_free: AtomicUsize,
}

impl HeapBudget {
    /// Create a budget of `capacity` bytes, all free.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            free: AtomicUsize::new(capacity),
            minimum_free: AtomicUsize::new(capacity),
        }
    }

    /// Reserve `bytes`, returning a lease that frees them on drop.
    ///
    /// # Errors
    ///
    /// - [`MonitorError::EmptyReservation`] for a zero-byte request
    /// - [`MonitorError::HeapExhausted`] if fewer than `bytes` are free
    pub fn try_reserve(&self, bytes: usize) -> MonitorResult<HeapLease<'_>> {
        if bytes == 0 {
            return Err(MonitorError::EmptyReservation);
        }
        self.free
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |free| {
                free.checked_sub(bytes)
            })
            .map_err(|free| MonitorError::heap_exhausted(bytes, free))?;
        self.minimum_free
            .fetch_min(self.free.load(Ordering::Acquire), Ordering::AcqRel);
        Ok(HeapLease { heap: self, bytes })
    }

    /// Bytes currently free.
    #[must_use]
    pub fn free_bytes(&self) -> usize {
        self.free.load(Ordering::Acquire)
    }

    /// Fewest bytes ever free.
    #[must_use]
    pub fn minimum_free_bytes(&self) -> usize {
        self.minimum_free.load(Ordering::Acquire)
    }

    /// Total budget.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Used share of the budget, in percent.
    #[must_use]
    pub fn used_percent(&self) -> u32 {
        if self.capacity == 0 {
            return 100;
        }
        let used = self.capacity.saturating_sub(self.free_bytes());
        let percent = used.saturating_mul(100) / self.capacity;
        u32::try_from(percent).unwrap_or(100)
    }

    /// Usage level against `warn_percent` and `critical_percent`.
    #[must_use]
    pub fn level(&self, warn_percent: u32, critical_percent: u32) -> HeapLevel {
        let used = self.used_percent();
        if used >= critical_percent {
            HeapLevel::Critical
        } else if used >= warn_percent {
            HeapLevel::Warning
        } else {
            HeapLevel::Normal
        }
    }

    fn release(&self, bytes: usize) {
        let capacity = self.capacity;
        let _previous = self
            .free
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |free| {
                Some(free.saturating_add(bytes).min(capacity))
            });
    }
}

impl Default for HeapBudget {
    fn default() -> Self {
        Self::new(DEFAULT_HEAP_BYTES)
    }
}

/// Bytes held from a [`HeapBudget`]; returned on drop.
#[derive(Debug)]
#[must_use = "dropping the lease releases the reservation immediately"]
pub struct HeapLease<'a> {
    heap: &'a HeapBudget,
    bytes: usize,
}

impl HeapLease<'_> {
    /// Bytes held.
    #[must_use]
    pub fn bytes(&self) -> usize {
        self.bytes
    }
}

impl Drop for HeapLease<'_> {
    fn drop(&mut self) {
        self.heap.release(self.bytes);
    }
}

/// Allocation statistics kept in shared state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryStats {
    /// Successful reservations.
    pub allocations: u64,
    /// Releases.
    pub deallocations: u64,
    /// Refused reservations.
    pub allocation_failures: u64,
    /// Reservations currently held.
    pub active_allocations: u64,
    /// Bytes currently held.
    pub bytes_allocated: usize,
    /// Most bytes ever held at once.
    pub peak_usage: usize,
    /// Free bytes after the latest operation.
    pub current_free: usize,
    /// Fewest free bytes ever observed.
    pub minimum_free: usize,
}

impl MemoryStats {
    /// Stats for a heap of `capacity` bytes with nothing allocated.
    #[must_use]
    pub fn for_capacity(capacity: usize) -> Self {
        Self {
            current_free: capacity,
            minimum_free: capacity,
            ..Self::default()
        }
    }

    /// Record a successful reservation of `bytes` leaving `free_after` free.
    pub fn record_allocation(&mut self, bytes: usize, free_after: usize) {
        self.allocations = self.allocations.saturating_add(1);
        self.active_allocations = self.active_allocations.saturating_add(1);
        self.bytes_allocated = self.bytes_allocated.saturating_add(bytes);
        self.peak_usage = self.peak_usage.max(self.bytes_allocated);
        self.current_free = free_after;
        self.minimum_free = self.minimum_free.min(free_after);
    }

    /// Record a release of `bytes` leaving `free_after` free.
    pub fn record_free(&mut self, bytes: usize, free_after: usize) {
        self.deallocations = self.deallocations.saturating_add(1);
        self.active_allocations = self.active_allocations.saturating_sub(1);
        self.bytes_allocated = self.bytes_allocated.saturating_sub(bytes);
        self.current_free = free_after;
    }

    /// Record a refused reservation.
    pub fn record_failure(&mut self) {
        self.allocation_failures = self.allocation_failures.saturating_add(1);
    }
}
