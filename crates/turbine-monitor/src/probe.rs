//! Stack depth measurement on the calling thread.
//!
//! A probe is anchored near the base of a task thread's stack. Later calls
//! on the same thread measure the distance between the anchor and a fresh
//! local, which bounds how deep the task has gone at that point. Comparing the
//! deepest figure against the configured thread stack size gives the free
//! stack used by the [`StackMonitor`](crate::stack::StackMonitor).

use std::cell::Cell;

/// Bytes per stack word.
pub const WORD_BYTES: usize = 8;

/// Measures stack depth relative to an anchor on the owning thread.
///
/// Not `Send`: an anchor is only meaningful on the thread that created it.
#[derive(Debug)]
pub struct StackProbe {
    anchor: usize,
    stack_bytes: usize,
    deepest: Cell<usize>,
}

impl StackProbe {
    /// Anchor a probe at the current stack position.
    ///
    /// Call this first thing in the thread body; `stack_words` is the size
    /// the thread was spawned with.
    #[inline(never)]
    #[must_use]
    pub fn anchor(stack_words: u32) -> Self {
        let stack_bytes = usize::try_from(stack_words)
            .unwrap_or(usize::MAX)
            .saturating_mul(WORD_BYTES);
        Self {
            anchor: current_stack_address(),
            stack_bytes,
            deepest: Cell::new(0),
        }
    }

    /// Record the current depth and return it in bytes.
    #[inline(never)]
    pub fn sample(&self) -> usize {
        let depth = self.anchor.abs_diff(current_stack_address());
        if depth > self.deepest.get() {
            self.deepest.set(depth);
        }
        depth
    }

    /// Deepest depth sampled since the last [`take_free_words`](Self::take_free_words).
    #[must_use]
    pub fn deepest_bytes(&self) -> usize {
        self.deepest.get()
    }

    /// Free words at the deepest sampled point, then reset the window.
    pub fn take_free_words(&self) -> u32 {
        let deepest = self.deepest.replace(0);
        let free_bytes = self.stack_bytes.saturating_sub(deepest);
        u32::try_from(free_bytes / WORD_BYTES).unwrap_or(u32::MAX)
    }

    /// Configured stack size in words.
    #[must_use]
    pub fn configured_words(&self) -> u32 {
        u32::try_from(self.stack_bytes / WORD_BYTES).unwrap_or(u32::MAX)
    }
}

#[inline(never)]
fn current_stack_address() -> usize {
    let marker = 0u8;
    core::ptr::from_ref(core::hint::black_box(&marker)).addr()
}
