//! The hard-stop path for unrecoverable faults.

use crate::stack::StackMonitorEntry;

/// Receives faults after which execution cannot be trusted.
pub trait FatalHandler: Send + Sync {
    /// A task ran out of stack.
    fn stack_overflow(&self, entry: &StackMonitorEntry);
}

/// Logs the fault and aborts the process without unwinding.
#[derive(Debug, Clone, Copy, Default)]
pub struct HaltOnFatal;

impl FatalHandler for HaltOnFatal {
    fn stack_overflow(&self, entry: &StackMonitorEntry) {
        tracing::error!(
            task = %entry.task_name,
            configured_words = entry.configured_words,
            minimum_free_words = entry.minimum_free_words,
            "stack overflow, halting"
        );
        std::process::abort();
    }
}
