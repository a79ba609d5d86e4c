//! Stack high-water tracking with edge-triggered warnings.
//!
//! Each observation reports the free stack of one task. Usage is classified
//! as Normal, Warning or Critical. A warning is issued once when usage first
//! reaches the warning level and is not repeated until usage has fallen back
//! under the re-arm level, so a task hovering around the threshold does not
//! flood the log.

use crate::fatal::FatalHandler;
use serde::{Deserialize, Serialize};
use turbine_types::Tick;

/// Stack usage thresholds, in percent of the configured stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StackThresholds {
    /// Usage at which a task is reported as approaching the warning level.
    pub approach_percent: u32,
    /// Usage at which a warning is issued.
    pub warning_percent: u32,
    /// Usage classified as critical.
    pub critical_percent: u32,
    /// Usage below which the warning re-arms.
    pub rearm_percent: u32,
}

impl Default for StackThresholds {
    fn default() -> Self {
        Self {
            approach_percent: 65,
            warning_percent: 70,
            critical_percent: 85,
            rearm_percent: 60,
        }
    }
}

impl StackThresholds {
    /// Whether the thresholds are ordered and within 0..=100.
    #[must_use]
    pub fn is_ordered(&self) -> bool {
        self.rearm_percent <= self.approach_percent
            && self.approach_percent <= self.warning_percent
            && self.warning_percent <= self.critical_percent
            && self.critical_percent <= 100
    }
}

/// Classification of a stack usage figure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum StackLevel {
    /// Below the warning level.
    Normal,
    /// At or above the warning level, below critical.
    Warning,
    /// At or above the critical level.
    Critical,
    /// No free stack left.
    Overflow,
}

impl StackLevel {
    /// Classify `usage_percent` with `thresholds`.
    #[must_use]
    pub fn classify(usage_percent: u32, thresholds: &StackThresholds) -> Self {
        if usage_percent >= thresholds.critical_percent {
            StackLevel::Critical
        } else if usage_percent >= thresholds.warning_percent {
            StackLevel::Warning
        } else {
            StackLevel::Normal
        }
    }
}

/// Per-task stack record, created on first observation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackMonitorEntry {
    /// Task name.
    pub task_name: String,
    /// Configured stack size in words.
    pub configured_words: u32,
    /// Free words at the latest observation.
    pub current_free_words: u32,
    /// Lowest free words ever observed. Never increases.
    pub minimum_free_words: u32,
    /// Usage at the latest observation.
    pub usage_percent: u32,
    /// Highest usage ever observed. Never decreases.
    pub peak_usage_percent: u32,
    /// A warning has been issued and not yet re-armed.
    pub warning_issued: bool,
    /// Usage is inside the approach band. Cleared on leaving it.
    #[serde(default)]
    pub approaching: bool,
    /// Time of the latest observation.
    pub last_checked: Tick,
}

impl StackMonitorEntry {
    fn new(task_name: &str, configured_words: u32, free_words: u32, now: Tick) -> Self {
        Self {
            task_name: task_name.to_owned(),
            configured_words,
            current_free_words: free_words,
            minimum_free_words: free_words,
            usage_percent: 0,
            peak_usage_percent: 0,
            warning_issued: false,
            approaching: false,
            last_checked: now,
        }
    }
}

/// Aggregate stack counters across all tasks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackStats {
    /// Warnings issued (one per crossing).
    pub warnings_issued: u32,
    /// Crossings that landed in the warning band.
    pub high_usage_events: u32,
    /// Crossings that landed in the critical band.
    pub critical_usage_events: u32,
    /// Observations with no free stack.
    pub overflow_events: u32,
    /// Entries into the approach band while no warning was outstanding.
    #[serde(default)]
    pub approaching_events: u32,
    /// Observations made.
    pub proactive_checks: u64,
    /// Tasks with an entry.
    pub tasks_monitored: u32,
    /// Task that received the most recent warning.
    pub last_warning_task: Option<String>,
}

/// What one observation concluded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StackObservation {
    /// Usage at this observation.
    pub usage_percent: u32,
    /// Classification.
    pub level: StackLevel,
    /// Whether this observation issued a new warning.
    pub warned: bool,
    /// Whether this observation re-armed the warning.
    pub rearmed: bool,
    /// Whether this observation entered the approach band.
    pub approached: bool,
}

/// Stack usage percentage of `configured` words with `free` words left.
#[must_use]
pub fn usage_percent(configured: u32, free: u32) -> u32 {
    if configured == 0 {
        return 100;
    }
    let used = u64::from(configured.saturating_sub(free));
    let percent = used.saturating_mul(100) / u64::from(configured);
    u32::try_from(percent).unwrap_or(100)
}

/// Table of per-task stack entries plus aggregate counters.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StackMonitor {
    thresholds: StackThresholds,
    entries: Vec<StackMonitorEntry>,
    stats: StackStats,
}

impl StackMonitor {
    /// Create an empty monitor.
    #[must_use]
    pub fn new(thresholds: StackThresholds) -> Self {
        Self {
            thresholds,
            entries: Vec::new(),
            stats: StackStats::default(),
        }
    }

    /// Record the free stack of `task` and apply the warning policy.
    ///
    /// An observation with zero free words is an overflow: it is counted and
    /// handed to `fatal`, which by default does not return.
    pub fn observe(
        &mut self,
        task: &str,
        configured_words: u32,
        free_words: u32,
        now: Tick,
        fatal: &dyn FatalHandler,
    ) -> StackObservation {
        let thresholds = self.thresholds;
        self.stats.proactive_checks = self.stats.proactive_checks.saturating_add(1);

        let index = match self.entries.iter().position(|e| e.task_name == task) {
            Some(index) => index,
            None => {
                self.entries.push(StackMonitorEntry::new(
                    task,
                    configured_words,
                    free_words.min(configured_words),
                    now,
                ));
                self.stats.tasks_monitored =
                    u32::try_from(self.entries.len()).unwrap_or(u32::MAX);
                self.entries.len().saturating_sub(1)
            }
        };
        let Some(entry) = self.entries.get_mut(index) else {
            return StackObservation {
                usage_percent: 0,
                level: StackLevel::Normal,
                warned: false,
                rearmed: false,
                approached: false,
            };
        };

        let free_words = free_words.min(entry.configured_words);
        let usage = usage_percent(entry.configured_words, free_words);
        entry.current_free_words = free_words;
        entry.minimum_free_words = entry.minimum_free_words.min(free_words);
        entry.usage_percent = usage;
        entry.peak_usage_percent = entry.peak_usage_percent.max(usage);
        entry.last_checked = now;

        if free_words == 0 {
            self.stats.overflow_events = self.stats.overflow_events.saturating_add(1);
            fatal.stack_overflow(entry);
            return StackObservation {
                usage_percent: usage,
                level: StackLevel::Overflow,
                warned: false,
                rearmed: false,
                approached: false,
            };
        }

        let level = StackLevel::classify(usage, &thresholds);
        let warned = !entry.warning_issued && level >= StackLevel::Warning;
        if warned {
            entry.warning_issued = true;
            if level == StackLevel::Critical {
                self.stats.critical_usage_events =
                    self.stats.critical_usage_events.saturating_add(1);
            } else {
                self.stats.high_usage_events = self.stats.high_usage_events.saturating_add(1);
            }
            self.stats.warnings_issued = self.stats.warnings_issued.saturating_add(1);
            self.stats.last_warning_task = Some(entry.task_name.clone());
            tracing::warn!(
                task = %entry.task_name,
                usage_percent = usage,
                free_words,
                ?level,
                "stack usage high"
            );
        }

        let rearmed = entry.warning_issued && usage < thresholds.rearm_percent;
        if rearmed {
            entry.warning_issued = false;
            tracing::info!(task = %entry.task_name, usage_percent = usage, "stack usage recovered");
        }

        let in_band =
            usage >= thresholds.approach_percent && usage < thresholds.warning_percent;
        let approached = in_band && !entry.approaching && !entry.warning_issued;
        entry.approaching = in_band;
        if approached {
            self.stats.approaching_events = self.stats.approaching_events.saturating_add(1);
            tracing::info!(
                task = %entry.task_name,
                usage_percent = usage,
                "stack usage approaching warning level"
            );
        }

        StackObservation {
            usage_percent: usage,
            level,
            warned,
            rearmed,
            approached,
        }
    }

    /// Entry for `task`, if it has been observed.
    #[must_use]
    pub fn entry(&self, task: &str) -> Option<&StackMonitorEntry> {
        self.entries.iter().find(|e| e.task_name == task)
    }

    /// All entries in first-observation order.
    #[must_use]
    pub fn entries(&self) -> &[StackMonitorEntry] {
        &self.entries
    }

    /// Aggregate counters.
    #[must_use]
    pub fn stats(&self) -> &StackStats {
        &self.stats
    }

    /// Thresholds in force.
    #[must_use]
    pub fn thresholds(&self) -> &StackThresholds {
        &self.thresholds
    }
}
