//! Per-task runtime counters and liveness.
//!
//! Each task thread owns one slot and updates it with relaxed atomics at the
//! end of every cycle; the dashboard reads every slot without locking. The
//! registry never blocks a task.

use crate::error::{MonitorError, MonitorResult};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, AtomicU8, AtomicU32, AtomicU64, Ordering};
use std::time::Duration;
use turbine_types::{TaskId, TaskPriority, Tick};

/// Lifecycle state of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskState {
    /// Spawned, no cycle completed yet.
    Starting,
    /// Executing a cycle body.
    Running,
    /// Parked until its next period.
    Waiting,
    /// Returned from its loop.
    Stopped,
}

impl TaskState {
    const fn to_u8(self) -> u8 {
        match self {
            TaskState::Starting => 0,
            TaskState::Running => 1,
            TaskState::Waiting => 2,
            TaskState::Stopped => 3,
        }
    }

    const fn from_u8(raw: u8) -> Self {
        match raw {
            1 => TaskState::Running,
            2 => TaskState::Waiting,
            3 => TaskState::Stopped,
            _ => TaskState::Starting,
        }
    }
}

/// Point-in-time view of one task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskStatus {
    /// Task identity.
    pub task: TaskId,
    /// Fixed priority.
    pub priority: TaskPriority,
    /// Lifecycle state.
    pub state: TaskState,
    /// Summed time spent in cycle bodies, in microseconds.
    pub runtime_us: u64,
    /// Completed cycles.
    pub cycles: u64,
    /// Configured stack size in words.
    pub stack_words: u32,
    /// Fewest free stack words ever reported.
    pub stack_high_water_words: u32,
    /// Time of the latest completed cycle.
    pub last_cycle_at: Option<Tick>,
    /// Releases a full period or more past the deadline.
    pub deadline_misses: u64,
    /// Worst release lateness, in microseconds.
    pub max_lateness_us: u64,
    /// 99th percentile release lateness over recent cycles, in microseconds.
    pub p99_lateness_us: u64,
}

#[derive(Debug)]
struct TaskSlot {
    task: TaskId,
    stack_words: u32,
    state: AtomicU8,
    runtime_us: AtomicU64,
    cycles: AtomicU64,
    idle_entries: AtomicU64,
    last_cycle_at_us: AtomicU64,
    high_water_words: AtomicU32,
    window_free_words: AtomicU32,
    deadline_misses: AtomicU64,
    max_lateness_us: AtomicU64,
    p99_lateness_us: AtomicU64,
    stale: AtomicBool,
}

impl TaskSlot {
    fn new(task: TaskId, stack_words: u32) -> Self {
        Self {
            task,
            stack_words,
            state: AtomicU8::new(TaskState::Starting.to_u8()),
            runtime_us: AtomicU64::new(0),
            cycles: AtomicU64::new(0),
            idle_entries: AtomicU64::new(0),
            last_cycle_at_us: AtomicU64::new(0),
            high_water_words: AtomicU32::new(stack_words),
            window_free_words: AtomicU32::new(stack_words),
            deadline_misses: AtomicU64::new(0),
            max_lateness_us: AtomicU64::new(0),
            p99_lateness_us: AtomicU64::new(0),
            stale: AtomicBool::new(false),
        }
    }

    fn status(&self) -> TaskStatus {
        let cycles = self.cycles.load(Ordering::Relaxed);
        TaskStatus {
            task: self.task,
            priority: self.task.priority(),
            state: TaskState::from_u8(self.state.load(Ordering::Relaxed)),
            runtime_us: self.runtime_us.load(Ordering::Relaxed),
            cycles,
            stack_words: self.stack_words,
            stack_high_water_words: self.high_water_words.load(Ordering::Relaxed),
            last_cycle_at: (cycles > 0)
                .then(|| Tick::from_micros(self.last_cycle_at_us.load(Ordering::Relaxed))),
            deadline_misses: self.deadline_misses.load(Ordering::Relaxed),
            max_lateness_us: self.max_lateness_us.load(Ordering::Relaxed),
            p99_lateness_us: self.p99_lateness_us.load(Ordering::Relaxed),
        }
    }
}

/// Cycle report handed to [`TaskRegistry::record_cycle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleReport {
    /// Time spent in the cycle body.
    pub busy: Duration,
    /// When the cycle finished.
    pub finished_at: Tick,
    /// Free stack words at the deepest point of the cycle.
    pub free_stack_words: u32,
    /// Whether the task parked before this cycle.
    pub parked: bool,
}

/// Fixed table of task slots, created once at start-up.
#[derive(Debug)]
pub struct TaskRegistry {
    slots: Vec<TaskSlot>,
    started_at: Tick,
}

impl TaskRegistry {
    /// Create a registry for `tasks`, each with its configured stack in words.
    ///
    /// # Errors
    ///
    /// Returns [`MonitorError::ZeroStack`] if any task has a zero-sized stack.
    pub fn new(
        tasks: impl IntoIterator<Item = (TaskId, u32)>,
        started_at: Tick,
    ) -> MonitorResult<Self> {
        let slots = tasks
            .into_iter()
            .map(|(task, words)| {
                if words == 0 {
                    Err(MonitorError::ZeroStack { task: task.name() })
                } else {
                    Ok(TaskSlot::new(task, words))
                }
            })
            .collect::<MonitorResult<Vec<_>>>()?;
        Ok(Self { slots, started_at })
    }

    fn slot(&self, task: TaskId) -> Option<&TaskSlot> {
        self.slots.iter().find(|s| s.task == task)
    }

    /// Set the lifecycle state of `task`.
    pub fn set_state(&self, task: TaskId, state: TaskState) {
        if let Some(slot) = self.slot(task) {
            slot.state.store(state.to_u8(), Ordering::Relaxed);
        }
    }

    /// Record a completed cycle of `task`.
    pub fn record_cycle(&self, task: TaskId, report: CycleReport) {
        let Some(slot) = self.slot(task) else {
            return;
        };
        let busy_us = u64::try_from(report.busy.as_micros()).unwrap_or(u64::MAX);
        slot.runtime_us.fetch_add(busy_us, Ordering::Relaxed);
        slot.cycles.fetch_add(1, Ordering::Relaxed);
        if report.parked {
            slot.idle_entries.fetch_add(1, Ordering::Relaxed);
        }
        slot.last_cycle_at_us
            .fetch_max(report.finished_at.as_micros(), Ordering::Relaxed);
        let free = report.free_stack_words.min(slot.stack_words);
        slot.high_water_words.fetch_min(free, Ordering::Relaxed);
        slot.window_free_words.fetch_min(free, Ordering::Relaxed);
        slot.state.store(TaskState::Waiting.to_u8(), Ordering::Relaxed);
    }

    /// Count a missed deadline of `task`.
    pub fn record_deadline_miss(&self, task: TaskId) {
        if let Some(slot) = self.slot(task) {
            slot.deadline_misses.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Publish the release lateness figures of `task`.
    pub fn record_lateness(&self, task: TaskId, max_us: u64, p99_us: u64) {
        if let Some(slot) = self.slot(task) {
            slot.max_lateness_us.fetch_max(max_us, Ordering::Relaxed);
            slot.p99_lateness_us.store(p99_us, Ordering::Relaxed);
        }
    }

    /// Fewest free words reported by `task` since the previous call, with its
    /// configured size. Resets the window.
    #[must_use]
    pub fn take_stack_window(&self, task: TaskId) -> Option<(u32, u32)> {
        let slot = self.slot(task)?;
        let free = slot
            .window_free_words
            .swap(slot.stack_words, Ordering::Relaxed);
        Some((slot.stack_words, free))
    }

    /// Status of `task`, if registered.
    #[must_use]
    pub fn status(&self, task: TaskId) -> Option<TaskStatus> {
        self.slot(task).map(TaskSlot::status)
    }

    /// Status of every registered task, in registration order.
    #[must_use]
    pub fn statuses(&self) -> Vec<TaskStatus> {
        self.slots.iter().map(TaskSlot::status).collect()
    }

    /// Summed busy time of all tasks.
    #[must_use]
    pub fn total_runtime(&self) -> Duration {
        let us = self
            .slots
            .iter()
            .map(|s| s.runtime_us.load(Ordering::Relaxed))
            .fold(0u64, u64::saturating_add);
        Duration::from_micros(us)
    }

    /// Summed idle entries of all tasks.
    #[must_use]
    pub fn idle_entries(&self) -> u64 {
        self.slots
            .iter()
            .map(|s| s.idle_entries.load(Ordering::Relaxed))
            .fold(0u64, u64::saturating_add)
    }

    /// Tasks with no completed cycle within `timeout` of `now`.
    ///
    /// A task that has never completed a cycle is measured from registry
    /// creation. Each task is logged once when it goes stale and once when
    /// it recovers.
    pub fn check_liveness(&self, now: Tick, timeout: Duration) -> Vec<TaskId> {
        let mut stale = Vec::new();
        for slot in &self.slots {
            if TaskState::from_u8(slot.state.load(Ordering::Relaxed)) == TaskState::Stopped {
                continue;
            }
            let last = if slot.cycles.load(Ordering::Relaxed) == 0 {
                self.started_at
            } else {
                Tick::from_micros(slot.last_cycle_at_us.load(Ordering::Relaxed))
            };
            let silent_for = now.saturating_since(last);
            let is_stale = silent_for > timeout;
            let was_stale = slot.stale.swap(is_stale, Ordering::Relaxed);
            if is_stale {
                if !was_stale {
                    tracing::warn!(
                        task = %slot.task,
                        silent_ms = silent_for.as_millis(),
                        "task missed its liveness deadline"
                    );
                }
                stale.push(slot.task);
            } else if was_stale {
                tracing::info!(task = %slot.task, "task is cycling again");
            }
        }
        stale
    }

    /// When the registry was created.
    #[must_use]
    pub fn started_at(&self) -> Tick {
        self.started_at
    }
}
