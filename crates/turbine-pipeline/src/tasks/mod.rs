//! The five application tasks.
//!
//! Each task is a plain struct owning its private state. The runtime drives
//! it from a dedicated thread: [`PipelineTask::start`] once, then
//! [`PipelineTask::run_cycle`] on every release of the task's ticker. Tests
//! drive the same methods directly against a context with a manual clock.

mod anomaly;
mod dashboard;
mod network;
mod safety;
mod sensor;

pub use anomaly::AnomalyTask;
pub use dashboard::DashboardTask;
pub use network::{NetworkTask, PacketKind, encode_body};
pub use safety::{ActiveAlarms, SafetyTask};
pub use sensor::SensorTask;

use crate::context::PipelineContext;
use turbine_monitor::StackProbe;
use turbine_types::{TaskId, Tick};

/// Whether a task wants to keep running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskFlow {
    /// Enter or stay in the periodic loop.
    Continue,
    /// Return from the thread.
    Stop,
}

/// Per-cycle inputs handed to a task by its driver.
#[derive(Debug, Clone, Copy)]
pub struct CycleInfo<'a> {
    /// One-based cycle number.
    pub number: u64,
    /// Release time of the cycle.
    pub now: Tick,
    /// Stack probe anchored on the task's thread.
    pub probe: &'a StackProbe,
}

/// A periodic task of the pipeline.
pub trait PipelineTask: Send {
    /// Task identity; selects period, stack size and priority.
    fn id(&self) -> TaskId;

    /// One-time work before the periodic loop.
    fn start(&mut self, _ctx: &PipelineContext) -> TaskFlow {
        TaskFlow::Continue
    }

    /// One cycle of work.
    fn run_cycle(&mut self, ctx: &PipelineContext, cycle: &CycleInfo<'_>);
}
