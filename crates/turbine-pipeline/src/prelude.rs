//! Prelude for turbine-pipeline.

pub use crate::config::{MonitorConfig, MonitorConfigBuilder};
pub use crate::context::PipelineContext;
pub use crate::error::{PipelineError, PipelineResult};
pub use crate::runtime::{MonitorRuntime, MonitorSnapshot};
pub use crate::state::{EventKind, SystemState};
pub use crate::tasks::{CycleInfo, PipelineTask, TaskFlow};
pub use turbine_types::TaskId;
