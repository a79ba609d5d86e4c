//! Error types for the turbine-monitor binary

use std::path::PathBuf;
use thiserror::Error;
use turbine_pipeline::PipelineError;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("cannot read config file {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse config file {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("run duration must be greater than 0")]
    ZeroDuration,
}

/// Exit code for a failed run.
///
/// 2 for configuration problems, 3 for a task panic, 1 otherwise.
pub fn exit_code(error: &anyhow::Error) -> u8 {
    if error.downcast_ref::<CliError>().is_some() {
        return 2;
    }
    match error.downcast_ref::<PipelineError>() {
        Some(
            PipelineError::InvalidConfig(_)
            | PipelineError::Thresholds(_)
            | PipelineError::Detector(_)
            | PipelineError::Monitor(_),
        ) => 2,
        Some(PipelineError::TaskPanicked { .. }) => 3,
        _ => 1,
    }
}
