//! Config file loading and flag overrides

use crate::error::CliError;
use std::fs;
use std::path::Path;
use turbine_pipeline::{MonitorConfig, MonitorConfigBuilder, PipelineResult};

/// Read a JSON config file. Missing sections and fields take their defaults.
pub fn read_file(path: &Path) -> Result<MonitorConfig, CliError> {
    let text = fs::read_to_string(path).map_err(|source| CliError::ConfigRead {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| CliError::ConfigParse {
        path: path.to_path_buf(),
        source,
    })
}

/// Apply command-line overrides and validate.
pub fn with_overrides(config: MonitorConfig, seed: Option<u64>) -> PipelineResult<MonitorConfig> {
    let builder = MonitorConfigBuilder::from_config(config);
    match seed {
        Some(seed) => builder.with_seed(seed).build(),
        None => builder.build(),
    }
}
