//! Configuration validation.
//!
//! Validates the INI sections before any data is loaded.

use crate::domain::error::FlowError;
use crate::ports::config_port::ConfigPort;
use std::path::{Path, PathBuf};

pub fn validate_config(config: &dyn ConfigPort) -> Result<(), FlowError> {
    validate_window(config, "cmf_window")?;
    validate_window(config, "mfi_window")?;
    validate_ranking_limit(config)?;
    Ok(())
}

/// Dataset location: an explicit override wins over `[dataset] path`.
pub fn dataset_path(
    config: &dyn ConfigPort,
    path_override: Option<&Path>,
) -> Result<PathBuf, FlowError> {
    if let Some(path) = path_override {
        return Ok(path.to_path_buf());
    }
    match config.get_string("dataset", "path") {
        Some(s) if !s.trim().is_empty() => Ok(PathBuf::from(s.trim())),
        _ => Err(FlowError::ConfigMissing {
            section: "dataset".to_string(),
            key: "path".to_string(),
        }),
    }
}

fn validate_window(config: &dyn ConfigPort, key: &str) -> Result<(), FlowError> {
    if config.get_string("indicators", key).is_none() {
        return Ok(());
    }
    let value = config.get_int("indicators", key, 0);
    if value < 1 {
        return Err(FlowError::ConfigInvalid {
            section: "indicators".to_string(),
            key: key.to_string(),
            reason: format!("{} must be a positive integer", key),
        });
    }
    Ok(())
}

fn validate_ranking_limit(config: &dyn ConfigPort) -> Result<(), FlowError> {
    if config.get_string("ranking", "limit").is_none() {
        return Ok(());
    }
    let value = config.get_int("ranking", "limit", 0);
    if value < 1 {
        return Err(FlowError::ConfigInvalid {
            section: "ranking".to_string(),
            key: "limit".to_string(),
            reason: "limit must be a positive integer".to_string(),
        });
    }
    Ok(())
}
