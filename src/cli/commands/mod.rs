//! CLI command implementations

pub mod check;
pub mod config;
pub mod load;
pub mod status;

use std::path::Path;

use crate::cli::error::CliError;
use crate::config::EtlConfig;

/// Runtime for one command; the store and prompts are driven from one thread
pub(crate) fn runtime() -> Result<tokio::runtime::Runtime, CliError> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| CliError::IoError(format!("Failed to create runtime: {}", e)))
}

/// Load the configuration file (if any) with environment overrides applied
pub(crate) fn load_config(path: Option<&Path>) -> Result<EtlConfig, CliError> {
    if let Some(path) = path
        && !path.exists()
    {
        return Err(CliError::FileNotFound(path.to_path_buf()));
    }
    Ok(EtlConfig::load(path)?)
}
