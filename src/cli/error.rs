//! CLI-specific error types

use crate::database::DatabaseError;
use crate::loader::LoadError;
use std::path::PathBuf;
use thiserror::Error;

/// CLI-specific error type
#[derive(Error, Debug)]
pub enum CliError {
    #[error("Config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("IO error: {0}")]
    IoError(String),

    #[error(transparent)]
    Database(#[from] DatabaseError),

    #[error(transparent)]
    Load(#[from] LoadError),

    #[error("{0} file(s) failed to load")]
    RunFailed(usize),
}
