//! Import functionality
//!
//! Finds report workbooks in a folder and reads their designated worksheet
//! into a [`SourceTable`](crate::models::SourceTable).

pub mod discovery;
pub mod excel;

use std::path::{Path, PathBuf};

use crate::models::SourceTable;

pub use discovery::discover_workbooks;
pub use excel::ExcelReader;

/// Worksheet every report must carry
pub const DEFAULT_SHEET: &str = "FORMATO";

/// Error during import
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("Source folder not found: {0}")]
    FolderNotFound(PathBuf),
    #[error("Sheet '{sheet}' not found (available: {})", available.join(", "))]
    SheetNotFound {
        sheet: String,
        available: Vec<String>,
    },
    #[error("Workbook error in {path}: {message}")]
    WorkbookError { path: PathBuf, message: String },
    #[error("IO error: {0}")]
    IoError(String),
}

impl From<std::io::Error> for ImportError {
    fn from(e: std::io::Error) -> Self {
        ImportError::IoError(e.to_string())
    }
}

/// Reads one named worksheet of a workbook
///
/// The loader only depends on this trait, so tests can feed tables without
/// writing workbooks to disk.
pub trait SheetReader {
    fn read_sheet(&self, path: &Path, sheet: &str) -> Result<SourceTable, ImportError>;
}
