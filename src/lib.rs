//! Transmission ETL - loads transmission-outage workbooks into a relational table
//!
//! Provides:
//! - Workbook discovery and worksheet reading
//! - Column mapping onto the canonical outage schema
//! - Row normalization (empty markers, lenient dates and numbers)
//! - Duplicate-file detection with skip / replace / append resolution
//! - Store backends (DuckDB, PostgreSQL, in-memory)
//! - Run orchestration and summary reporting

#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod database;
pub mod import;
pub mod loader;
#[cfg(feature = "cli")]
pub mod logging;
pub mod mapping;
pub mod models;
pub mod normalize;
pub mod resolver;
pub mod validation;

// Re-export commonly used types
pub use config::{DatabaseBackendType, EtlConfig};
pub use database::{DatabaseError, DatabaseResult, StoreGateway, TargetTable};
pub use import::{ExcelReader, ImportError, SheetReader};
pub use loader::{LoadError, LoadOptions, LoadOrchestrator, RunSummary};
pub use mapping::map_columns;
pub use normalize::{Normalized, normalize};
pub use resolver::{ConflictPrompt, NoPrompt, ResolveError, ResolveMode};

// Re-export models
pub use models::{
    CanonicalField, CanonicalRow, CellValue, FileLoadStats, FileOutcome, FileReport, LoadAction,
    PriorLoadInfo, SourceTable,
};
