//! Load orchestration
//!
//! Drives every discovered workbook through resolution, reading, mapping,
//! normalization and the store write. Files are processed one at a time and
//! each ends in exactly one [`FileOutcome`]; a failing file never stops the
//! run.

pub mod summary;

use chrono::Local;
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::config::EtlConfig;
use crate::database::{DatabaseError, StoreGateway, TargetTable};
use crate::import::{ImportError, SheetReader, discover_workbooks};
use crate::mapping::map_columns;
use crate::models::{CanonicalField, FileOutcome, FileReport, LoadAction};
use crate::normalize::normalize;
use crate::resolver::{self, ConflictPrompt, ResolveError, ResolveMode};

pub use summary::RunSummary;

/// Rows logged as a sample after normalization
const SAMPLE_ROWS: usize = 3;

/// Error that stops a whole run
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("No .xlsx or .xls files found in {0}")]
    NoSourceFiles(PathBuf),
    #[error(transparent)]
    Import(#[from] ImportError),
    #[error(transparent)]
    Database(#[from] DatabaseError),
}

/// Error that ends one file
#[derive(Debug, thiserror::Error)]
enum FileError {
    #[error(transparent)]
    Resolve(#[from] ResolveError),
    #[error(transparent)]
    Import(#[from] ImportError),
    #[error("Write failed: {0}")]
    Database(#[from] DatabaseError),
}

/// Per-run settings
#[derive(Debug, Clone, PartialEq)]
pub struct LoadOptions {
    /// Worksheet read from every workbook
    pub sheet: String,
    /// Rows per insert statement
    pub batch_size: usize,
    pub mode: ResolveMode,
}

impl LoadOptions {
    pub fn from_config(config: &EtlConfig) -> Self {
        Self {
            sheet: config.source.sheet.clone(),
            batch_size: config.target.batch_size,
            mode: ResolveMode::from_interactive(config.load.interactive),
        }
    }
}

/// File identifier stored with every row: the file name without directories
pub fn file_id(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Load orchestrator over a store and a worksheet reader
pub struct LoadOrchestrator<'a, B: StoreGateway + ?Sized, R: SheetReader> {
    store: &'a B,
    reader: R,
    table: TargetTable,
    options: LoadOptions,
}

impl<'a, B: StoreGateway + ?Sized, R: SheetReader> LoadOrchestrator<'a, B, R> {
    pub fn new(store: &'a B, reader: R, table: TargetTable, options: LoadOptions) -> Self {
        Self {
            store,
            reader,
            table,
            options,
        }
    }

    pub fn table(&self) -> &TargetTable {
        &self.table
    }

    pub fn options(&self) -> &LoadOptions {
        &self.options
    }

    /// Create the destination table if missing
    pub async fn prepare(&self) -> Result<(), DatabaseError> {
        self.store.initialize(&self.table).await?;
        tracing::info!(
            "Destination table {} ready ({})",
            self.table,
            self.store.backend_type()
        );
        Ok(())
    }

    /// Discover workbooks in `folder` and load them
    ///
    /// Fails only when the folder cannot be read or holds no workbooks.
    pub async fn run_folder(
        &self,
        folder: &Path,
        prompt: &mut dyn ConflictPrompt,
    ) -> Result<RunSummary, LoadError> {
        let files = discover_workbooks(folder)?;
        if files.is_empty() {
            return Err(LoadError::NoSourceFiles(folder.to_path_buf()));
        }

        tracing::info!("Found {} files in {}:", files.len(), folder.display());
        for file in &files {
            tracing::info!("  - {}", file_id(file));
        }

        Ok(self.run(&files, prompt).await)
    }

    /// Load `files` in order
    pub async fn run(&self, files: &[PathBuf], prompt: &mut dyn ConflictPrompt) -> RunSummary {
        let start = Instant::now();
        let mut summary = RunSummary::new();

        for (idx, path) in files.iter().enumerate() {
            tracing::info!("[{}/{}] {}", idx + 1, files.len(), path.display());
            summary.push(self.process_file(path, prompt).await);
        }

        summary.duration_ms = start.elapsed().as_millis() as u64;
        summary
    }

    /// Load one workbook; every failure becomes an error outcome
    pub async fn process_file(
        &self,
        path: &Path,
        prompt: &mut dyn ConflictPrompt,
    ) -> FileReport {
        let name = file_id(path);
        let mut report = FileReport::new(name.clone(), FileOutcome::Skipped);

        report.outcome = match self.load_file(path, &name, prompt, &mut report.rows_deleted).await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!("Error processing {}: {}", name, e);
                FileOutcome::error(e.to_string())
            }
        };

        match &report.outcome {
            FileOutcome::Success { rows, action } => {
                tracing::info!("{}: {} rows loaded ({})", name, rows, action)
            }
            FileOutcome::Skipped => tracing::info!("{}: skipped", name),
            FileOutcome::NoValidData => tracing::warn!("{}: no valid data", name),
            FileOutcome::Error { .. } => {}
        }
        report
    }

    async fn load_file(
        &self,
        path: &Path,
        name: &str,
        prompt: &mut dyn ConflictPrompt,
        rows_deleted: &mut u64,
    ) -> Result<FileOutcome, FileError> {
        let prior = resolver::check(self.store, &self.table, name).await;
        let action = resolver::resolve(prior.as_ref(), self.options.mode, prompt)?;
        if let Some(prior) = &prior {
            tracing::info!(
                "{} already loaded ({} rows), action: {}",
                name,
                prior.row_count,
                action
            );
        }
        if action == LoadAction::Skip {
            return Ok(FileOutcome::Skipped);
        }

        let raw = self.reader.read_sheet(path, &self.options.sheet)?;
        let mapped = map_columns(&raw);
        let mut normalized = normalize(&mapped, name);
        if normalized.is_empty() {
            return Ok(FileOutcome::NoValidData);
        }

        for row in normalized.rows.iter().take(SAMPLE_ROWS) {
            tracing::debug!(
                "Sample row: {}={} {}={:?} {}={:?}",
                CanonicalField::FechaHoraApertura,
                row.fecha_hora_apertura,
                CanonicalField::Subestacion,
                row.subestacion,
                CanonicalField::CausaEvento,
                row.causa_evento
            );
        }

        if action == LoadAction::Replace {
            *rows_deleted = resolver::apply(self.store, &self.table, name, action).await?;
            let updated_at = Local::now().naive_local();
            for row in &mut normalized.rows {
                row.fecha_actualizacion = Some(updated_at);
            }
        }

        let rows = self
            .store
            .bulk_insert(&self.table, &normalized.rows, self.options.batch_size)
            .await?;

        Ok(FileOutcome::Success { rows, action })
    }
}
