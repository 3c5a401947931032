//! Aggregated outcome of a load run

use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::path::PathBuf;

use crate::models::{FileOutcome, FileReport};

/// Result of a load run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
    /// One report per processed file, in processing order
    pub reports: Vec<FileReport>,
    /// Log file written during the run, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_file: Option<PathBuf>,
    /// Duration of the run in milliseconds
    pub duration_ms: u64,
}

impl RunSummary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, report: FileReport) {
        self.reports.push(report);
    }

    fn count(&self, pred: impl Fn(&FileOutcome) -> bool) -> usize {
        self.reports.iter().filter(|r| pred(&r.outcome)).count()
    }

    pub fn files_processed(&self) -> usize {
        self.reports.len()
    }

    pub fn successful(&self) -> usize {
        self.count(FileOutcome::is_success)
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, FileOutcome::Skipped))
    }

    pub fn no_valid_data(&self) -> usize {
        self.count(|o| matches!(o, FileOutcome::NoValidData))
    }

    pub fn errors(&self) -> usize {
        self.count(|o| matches!(o, FileOutcome::Error { .. }))
    }

    /// Rows written across all files
    pub fn total_rows(&self) -> usize {
        self.reports.iter().map(|r| r.outcome.rows_loaded()).sum()
    }

    /// Rows removed by replace actions across all files
    pub fn total_deleted(&self) -> u64 {
        self.reports.iter().map(|r| r.rows_deleted).sum()
    }

    /// Check if every file ended without error
    pub fn is_success(&self) -> bool {
        self.errors() == 0
    }

    /// Human-readable summary, one line per file followed by totals
    pub fn render(&self) -> String {
        let mut out = String::new();
        let rule = "=".repeat(60);

        let _ = writeln!(out, "{}", rule);
        let _ = writeln!(out, "LOAD SUMMARY");
        let _ = writeln!(out, "{}", rule);

        for report in &self.reports {
            let line = match &report.outcome {
                FileOutcome::Success { rows, action } => {
                    let mut line = format!("OK       {} rows ({})", rows, action);
                    if report.rows_deleted > 0 {
                        let _ = write!(line, ", {} replaced", report.rows_deleted);
                    }
                    line
                }
                FileOutcome::Skipped => "SKIPPED  already loaded".to_string(),
                FileOutcome::NoValidData => "EMPTY    no valid rows".to_string(),
                FileOutcome::Error { message } => format!("ERROR    {}", message),
            };
            let _ = writeln!(out, "  {:<40} {}", report.file_name, line);
        }

        let _ = writeln!(out, "{}", "-".repeat(60));
        let _ = writeln!(out, "Files processed:   {}", self.files_processed());
        let _ = writeln!(out, "Loaded:            {}", self.successful());
        let _ = writeln!(out, "Skipped:           {}", self.skipped());
        let _ = writeln!(out, "No valid data:     {}", self.no_valid_data());
        let _ = writeln!(out, "Errors:            {}", self.errors());
        let _ = writeln!(out, "Total rows loaded: {}", self.total_rows());
        if self.total_deleted() > 0 {
            let _ = writeln!(out, "Rows replaced:     {}", self.total_deleted());
        }
        if let Some(log_file) = &self.log_file {
            let _ = writeln!(out, "Log file:          {}", log_file.display());
        }
        let _ = write!(out, "{}", rule);
        out
    }
}

impl std::fmt::Display for RunSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.render())
    }
}
