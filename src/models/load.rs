//! Load bookkeeping: what the store already holds and what a run did

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::enums::LoadAction;

/// Aggregate of the rows currently stored for one source file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriorLoadInfo {
    pub file_id: String,
    pub row_count: u64,
    pub first_load_at: Option<NaiveDateTime>,
    pub last_load_at: Option<NaiveDateTime>,
    pub last_update_at: Option<NaiveDateTime>,
    /// Earliest opening timestamp among the stored rows
    pub min_event_at: Option<NaiveDateTime>,
    /// Latest opening timestamp among the stored rows
    pub max_event_at: Option<NaiveDateTime>,
}

impl PriorLoadInfo {
    /// A file counts as loaded only when at least one row is stored for it
    pub fn exists(&self) -> bool {
        self.row_count > 0
    }
}

impl std::fmt::Display for PriorLoadInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        fn ts(v: &Option<NaiveDateTime>) -> String {
            v.map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
                .unwrap_or_else(|| "-".to_string())
        }

        writeln!(f, "File:          {}", self.file_id)?;
        writeln!(f, "Rows stored:   {}", self.row_count)?;
        writeln!(f, "First load:    {}", ts(&self.first_load_at))?;
        writeln!(f, "Last load:     {}", ts(&self.last_load_at))?;
        writeln!(f, "Last update:   {}", ts(&self.last_update_at))?;
        write!(
            f,
            "Event range:   {} .. {}",
            ts(&self.min_event_at),
            ts(&self.max_event_at)
        )
    }
}

/// Row count per loaded file, as listed by the store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileLoadStats {
    pub file_id: String,
    pub row_count: u64,
    pub first_load_at: Option<NaiveDateTime>,
}

/// Terminal state of one source file within a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FileOutcome {
    Success { rows: usize, action: LoadAction },
    Skipped,
    NoValidData,
    Error { message: String },
}

impl FileOutcome {
    pub fn error(message: impl Into<String>) -> Self {
        FileOutcome::Error {
            message: message.into(),
        }
    }

    pub fn rows_loaded(&self) -> usize {
        match self {
            FileOutcome::Success { rows, .. } => *rows,
            _ => 0,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, FileOutcome::Success { .. })
    }
}

/// Outcome of one file plus the bookkeeping the summary needs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileReport {
    pub file_name: String,
    pub outcome: FileOutcome,
    /// Rows removed by a replace before the new rows were written
    pub rows_deleted: u64,
}

impl FileReport {
    pub fn new(file_name: impl Into<String>, outcome: FileOutcome) -> Self {
        Self {
            file_name: file_name.into(),
            outcome,
            rows_deleted: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prior_load_exists() {
        let mut info = PriorLoadInfo {
            file_id: "a.xlsx".to_string(),
            row_count: 0,
            first_load_at: None,
            last_load_at: None,
            last_update_at: None,
            min_event_at: None,
            max_event_at: None,
        };
        assert!(!info.exists());
        info.row_count = 3;
        assert!(info.exists());
        assert!(info.to_string().contains("Rows stored:   3"));
    }

    #[test]
    fn test_outcome_rows_loaded() {
        let ok = FileOutcome::Success {
            rows: 7,
            action: LoadAction::Append,
        };
        assert_eq!(ok.rows_loaded(), 7);
        assert!(ok.is_success());
        assert_eq!(FileOutcome::Skipped.rows_loaded(), 0);
        assert_eq!(FileOutcome::error("boom").rows_loaded(), 0);
    }
}
