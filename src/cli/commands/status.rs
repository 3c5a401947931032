//! Status command implementation
//!
//! Lists every file currently stored in the destination table with its row
//! count and first load time.

use std::fmt::Write as _;
use std::path::PathBuf;

use super::{load_config, runtime};
use crate::cli::error::CliError;
use crate::database;
use crate::logging;
use crate::models::FileLoadStats;

/// Output format for stored file statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Aligned text table (default)
    #[default]
    Table,
    Json,
    Csv,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            "csv" => Ok(OutputFormat::Csv),
            _ => Err(format!("Unknown output format: {}", s)),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Table => write!(f, "table"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Csv => write!(f, "csv"),
        }
    }
}

/// Status command arguments
#[derive(Debug, Clone)]
pub struct StatusArgs {
    pub config: Option<PathBuf>,
    pub format: String,
    pub verbose: bool,
}

/// Handle the status command
pub fn handle_status(args: &StatusArgs) -> Result<(), CliError> {
    let format: OutputFormat = args.format.parse().map_err(CliError::InvalidArgument)?;
    let config = load_config(args.config.as_deref())?;
    config.validate()?;
    logging::init_console(&config.logging, args.verbose);

    let table = config.target_table()?;
    let rt = runtime()?;
    let stats = rt.block_on(async {
        let store = database::connect(&config).await?;
        let result = async {
            store.initialize(&table).await?;
            store.stats_by_file(&table).await
        }
        .await;
        if let Err(e) = store.close().await {
            tracing::warn!("Failed to close {} store: {}", store.backend_type(), e);
        }
        result
    })?;

    println!("{}", format_stats(&stats, format));
    Ok(())
}

fn load_time(stats: &FileLoadStats) -> String {
    stats
        .first_load_at
        .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_default()
}

/// Render stored file statistics
pub fn format_stats(stats: &[FileLoadStats], format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => {
            serde_json::to_string_pretty(stats).unwrap_or_else(|_| "[]".to_string())
        }
        OutputFormat::Csv => format_as_csv(stats),
        OutputFormat::Table => format_as_table(stats),
    }
}

fn csv_field(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

fn format_as_csv(stats: &[FileLoadStats]) -> String {
    let mut output = String::from("file,rows,first_load\n");
    for s in stats {
        let _ = writeln!(
            output,
            "{},{},{}",
            csv_field(&s.file_id),
            s.row_count,
            load_time(s)
        );
    }
    output
}

fn format_as_table(stats: &[FileLoadStats]) -> String {
    if stats.is_empty() {
        return "(no files loaded)".to_string();
    }

    let width = stats
        .iter()
        .map(|s| s.file_id.chars().count())
        .max()
        .unwrap_or(0)
        .max("file".len());

    let mut output = String::new();
    let _ = writeln!(output, "{:<width$}  {:>10}  first_load", "file", "rows");
    let _ = writeln!(output, "{}", "-".repeat(width + 35));
    for s in stats {
        let _ = writeln!(
            output,
            "{:<width$}  {:>10}  {}",
            s.file_id,
            s.row_count,
            load_time(s)
        );
    }

    let total: u64 = stats.iter().map(|s| s.row_count).sum();
    let _ = write!(output, "({} files, {} rows)", stats.len(), total);
    output
}
