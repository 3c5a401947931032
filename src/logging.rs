//! Run logging
//!
//! Installs a `tracing` subscriber with two outputs: the console (stderr) and
//! a per-run file under the configured log directory. The file is the record
//! of a run and is kept after the process exits.

use chrono::{Local, NaiveDateTime};
use std::fs::File;
use std::io;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::config::LoggingSection;

/// Prefix of every run log file
pub const LOG_FILE_PREFIX: &str = "etl_transmision";

/// File name of the log for a run started at `started`
pub fn log_file_name(started: NaiveDateTime) -> String {
    format!("{}_{}.log", LOG_FILE_PREFIX, started.format("%Y%m%d_%H%M%S"))
}

fn filter(settings: &LoggingSection, verbose: bool) -> EnvFilter {
    let fallback = settings
        .filter
        .clone()
        .unwrap_or_else(|| if verbose { "debug" } else { "info" }.to_string());

    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&fallback))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Install console and file logging; returns the log file path
pub fn init(settings: &LoggingSection, verbose: bool) -> io::Result<PathBuf> {
    std::fs::create_dir_all(&settings.dir)?;
    let path = settings.dir.join(log_file_name(Local::now().naive_local()));
    let file = File::create(&path)?;

    tracing_subscriber::registry()
        .with(filter(settings, verbose))
        .with(fmt::layer().with_writer(io::stderr).with_target(false))
        .with(
            fmt::layer()
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .with_target(true),
        )
        .try_init()
        .map_err(|e| io::Error::other(e.to_string()))?;

    Ok(path)
}

/// Console-only logging for commands that do not produce a run log
pub fn init_console(settings: &LoggingSection, verbose: bool) {
    // A subscriber may already be installed (tests); keep it
    let _ = tracing_subscriber::registry()
        .with(filter(settings, verbose))
        .with(fmt::layer().with_writer(io::stderr).with_target(false))
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_log_file_name() {
        let started = NaiveDate::from_ymd_opt(2024, 3, 7)
            .unwrap()
            .and_hms_opt(9, 5, 30)
            .unwrap();
        assert_eq!(
            log_file_name(started),
            "etl_transmision_20240307_090530.log"
        );
    }
}
