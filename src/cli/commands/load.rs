//! Load command implementation
//!
//! Runs the whole pipeline over the configured source folder and prints the
//! run summary. The store is opened once and closed once, whatever happens
//! in between.

use std::path::PathBuf;

use super::{load_config, runtime};
use crate::cli::error::CliError;
use crate::config::EtlConfig;
use crate::database::{self, StoreGateway};
use crate::import::ExcelReader;
use crate::loader::{LoadError, LoadOptions, LoadOrchestrator, RunSummary};
use crate::logging;
use crate::resolver::prompt::TerminalPrompt;
use crate::resolver::{ConflictPrompt, NoPrompt, ResolveMode};

/// Load command arguments
#[derive(Debug, Clone, Default)]
pub struct LoadArgs {
    /// Configuration file
    pub config: Option<PathBuf>,
    /// Source folder, overrides the configuration
    pub folder: Option<PathBuf>,
    /// Destination table, overrides the configuration
    pub table: Option<String>,
    /// Ask the operator about already-loaded files
    pub interactive: bool,
    /// Rows per insert statement, overrides the configuration
    pub batch_size: Option<usize>,
    pub verbose: bool,
}

impl LoadArgs {
    /// Command-line flags take precedence over file and environment
    pub fn apply(&self, config: &mut EtlConfig) {
        if let Some(folder) = &self.folder {
            config.source.folder = folder.clone();
        }
        if let Some(table) = &self.table {
            config.target.table = table.clone();
        }
        if self.interactive {
            config.load.interactive = true;
        }
        if let Some(batch_size) = self.batch_size {
            config.target.batch_size = batch_size;
        }
    }
}

/// Handle the load command
pub fn handle_load(args: &LoadArgs) -> Result<(), CliError> {
    let mut config = load_config(args.config.as_deref())?;
    args.apply(&mut config);
    config.validate()?;

    let log_file = logging::init(&config.logging, args.verbose)
        .map_err(|e| CliError::IoError(format!("Failed to open log file: {}", e)))?;

    tracing::info!("Starting transmission load");
    tracing::info!("Source folder: {}", config.source.folder.display());
    tracing::info!("Destination: {}", config.connection_summary());

    let rt = runtime()?;
    let mut summary = rt.block_on(async {
        let store = database::connect(&config).await?;
        let result = run(store.as_ref(), &config).await;
        if let Err(e) = store.close().await {
            tracing::warn!("Failed to close {} store: {}", store.backend_type(), e);
        }
        result
    })?;

    summary.log_file = Some(log_file);
    tracing::info!(
        "Run finished in {} ms: {} loaded, {} skipped, {} without data, {} errors",
        summary.duration_ms,
        summary.successful(),
        summary.skipped(),
        summary.no_valid_data(),
        summary.errors()
    );
    println!("{}", summary.render());

    if summary.is_success() {
        Ok(())
    } else {
        Err(CliError::RunFailed(summary.errors()))
    }
}

async fn run(store: &dyn StoreGateway, config: &EtlConfig) -> Result<RunSummary, CliError> {
    let options = LoadOptions::from_config(config);
    let mut prompt: Box<dyn ConflictPrompt> = match options.mode {
        ResolveMode::Interactive => Box::new(TerminalPrompt::new()),
        ResolveMode::NonInteractive => Box::new(NoPrompt),
    };

    let orchestrator =
        LoadOrchestrator::new(store, ExcelReader::new(), config.target_table()?, options);
    orchestrator.prepare().await.map_err(LoadError::from)?;

    Ok(orchestrator
        .run_folder(&config.source.folder, prompt.as_mut())
        .await?)
}
