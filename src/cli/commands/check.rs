//! Check command implementation

use std::path::{Path, PathBuf};

use super::{load_config, runtime};
use crate::cli::error::CliError;
use crate::database;
use crate::loader::file_id;
use crate::logging;

/// Check command arguments
#[derive(Debug, Clone)]
pub struct CheckArgs {
    pub config: Option<PathBuf>,
    /// Workbook path or bare file name
    pub file: PathBuf,
    pub verbose: bool,
}

/// Report what the store holds for one source file
pub fn handle_check(args: &CheckArgs) -> Result<(), CliError> {
    let config = load_config(args.config.as_deref())?;
    config.validate()?;
    logging::init_console(&config.logging, args.verbose);

    let table = config.target_table()?;
    let name = file_id(Path::new(&args.file));
    let rt = runtime()?;
    let prior = rt.block_on(async {
        let store = database::connect(&config).await?;
        let result = async {
            store.initialize(&table).await?;
            store.check_loaded(&table, &name).await
        }
        .await;
        if let Err(e) = store.close().await {
            tracing::warn!("Failed to close {} store: {}", store.backend_type(), e);
        }
        result
    })?;

    if prior.exists() {
        println!("{}", prior);
    } else {
        println!("{} has not been loaded into {}", name, table);
    }
    Ok(())
}
