//! Config command implementation

use std::path::Path;

use super::load_config;
use crate::cli::error::CliError;
use crate::config::sample_config;

/// Print a commented sample configuration file
pub fn handle_config_sample() -> Result<(), CliError> {
    print!("{}", sample_config());
    Ok(())
}

/// Load and validate the effective configuration
pub fn handle_config_validate(path: Option<&Path>) -> Result<(), CliError> {
    let config = load_config(path)?;
    config.validate()?;

    println!("Configuration valid");
    println!("  Source folder: {}", config.source.folder.display());
    println!("  Worksheet:     {}", config.source.sheet);
    println!("  Target table:  {}", config.target.table);
    println!("  Batch size:    {}", config.target.batch_size);
    println!("  Interactive:   {}", config.load.interactive);
    println!("  Connection:    {}", config.connection_summary());
    Ok(())
}
