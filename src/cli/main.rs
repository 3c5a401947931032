//! CLI binary entry point for transmission-etl

#[cfg(feature = "cli")]
use anyhow::Context;
#[cfg(feature = "cli")]
use clap::{Parser, Subcommand};
#[cfg(feature = "cli")]
use std::path::PathBuf;
#[cfg(feature = "cli")]
use transmission_etl::cli::commands::check::{CheckArgs, handle_check};
#[cfg(feature = "cli")]
use transmission_etl::cli::commands::config::{handle_config_sample, handle_config_validate};
#[cfg(feature = "cli")]
use transmission_etl::cli::commands::load::{LoadArgs, handle_load};
#[cfg(feature = "cli")]
use transmission_etl::cli::commands::status::{StatusArgs, handle_status};

#[cfg(feature = "cli")]
#[derive(Parser)]
#[command(name = "transmission-etl")]
#[command(about = "Load transmission-outage workbooks into a relational table")]
#[command(version)]
struct Cli {
    /// Configuration file (default: ./etl-transmision.toml if present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[cfg(feature = "cli")]
#[derive(Subcommand)]
enum Commands {
    /// Load every workbook in the source folder
    Load {
        /// Folder holding .xlsx/.xls files
        #[arg(short, long)]
        folder: Option<PathBuf>,
        /// Destination table, optionally schema-qualified
        #[arg(short, long)]
        table: Option<String>,
        /// Ask what to do with files that are already loaded
        #[arg(short, long)]
        interactive: bool,
        /// Rows per insert statement
        #[arg(short, long)]
        batch_size: Option<usize>,
    },

    /// Show the files stored in the destination table
    Status {
        /// Output format
        #[arg(short, long, value_enum, default_value = "table")]
        format: StatusFormatArg,
    },

    /// Show what is stored for one source file
    Check {
        /// Workbook path or file name
        file: PathBuf,
    },

    /// Configuration helpers
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[cfg(feature = "cli")]
#[derive(Subcommand)]
enum ConfigCommands {
    /// Print a sample configuration file
    Sample,
    /// Validate the effective configuration (file + environment)
    Validate,
}

#[cfg(feature = "cli")]
#[derive(clap::ValueEnum, Clone, Debug)]
enum StatusFormatArg {
    Table,
    Json,
    Csv,
}

#[cfg(feature = "cli")]
fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Load {
            folder,
            table,
            interactive,
            batch_size,
        } => {
            let args = LoadArgs {
                config: cli.config,
                folder,
                table,
                interactive,
                batch_size,
                verbose: cli.verbose,
            };
            handle_load(&args).context("Load run failed")
        }
        Commands::Status { format } => {
            let format = match format {
                StatusFormatArg::Table => "table",
                StatusFormatArg::Json => "json",
                StatusFormatArg::Csv => "csv",
            };
            let args = StatusArgs {
                config: cli.config,
                format: format.to_string(),
                verbose: cli.verbose,
            };
            Ok(handle_status(&args)?)
        }
        Commands::Check { file } => {
            let args = CheckArgs {
                config: cli.config,
                file,
                verbose: cli.verbose,
            };
            Ok(handle_check(&args)?)
        }
        Commands::Config { command } => match command {
            ConfigCommands::Sample => Ok(handle_config_sample()?),
            ConfigCommands::Validate => Ok(handle_config_validate(cli.config.as_deref())?),
        },
    }
}

#[cfg(feature = "cli")]
fn main() {
    // A missing .env is normal
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!("CLI feature is not enabled. Build with --features cli");
    std::process::exit(1);
}
