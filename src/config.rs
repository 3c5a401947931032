//! Configuration file support
//!
//! Handles parsing of `etl-transmision.toml` configuration files and
//! environment variable overrides. Precedence, lowest first: defaults, the
//! file, `.env` (loaded by the binary), environment variables, CLI flags.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::database::{DatabaseError, DatabaseResult, TargetTable};
use crate::import::DEFAULT_SHEET;

/// Default configuration filename
pub const CONFIG_FILENAME: &str = "etl-transmision.toml";

/// Default folder holding the report workbooks
pub const DEFAULT_SOURCE_FOLDER: &str = "datos_transmision";

/// Default destination table
pub const DEFAULT_TABLE: &str = "Calidad_Transmision";

/// Default number of rows per insert batch
pub const DEFAULT_BATCH_SIZE: usize = 500;

/// Default database filename for DuckDB
pub const DEFAULT_DUCKDB_FILENAME: &str = "calidad_transmision.duckdb";

/// Default directory for run logs
pub const DEFAULT_LOG_DIR: &str = "logs";

/// Environment variable selecting the store backend (`duckdb`, `postgres`
/// or `memory`); ODBC driver names are not accepted
pub const ENV_DRIVER: &str = "SQL_DRIVER";
/// Environment variable for the PostgreSQL host
pub const ENV_SERVER: &str = "SQL_SERVER";
pub const ENV_PORT: &str = "SQL_PORT";
pub const ENV_DATABASE: &str = "SQL_DATABASE";
pub const ENV_USERNAME: &str = "SQL_USERNAME";
pub const ENV_PASSWORD: &str = "SQL_PASSWORD";
/// Environment variable enabling integrated authentication (`true`/`yes`/`1`)
pub const ENV_INTEGRATED_AUTH: &str = "SQL_USE_WINDOWS_AUTH";
pub const ENV_TABLE_NAME: &str = "SQL_TABLE_NAME";
pub const ENV_SOURCE_FOLDER: &str = "EXCEL_FOLDER_TRANSMISION";
/// Environment variable for DuckDB path
pub const ENV_DUCKDB_PATH: &str = "ETL_DUCKDB_PATH";
pub const ENV_INTERACTIVE: &str = "ETL_INTERACTIVE";
pub const ENV_BATCH_SIZE: &str = "ETL_BATCH_SIZE";
pub const ENV_LOG_DIR: &str = "ETL_LOG_DIR";

/// Database backend type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseBackendType {
    /// DuckDB embedded database (default)
    #[default]
    DuckDB,
    /// PostgreSQL database
    Postgres,
    /// In-memory store, nothing persisted
    Memory,
}

impl std::str::FromStr for DatabaseBackendType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "duckdb" => Ok(DatabaseBackendType::DuckDB),
            "postgres" | "postgresql" => Ok(DatabaseBackendType::Postgres),
            "memory" => Ok(DatabaseBackendType::Memory),
            _ => Err(format!(
                "Unknown database backend: {}. Use 'duckdb', 'postgres' or 'memory'.",
                s
            )),
        }
    }
}

impl std::fmt::Display for DatabaseBackendType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DatabaseBackendType::DuckDB => write!(f, "duckdb"),
            DatabaseBackendType::Postgres => write!(f, "postgres"),
            DatabaseBackendType::Memory => write!(f, "memory"),
        }
    }
}

/// Source workbook configuration section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceSection {
    /// Folder scanned for `.xlsx` / `.xls` files
    #[serde(default = "default_source_folder")]
    pub folder: PathBuf,

    /// Worksheet read from every workbook
    #[serde(default = "default_sheet")]
    pub sheet: String,
}

fn default_source_folder() -> PathBuf {
    PathBuf::from(DEFAULT_SOURCE_FOLDER)
}

fn default_sheet() -> String {
    DEFAULT_SHEET.to_string()
}

impl Default for SourceSection {
    fn default() -> Self {
        Self {
            folder: default_source_folder(),
            sheet: default_sheet(),
        }
    }
}

/// Destination table configuration section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetSection {
    /// Table name, optionally `schema.table`
    #[serde(default = "default_table")]
    pub table: String,

    /// Rows per insert statement
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

fn default_table() -> String {
    DEFAULT_TABLE.to_string()
}

fn default_batch_size() -> usize {
    DEFAULT_BATCH_SIZE
}

impl Default for TargetSection {
    fn default() -> Self {
        Self {
            table: default_table(),
            batch_size: default_batch_size(),
        }
    }
}

/// Load behaviour configuration section
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoadSection {
    /// Ask the operator what to do with already-loaded files
    #[serde(default)]
    pub interactive: bool,
}

/// Database configuration section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseSection {
    /// Database backend type
    #[serde(default)]
    pub backend: DatabaseBackendType,

    /// Path to DuckDB database file
    #[serde(default = "default_duckdb_path")]
    pub path: PathBuf,
}

fn default_duckdb_path() -> PathBuf {
    PathBuf::from(DEFAULT_DUCKDB_FILENAME)
}

impl Default for DatabaseSection {
    fn default() -> Self {
        Self {
            backend: DatabaseBackendType::default(),
            path: default_duckdb_path(),
        }
    }
}

/// PostgreSQL configuration section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostgresSection {
    #[serde(default)]
    pub host: Option<String>,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default)]
    pub database: Option<String>,

    #[serde(default)]
    pub username: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    /// Authenticate as the process user without a password
    #[serde(default)]
    pub integrated_auth: bool,
}

fn default_port() -> u16 {
    5432
}

impl Default for PostgresSection {
    fn default() -> Self {
        Self {
            host: None,
            port: default_port(),
            database: None,
            username: None,
            password: None,
            integrated_auth: false,
        }
    }
}

/// Logging configuration section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingSection {
    /// Directory for per-run log files
    #[serde(default = "default_log_dir")]
    pub dir: PathBuf,

    /// `tracing` filter directive; `RUST_LOG` wins when set
    #[serde(default)]
    pub filter: Option<String>,
}

fn default_log_dir() -> PathBuf {
    PathBuf::from(DEFAULT_LOG_DIR)
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            dir: default_log_dir(),
            filter: None,
        }
    }
}

/// Main configuration structure
///
/// Represents the `etl-transmision.toml` configuration file format.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EtlConfig {
    #[serde(default)]
    pub source: SourceSection,

    #[serde(default)]
    pub target: TargetSection,

    #[serde(default)]
    pub load: LoadSection,

    #[serde(default)]
    pub database: DatabaseSection,

    /// PostgreSQL-specific configuration
    #[serde(default)]
    pub postgres: PostgresSection,

    #[serde(default)]
    pub logging: LoggingSection,
}

impl EtlConfig {
    /// Create a new default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from `path`, or from [`CONFIG_FILENAME`] in the
    /// working directory when no path is given
    ///
    /// An explicit path must exist; the default file is optional. Environment
    /// overrides are applied on top.
    pub fn load(path: Option<&Path>) -> DatabaseResult<Self> {
        let mut config = match path {
            Some(path) => Self::read(path)?,
            None => {
                let default_path = Path::new(CONFIG_FILENAME);
                if default_path.exists() {
                    Self::read(default_path)?
                } else {
                    Self::default()
                }
            }
        };

        config.apply_env_overrides()?;
        Ok(config)
    }

    fn read(path: &Path) -> DatabaseResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            DatabaseError::IoError(format!("Failed to read config {}: {}", path.display(), e))
        })?;
        Self::parse(&content)
    }

    /// Parse configuration from TOML string
    pub fn parse(content: &str) -> DatabaseResult<Self> {
        toml::from_str(content)
            .map_err(|e| DatabaseError::ConfigError(format!("Failed to parse config: {}", e)))
    }

    /// Convert configuration to TOML string
    pub fn to_toml(&self) -> DatabaseResult<String> {
        toml::to_string_pretty(self).map_err(|e| {
            DatabaseError::ConfigError(format!("Failed to serialize config: {}", e))
        })
    }

    /// Apply environment variable overrides from the process environment
    pub fn apply_env_overrides(&mut self) -> DatabaseResult<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from any key lookup
    ///
    /// Empty values are ignored. A value that cannot be parsed is an error
    /// rather than silently falling back to the default.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> DatabaseResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(driver) = get(ENV_DRIVER) {
            self.database.backend = driver.parse().map_err(|e| {
                DatabaseError::ConfigError(format!(
                    "{} selects the store backend, not an ODBC driver: {}",
                    ENV_DRIVER, e
                ))
            })?;
        }
        if let Some(path) = get(ENV_DUCKDB_PATH) {
            self.database.path = PathBuf::from(path);
        }
        if let Some(host) = get(ENV_SERVER) {
            self.postgres.host = Some(host);
        }
        if let Some(port) = get(ENV_PORT) {
            self.postgres.port = port.trim().parse().map_err(|_| {
                DatabaseError::ConfigError(format!("{}: invalid port '{}'", ENV_PORT, port))
            })?;
        }
        if let Some(database) = get(ENV_DATABASE) {
            self.postgres.database = Some(database);
        }
        if let Some(username) = get(ENV_USERNAME) {
            self.postgres.username = Some(username);
        }
        if let Some(password) = get(ENV_PASSWORD) {
            self.postgres.password = Some(password);
        }
        if let Some(flag) = get(ENV_INTEGRATED_AUTH) {
            self.postgres.integrated_auth = parse_flag(ENV_INTEGRATED_AUTH, &flag)?;
        }
        if let Some(table) = get(ENV_TABLE_NAME) {
            self.target.table = table;
        }
        if let Some(size) = get(ENV_BATCH_SIZE) {
            self.target.batch_size = size.trim().parse().map_err(|_| {
                DatabaseError::ConfigError(format!("{}: invalid number '{}'", ENV_BATCH_SIZE, size))
            })?;
        }
        if let Some(folder) = get(ENV_SOURCE_FOLDER) {
            self.source.folder = PathBuf::from(folder);
        }
        if let Some(flag) = get(ENV_INTERACTIVE) {
            self.load.interactive = parse_flag(ENV_INTERACTIVE, &flag)?;
        }
        if let Some(dir) = get(ENV_LOG_DIR) {
            self.logging.dir = PathBuf::from(dir);
        }

        Ok(())
    }

    /// Check the configuration before any file is touched
    pub fn validate(&self) -> DatabaseResult<()> {
        self.target_table()?;

        if self.target.batch_size == 0 {
            return Err(DatabaseError::ConfigError(
                "batch_size must be greater than zero".into(),
            ));
        }
        if self.source.sheet.trim().is_empty() {
            return Err(DatabaseError::ConfigError("sheet name cannot be empty".into()));
        }

        match self.database.backend {
            DatabaseBackendType::DuckDB => {
                if self.database.path.as_os_str().is_empty() {
                    return Err(DatabaseError::ConfigError(
                        "DuckDB backend requires a database path".into(),
                    ));
                }
            }
            DatabaseBackendType::Postgres => {
                let mut missing = Vec::new();
                if is_unset(&self.postgres.host) {
                    missing.push(ENV_SERVER);
                }
                if is_unset(&self.postgres.database) {
                    missing.push(ENV_DATABASE);
                }
                if !self.postgres.integrated_auth {
                    if is_unset(&self.postgres.username) {
                        missing.push(ENV_USERNAME);
                    }
                    if is_unset(&self.postgres.password) {
                        missing.push(ENV_PASSWORD);
                    }
                }
                if !missing.is_empty() {
                    return Err(DatabaseError::ConfigError(format!(
                        "Missing PostgreSQL settings: {}",
                        missing.join(", ")
                    )));
                }
            }
            DatabaseBackendType::Memory => {}
        }

        Ok(())
    }

    /// The validated destination table
    pub fn target_table(&self) -> DatabaseResult<TargetTable> {
        TargetTable::parse(&self.target.table)
            .map_err(|e| DatabaseError::ConfigError(format!("target table: {}", e)))
    }

    /// One-line description of the store, never including the password
    pub fn connection_summary(&self) -> String {
        match self.database.backend {
            DatabaseBackendType::DuckDB => {
                format!("duckdb ({})", self.database.path.display())
            }
            DatabaseBackendType::Postgres => {
                let auth = if self.postgres.integrated_auth {
                    "integrated authentication".to_string()
                } else {
                    format!(
                        "user {}",
                        self.postgres.username.as_deref().unwrap_or("<unset>")
                    )
                };
                format!(
                    "postgres ({}:{}/{}, {})",
                    self.postgres.host.as_deref().unwrap_or("<unset>"),
                    self.postgres.port,
                    self.postgres.database.as_deref().unwrap_or("<unset>"),
                    auth
                )
            }
            DatabaseBackendType::Memory => "memory (nothing is persisted)".to_string(),
        }
    }
}

fn is_unset(value: &Option<String>) -> bool {
    value.as_deref().map(|v| v.trim().is_empty()).unwrap_or(true)
}

fn parse_flag(key: &str, value: &str) -> DatabaseResult<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(DatabaseError::ConfigError(format!(
            "{}: expected true or false, got '{}'",
            key, value
        ))),
    }
}

/// Generate a sample configuration file content
pub fn sample_config() -> &'static str {
    r#"# Transmission outage loader configuration

[source]
# Folder scanned for .xlsx / .xls reports (env: EXCEL_FOLDER_TRANSMISION)
folder = "datos_transmision"
# Worksheet read from every report
sheet = "FORMATO"

[target]
# Destination table, optionally "schema.table" (env: SQL_TABLE_NAME)
table = "Calidad_Transmision"
# Rows per insert statement (env: ETL_BATCH_SIZE)
batch_size = 500

[load]
# Ask what to do with files that are already loaded (env: ETL_INTERACTIVE)
# When false, loaded files are skipped
interactive = false

[database]
# Backend: "duckdb" (default), "postgres" or "memory" (env: SQL_DRIVER)
backend = "duckdb"
# DuckDB database file (env: ETL_DUCKDB_PATH)
path = "calidad_transmision.duckdb"

[postgres]
# Used when backend = "postgres"
# host = "localhost"          # env: SQL_SERVER
port = 5432                   # env: SQL_PORT
# database = "calidad"        # env: SQL_DATABASE
# username = "etl"            # env: SQL_USERNAME
# password is best set through SQL_PASSWORD
integrated_auth = false       # env: SQL_USE_WINDOWS_AUTH

[logging]
# Per-run log files are written here (env: ETL_LOG_DIR)
dir = "logs"
# filter = "info,transmission_etl=debug"
"#
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::tempdir;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = EtlConfig::new();
        assert_eq!(config.database.backend, DatabaseBackendType::DuckDB);
        assert_eq!(config.source.folder, PathBuf::from("datos_transmision"));
        assert_eq!(config.source.sheet, "FORMATO");
        assert_eq!(config.target.table, "Calidad_Transmision");
        assert_eq!(config.target.batch_size, 500);
        assert!(!config.load.interactive);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_config() {
        let toml = r#"
[source]
folder = "reportes"

[target]
table = "etl.Calidad"
batch_size = 100

[database]
backend = "memory"
"#;
        let config = EtlConfig::parse(toml).unwrap();
        assert_eq!(config.source.folder, PathBuf::from("reportes"));
        assert_eq!(config.source.sheet, "FORMATO");
        assert_eq!(config.target.batch_size, 100);
        assert_eq!(config.database.backend, DatabaseBackendType::Memory);
        assert_eq!(config.target_table().unwrap().schema(), Some("etl"));
    }

    #[test]
    fn test_env_overrides() {
        let mut config = EtlConfig::new();
        config
            .apply_overrides(env(&[
                (ENV_DRIVER, "postgresql"),
                (ENV_SERVER, "db.local"),
                (ENV_PORT, "6543"),
                (ENV_DATABASE, "calidad"),
                (ENV_INTEGRATED_AUTH, "yes"),
                (ENV_TABLE_NAME, "Outages"),
                (ENV_SOURCE_FOLDER, "/data/in"),
                (ENV_INTERACTIVE, "true"),
                (ENV_USERNAME, ""),
            ]))
            .unwrap();

        assert_eq!(config.database.backend, DatabaseBackendType::Postgres);
        assert_eq!(config.postgres.host.as_deref(), Some("db.local"));
        assert_eq!(config.postgres.port, 6543);
        assert!(config.postgres.integrated_auth);
        assert_eq!(config.postgres.username, None);
        assert_eq!(config.target.table, "Outages");
        assert_eq!(config.source.folder, PathBuf::from("/data/in"));
        assert!(config.load.interactive);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_env_values_are_errors() {
        let mut config = EtlConfig::new();
        assert!(config.apply_overrides(env(&[(ENV_DRIVER, "oracle")])).is_err());
        assert!(config.apply_overrides(env(&[(ENV_BATCH_SIZE, "many")])).is_err());
        assert!(config
            .apply_overrides(env(&[(ENV_INTERACTIVE, "maybe")]))
            .is_err());
    }

    #[test]
    fn test_odbc_driver_name_explains_backend_choice() {
        let mut config = EtlConfig::new();
        let err = config
            .apply_overrides(env(&[(ENV_DRIVER, "ODBC Driver 17 for SQL Server")]))
            .unwrap_err()
            .to_string();
        assert!(err.contains("SQL_DRIVER selects the store backend"));
        assert!(err.contains("ODBC Driver 17 for SQL Server"));
        assert!(err.contains("'duckdb', 'postgres' or 'memory'"));
        assert_eq!(config.database.backend, DatabaseBackendType::DuckDB);
    }

    #[test]
    fn test_validate_postgres_requires_credentials() {
        let mut config = EtlConfig::new();
        config.database.backend = DatabaseBackendType::Postgres;
        config.postgres.host = Some("db.local".into());
        config.postgres.database = Some("calidad".into());

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains(ENV_USERNAME));
        assert!(err.contains(ENV_PASSWORD));
        assert!(!err.contains(ENV_SERVER));

        config.postgres.username = Some("etl".into());
        config.postgres.password = Some("secret".into());
        assert!(config.validate().is_ok());
        assert!(!config.connection_summary().contains("secret"));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = EtlConfig::new();
        config.target.batch_size = 0;
        assert!(config.validate().is_err());

        let mut config = EtlConfig::new();
        config.target.table = "Calidad; DROP TABLE x".into();
        assert!(matches!(
            config.validate(),
            Err(DatabaseError::ConfigError(_))
        ));

        let mut config = EtlConfig::new();
        config.database.path = PathBuf::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_explicit_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        std::fs::write(&path, "[target]\nbatch_size = 42\n").unwrap();

        let config = EtlConfig::load(Some(&path)).unwrap();
        assert_eq!(config.target.batch_size, 42);

        assert!(EtlConfig::load(Some(&dir.path().join("absent.toml"))).is_err());
    }

    #[test]
    fn test_to_toml_skips_unset_password() {
        let mut config = EtlConfig::new();
        config.postgres.password = Some("secret".into());
        let toml = config.to_toml().unwrap();
        assert!(toml.contains("Calidad_Transmision"));
        assert!(toml.contains("secret"));

        config.postgres.password = None;
        assert!(!config.to_toml().unwrap().contains("password"));
    }

    #[test]
    fn test_backend_type_from_str() {
        assert_eq!(
            "duckdb".parse::<DatabaseBackendType>().unwrap(),
            DatabaseBackendType::DuckDB
        );
        assert_eq!(
            "Postgres".parse::<DatabaseBackendType>().unwrap(),
            DatabaseBackendType::Postgres
        );
        assert_eq!(
            "memory".parse::<DatabaseBackendType>().unwrap(),
            DatabaseBackendType::Memory
        );
        assert!("invalid".parse::<DatabaseBackendType>().is_err());
    }

    #[test]
    fn test_sample_config_is_valid() {
        let config = EtlConfig::parse(sample_config()).unwrap();
        assert_eq!(config, EtlConfig::default());
    }
}
