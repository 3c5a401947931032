//! Store gateway for the destination outage table
//!
//! This module provides the persistence seam of the loader. Backends:
//! - DuckDB: embedded database file (default)
//! - PostgreSQL: server deployments
//! - Memory: dry runs and tests
//!
//! Every operation takes the [`TargetTable`] explicitly; backends hold no
//! per-table state.

use async_trait::async_trait;
use std::fmt;

#[cfg(feature = "duckdb-backend")]
pub mod duckdb;

#[cfg(feature = "postgres-backend")]
pub mod postgres;

pub mod memory;
pub mod schema;

#[cfg(feature = "duckdb-backend")]
pub use self::duckdb::DuckDBBackend;

#[cfg(feature = "postgres-backend")]
pub use self::postgres::PostgresBackend;

pub use memory::MemoryBackend;

use crate::config::{DatabaseBackendType, EtlConfig};
use crate::models::{CanonicalRow, FileLoadStats, PriorLoadInfo};
use crate::validation::{quote_identifier, validate_table_name};

/// Error type for database operations
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    /// Failed to connect to database
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Schema creation failed
    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// Transaction failed
    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Backend not compiled into this build
    #[error("Backend '{0}' is not available in this build")]
    BackendUnavailable(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// IO error
    #[error("IO error: {0}")]
    IoError(String),
}

/// Result type for database operations
pub type DatabaseResult<T> = Result<T, DatabaseError>;

/// Validated destination table, optionally schema-qualified
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TargetTable {
    schema: Option<String>,
    name: String,
}

impl TargetTable {
    /// Parse and validate `table` or `schema.table`
    pub fn parse(name: &str) -> DatabaseResult<Self> {
        let (schema, table) = validate_table_name(name.trim())
            .map_err(|e| DatabaseError::InvalidInput(e.to_string()))?;
        Ok(Self {
            schema: schema.map(str::to_string),
            name: table.to_string(),
        })
    }

    pub fn schema(&self) -> Option<&str> {
        self.schema.as_deref()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Quoted name for SQL text
    pub fn qualified(&self) -> String {
        match &self.schema {
            Some(schema) => format!(
                "{}.{}",
                quote_identifier(schema),
                quote_identifier(&self.name)
            ),
            None => quote_identifier(&self.name),
        }
    }
}

impl fmt::Display for TargetTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.schema {
            Some(schema) => write!(f, "{}.{}", schema, self.name),
            None => write!(f, "{}", self.name),
        }
    }
}

/// Persistence operations the loader needs
///
/// All operations are async so the PostgreSQL client can be driven without
/// blocking; the embedded backends complete synchronously.
#[async_trait(?Send)]
pub trait StoreGateway: Send + Sync {
    /// Create the destination table and its file-id index if missing
    async fn initialize(&self, table: &TargetTable) -> DatabaseResult<()>;

    /// Aggregate of the rows stored for `file_id`
    ///
    /// Returns a record with `row_count == 0` when nothing is stored.
    async fn check_loaded(&self, table: &TargetTable, file_id: &str)
    -> DatabaseResult<PriorLoadInfo>;

    /// Delete every row of `file_id` in one statement; returns the count
    async fn delete_by_file_id(&self, table: &TargetTable, file_id: &str) -> DatabaseResult<u64>;

    /// Insert `rows` in batches of `batch_size` inside one transaction
    ///
    /// `FECHA_CARGA` is stamped with the same local timestamp on every row of
    /// the call. Either all rows are written or none.
    async fn bulk_insert(
        &self,
        table: &TargetTable,
        rows: &[CanonicalRow],
        batch_size: usize,
    ) -> DatabaseResult<usize>;

    /// Row count and first load time per stored file
    async fn stats_by_file(&self, table: &TargetTable) -> DatabaseResult<Vec<FileLoadStats>>;

    /// Check that the connection works
    async fn health_check(&self) -> DatabaseResult<bool>;

    /// Get the backend type name
    fn backend_type(&self) -> &'static str;

    /// Release the connection
    async fn close(&self) -> DatabaseResult<()>;
}

/// Open the backend selected by `config`
pub async fn connect(config: &EtlConfig) -> DatabaseResult<Box<dyn StoreGateway>> {
    match config.database.backend {
        DatabaseBackendType::Memory => Ok(Box::new(MemoryBackend::new())),
        #[cfg(feature = "duckdb-backend")]
        DatabaseBackendType::DuckDB => Ok(Box::new(DuckDBBackend::new(&config.database.path)?)),
        #[cfg(not(feature = "duckdb-backend"))]
        DatabaseBackendType::DuckDB => Err(DatabaseError::BackendUnavailable("duckdb".into())),
        #[cfg(feature = "postgres-backend")]
        DatabaseBackendType::Postgres => {
            Ok(Box::new(PostgresBackend::connect(&config.postgres).await?))
        }
        #[cfg(not(feature = "postgres-backend"))]
        DatabaseBackendType::Postgres => {
            Err(DatabaseError::BackendUnavailable("postgres".into()))
        }
    }
}

/// Split rows into insert batches
///
/// A zero size is treated as one; sizes above [`schema::MAX_BATCH_ROWS`] are
/// capped so one statement never exceeds the bind parameter limit.
pub(crate) fn batches(
    rows: &[CanonicalRow],
    batch_size: usize,
) -> std::slice::Chunks<'_, CanonicalRow> {
    rows.chunks(batch_size.clamp(1, schema::MAX_BATCH_ROWS))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_table_parse() {
        let table = TargetTable::parse("Calidad_Transmision").unwrap();
        assert_eq!(table.schema(), None);
        assert_eq!(table.name(), "Calidad_Transmision");
        assert_eq!(table.qualified(), "\"Calidad_Transmision\"");

        let table = TargetTable::parse("etl.Calidad").unwrap();
        assert_eq!(table.qualified(), "\"etl\".\"Calidad\"");
        assert_eq!(table.to_string(), "etl.Calidad");
    }

    #[test]
    fn test_target_table_rejects_injection() {
        assert!(matches!(
            TargetTable::parse("x; DROP TABLE y"),
            Err(DatabaseError::InvalidInput(_))
        ));
        assert!(TargetTable::parse("").is_err());
    }

    #[test]
    fn test_batches_respect_size() {
        let ts = chrono::NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let rows = vec![CanonicalRow::new(ts, "a.xlsx"); 7];

        let sizes: Vec<usize> = batches(&rows, 3).map(|b| b.len()).collect();
        assert_eq!(sizes, vec![3, 3, 1]);
        assert_eq!(batches(&rows, 0).count(), 7);
    }

    #[test]
    fn test_batches_capped_at_parameter_limit() {
        let ts = chrono::NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let rows = vec![CanonicalRow::new(ts, "a.xlsx"); schema::MAX_BATCH_ROWS + 10];

        let sizes: Vec<usize> = batches(&rows, 5000).map(|b| b.len()).collect();
        assert_eq!(sizes, vec![schema::MAX_BATCH_ROWS, 10]);
        assert!(sizes[0] * schema::INSERT_COLUMN_COUNT <= schema::MAX_BIND_PARAMETERS);
    }

    #[tokio::test]
    async fn test_connect_memory() {
        let mut config = EtlConfig::default();
        config.database.backend = DatabaseBackendType::Memory;
        let store = connect(&config).await.unwrap();
        assert_eq!(store.backend_type(), "memory");
        assert!(store.health_check().await.unwrap());
    }
}
