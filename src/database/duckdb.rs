//! DuckDB database backend implementation
//!
//! Provides an embedded store for the outage table. Supports both file-based
//! persistence and in-memory mode.

use async_trait::async_trait;
use chrono::Local;
use duckdb::types::Value;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use super::schema::{self, format_db_timestamp, parse_db_timestamp};
use super::{DatabaseError, DatabaseResult, StoreGateway, TargetTable, batches};
use crate::models::{CanonicalField, CanonicalRow, FieldValue, FileLoadStats, PriorLoadInfo};

/// DuckDB database backend
pub struct DuckDBBackend {
    /// Path to the database file (None for in-memory)
    db_path: Option<PathBuf>,
    /// DuckDB connection (wrapped in Mutex for thread safety)
    connection: Mutex<duckdb::Connection>,
}

impl DuckDBBackend {
    /// Create a new DuckDB backend with a file-based database
    pub fn new(db_path: impl AsRef<Path>) -> DatabaseResult<Self> {
        let path = db_path.as_ref().to_path_buf();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| {
                DatabaseError::IoError(format!("Failed to create {}: {}", parent.display(), e))
            })?;
        }

        let connection = duckdb::Connection::open(&path).map_err(|e| {
            DatabaseError::ConnectionFailed(format!("Failed to open DuckDB: {}", e))
        })?;

        tracing::info!("Opened DuckDB database at {}", path.display());

        Ok(Self {
            db_path: Some(path),
            connection: Mutex::new(connection),
        })
    }

    /// Create an in-memory DuckDB backend
    pub fn in_memory() -> DatabaseResult<Self> {
        let connection = duckdb::Connection::open_in_memory().map_err(|e| {
            DatabaseError::ConnectionFailed(format!("Failed to create in-memory DuckDB: {}", e))
        })?;

        Ok(Self {
            db_path: None,
            connection: Mutex::new(connection),
        })
    }

    /// Get the database file path (None for in-memory)
    pub fn db_path(&self) -> Option<&Path> {
        self.db_path.as_deref()
    }

    /// Check if this is an in-memory database
    pub fn is_in_memory(&self) -> bool {
        self.db_path.is_none()
    }

    fn lock(&self) -> DatabaseResult<MutexGuard<'_, duckdb::Connection>> {
        self.connection
            .lock()
            .map_err(|e| DatabaseError::ConnectionFailed(format!("Lock error: {}", e)))
    }

    /// Bind values for one row in insert order
    fn row_params(row: &CanonicalRow, fecha_carga: &str, out: &mut Vec<Value>) {
        for field in CanonicalField::PERSISTED {
            out.push(match row.value(field) {
                FieldValue::Text(Some(s)) => Value::Text(s.to_string()),
                FieldValue::Timestamp(Some(ts)) => Value::Text(format_db_timestamp(&ts)),
                FieldValue::Number(Some(n)) => Value::Double(n),
                _ => Value::Null,
            });
        }
        out.push(Value::Text(fecha_carga.to_string()));
    }
}

fn timestamp(text: Option<String>) -> Option<chrono::NaiveDateTime> {
    text.as_deref().and_then(parse_db_timestamp)
}

#[async_trait(?Send)]
impl StoreGateway for DuckDBBackend {
    async fn initialize(&self, table: &TargetTable) -> DatabaseResult<()> {
        let conn = self.lock()?;
        conn.execute_batch(&schema::create_table_sql(table))
            .map_err(|e| {
                DatabaseError::MigrationFailed(format!("Failed to create table {}: {}", table, e))
            })
    }

    async fn check_loaded(
        &self,
        table: &TargetTable,
        file_id: &str,
    ) -> DatabaseResult<PriorLoadInfo> {
        let conn = self.lock()?;
        conn.query_row(&schema::check_loaded_sql(table), [file_id], |row| {
            Ok(PriorLoadInfo {
                file_id: file_id.to_string(),
                row_count: row.get::<_, i64>(0)?.max(0) as u64,
                first_load_at: timestamp(row.get(1)?),
                last_load_at: timestamp(row.get(2)?),
                last_update_at: timestamp(row.get(3)?),
                min_event_at: timestamp(row.get(4)?),
                max_event_at: timestamp(row.get(5)?),
            })
        })
        .map_err(|e| DatabaseError::QueryFailed(format!("Load check failed: {}", e)))
    }

    async fn delete_by_file_id(&self, table: &TargetTable, file_id: &str) -> DatabaseResult<u64> {
        let conn = self.lock()?;
        let deleted = conn
            .execute(&schema::delete_by_file_sql(table), [file_id])
            .map_err(|e| DatabaseError::QueryFailed(format!("Delete failed: {}", e)))?;
        Ok(deleted as u64)
    }

    async fn bulk_insert(
        &self,
        table: &TargetTable,
        rows: &[CanonicalRow],
        batch_size: usize,
    ) -> DatabaseResult<usize> {
        let fecha_carga = format_db_timestamp(&Local::now().naive_local());
        let mut conn = self.lock()?;
        let tx = conn
            .transaction()
            .map_err(|e| DatabaseError::TransactionFailed(format!("Begin failed: {}", e)))?;

        let mut written = 0;
        for batch in batches(rows, batch_size) {
            let mut params = Vec::with_capacity(batch.len() * schema::INSERT_COLUMN_COUNT);
            for row in batch {
                Self::row_params(row, &fecha_carga, &mut params);
            }
            // Dropping the transaction on error rolls it back
            tx.execute(
                &schema::insert_sql(table, batch.len()),
                duckdb::params_from_iter(params),
            )
            .map_err(|e| DatabaseError::QueryFailed(format!("Insert failed: {}", e)))?;
            written += batch.len();
            tracing::debug!("Inserted batch of {} rows ({} total)", batch.len(), written);
        }

        tx.commit()
            .map_err(|e| DatabaseError::TransactionFailed(format!("Commit failed: {}", e)))?;
        Ok(written)
    }

    async fn stats_by_file(&self, table: &TargetTable) -> DatabaseResult<Vec<FileLoadStats>> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare(&schema::stats_by_file_sql(table))
            .map_err(|e| DatabaseError::QueryFailed(format!("Prepare failed: {}", e)))?;

        let rows = stmt
            .query_map([], |row| {
                Ok(FileLoadStats {
                    file_id: row.get(0)?,
                    row_count: row.get::<_, i64>(1)?.max(0) as u64,
                    first_load_at: timestamp(row.get(2)?),
                })
            })
            .map_err(|e| DatabaseError::QueryFailed(format!("Query failed: {}", e)))?;

        rows.collect::<Result<Vec<_>, _>>()
            .map_err(|e| DatabaseError::QueryFailed(format!("Row fetch error: {}", e)))
    }

    async fn health_check(&self) -> DatabaseResult<bool> {
        let conn = self.lock()?;
        let one: i32 = conn
            .query_row("SELECT 1", [], |row| row.get(0))
            .map_err(|e| DatabaseError::QueryFailed(format!("Health check failed: {}", e)))?;
        Ok(one == 1)
    }

    fn backend_type(&self) -> &'static str {
        "duckdb"
    }

    async fn close(&self) -> DatabaseResult<()> {
        // DuckDB connection is closed when dropped; flush the WAL so the file
        // is complete if the process exits right after
        if !self.is_in_memory() {
            let conn = self.lock()?;
            conn.execute_batch("CHECKPOINT")
                .map_err(|e| DatabaseError::QueryFailed(format!("Checkpoint failed: {}", e)))?;
        }
        Ok(())
    }
}
