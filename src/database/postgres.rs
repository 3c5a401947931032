//! PostgreSQL database backend implementation
//!
//! Provides a PostgreSQL store for server deployments. Connection settings
//! come from the `[postgres]` configuration section.

use async_trait::async_trait;
use chrono::{Local, NaiveDateTime};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio_postgres::types::ToSql;

use super::schema::{self, parse_db_timestamp};
use super::{DatabaseError, DatabaseResult, StoreGateway, TargetTable, batches};
use crate::config::PostgresSection;
use crate::models::{CanonicalField, CanonicalRow, FieldValue, FileLoadStats, PriorLoadInfo};

type Param = Box<dyn ToSql + Sync>;

/// PostgreSQL database backend
pub struct PostgresBackend {
    /// Connection summary without the password, for logs
    summary: String,
    /// PostgreSQL client (wrapped for async access)
    client: Arc<Mutex<tokio_postgres::Client>>,
}

fn masked_connection_string(user: &str, host: &str, port: u16, database: &str) -> String {
    format!("postgresql://{}:****@{}:{}/{}", user, host, port, database)
}

impl PostgresBackend {
    /// Connect using the `[postgres]` settings
    ///
    /// With integrated authentication no password is sent and the user falls
    /// back to the login name of the current process.
    pub async fn connect(settings: &PostgresSection) -> DatabaseResult<Self> {
        let host = settings
            .host
            .as_deref()
            .ok_or_else(|| DatabaseError::ConfigError("PostgreSQL host is not set".into()))?;
        let database = settings
            .database
            .as_deref()
            .ok_or_else(|| DatabaseError::ConfigError("PostgreSQL database is not set".into()))?;

        let user = match (&settings.username, settings.integrated_auth) {
            (Some(user), _) => user.clone(),
            (None, true) => std::env::var("USER")
                .or_else(|_| std::env::var("USERNAME"))
                .map_err(|_| {
                    DatabaseError::ConfigError(
                        "Integrated authentication needs a username or a USER variable".into(),
                    )
                })?,
            (None, false) => {
                return Err(DatabaseError::ConfigError(
                    "PostgreSQL username is not set".into(),
                ));
            }
        };

        let mut config = tokio_postgres::Config::new();
        config
            .host(host)
            .port(settings.port)
            .dbname(database)
            .user(&user)
            .application_name("transmission-etl");
        if !settings.integrated_auth
            && let Some(password) = &settings.password
        {
            config.password(password);
        }

        let (client, connection) = config.connect(tokio_postgres::NoTls).await.map_err(|e| {
            DatabaseError::ConnectionFailed(format!("Failed to connect to PostgreSQL: {}", e))
        })?;

        // Spawn connection handler
        tokio::spawn(async move {
            if let Err(e) = connection.await {
                tracing::error!("PostgreSQL connection error: {}", e);
            }
        });

        let backend = Self {
            summary: masked_connection_string(&user, host, settings.port, database),
            client: Arc::new(Mutex::new(client)),
        };
        tracing::info!("Connected to {}", backend.connection_string_masked());
        Ok(backend)
    }

    /// Connection string with the password masked
    pub fn connection_string_masked(&self) -> &str {
        &self.summary
    }

    /// Bind values for one row in insert order
    fn row_params(row: &CanonicalRow, fecha_carga: NaiveDateTime, out: &mut Vec<Param>) {
        for field in CanonicalField::PERSISTED {
            out.push(match row.value(field) {
                FieldValue::Text(v) => Box::new(v.map(str::to_string)),
                FieldValue::Timestamp(v) => Box::new(v),
                FieldValue::Number(v) => Box::new(v),
            });
        }
        out.push(Box::new(fecha_carga));
    }
}

fn timestamp(row: &tokio_postgres::Row, idx: usize) -> Option<NaiveDateTime> {
    row.get::<_, Option<String>>(idx)
        .as_deref()
        .and_then(parse_db_timestamp)
}

#[async_trait(?Send)]
impl StoreGateway for PostgresBackend {
    async fn initialize(&self, table: &TargetTable) -> DatabaseResult<()> {
        let client = self.client.lock().await;
        client
            .batch_execute(&schema::create_table_sql(table))
            .await
            .map_err(|e| {
                DatabaseError::MigrationFailed(format!("Failed to create table {}: {}", table, e))
            })
    }

    async fn check_loaded(
        &self,
        table: &TargetTable,
        file_id: &str,
    ) -> DatabaseResult<PriorLoadInfo> {
        let client = self.client.lock().await;
        let row = client
            .query_one(&schema::check_loaded_sql(table), &[&file_id])
            .await
            .map_err(|e| DatabaseError::QueryFailed(format!("Load check failed: {}", e)))?;

        Ok(PriorLoadInfo {
            file_id: file_id.to_string(),
            row_count: row.get::<_, i64>(0).max(0) as u64,
            first_load_at: timestamp(&row, 1),
            last_load_at: timestamp(&row, 2),
            last_update_at: timestamp(&row, 3),
            min_event_at: timestamp(&row, 4),
            max_event_at: timestamp(&row, 5),
        })
    }

    async fn delete_by_file_id(&self, table: &TargetTable, file_id: &str) -> DatabaseResult<u64> {
        let client = self.client.lock().await;
        client
            .execute(&schema::delete_by_file_sql(table), &[&file_id])
            .await
            .map_err(|e| DatabaseError::QueryFailed(format!("Delete failed: {}", e)))
    }

    async fn bulk_insert(
        &self,
        table: &TargetTable,
        rows: &[CanonicalRow],
        batch_size: usize,
    ) -> DatabaseResult<usize> {
        let fecha_carga = Local::now().naive_local();
        let mut client = self.client.lock().await;
        let tx = client
            .transaction()
            .await
            .map_err(|e| DatabaseError::TransactionFailed(format!("Begin failed: {}", e)))?;

        let mut written = 0;
        for batch in batches(rows, batch_size) {
            let mut params: Vec<Param> =
                Vec::with_capacity(batch.len() * schema::INSERT_COLUMN_COUNT);
            for row in batch {
                Self::row_params(row, fecha_carga, &mut params);
            }
            let refs: Vec<&(dyn ToSql + Sync)> = params
                .iter()
                .map(|p| p.as_ref())
                .collect();

            // Dropping the transaction on error rolls it back
            tx.execute(&schema::insert_sql(table, batch.len()), &refs)
                .await
                .map_err(|e| DatabaseError::QueryFailed(format!("Insert failed: {}", e)))?;
            written += batch.len();
            tracing::debug!("Inserted batch of {} rows ({} total)", batch.len(), written);
        }

        tx.commit()
            .await
            .map_err(|e| DatabaseError::TransactionFailed(format!("Commit failed: {}", e)))?;
        Ok(written)
    }

    async fn stats_by_file(&self, table: &TargetTable) -> DatabaseResult<Vec<FileLoadStats>> {
        let client = self.client.lock().await;
        let rows = client
            .query(&schema::stats_by_file_sql(table), &[])
            .await
            .map_err(|e| DatabaseError::QueryFailed(format!("Query failed: {}", e)))?;

        Ok(rows
            .iter()
            .map(|row| FileLoadStats {
                file_id: row.get(0),
                row_count: row.get::<_, i64>(1).max(0) as u64,
                first_load_at: timestamp(row, 2),
            })
            .collect())
    }

    async fn health_check(&self) -> DatabaseResult<bool> {
        let client = self.client.lock().await;
        let row = client
            .query_one("SELECT 1", &[])
            .await
            .map_err(|e| DatabaseError::QueryFailed(format!("Health check failed: {}", e)))?;
        Ok(row.get::<_, i32>(0) == 1)
    }

    fn backend_type(&self) -> &'static str {
        "postgres"
    }

    async fn close(&self) -> DatabaseResult<()> {
        // Connection is closed when the client is dropped
        tracing::info!("Closing {}", self.connection_string_masked());
        Ok(())
    }
}
