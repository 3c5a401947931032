//! In-memory store gateway
//!
//! Keeps rows in a map keyed by table. Used for dry runs and tests; nothing
//! survives the process.

use async_trait::async_trait;
use chrono::{Local, NaiveDateTime};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};

use super::{DatabaseError, DatabaseResult, StoreGateway, TargetTable, batches};
use crate::models::{CanonicalRow, FileLoadStats, PriorLoadInfo};

#[derive(Debug, Clone)]
struct StoredRow {
    row: CanonicalRow,
    fecha_carga: NaiveDateTime,
}

/// In-memory backend
#[derive(Debug, Default)]
pub struct MemoryBackend {
    tables: Mutex<HashMap<TargetTable, Vec<StoredRow>>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> DatabaseResult<MutexGuard<'_, HashMap<TargetTable, Vec<StoredRow>>>> {
        self.tables
            .lock()
            .map_err(|e| DatabaseError::ConnectionFailed(format!("Lock error: {}", e)))
    }

    /// Snapshot of the rows stored in `table`, in insert order
    pub fn rows(&self, table: &TargetTable) -> DatabaseResult<Vec<CanonicalRow>> {
        Ok(self
            .lock()?
            .get(table)
            .map(|rows| rows.iter().map(|r| r.row.clone()).collect())
            .unwrap_or_default())
    }

    fn require<'a>(
        tables: &'a mut HashMap<TargetTable, Vec<StoredRow>>,
        table: &TargetTable,
    ) -> DatabaseResult<&'a mut Vec<StoredRow>> {
        tables
            .get_mut(table)
            .ok_or_else(|| DatabaseError::QueryFailed(format!("Table {} does not exist", table)))
    }
}

#[async_trait(?Send)]
impl StoreGateway for MemoryBackend {
    async fn initialize(&self, table: &TargetTable) -> DatabaseResult<()> {
        self.lock()?.entry(table.clone()).or_default();
        Ok(())
    }

    async fn check_loaded(
        &self,
        table: &TargetTable,
        file_id: &str,
    ) -> DatabaseResult<PriorLoadInfo> {
        let mut tables = self.lock()?;
        let rows: Vec<&StoredRow> = Self::require(&mut tables, table)?
            .iter()
            .filter(|r| r.row.archivo_origen == file_id)
            .collect();

        Ok(PriorLoadInfo {
            file_id: file_id.to_string(),
            row_count: rows.len() as u64,
            first_load_at: rows.iter().map(|r| r.fecha_carga).min(),
            last_load_at: rows.iter().map(|r| r.fecha_carga).max(),
            last_update_at: rows.iter().filter_map(|r| r.row.fecha_actualizacion).max(),
            min_event_at: rows.iter().map(|r| r.row.fecha_hora_apertura).min(),
            max_event_at: rows.iter().map(|r| r.row.fecha_hora_apertura).max(),
        })
    }

    async fn delete_by_file_id(&self, table: &TargetTable, file_id: &str) -> DatabaseResult<u64> {
        let mut tables = self.lock()?;
        let rows = Self::require(&mut tables, table)?;
        let before = rows.len();
        rows.retain(|r| r.row.archivo_origen != file_id);
        Ok((before - rows.len()) as u64)
    }

    async fn bulk_insert(
        &self,
        table: &TargetTable,
        rows: &[CanonicalRow],
        batch_size: usize,
    ) -> DatabaseResult<usize> {
        let fecha_carga = Local::now().naive_local();
        let mut tables = self.lock()?;
        let stored = Self::require(&mut tables, table)?;

        let mut written = 0;
        for batch in batches(rows, batch_size) {
            stored.extend(batch.iter().map(|row| StoredRow {
                row: row.clone(),
                fecha_carga,
            }));
            written += batch.len();
            tracing::debug!("Inserted batch of {} rows ({} total)", batch.len(), written);
        }
        Ok(written)
    }

    async fn stats_by_file(&self, table: &TargetTable) -> DatabaseResult<Vec<FileLoadStats>> {
        let mut tables = self.lock()?;
        let rows = Self::require(&mut tables, table)?;

        let mut by_file: BTreeMap<&str, FileLoadStats> = BTreeMap::new();
        for r in rows.iter() {
            let entry = by_file
                .entry(r.row.archivo_origen.as_str())
                .or_insert_with(|| FileLoadStats {
                    file_id: r.row.archivo_origen.clone(),
                    row_count: 0,
                    first_load_at: None,
                });
            entry.row_count += 1;
            entry.first_load_at = Some(match entry.first_load_at {
                Some(t) => t.min(r.fecha_carga),
                None => r.fecha_carga,
            });
        }
        let mut stats: Vec<FileLoadStats> = by_file.into_values().collect();
        stats.sort_by(|a, b| {
            a.first_load_at
                .cmp(&b.first_load_at)
                .then_with(|| a.file_id.cmp(&b.file_id))
        });
        Ok(stats)
    }

    async fn health_check(&self) -> DatabaseResult<bool> {
        Ok(self.lock().is_ok())
    }

    fn backend_type(&self) -> &'static str {
        "memory"
    }

    async fn close(&self) -> DatabaseResult<()> {
        Ok(())
    }
}
