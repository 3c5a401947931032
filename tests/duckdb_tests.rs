//! Load runs against a file-backed DuckDB database

#![cfg(feature = "duckdb-backend")]

mod common;

use common::{ScriptedPrompt, write_outage_report};
use transmission_etl::database::DuckDBBackend;
use transmission_etl::resolver::{NoPrompt, ResolveMode};
use transmission_etl::{
    ExcelReader, FileOutcome, LoadAction, LoadOptions, LoadOrchestrator, StoreGateway,
    TargetTable,
};

fn options(mode: ResolveMode) -> LoadOptions {
    LoadOptions {
        sheet: "FORMATO".to_string(),
        batch_size: 4,
        mode,
    }
}

#[tokio::test]
async fn test_load_persists_across_connections() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("input");
    std::fs::create_dir(&input).unwrap();
    write_outage_report(&input, "a.xlsx");
    let db_path = dir.path().join("db").join("calidad.duckdb");
    let table = TargetTable::parse("etl.Calidad_Transmision").unwrap();

    {
        let store = DuckDBBackend::new(&db_path).unwrap();
        let orchestrator = LoadOrchestrator::new(
            &store,
            ExcelReader::new(),
            table.clone(),
            options(ResolveMode::NonInteractive),
        );
        orchestrator.prepare().await.unwrap();
        let summary = orchestrator.run_folder(&input, &mut NoPrompt).await.unwrap();
        assert_eq!(summary.total_rows(), 7);
        store.close().await.unwrap();
    }

    let store = DuckDBBackend::new(&db_path).unwrap();
    assert!(store.health_check().await.unwrap());

    let prior = store.check_loaded(&table, "a.xlsx").await.unwrap();
    assert_eq!(prior.row_count, 7);
    assert!(prior.first_load_at.is_some());
    assert_eq!(prior.last_update_at, None);
    assert_eq!(
        prior.min_event_at.map(|t| t.to_string()).as_deref(),
        Some("2024-01-01 08:30:00")
    );
    assert_eq!(
        prior.max_event_at.map(|t| t.to_string()).as_deref(),
        Some("2024-01-07 08:30:00")
    );

    let stats = store.stats_by_file(&table).await.unwrap();
    assert_eq!(stats.len(), 1);
    assert_eq!(stats[0].file_id, "a.xlsx");
    assert_eq!(stats[0].row_count, 7);
}

#[tokio::test]
async fn test_replace_and_skip() {
    let dir = tempfile::tempdir().unwrap();
    write_outage_report(dir.path(), "a.xlsx");
    let store = DuckDBBackend::in_memory().unwrap();
    let table = TargetTable::parse("Calidad_Transmision").unwrap();

    let first = LoadOrchestrator::new(
        &store,
        ExcelReader::new(),
        table.clone(),
        options(ResolveMode::NonInteractive),
    );
    first.prepare().await.unwrap();
    first.run_folder(dir.path(), &mut NoPrompt).await.unwrap();

    let skipped = first.run_folder(dir.path(), &mut NoPrompt).await.unwrap();
    assert_eq!(skipped.reports[0].outcome, FileOutcome::Skipped);

    let interactive = LoadOrchestrator::new(
        &store,
        ExcelReader::new(),
        table.clone(),
        options(ResolveMode::Interactive),
    );
    let mut prompt = ScriptedPrompt::new(&["2"], &[true]);
    let replaced = interactive.run_folder(dir.path(), &mut prompt).await.unwrap();
    assert_eq!(
        replaced.reports[0].outcome,
        FileOutcome::Success {
            rows: 7,
            action: LoadAction::Replace
        }
    );
    assert_eq!(replaced.reports[0].rows_deleted, 7);

    let prior = store.check_loaded(&table, "a.xlsx").await.unwrap();
    assert_eq!(prior.row_count, 7);
    assert!(prior.last_update_at.is_some());
}
