//! Source column mapping
//!
//! Report templates have drifted over time: some carry a stray space in a
//! header, some an accented one. Every known spelling is renamed to its
//! canonical column; anything else is dropped.

use std::collections::HashMap;

use once_cell::sync::Lazy;

use crate::models::{CanonicalField, SourceTable};

/// Raw headers that differ from their canonical column name
const DEFECTIVE_HEADERS: &[(&str, CanonicalField)] = &[
    ("PROTECCION _OPERADA", CanonicalField::ProteccionOperada),
    (
        "DURACIÓN_INDISPONIBILIDAD_MINUTOS",
        CanonicalField::DuracionIndisponibilidadMinutos,
    ),
];

static COLUMN_MAPPING: Lazy<HashMap<&'static str, CanonicalField>> = Lazy::new(|| {
    let mut map: HashMap<&'static str, CanonicalField> = CanonicalField::SOURCE
        .iter()
        .map(|f| (f.column_name(), *f))
        .collect();
    map.extend(DEFECTIVE_HEADERS.iter().copied());
    map
});

/// Canonical column for a raw header, if it is a known spelling
pub fn canonical_for(raw: &str) -> Option<CanonicalField> {
    COLUMN_MAPPING.get(raw).copied()
}

/// Renames that apply to a set of raw headers (identity renames excluded)
pub fn rename_plan(columns: &[String]) -> Vec<(String, CanonicalField)> {
    columns
        .iter()
        .filter_map(|c| canonical_for(c).map(|f| (c.clone(), f)))
        .filter(|(raw, field)| raw != field.column_name())
        .collect()
}

/// Rename known headers and keep only canonical columns, in source order
pub fn map_columns(table: &SourceTable) -> SourceTable {
    for (raw, field) in rename_plan(&table.columns) {
        tracing::info!("Renaming column '{}' -> '{}'", raw, field);
    }

    let mut keep: Vec<(usize, CanonicalField)> = Vec::new();

    for (idx, raw) in table.columns.iter().enumerate() {
        let Some(field) = canonical_for(raw) else {
            tracing::debug!("Dropping unmapped column '{}'", raw);
            continue;
        };

        if keep.iter().any(|(_, f)| *f == field) {
            tracing::warn!(
                "Column '{}' maps to {} which is already present; keeping the first",
                raw,
                field
            );
            continue;
        }

        keep.push((idx, field));
    }

    let mut mapped = SourceTable::new(
        keep.iter()
            .map(|(_, f)| f.column_name().to_string())
            .collect(),
    );
    for row in &table.rows {
        mapped.push_row(keep.iter().map(|(idx, _)| row[*idx].clone()).collect());
    }

    tracing::info!(
        "Mapped {} of {} columns: {:?}",
        mapped.column_count(),
        table.column_count(),
        mapped.columns
    );

    mapped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CellValue;

    fn table(columns: &[&str], rows: Vec<Vec<CellValue>>) -> SourceTable {
        let mut t = SourceTable::new(columns.iter().map(|c| c.to_string()).collect());
        for r in rows {
            t.push_row(r);
        }
        t
    }

    #[test]
    fn test_stray_space_header_is_corrected() {
        let t = table(
            &["PROTECCION _OPERADA", "REGION"],
            vec![vec!["87T".into(), "NORTE".into()]],
        );
        let mapped = map_columns(&t);
        assert_eq!(mapped.columns, vec!["PROTECCION_OPERADA", "REGION"]);
        assert_eq!(mapped.rows[0][0], CellValue::text("87T"));
    }

    #[test]
    fn test_accented_header_is_corrected() {
        assert_eq!(
            canonical_for("DURACIÓN_INDISPONIBILIDAD_MINUTOS"),
            Some(CanonicalField::DuracionIndisponibilidadMinutos)
        );
    }

    #[test]
    fn test_unknown_columns_are_dropped() {
        let t = table(
            &["OBSERVACIONES", "SUBESTACION", "Unnamed: 3"],
            vec![vec!["x".into(), "SE1".into(), CellValue::Empty]],
        );
        let mapped = map_columns(&t);
        assert_eq!(mapped.columns, vec!["SUBESTACION"]);
        assert_eq!(mapped.rows, vec![vec![CellValue::text("SE1")]]);
    }

    #[test]
    fn test_no_known_columns_yields_zero_column_table() {
        let t = table(&["A", "B"], vec![vec!["1".into(), "2".into()]]);
        let mapped = map_columns(&t);
        assert_eq!(mapped.column_count(), 0);
        assert_eq!(mapped.row_count(), 1);
        assert!(mapped.rows[0].is_empty());
    }

    #[test]
    fn test_duplicate_target_keeps_first() {
        let t = table(
            &["PROTECCION _OPERADA", "PROTECCION_OPERADA"],
            vec![vec!["first".into(), "second".into()]],
        );
        let mapped = map_columns(&t);
        assert_eq!(mapped.columns, vec!["PROTECCION_OPERADA"]);
        assert_eq!(mapped.rows[0][0], CellValue::text("first"));
    }

    #[test]
    fn test_rename_plan_excludes_identity() {
        let plan = rename_plan(&[
            "REGION".to_string(),
            "PROTECCION _OPERADA".to_string(),
            "OTHER".to_string(),
        ]);
        assert_eq!(
            plan,
            vec![(
                "PROTECCION _OPERADA".to_string(),
                CanonicalField::ProteccionOperada
            )]
        );
    }
}
