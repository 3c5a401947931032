//! Row normalization
//!
//! Turns a mapped [`SourceTable`] into [`CanonicalRow`]s. The steps run in a
//! fixed order and each one relies on the previous:
//!
//! 1. drop rows that are blank in every canonical column
//! 2. drop rows without an opening timestamp
//! 3. coerce timestamp columns (failures become null)
//! 4. coerce numeric columns (failures become null)
//! 5. trim text columns
//! 6. fold blanks and missing-value markers into null
//! 7. attach the source file identifier
//!
//! A row whose opening timestamp fails step 3 is dropped as well, so every
//! produced row satisfies the non-null opening timestamp invariant.

pub mod coerce;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::models::{CanonicalField, CanonicalRow, FieldKind, SourceTable};
use coerce::{coerce_number, coerce_text, coerce_timestamp, is_blank};

/// Text longer than this is flagged; typical `VARCHAR` limit
pub const TEXT_WARN_LENGTH: usize = 255;

/// Text longer than this needs an unbounded text column
pub const TEXT_MAX_LENGTH: usize = 4000;

/// Diagnostics collected while normalizing one table
///
/// Advisory only: nothing in here changes which rows are produced.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizeReport {
    pub rows_initial: usize,
    /// Rows left after dropping fully blank rows
    pub rows_non_empty: usize,
    /// Rows left after dropping rows without an opening timestamp
    pub rows_with_open: usize,
    /// Rows dropped because the opening timestamp could not be parsed
    pub rows_unparseable_open: usize,
    pub rows_kept: usize,
    /// Null values per column in the produced rows
    pub null_counts: BTreeMap<CanonicalField, usize>,
    /// Values that failed coercion per column
    pub conversion_failures: BTreeMap<CanonicalField, usize>,
    /// Longest text value per column, for columns over [`TEXT_WARN_LENGTH`]
    pub long_text: BTreeMap<CanonicalField, usize>,
}

/// Normalized rows of one source file
#[derive(Debug, Clone, Default)]
pub struct Normalized {
    pub rows: Vec<CanonicalRow>,
    pub report: NormalizeReport,
}

impl Normalized {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Normalize a mapped table and tag every row with `file_id`
pub fn normalize(table: &SourceTable, file_id: &str) -> Normalized {
    let mut report = NormalizeReport {
        rows_initial: table.row_count(),
        ..Default::default()
    };

    let fields: Vec<(usize, CanonicalField)> = table
        .columns
        .iter()
        .enumerate()
        .filter_map(|(idx, name)| CanonicalField::from_source_name(name).map(|f| (idx, f)))
        .collect();

    // 1. fully blank rows
    let non_empty: Vec<&Vec<_>> = table
        .rows
        .iter()
        .filter(|row| fields.iter().any(|(idx, _)| !is_blank(&row[*idx])))
        .collect();
    report.rows_non_empty = non_empty.len();

    // 2. missing opening timestamp
    let open_idx = fields
        .iter()
        .find(|(_, f)| *f == CanonicalField::FechaHoraApertura)
        .map(|(idx, _)| *idx);
    let with_open: Vec<&Vec<_>> = match open_idx {
        Some(open_idx) => non_empty
            .into_iter()
            .filter(|row| !is_blank(&row[open_idx]))
            .collect(),
        None => {
            if report.rows_non_empty > 0 {
                tracing::warn!(
                    "Column {} is missing; no row can be kept",
                    CanonicalField::FechaHoraApertura
                );
            }
            Vec::new()
        }
    };
    report.rows_with_open = with_open.len();

    // 3-7. coerce, trim, fold nulls, tag
    let mut rows = Vec::with_capacity(with_open.len());
    for cells in with_open {
        let Some(open_idx) = open_idx else { break };
        let open = match coerce_timestamp(&cells[open_idx]) {
            Ok(Some(ts)) => ts,
            Ok(None) => continue,
            Err(e) => {
                tracing::debug!("Dropping row: {}: {}", CanonicalField::FechaHoraApertura, e);
                report.rows_unparseable_open += 1;
                *report
                    .conversion_failures
                    .entry(CanonicalField::FechaHoraApertura)
                    .or_default() += 1;
                continue;
            }
        };

        let mut row = CanonicalRow::new(open, file_id);
        for (idx, field) in &fields {
            if *field == CanonicalField::FechaHoraApertura {
                continue;
            }
            let cell = &cells[*idx];
            match field.kind() {
                FieldKind::Timestamp => {
                    let value = coerce_timestamp(cell).unwrap_or_else(|e| {
                        tracing::debug!("{}: {}", field, e);
                        *report.conversion_failures.entry(*field).or_default() += 1;
                        None
                    });
                    row.set_timestamp(*field, value);
                }
                FieldKind::Number => {
                    let value = coerce_number(cell).unwrap_or_else(|e| {
                        tracing::debug!("{}: {}", field, e);
                        *report.conversion_failures.entry(*field).or_default() += 1;
                        None
                    });
                    row.set_number(*field, value);
                }
                FieldKind::Text => {
                    let value = coerce_text(cell);
                    if let Some(text) = &value {
                        let len = text.chars().count();
                        if len > TEXT_WARN_LENGTH {
                            let longest = report.long_text.entry(*field).or_default();
                            *longest = (*longest).max(len);
                        }
                    }
                    row.set_text(*field, value);
                }
            }
        }
        rows.push(row);
    }

    report.rows_kept = rows.len();
    for (_, field) in &fields {
        let nulls = rows.iter().filter(|r| r.value(*field).is_null()).count();
        report.null_counts.insert(*field, nulls);
    }

    log_report(&report);

    Normalized { rows, report }
}

fn log_report(report: &NormalizeReport) {
    tracing::info!("Initial rows: {}", report.rows_initial);
    tracing::info!("Rows after dropping blank rows: {}", report.rows_non_empty);
    tracing::info!("Rows with an opening timestamp: {}", report.rows_with_open);
    if report.rows_unparseable_open > 0 {
        tracing::warn!(
            "Dropped {} rows with an unreadable {}",
            report.rows_unparseable_open,
            CanonicalField::FechaHoraApertura
        );
    }
    for (field, failures) in &report.conversion_failures {
        tracing::warn!("{}: {} values could not be converted", field, failures);
    }
    for (field, nulls) in &report.null_counts {
        if *nulls > 0 {
            tracing::info!("{}: {} null values", field, nulls);
        }
    }
    for (field, len) in &report.long_text {
        if *len > TEXT_MAX_LENGTH {
            tracing::warn!(
                "{}: values up to {} characters (needs an unbounded text column)",
                field,
                len
            );
        } else {
            tracing::warn!(
                "{}: values up to {} characters (typical limit {})",
                field,
                len,
                TEXT_WARN_LENGTH
            );
        }
    }
    tracing::info!(
        "Normalization complete: {} of {} rows kept",
        report.rows_kept,
        report.rows_initial
    );
}
