//! Raw worksheet cells and tables

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::enums::CanonicalField;
use super::row::{CanonicalRow, FieldValue};

/// An untyped spreadsheet cell
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum CellValue {
    #[default]
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
    DateTime(NaiveDateTime),
}

impl CellValue {
    pub fn text(value: impl Into<String>) -> Self {
        CellValue::Text(value.into())
    }

    /// True for empty cells only; blank and sentinel text is handled by the
    /// normalizer
    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Number(value)
    }
}

impl From<NaiveDateTime> for CellValue {
    fn from(value: NaiveDateTime) -> Self {
        CellValue::DateTime(value)
    }
}

/// A worksheet read into memory: ordered column names plus ordered rows
///
/// Rows shorter than the header are padded with [`CellValue::Empty`] on read,
/// so every row has exactly `columns.len()` cells.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
}

impl SourceTable {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Append a row, padding or truncating it to the column count
    pub fn push_row(&mut self, mut row: Vec<CellValue>) {
        row.resize(self.columns.len(), CellValue::Empty);
        self.rows.push(row);
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rebuild a table from normalized rows
    ///
    /// Produces one column per source field; the provenance and audit columns
    /// are left out because the normalizer attaches them itself.
    pub fn from_canonical(rows: &[CanonicalRow]) -> Self {
        let mut table = SourceTable::new(
            CanonicalField::SOURCE
                .iter()
                .map(|f| f.column_name().to_string())
                .collect(),
        );

        for row in rows {
            let cells = CanonicalField::SOURCE
                .iter()
                .map(|field| match row.value(*field) {
                    FieldValue::Text(Some(s)) => CellValue::Text(s.to_string()),
                    FieldValue::Timestamp(Some(ts)) => CellValue::DateTime(ts),
                    FieldValue::Number(Some(n)) => CellValue::Number(n),
                    _ => CellValue::Empty,
                })
                .collect();
            table.push_row(cells);
        }

        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_row_pads_short_rows() {
        let mut table = SourceTable::new(vec!["A".into(), "B".into(), "C".into()]);
        table.push_row(vec![CellValue::text("x")]);
        assert_eq!(table.rows[0].len(), 3);
        assert_eq!(table.rows[0][2], CellValue::Empty);
    }

    #[test]
    fn test_column_index() {
        let table = SourceTable::new(vec!["REGION".into(), "SUBESTACION".into()]);
        assert_eq!(table.column_index("SUBESTACION"), Some(1));
        assert_eq!(table.column_index("missing"), None);
    }
}
