//! Read worksheets from `.xlsx` / `.xls` workbooks

use std::path::Path;

use calamine::{Data, Reader, open_workbook_auto};

use super::{ImportError, SheetReader};
use crate::models::{CellValue, SourceTable};
use crate::normalize::coerce::{format_number, from_excel_serial};

/// Workbook reader backed by calamine
#[derive(Debug, Clone, Copy, Default)]
pub struct ExcelReader;

impl ExcelReader {
    pub fn new() -> Self {
        Self
    }
}

/// Convert a calamine cell to an untyped cell
fn cell_to_value(cell: &Data) -> CellValue {
    match cell {
        Data::Empty => CellValue::Empty,
        Data::String(s) => CellValue::Text(s.clone()),
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Float(f) => CellValue::Number(*f),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::DateTime(dt) => {
            if dt.is_datetime() {
                from_excel_serial(dt.as_f64())
                    .map(CellValue::DateTime)
                    .unwrap_or(CellValue::Number(dt.as_f64()))
            } else {
                CellValue::Number(dt.as_f64())
            }
        }
        Data::DateTimeIso(s) => CellValue::Text(s.clone()),
        Data::DurationIso(s) => CellValue::Text(s.clone()),
        Data::Error(_) => CellValue::Empty,
    }
}

/// Header text for a cell; blank headers get a positional name
fn header_name(cell: &Data, idx: usize) -> String {
    let name = match cell {
        Data::String(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => format_number(*f),
        Data::Bool(b) => b.to_string(),
        Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
        _ => String::new(),
    };
    if name.is_empty() {
        format!("Unnamed: {}", idx)
    } else {
        name
    }
}

impl SheetReader for ExcelReader {
    fn read_sheet(&self, path: &Path, sheet: &str) -> Result<SourceTable, ImportError> {
        let mut workbook = open_workbook_auto(path).map_err(|e| ImportError::WorkbookError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        let available = workbook.sheet_names().to_vec();
        if !available.iter().any(|s| s == sheet) {
            tracing::error!("Sheet '{}' not found in {}", sheet, path.display());
            tracing::info!("Available sheets: {:?}", available);
            return Err(ImportError::SheetNotFound {
                sheet: sheet.to_string(),
                available,
            });
        }

        let range = workbook
            .worksheet_range(sheet)
            .map_err(|e| ImportError::WorkbookError {
                path: path.to_path_buf(),
                message: format!("Failed to read sheet '{}': {}", sheet, e),
            })?;

        let mut rows = range.rows();
        let Some(header) = rows.next() else {
            return Ok(SourceTable::default());
        };

        let mut table = SourceTable::new(
            header
                .iter()
                .enumerate()
                .map(|(idx, c)| header_name(c, idx))
                .collect(),
        );
        for row in rows {
            table.push_row(row.iter().map(cell_to_value).collect());
        }

        tracing::info!(
            "Read sheet '{}': {} rows, {} columns",
            sheet,
            table.row_count(),
            table.column_count()
        );

        Ok(table)
    }
}
