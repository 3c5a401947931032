//! Lenient cell coercion
//!
//! Every coercion distinguishes three results: a value, a null (the cell was
//! empty or a missing-value marker) and a conversion failure. Callers turn
//! failures into nulls; they never abort a row.

use chrono::{Duration, NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use std::collections::HashSet;
use thiserror::Error;

use crate::models::CellValue;

/// A cell that could not be converted to the column's type
#[derive(Debug, Clone, PartialEq, Error)]
#[error("cannot convert {value:?} to {target}")]
pub struct ConversionError {
    pub value: String,
    pub target: &'static str,
}

impl ConversionError {
    fn new(value: impl Into<String>, target: &'static str) -> Self {
        Self {
            value: value.into(),
            target,
        }
    }
}

/// Text that spreadsheet exports use to mean "no value"
static MISSING_MARKERS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
        "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
    ]
    .into_iter()
    .collect()
});

/// Timestamp layouts accepted in text cells; slashed and dashed dates are
/// read day-first
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
    "%d-%m-%Y %H:%M:%S",
    "%d-%m-%Y %H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%d/%m/%Y", "%d-%m-%Y"];

/// Largest spreadsheet serial that is still a valid date (9999-12-31)
const MAX_SERIAL: f64 = 2_958_465.999_999;

pub fn is_missing_marker(text: &str) -> bool {
    let trimmed = text.trim();
    trimmed.is_empty() || MISSING_MARKERS.contains(trimmed)
}

/// True when a cell carries no value after trimming and marker handling
pub fn is_blank(cell: &CellValue) -> bool {
    match cell {
        CellValue::Empty => true,
        CellValue::Text(s) => is_missing_marker(s),
        CellValue::Number(n) => n.is_nan(),
        CellValue::Bool(_) | CellValue::DateTime(_) => false,
    }
}

/// Convert a spreadsheet serial date (days since 1899-12-30) to a timestamp
pub fn from_excel_serial(serial: f64) -> Option<NaiveDateTime> {
    if !serial.is_finite() || serial < 0.0 || serial > MAX_SERIAL {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?.and_hms_opt(0, 0, 0)?;
    let millis = (serial * 86_400_000.0).round() as i64;
    epoch.checked_add_signed(Duration::milliseconds(millis))
}

fn parse_datetime_text(text: &str) -> Option<NaiveDateTime> {
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

pub fn coerce_timestamp(cell: &CellValue) -> Result<Option<NaiveDateTime>, ConversionError> {
    if is_blank(cell) {
        return Ok(None);
    }
    match cell {
        CellValue::DateTime(ts) => Ok(Some(*ts)),
        CellValue::Number(n) => from_excel_serial(*n)
            .map(Some)
            .ok_or_else(|| ConversionError::new(n.to_string(), "timestamp")),
        CellValue::Text(s) => parse_datetime_text(s.trim())
            .map(Some)
            .ok_or_else(|| ConversionError::new(s.clone(), "timestamp")),
        CellValue::Bool(b) => Err(ConversionError::new(b.to_string(), "timestamp")),
        CellValue::Empty => Ok(None),
    }
}

/// Coerce to a non-negative finite number
pub fn coerce_number(cell: &CellValue) -> Result<Option<f64>, ConversionError> {
    if is_blank(cell) {
        return Ok(None);
    }
    let value = match cell {
        CellValue::Number(n) => *n,
        CellValue::Text(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| ConversionError::new(s.clone(), "number"))?,
        CellValue::Bool(b) => return Err(ConversionError::new(b.to_string(), "number")),
        CellValue::DateTime(ts) => return Err(ConversionError::new(ts.to_string(), "number")),
        CellValue::Empty => return Ok(None),
    };

    if !value.is_finite() || value < 0.0 {
        return Err(ConversionError::new(value.to_string(), "non-negative number"));
    }
    Ok(Some(value))
}

/// Render a number the way it reads in a cell: integral values lose the `.0`
pub fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

/// Coerce to trimmed text; never fails
pub fn coerce_text(cell: &CellValue) -> Option<String> {
    if is_blank(cell) {
        return None;
    }
    match cell {
        CellValue::Text(s) => Some(s.trim().to_string()),
        CellValue::Number(n) => Some(format_number(*n)),
        CellValue::Bool(b) => Some(b.to_string()),
        CellValue::DateTime(ts) => Some(ts.format("%Y-%m-%d %H:%M:%S").to_string()),
        CellValue::Empty => None,
    }
}
