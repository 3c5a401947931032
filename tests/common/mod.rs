//! Shared fixtures: outage workbooks written with rust_xlsxwriter

#![allow(dead_code)]

use rust_xlsxwriter::{ExcelDateTime, Format, Workbook};
use std::path::{Path, PathBuf};
use transmission_etl::resolver::{ConflictPrompt, ResolveError};
use transmission_etl::{LoadAction, PriorLoadInfo};

/// Header row of the fixture workbooks, including two defective spellings and
/// one column the loader does not know
pub const HEADERS: [&str; 7] = [
    "FECHA_HORA_APERTURA",
    "FECHA_HORA_CIERRE",
    "DURACIÓN_INDISPONIBILIDAD_MINUTOS",
    "SUBESTACION",
    "PROTECCION _OPERADA",
    "CAUSA_EVENTO",
    "OBSERVACIONES",
];

/// One fixture cell
#[derive(Debug, Clone)]
pub enum Cell {
    Blank,
    Text(&'static str),
    Owned(String),
    Number(f64),
    /// Native date cell: year, month, day, hour, minute
    DateTime(u16, u8, u8, u16, u8),
}

/// Write `rows` under `headers` into sheet `sheet` of `dir/name`
pub fn write_workbook(
    dir: &Path,
    name: &str,
    sheet: &str,
    headers: &[&str],
    rows: &[Vec<Cell>],
) -> PathBuf {
    let path = dir.join(name);
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(sheet).unwrap();
    let date_format = Format::new().set_num_format("yyyy-mm-dd hh:mm:ss");

    for (col, header) in headers.iter().enumerate() {
        worksheet.write_string(0, col as u16, *header).unwrap();
    }
    for (r, row) in rows.iter().enumerate() {
        let r = r as u32 + 1;
        for (col, cell) in row.iter().enumerate() {
            let col = col as u16;
            match cell {
                Cell::Blank => {}
                Cell::Text(s) => {
                    worksheet.write_string(r, col, *s).unwrap();
                }
                Cell::Owned(s) => {
                    worksheet.write_string(r, col, s.as_str()).unwrap();
                }
                Cell::Number(n) => {
                    worksheet.write_number(r, col, *n).unwrap();
                }
                Cell::DateTime(year, month, day, hour, minute) => {
                    let datetime = ExcelDateTime::from_ymd(*year, *month, *day)
                        .unwrap()
                        .and_hms(*hour, *minute, 0)
                        .unwrap();
                    worksheet
                        .write_datetime_with_format(r, col, &datetime, &date_format)
                        .unwrap();
                }
            }
        }
    }

    workbook.save(&path).unwrap();
    path
}

fn event(day: u32, substation: &'static str) -> Vec<Cell> {
    vec![
        Cell::Owned(format!("2024-01-{:02} 08:30:00", day)),
        Cell::Owned(format!("2024-01-{:02} 10:00:00", day)),
        Cell::Number(90.0),
        Cell::Text(substation),
        Cell::Text("  DISTANCIA  "),
        Cell::Text("DESCARGA ATMOSFERICA"),
        Cell::Text("ignored"),
    ]
}

/// The ten-row report: two rows lack an opening time and one is fully blank,
/// leaving seven loadable events
pub fn outage_rows() -> Vec<Vec<Cell>> {
    let mut no_open = event(20, "SE NORTE");
    no_open[0] = Cell::Blank;
    let mut na_open = event(21, "SE SUR");
    na_open[0] = Cell::Text("N/A");

    vec![
        event(1, "SE CENTRO"),
        event(2, "SE CENTRO"),
        no_open,
        event(3, "SE ESTE"),
        vec![Cell::Blank; HEADERS.len()],
        event(4, "SE OESTE"),
        na_open,
        event(5, "SE NORTE"),
        event(6, "SE SUR"),
        event(7, "SE CENTRO"),
    ]
}

/// Write the ten-row report as `dir/name` with the FORMATO sheet
pub fn write_outage_report(dir: &Path, name: &str) -> PathBuf {
    write_workbook(dir, name, "FORMATO", &HEADERS, &outage_rows())
}

/// Prompt that answers from a script and records what it was shown
#[derive(Debug, Default)]
pub struct ScriptedPrompt {
    answers: Vec<&'static str>,
    confirmations: Vec<bool>,
    pub shown: Vec<PriorLoadInfo>,
}

impl ScriptedPrompt {
    pub fn new(answers: &[&'static str], confirmations: &[bool]) -> Self {
        Self {
            answers: answers.iter().rev().copied().collect(),
            confirmations: confirmations.iter().rev().copied().collect(),
            shown: Vec::new(),
        }
    }
}

impl ConflictPrompt for ScriptedPrompt {
    fn show_prior(&mut self, prior: &PriorLoadInfo) -> Result<(), ResolveError> {
        self.shown.push(prior.clone());
        Ok(())
    }

    fn ask_choice(&mut self, _file_id: &str) -> Result<String, ResolveError> {
        self.answers
            .pop()
            .map(str::to_string)
            .ok_or_else(|| ResolveError::PromptFailed("script exhausted".into()))
    }

    fn reject(&mut self, _input: &str) {}

    fn confirm(&mut self, _file_id: &str, _action: LoadAction) -> Result<bool, ResolveError> {
        self.confirmations
            .pop()
            .ok_or_else(|| ResolveError::PromptFailed("script exhausted".into()))
    }
}
