//! Destination table definition and SQL builders
//!
//! Provides SQL that works with both DuckDB and PostgreSQL. Column names are
//! upper case and always quoted; parameters use the `$n` placeholder style,
//! which both engines accept. Timestamps are read back as text and parsed with
//! [`parse_db_timestamp`] so both backends share the same queries.

use chrono::NaiveDateTime;

use super::TargetTable;
use crate::models::{CanonicalField, FieldKind};
use crate::validation::quote_identifier;

/// Columns bound per inserted row: the persisted fields plus `FECHA_CARGA`
pub const INSERT_COLUMN_COUNT: usize = CanonicalField::PERSISTED.len() + 1;

/// Bind parameters one PostgreSQL statement can carry
pub const MAX_BIND_PARAMETERS: usize = 65_535;

/// Largest batch whose `INSERT` stays within [`MAX_BIND_PARAMETERS`]
pub const MAX_BATCH_ROWS: usize = MAX_BIND_PARAMETERS / INSERT_COLUMN_COUNT;

/// Store-side SQL type of a column
pub fn column_type(field: CanonicalField) -> &'static str {
    match field.kind() {
        FieldKind::Timestamp => "TIMESTAMP",
        FieldKind::Number => "DOUBLE PRECISION",
        FieldKind::Text => "TEXT",
    }
}

fn column(field: CanonicalField) -> String {
    quote_identifier(field.column_name())
}

/// `CREATE TABLE` (and supporting schema/index) statements
pub fn create_table_sql(table: &TargetTable) -> String {
    let mut sql = String::new();
    if let Some(schema) = table.schema() {
        sql.push_str(&format!(
            "CREATE SCHEMA IF NOT EXISTS {};\n",
            quote_identifier(schema)
        ));
    }

    let columns: Vec<String> = CanonicalField::PERSISTED
        .iter()
        .chain(std::iter::once(&CanonicalField::FechaCarga))
        .map(|f| {
            let not_null = matches!(
                f,
                CanonicalField::FechaHoraApertura
                    | CanonicalField::ArchivoOrigen
                    | CanonicalField::FechaCarga
            );
            format!(
                "    {} {}{}",
                column(*f),
                column_type(*f),
                if not_null { " NOT NULL" } else { "" }
            )
        })
        .collect();

    sql.push_str(&format!(
        "CREATE TABLE IF NOT EXISTS {} (\n{}\n);\n",
        table.qualified(),
        columns.join(",\n")
    ));
    sql.push_str(&format!(
        "CREATE INDEX IF NOT EXISTS {} ON {} ({});\n",
        quote_identifier(&format!("idx_{}_archivo_origen", table.name())),
        table.qualified(),
        column(CanonicalField::ArchivoOrigen)
    ));
    sql
}

/// Aggregate of the rows stored for one file; binds the file id as `$1`
pub fn check_loaded_sql(table: &TargetTable) -> String {
    format!(
        "SELECT COUNT(*), \
         CAST(MIN({carga}) AS VARCHAR), \
         CAST(MAX({carga}) AS VARCHAR), \
         CAST(MAX({actualizacion}) AS VARCHAR), \
         CAST(MIN({apertura}) AS VARCHAR), \
         CAST(MAX({apertura}) AS VARCHAR) \
         FROM {table} WHERE {archivo} = $1",
        carga = column(CanonicalField::FechaCarga),
        actualizacion = column(CanonicalField::FechaActualizacion),
        apertura = column(CanonicalField::FechaHoraApertura),
        archivo = column(CanonicalField::ArchivoOrigen),
        table = table.qualified(),
    )
}

/// Delete every row of one file; binds the file id as `$1`
pub fn delete_by_file_sql(table: &TargetTable) -> String {
    format!(
        "DELETE FROM {} WHERE {} = $1",
        table.qualified(),
        column(CanonicalField::ArchivoOrigen)
    )
}

/// Row count per file, ordered by file id
pub fn stats_by_file_sql(table: &TargetTable) -> String {
    format!(
        "SELECT {archivo}, COUNT(*), CAST(MIN({carga}) AS VARCHAR) \
         FROM {table} GROUP BY {archivo} ORDER BY MIN({carga}), {archivo}",
        archivo = column(CanonicalField::ArchivoOrigen),
        carga = column(CanonicalField::FechaCarga),
        table = table.qualified(),
    )
}

/// Multi-row `INSERT` for `row_count` rows
///
/// Parameters are laid out row by row in [`CanonicalField::PERSISTED`] order
/// followed by `FECHA_CARGA`, [`INSERT_COLUMN_COUNT`] per row.
pub fn insert_sql(table: &TargetTable, row_count: usize) -> String {
    let fields: Vec<CanonicalField> = CanonicalField::PERSISTED
        .iter()
        .copied()
        .chain(std::iter::once(CanonicalField::FechaCarga))
        .collect();

    let columns: Vec<String> = fields.iter().map(|f| column(*f)).collect();

    let mut param = 0usize;
    let tuples: Vec<String> = (0..row_count)
        .map(|_| {
            let values: Vec<String> = fields
                .iter()
                .map(|f| {
                    param += 1;
                    match f.kind() {
                        FieldKind::Text => format!("${}", param),
                        _ => format!("CAST(${} AS {})", param, column_type(*f)),
                    }
                })
                .collect();
            format!("({})", values.join(", "))
        })
        .collect();

    format!(
        "INSERT INTO {} ({}) VALUES {}",
        table.qualified(),
        columns.join(", "),
        tuples.join(", ")
    )
}

/// Format a timestamp for binding as text
pub fn format_db_timestamp(ts: &NaiveDateTime) -> String {
    ts.format("%Y-%m-%d %H:%M:%S%.6f").to_string()
}

/// Parse a timestamp rendered as text by either backend
pub fn parse_db_timestamp(text: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(text.trim(), "%Y-%m-%d %H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(text.trim(), "%Y-%m-%dT%H:%M:%S%.f"))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn table() -> TargetTable {
        TargetTable::parse("Calidad_Transmision").unwrap()
    }

    #[test]
    fn test_create_table_sql() {
        let sql = create_table_sql(&table());
        assert!(sql.contains("CREATE TABLE IF NOT EXISTS \"Calidad_Transmision\""));
        assert!(sql.contains("\"FECHA_HORA_APERTURA\" TIMESTAMP NOT NULL"));
        assert!(sql.contains("\"CARGA_MEGAS\" DOUBLE PRECISION,"));
        assert!(sql.contains("\"ARCHIVO_ORIGEN\" TEXT NOT NULL"));
        assert!(sql.contains("\"FECHA_CARGA\" TIMESTAMP NOT NULL"));
        assert!(!sql.contains("CREATE SCHEMA"));
    }

    #[test]
    fn test_create_table_with_schema() {
        let sql = create_table_sql(&TargetTable::parse("etl.Calidad").unwrap());
        assert!(sql.starts_with("CREATE SCHEMA IF NOT EXISTS \"etl\";"));
        assert!(sql.contains("\"etl\".\"Calidad\""));
    }

    #[test]
    fn test_insert_sql_placeholders() {
        let sql = insert_sql(&table(), 2);
        assert!(sql.contains("(CAST($1 AS TIMESTAMP), CAST($2 AS TIMESTAMP)"));
        assert!(sql.contains(&format!("${}", INSERT_COLUMN_COUNT * 2)));
        assert!(!sql.contains(&format!("${}", INSERT_COLUMN_COUNT * 2 + 1)));
        assert_eq!(sql.matches("), (").count(), 1);
    }

    #[test]
    fn test_stats_ordered_by_first_load() {
        let sql = stats_by_file_sql(&table());
        assert!(sql.ends_with("ORDER BY MIN(\"FECHA_CARGA\"), \"ARCHIVO_ORIGEN\""));
    }

    #[test]
    fn test_max_batch_rows_fits_parameter_limit() {
        assert_eq!(MAX_BATCH_ROWS, 3120);
        assert!(MAX_BATCH_ROWS * INSERT_COLUMN_COUNT <= MAX_BIND_PARAMETERS);
        assert!((MAX_BATCH_ROWS + 1) * INSERT_COLUMN_COUNT > MAX_BIND_PARAMETERS);
    }

    #[test]
    fn test_db_timestamp_round_trip() {
        let ts = NaiveDate::from_ymd_opt(2024, 2, 29)
            .unwrap()
            .and_hms_milli_opt(23, 59, 1, 250)
            .unwrap();
        assert_eq!(parse_db_timestamp(&format_db_timestamp(&ts)), Some(ts));
        assert_eq!(
            parse_db_timestamp("2024-02-29 23:59:01"),
            NaiveDate::from_ymd_opt(2024, 2, 29)
                .unwrap()
                .and_hms_opt(23, 59, 1)
        );
        assert_eq!(parse_db_timestamp("garbage"), None);
    }
}
