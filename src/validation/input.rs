//! Input validation for identifiers that end up in SQL text.
//!
//! Table names cannot be bound as query parameters, so the destination table
//! name from configuration is validated here and always emitted quoted.

use thiserror::Error;

/// Maximum length for one identifier part
pub const MAX_IDENTIFIER_LENGTH: usize = 128;

/// Errors that can occur during input validation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// Input is empty when a value is required
    #[error("{0} cannot be empty")]
    Empty(&'static str),

    /// Input exceeds maximum allowed length
    #[error("{field} exceeds maximum length (max: {max}, got: {actual})")]
    TooLong {
        field: &'static str,
        max: usize,
        actual: usize,
    },

    /// Input contains invalid characters
    #[error("{field} contains invalid characters: {reason}")]
    InvalidCharacters { field: &'static str, reason: String },

    /// Input has invalid format
    #[error("{0}: {1}")]
    InvalidFormat(&'static str, String),

    /// Input is a reserved word
    #[error("{field} cannot be a reserved word: {word}")]
    ReservedWord { field: &'static str, word: String },
}

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Validate one identifier part (a schema or a table name).
///
/// # Rules
///
/// - Must not be empty
/// - Must not exceed 128 characters
/// - Must start with a letter or underscore
/// - May contain letters, digits and underscores
/// - Cannot be a SQL reserved word
///
/// # Examples
///
/// ```
/// use transmission_etl::validation::input::validate_identifier;
///
/// assert!(validate_identifier("Calidad_Transmision", "table name").is_ok());
/// assert!(validate_identifier("", "table name").is_err());
/// assert!(validate_identifier("1_tabla", "table name").is_err());
/// assert!(validate_identifier("outages; DROP", "table name").is_err());
/// ```
pub fn validate_identifier(name: &str, field: &'static str) -> ValidationResult<()> {
    let Some(first_char) = name.chars().next() else {
        return Err(ValidationError::Empty(field));
    };

    let len = name.chars().count();
    if len > MAX_IDENTIFIER_LENGTH {
        return Err(ValidationError::TooLong {
            field,
            max: MAX_IDENTIFIER_LENGTH,
            actual: len,
        });
    }

    if !first_char.is_alphabetic() && first_char != '_' {
        return Err(ValidationError::InvalidFormat(
            field,
            "must start with a letter or underscore".to_string(),
        ));
    }

    if let Some(c) = name.chars().find(|c| !c.is_alphanumeric() && *c != '_') {
        return Err(ValidationError::InvalidCharacters {
            field,
            reason: format!("invalid character: '{}'", c),
        });
    }

    if is_sql_reserved_word(name) {
        return Err(ValidationError::ReservedWord {
            field,
            word: name.to_string(),
        });
    }

    Ok(())
}

/// Validate a destination table name, optionally schema-qualified
/// (`schema.table`). Returns the schema and table parts.
///
/// # Examples
///
/// ```
/// use transmission_etl::validation::input::validate_table_name;
///
/// assert_eq!(
///     validate_table_name("dbo.Calidad_Transmision").unwrap(),
///     (Some("dbo"), "Calidad_Transmision")
/// );
/// assert!(validate_table_name("a.b.c").is_err());
/// ```
pub fn validate_table_name(name: &str) -> ValidationResult<(Option<&str>, &str)> {
    let parts: Vec<&str> = name.split('.').collect();
    match parts.as_slice() {
        [table] => {
            validate_identifier(table, "table name")?;
            Ok((None, table))
        }
        [schema, table] => {
            validate_identifier(schema, "schema name")?;
            validate_identifier(table, "table name")?;
            Ok((Some(schema), table))
        }
        _ => Err(ValidationError::InvalidFormat(
            "table name",
            "expected 'table' or 'schema.table'".to_string(),
        )),
    }
}

/// Quote an identifier for use in SQL statements.
///
/// Internal quote characters are doubled, so the result is safe even for
/// names that skipped validation.
///
/// # Examples
///
/// ```
/// use transmission_etl::validation::input::quote_identifier;
///
/// assert_eq!(quote_identifier("REGION"), "\"REGION\"");
/// assert_eq!(quote_identifier("a\"b"), "\"a\"\"b\"");
/// ```
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Check if a word is a SQL reserved word.
///
/// This is a basic check covering common reserved words across SQL dialects.
fn is_sql_reserved_word(word: &str) -> bool {
    const RESERVED_WORDS: &[&str] = &[
        "select",
        "from",
        "where",
        "insert",
        "update",
        "delete",
        "create",
        "drop",
        "alter",
        "table",
        "index",
        "view",
        "database",
        "schema",
        "grant",
        "revoke",
        "commit",
        "rollback",
        "begin",
        "end",
        "transaction",
        "primary",
        "foreign",
        "key",
        "references",
        "constraint",
        "unique",
        "check",
        "default",
        "not",
        "null",
        "and",
        "or",
        "in",
        "like",
        "is",
        "case",
        "when",
        "then",
        "else",
        "as",
        "on",
        "join",
        "group",
        "by",
        "having",
        "order",
        "limit",
        "union",
        "all",
        "distinct",
        "values",
        "set",
        "into",
        "exec",
        "execute",
        "user",
    ];

    RESERVED_WORDS.contains(&word.to_lowercase().as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_identifiers() {
        assert!(validate_identifier("Calidad_Transmision", "table name").is_ok());
        assert!(validate_identifier("_staging", "table name").is_ok());
        assert!(validate_identifier("calidad2024", "table name").is_ok());
    }

    #[test]
    fn test_invalid_identifiers() {
        assert_eq!(
            validate_identifier("", "table name"),
            Err(ValidationError::Empty("table name"))
        );
        assert!(matches!(
            validate_identifier("2024_calidad", "table name"),
            Err(ValidationError::InvalidFormat(..))
        ));
        assert!(matches!(
            validate_identifier("calidad-transmision", "table name"),
            Err(ValidationError::InvalidCharacters { .. })
        ));
        assert!(matches!(
            validate_identifier("Select", "table name"),
            Err(ValidationError::ReservedWord { .. })
        ));
        assert!(matches!(
            validate_identifier(&"x".repeat(129), "table name"),
            Err(ValidationError::TooLong { .. })
        ));
    }

    #[test]
    fn test_qualified_table_names() {
        assert_eq!(
            validate_table_name("Calidad_Transmision").unwrap(),
            (None, "Calidad_Transmision")
        );
        assert_eq!(
            validate_table_name("etl.Calidad_Transmision").unwrap(),
            (Some("etl"), "Calidad_Transmision")
        );
        assert!(validate_table_name(".Calidad").is_err());
        assert!(validate_table_name("a.b.c").is_err());
    }

    #[test]
    fn test_quote_identifier() {
        assert_eq!(quote_identifier("FECHA_CARGA"), "\"FECHA_CARGA\"");
        assert_eq!(quote_identifier("we\"ird"), "\"we\"\"ird\"");
    }
}
