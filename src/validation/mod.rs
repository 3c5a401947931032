//! Validation functionality
//!
//! Provides input validation for identifiers taken from configuration.

pub mod input;

pub use input::{ValidationError, quote_identifier, validate_identifier, validate_table_name};
