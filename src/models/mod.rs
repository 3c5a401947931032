//! Models module for the loader
//!
//! Defines the data structures shared by the mapping, normalization,
//! duplicate-resolution and load stages.

pub mod cell;
pub mod enums;
pub mod load;
pub mod row;

pub use cell::{CellValue, SourceTable};
pub use enums::{CanonicalField, FieldKind, LoadAction};
pub use load::{FileLoadStats, FileOutcome, FileReport, PriorLoadInfo};
pub use row::{CanonicalRow, FieldValue};
