//! Error types for accuracy analysis.

use labplan_table::TableError;
use thiserror::Error;

/// Errors that can occur while reading or analysing accuracy samples.
#[derive(Debug, Error)]
pub enum AccuracyError {
    /// A required input column is absent.
    #[error(transparent)]
    Validation(TableError),

    /// A cell could not be interpreted as a number.
    #[error("data row {}: column '{column}' value '{value}' is not a number", .row + 1)]
    Conversion {
        row: usize,
        column: String,
        value: String,
    },

    /// A programmed volume of zero or less makes the percentage undefined.
    #[error("slot {slot}: programmed volume {programmed} must be positive")]
    NonPositiveProgrammed { slot: usize, programmed: f64 },
}

impl AccuracyError {
    /// Returns true if this error is a failed column-presence check.
    pub fn is_validation(&self) -> bool {
        matches!(self, AccuracyError::Validation(_))
    }
}
