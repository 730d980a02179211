//! Error types for volume allocation.

use labplan_table::TableError;
use thiserror::Error;

/// Errors that can occur while preparing or running an allocation.
#[derive(Debug, Error)]
pub enum AllocError {
    /// A required input column is absent.
    #[error(transparent)]
    Validation(TableError),

    /// A cell could not be interpreted as a volume.
    #[error("data row {}: column '{column}' value '{value}' is not a valid volume ({reason})", .row + 1)]
    Conversion {
        /// Zero-based data row index.
        row: usize,
        column: String,
        value: String,
        reason: String,
    },

    /// The target volume is not a number, or is negative or not finite.
    /// Holds the value as given.
    #[error("invalid target volume '{0}': must be a finite, non-negative number")]
    InvalidTarget(String),
}

impl AllocError {
    /// Returns true if this error is a failed column-presence check.
    pub fn is_validation(&self) -> bool {
        matches!(self, AllocError::Validation(_))
    }
}
