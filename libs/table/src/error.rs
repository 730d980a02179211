//! Error types for tabular input.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while reading or validating a table.
#[derive(Debug, Error)]
pub enum TableError {
    /// The workbook path could not be read.
    #[error("failed to read {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The CSV content is malformed.
    #[error("malformed CSV in {path}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// The sheet has no header row.
    #[error("sheet has no header row")]
    NoHeader,

    /// A required column is absent.
    #[error("missing required column '{column}' (available: {available:?})")]
    MissingColumn {
        column: String,
        available: Vec<String>,
    },

    /// Two header cells carry the same name.
    #[error("duplicate column '{0}'")]
    DuplicateColumn(String),

    /// A data row has a different number of cells than the header.
    #[error("data row {}: has {actual} cells, header has {expected}", .row + 1)]
    RaggedRow {
        /// Zero-based data row index.
        row: usize,
        expected: usize,
        actual: usize,
    },

    /// The requested sheet does not exist in the workbook.
    #[error("sheet '{sheet}' not found in {path}")]
    SheetNotFound { sheet: String, path: PathBuf },

    /// The workbook holds several sheets and none was selected.
    #[error("{path} holds several sheets, select one of {available:?}")]
    SheetRequired {
        path: PathBuf,
        available: Vec<String>,
    },
}

impl TableError {
    /// Returns true if this error is a failed column-presence check.
    pub fn is_missing_column(&self) -> bool {
        matches!(self, TableError::MissingColumn { .. })
    }

    /// Returns true if this error concerns sheet selection.
    pub fn is_sheet_error(&self) -> bool {
        matches!(
            self,
            TableError::SheetNotFound { .. } | TableError::SheetRequired { .. }
        )
    }
}
