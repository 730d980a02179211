//! # labplan-table
//!
//! Tabular input for labplan runs.
//!
//! Experiment inputs are authored in a spreadsheet and exported as CSV. A
//! "workbook" is either a single CSV file or a directory holding one CSV file
//! per sheet (`<sheet>.csv`). Consumers only ever see a [`Table`]: ordered rows
//! of string cells addressed by header name.
//!
//! Reading is read-only and happens once per run. Numeric interpretation of
//! cells is left to the consumer.

mod error;
mod source;
mod table;

pub use error::TableError;
pub use source::{parse_csv, CsvWorkbook, TabularSource};
pub use table::{Record, Table};
