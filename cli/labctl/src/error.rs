//! Error handling and display for the CLI.

use colored::Colorize;
use labplan_alloc::AllocError;
use labplan_table::TableError;
use thiserror::Error;

/// CLI-specific errors.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("No input specified. Use --input or set [input] path in the run config.")]
    NoInput,

    #[error("{count} well(s) exceed the target volume of {target_ul} µL")]
    Overfilled { count: usize, target_ul: f64 },

    #[error("Config file already exists at {0}")]
    ConfigExists(String),

    #[error("Speaker self-test failed: {0}")]
    SelfTest(String),
}

/// Print an error in a user-friendly format.
pub fn print_error(err: &anyhow::Error) {
    eprintln!("{} {:#}", "Error:".red().bold(), err);

    if let Some(hint) = hint_for(err) {
        eprintln!("\n{}", format!("Hint: {hint}").yellow());
    }
}

fn hint_for(err: &anyhow::Error) -> Option<&'static str> {
    if let Some(cli_err) = err.downcast_ref::<CliError>() {
        return match cli_err {
            CliError::NoInput => Some("Pass --input PATH or run `labctl config init`."),
            CliError::Overfilled { .. } => {
                Some("Drop --strict to dispense anyway; over-filled wells get no diluent.")
            }
            CliError::ConfigExists(_) => Some("Use --force to overwrite it."),
            CliError::SelfTest(_) => Some("Check that the audio player is installed."),
        };
    }

    if let Some(alloc_err) = err.downcast_ref::<AllocError>() {
        return match alloc_err {
            AllocError::Validation(_) => {
                Some("Check the column names with --column-a/--column-b or [input.columns].")
            }
            AllocError::Conversion { .. } => {
                Some("Every volume cell must hold a non-negative number.")
            }
            AllocError::InvalidTarget(_) => None,
        };
    }

    match err.downcast_ref::<TableError>() {
        Some(table_err) if table_err.is_sheet_error() => Some("Select a sheet with --sheet."),
        _ => None,
    }
}
