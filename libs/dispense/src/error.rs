//! Error types for dispensing.

use thiserror::Error;

/// Errors raised by a pipette or a dispensing routine.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DispenseError {
    /// A well name could not be parsed.
    #[error("invalid well name '{0}'")]
    InvalidWell(String),

    /// The well does not exist on the labware.
    #[error("well {well} is outside {labware} ({rows} rows x {columns} columns)")]
    WellOutOfRange {
        well: String,
        labware: String,
        rows: u8,
        columns: u8,
    },

    /// The labware has rows or columns that cannot be labelled.
    #[error("{labware} has {rows} rows x {columns} columns; rows must be 1-26 and columns at least 1")]
    InvalidGeometry {
        labware: String,
        rows: u8,
        columns: u8,
    },

    /// The requested volume cannot be handled by the pipette.
    #[error("volume {volume} µL is outside the range of {pipette} (0-{max} µL)")]
    VolumeOutOfRange {
        volume: f64,
        pipette: String,
        max: f64,
    },

    /// An operation needed a tip and none is attached.
    #[error("{0} has no tip attached")]
    NoTipAttached(String),

    /// A tip was requested while one is already attached.
    #[error("{0} already has a tip attached")]
    TipAlreadyAttached(String),

    /// The tip rack has no tips left.
    #[error("{pipette} ran out of tips after {used} pick-ups")]
    OutOfTips { pipette: String, used: usize },

    /// The robot rejected or failed an operation.
    #[error("hardware error: {0}")]
    Hardware(String),
}

impl DispenseError {
    /// Returns true if this error concerns tip state.
    pub fn is_tip_error(&self) -> bool {
        matches!(
            self,
            DispenseError::NoTipAttached(_)
                | DispenseError::TipAlreadyAttached(_)
                | DispenseError::OutOfTips { .. }
        )
    }
}
