//! Per-slot dispense error.

use labplan_table::Table;
use serde::{Deserialize, Serialize};

use crate::AccuracyError;

/// One weighed calibration slot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AccuracySample {
    /// 1-based rack position.
    pub slot: usize,
    /// Volume (µL) the pipette was told to dispense.
    pub programmed: f64,
    /// Volume (µL) measured in the slot.
    pub dispensed: f64,
}

/// Error figures for one slot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AccuracyRow {
    pub slot: usize,
    pub programmed: f64,
    pub dispensed: f64,
    /// `|dispensed - programmed|` in µL.
    pub error: f64,
    /// `error / programmed * 100`.
    pub percent_error: f64,
}

/// Compute absolute and percentage error per slot, preserving order.
pub fn analyze(samples: &[AccuracySample]) -> Result<Vec<AccuracyRow>, AccuracyError> {
    samples
        .iter()
        .map(|sample| {
            if sample.programmed <= 0.0 {
                return Err(AccuracyError::NonPositiveProgrammed {
                    slot: sample.slot,
                    programmed: sample.programmed,
                });
            }
            let error = (sample.dispensed - sample.programmed).abs();
            Ok(AccuracyRow {
                slot: sample.slot,
                programmed: sample.programmed,
                dispensed: sample.dispensed,
                error,
                percent_error: error / sample.programmed * 100.0,
            })
        })
        .collect()
}

/// Drop rows whose slot is listed in `slots`.
pub fn exclude_slots(rows: Vec<AccuracyRow>, slots: &[usize]) -> Vec<AccuracyRow> {
    rows.into_iter()
        .filter(|row| !slots.contains(&row.slot))
        .collect()
}

/// Column headers of an accuracy sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccuracyColumns {
    pub programmed: String,
    pub dispensed: String,
    /// Optional slot column; rows are numbered from 1 when absent.
    pub slot: String,
}

impl Default for AccuracyColumns {
    fn default() -> Self {
        Self {
            programmed: "Programmed Volume (µL)".to_string(),
            dispensed: "Volume Dispensed (µL)".to_string(),
            slot: "Slot".to_string(),
        }
    }
}

/// Read samples from a weighed-calibration sheet.
pub fn samples_from_table(
    table: &Table,
    columns: &AccuracyColumns,
) -> Result<Vec<AccuracySample>, AccuracyError> {
    table
        .require_columns(&[columns.programmed.as_str(), columns.dispensed.as_str()])
        .map_err(AccuracyError::Validation)?;
    let has_slot = table.has_column(&columns.slot);

    table
        .records()
        .map(|record| -> Result<AccuracySample, AccuracyError> {
            let number = |column: &str| -> Result<f64, AccuracyError> {
                let raw = record.get(column).unwrap_or_default();
                raw.trim()
                    .parse::<f64>()
                    .ok()
                    .filter(|v| v.is_finite())
                    .ok_or_else(|| AccuracyError::Conversion {
                        row: record.index(),
                        column: column.to_string(),
                        value: raw.to_string(),
                    })
            };

            let slot = if has_slot {
                let raw = record.get(&columns.slot).unwrap_or_default();
                raw.trim()
                    .parse::<usize>()
                    .map_err(|_| AccuracyError::Conversion {
                        row: record.index(),
                        column: columns.slot.clone(),
                        value: raw.to_string(),
                    })?
            } else {
                record.index() + 1
            };

            Ok(AccuracySample {
                slot,
                programmed: number(&columns.programmed)?,
                dispensed: number(&columns.dispensed)?,
            })
        })
        .collect()
}
