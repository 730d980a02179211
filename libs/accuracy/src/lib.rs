//! # labplan-accuracy
//!
//! Dispense-accuracy statistics for pipette calibration runs.
//!
//! A calibration run dispenses a ladder of programmed volumes; each slot is
//! then weighed (water: 1 mg = 1 µL) to obtain the volume actually dispensed.
//! This crate turns those pairs into absolute and percentage errors and the
//! box-plot summary used to judge a pipette.

mod analysis;
mod error;
mod summary;

pub use analysis::{
    analyze, exclude_slots, samples_from_table, AccuracyColumns, AccuracyRow, AccuracySample,
};
pub use error::AccuracyError;
pub use summary::{summarize, Summary};
