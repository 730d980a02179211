//! # labplan-dispense
//!
//! Turns allocation results into pipetting operations.
//!
//! The robot itself sits behind the [`Pipette`] trait: tip handling, blow-out
//! and `transfer(volume, source, destination, options)`. Everything in this
//! crate is expressed against that trait, so a run can be driven against real
//! hardware bindings or against [`RecordingPipette`] for a dry run.
//!
//! ## Routines
//!
//! - [`dispense_allocation`]: one pass per component (reagent A, reagent B,
//!   diluent), each pass with a single tip, dispensing at the top of each well
//! - [`run_calibration`]: a volume ladder into a tube rack, fresh tip per
//!   transfer, with blow-out and touch-tip
//! - [`blow_out_clean`]: pick up, blow out into the trash, return the tip
//!
//! Hardware calls are serialised by the robot, so every routine issues its
//! operations strictly in order and stops at the first error.

mod error;
mod labware;
mod pipette;
mod recording;
mod routines;
mod sequence;

pub use error::DispenseError;
pub use labware::{Labware, Location, WellName, WellPosition, MAX_ROWS};
pub use pipette::{Mix, Pipette, TipPolicy, TransferOptions};
pub use recording::{RecordingPipette, Step};
pub use routines::{
    blow_out_clean, calibration_ladder, run_calibration, CalibrationReport,
    DEFAULT_CALIBRATION_SLOTS, DEFAULT_CALIBRATION_STEP_UL, DEFAULT_CLEAN_CYCLES,
};
pub use sequence::{dispense_allocation, DispenseReport, DispenseSources, Reagent, Shortfall};
