//! Maintenance and calibration routines.

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::{DispenseError, Labware, Location, Pipette, TipPolicy, TransferOptions};

/// Volume increment between calibration slots.
pub const DEFAULT_CALIBRATION_STEP_UL: f64 = 40.0;

/// Slots in a 24-tube rack.
pub const DEFAULT_CALIBRATION_SLOTS: usize = 24;

/// Tip columns in a rack for a multi-channel pipette.
pub const DEFAULT_CLEAN_CYCLES: usize = 12;

/// Increasing volumes `step, 2*step, ... count*step`.
pub fn calibration_ladder(step: f64, count: usize) -> Vec<f64> {
    (1..=count).map(|i| step * i as f64).collect()
}

/// Outcome of a calibration run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalibrationReport {
    /// `(slot, volume)` pairs actually dispensed, slot 1-based.
    pub dispensed: Vec<(usize, f64)>,
    /// Volumes with no rack position left.
    pub skipped: usize,
}

/// Dispense each volume into successive rack positions.
///
/// Every transfer uses a fresh tip, blows out and touches the tip so the
/// dispensed mass reflects the programmed volume as closely as possible.
pub fn run_calibration<P: Pipette + ?Sized>(
    pipette: &mut P,
    volumes: &[f64],
    source: &Location,
    rack: &Labware,
) -> Result<CalibrationReport, DispenseError> {
    let wells = rack.wells();
    if volumes.len() > wells.len() {
        warn!(
            volumes = volumes.len(),
            wells = wells.len(),
            rack = %rack.load_name,
            "more volumes than rack positions; extra volumes are skipped"
        );
    }

    let options = TransferOptions {
        new_tip: TipPolicy::Always,
        blow_out: true,
        touch_tip: true,
        ..TransferOptions::default()
    };

    let mut dispensed = Vec::with_capacity(volumes.len().min(wells.len()));
    for (slot, (volume, well)) in volumes.iter().zip(&wells).enumerate() {
        let destination = rack.well(*well)?;
        pipette.transfer(*volume, source, &destination, &options)?;
        dispensed.push((slot + 1, *volume));
    }

    info!(
        pipette = pipette.name(),
        slots = dispensed.len(),
        "calibration ladder dispensed"
    );
    Ok(CalibrationReport {
        skipped: volumes.len() - dispensed.len(),
        dispensed,
    })
}

/// Pick up each tip, blow it out into the trash and put it back.
///
/// Returns the number of completed cycles.
pub fn blow_out_clean<P: Pipette + ?Sized>(
    pipette: &mut P,
    cycles: usize,
) -> Result<usize, DispenseError> {
    for cycle in 0..cycles {
        pipette.pick_up_tip()?;
        pipette.blow_out(None)?;
        pipette.return_tip()?;
        debug!(cycle, "tip blown out");
    }
    info!(pipette = pipette.name(), cycles, "blow-out clean complete");
    Ok(cycles)
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::{RecordingPipette, Step};

    #[test]
    fn test_calibration_ladder_default() {
        let ladder = calibration_ladder(DEFAULT_CALIBRATION_STEP_UL, DEFAULT_CALIBRATION_SLOTS);
        assert_eq!(ladder.len(), 24);
        assert_eq!(ladder[0], 40.0);
        assert_eq!(ladder[23], 960.0);
    }

    #[test]
    fn test_calibration_ladder_empty() {
        assert!(calibration_ladder(40.0, 0).is_empty());
    }

    #[test]
    fn test_run_calibration() {
        let reservoir = Labware::reservoir_12("nest_12_reservoir_15ml", 3);
        let rack = Labware::tube_rack_24("opentrons_24_tuberack_nest_1.5ml_snapcap", 2);
        let source = reservoir.well_by_name("A1").unwrap();
        let mut pipette = RecordingPipette::new("p1000_single_gen2", 1000.0);

        let volumes = calibration_ladder(40.0, 24);
        let report = run_calibration(&mut pipette, &volumes, &source, &rack).unwrap();

        assert_eq!(report.dispensed.len(), 24);
        assert_eq!(report.skipped, 0);
        assert_eq!(report.dispensed[23], (24, 960.0));
        assert_eq!(pipette.tips_used(), 24);
        assert_eq!(pipette.transfer_count(), 24);

        let destinations: Vec<String> = pipette
            .steps()
            .iter()
            .filter_map(|step| match step {
                Step::Transfer {
                    destination,
                    blow_out,
                    touch_tip,
                    ..
                } => {
                    assert!(*blow_out && *touch_tip);
                    Some(destination.well.to_string())
                }
                _ => None,
            })
            .collect();
        assert_eq!(&destinations[..5], ["A1", "B1", "C1", "D1", "A2"]);
    }

    #[test]
    fn test_run_calibration_skips_extra_volumes() {
        let reservoir = Labware::reservoir_12("nest_12_reservoir_15ml", 3);
        let rack = Labware::tube_rack_24("opentrons_24_tuberack_nest_1.5ml_snapcap", 2);
        let source = reservoir.well_by_name("A1").unwrap();
        let mut pipette = RecordingPipette::new("p1000_single_gen2", 1000.0).with_racks(2);

        let volumes = vec![10.0; 30];
        let report = run_calibration(&mut pipette, &volumes, &source, &rack).unwrap();
        assert_eq!(report.dispensed.len(), 24);
        assert_eq!(report.skipped, 6);
    }

    #[test]
    fn test_blow_out_clean() {
        let mut pipette = RecordingPipette::new("p300_multi_gen2", 300.0).with_channels(8);
        let cycles = blow_out_clean(&mut pipette, DEFAULT_CLEAN_CYCLES).unwrap();
        assert_eq!(cycles, 12);
        assert_eq!(pipette.steps().len(), 36);
        assert_eq!(
            pipette.steps()[..3],
            [
                Step::PickUpTip { tip: 0 },
                Step::BlowOut { location: None },
                Step::ReturnTip
            ]
        );
    }

    #[test]
    fn test_blow_out_clean_out_of_tips() {
        let mut pipette = RecordingPipette::new("p300_multi_gen2", 300.0).with_channels(8);
        let err = blow_out_clean(&mut pipette, 13).unwrap_err();
        assert!(err.is_tip_error());
    }
}
