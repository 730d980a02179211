//! The dispensing sequence for an allocation.

use labplan_alloc::{AllocationResult, ReagentTotals};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::{DispenseError, Labware, Location, Pipette, TransferOptions};

/// A reagent loaded into a source well.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reagent {
    pub name: String,
    pub location: Location,
    /// Volume (µL) loaded at the start of the run.
    pub loaded_ul: f64,
}

/// Where each component is drawn from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispenseSources {
    pub component_a: Reagent,
    pub component_b: Reagent,
    pub diluent: Reagent,
}

/// A source that does not hold enough liquid for the run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Shortfall {
    pub reagent: String,
    pub required_ul: f64,
    pub loaded_ul: f64,
}

impl DispenseSources {
    /// Sources whose loaded volume is below what the run draws.
    pub fn shortfalls(&self, totals: &ReagentTotals) -> Vec<Shortfall> {
        [
            (&self.component_a, totals.component_a),
            (&self.component_b, totals.component_b),
            (&self.diluent, totals.diluent),
        ]
        .into_iter()
        .filter(|(reagent, required)| *required > reagent.loaded_ul)
        .map(|(reagent, required)| Shortfall {
            reagent: reagent.name.clone(),
            required_ul: required,
            loaded_ul: reagent.loaded_ul,
        })
        .collect()
    }
}

/// What a dispensing run did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DispenseReport {
    /// Wells that received liquid (or would have, had every volume been zero).
    pub wells_planned: usize,
    /// Results beyond the plate's well count.
    pub wells_skipped: usize,
    /// Transfers requested; one above the pipette maximum records several steps.
    pub transfers: usize,
    pub tips_used: usize,
}

/// Dispense every result into the plate, well `i` taking result `i`.
///
/// Three passes run in order: reagent A, reagent B, then diluent. Each pass
/// uses one tip for all of its wells and dispenses at the top of the well, so
/// every well still receives A, then B, then diluent. Zero volumes are not
/// transferred and a pass with nothing to move does not pick up a tip.
/// Results beyond the plate's well count are skipped.
pub fn dispense_allocation<P: Pipette + ?Sized>(
    pipette: &mut P,
    results: &[AllocationResult],
    plate: &Labware,
    sources: &DispenseSources,
) -> Result<DispenseReport, DispenseError> {
    let wells = plate.wells();
    let planned = results.len().min(wells.len());
    let skipped = results.len() - planned;
    if skipped > 0 {
        warn!(
            results = results.len(),
            wells = wells.len(),
            skipped,
            plate = %plate.load_name,
            "more results than wells; extra results are skipped"
        );
    }

    let destinations = wells[..planned]
        .iter()
        .map(|well| plate.well(*well).map(|location| location.top()))
        .collect::<Result<Vec<_>, _>>()?;
    let results = &results[..planned];

    let passes: [(&Reagent, fn(&AllocationResult) -> f64); 3] = [
        (&sources.component_a, |r| r.component_a),
        (&sources.component_b, |r| r.component_b),
        (&sources.diluent, |r| r.remaining),
    ];

    let mut report = DispenseReport {
        wells_planned: planned,
        wells_skipped: skipped,
        ..DispenseReport::default()
    };

    for (reagent, volume_of) in passes {
        let transfers: Vec<(f64, &Location)> = results
            .iter()
            .zip(&destinations)
            .map(|(result, destination)| (volume_of(result), destination))
            .filter(|(volume, _)| *volume > 0.0)
            .collect();

        if transfers.is_empty() {
            info!(reagent = %reagent.name, "nothing to dispense; pass skipped");
            continue;
        }

        info!(
            reagent = %reagent.name,
            source = %reagent.location,
            wells = transfers.len(),
            "dispense pass"
        );

        pipette.pick_up_tip()?;
        report.tips_used += 1;
        for (volume, destination) in transfers {
            pipette.transfer(
                volume,
                &reagent.location,
                destination,
                &TransferOptions::reuse_tip(),
            )?;
            report.transfers += 1;
        }
        pipette.drop_tip()?;
    }

    info!(
        wells = report.wells_planned,
        transfers = report.transfers,
        "dispensing complete"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    use labplan_alloc::{allocate, ReagentRow, TargetVolume};

    use crate::{RecordingPipette, Step};

    fn plate() -> Labware {
        Labware::plate_96("nest_96_wellplate_100ul_pcr_full_skirt", 2)
    }

    fn sources() -> DispenseSources {
        let reservoir = Labware::reservoir_12("nest_12_reservoir_15ml", 5);
        let reagent = |name: &str, well: &str, loaded_ul: f64| Reagent {
            name: name.to_string(),
            location: reservoir.well_by_name(well).unwrap(),
            loaded_ul,
        };
        DispenseSources {
            component_a: reagent("Cu Stock Solution", "A2", 10_000.0),
            component_b: reagent("Glycine Stock Solution", "A3", 10_000.0),
            diluent: reagent("DI Water", "A1", 120_000.0),
        }
    }

    fn results(rows: &[(f64, f64)]) -> Vec<AllocationResult> {
        let rows: Vec<ReagentRow> = rows.iter().map(|&(a, b)| ReagentRow::new(a, b)).collect();
        allocate(&rows, TargetVolume::new(100.0).unwrap())
    }

    fn transfers(steps: &[Step]) -> Vec<(f64, String, String)> {
        steps
            .iter()
            .filter_map(|step| match step {
                Step::Transfer {
                    volume,
                    source,
                    destination,
                    ..
                } => Some((*volume, source.well.to_string(), destination.well.to_string())),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_each_well_gets_a_then_b_then_diluent() {
        let mut pipette = RecordingPipette::new("p1000_single_gen2", 1000.0);
        let report = dispense_allocation(
            &mut pipette,
            &results(&[(10.0, 20.0), (5.0, 5.0)]),
            &plate(),
            &sources(),
        )
        .unwrap();

        assert_eq!(report.wells_planned, 2);
        assert_eq!(report.transfers, 6);
        assert_eq!(report.tips_used, 3);
        assert_eq!(
            transfers(pipette.steps()),
            vec![
                (10.0, "A2".to_string(), "A1".to_string()),
                (5.0, "A2".to_string(), "B1".to_string()),
                (20.0, "A3".to_string(), "A1".to_string()),
                (5.0, "A3".to_string(), "B1".to_string()),
                (70.0, "A1".to_string(), "A1".to_string()),
                (90.0, "A1".to_string(), "B1".to_string()),
            ]
        );
    }

    #[test]
    fn test_one_tip_per_pass() {
        let mut pipette = RecordingPipette::new("p1000_single_gen2", 1000.0);
        dispense_allocation(&mut pipette, &results(&[(10.0, 20.0)]), &plate(), &sources())
            .unwrap();

        let actions: Vec<&str> = pipette
            .steps()
            .iter()
            .map(|step| match step {
                Step::PickUpTip { .. } => "pick",
                Step::DropTip => "drop",
                Step::Transfer { .. } => "transfer",
                _ => "other",
            })
            .collect();
        assert_eq!(
            actions,
            [
                "pick", "transfer", "drop", "pick", "transfer", "drop", "pick", "transfer", "drop"
            ]
        );
        assert!(!pipette.has_tip());
    }

    #[test]
    fn test_dispenses_at_top_of_well() {
        let mut pipette = RecordingPipette::new("p1000_single_gen2", 1000.0);
        dispense_allocation(&mut pipette, &results(&[(10.0, 20.0)]), &plate(), &sources())
            .unwrap();
        for step in pipette.steps() {
            if let Step::Transfer { destination, .. } = step {
                assert_eq!(destination.position, crate::WellPosition::Top);
            }
        }
    }

    #[test]
    fn test_overfilled_wells_get_no_diluent() {
        let mut pipette = RecordingPipette::new("p1000_single_gen2", 1000.0);
        let report = dispense_allocation(
            &mut pipette,
            &results(&[(60.0, 50.0), (10.0, 20.0)]),
            &plate(),
            &sources(),
        )
        .unwrap();
        assert_eq!(report.transfers, 5);
        let diluent: Vec<_> = transfers(pipette.steps())
            .into_iter()
            .filter(|(_, source, _)| source == "A1")
            .collect();
        assert_eq!(diluent, vec![(70.0, "A1".to_string(), "B1".to_string())]);
    }

    #[test]
    fn test_empty_pass_uses_no_tip() {
        let mut pipette = RecordingPipette::new("p1000_single_gen2", 1000.0);
        let report = dispense_allocation(
            &mut pipette,
            &results(&[(0.0, 100.0)]),
            &plate(),
            &sources(),
        )
        .unwrap();
        assert_eq!(report.transfers, 1);
        assert_eq!(report.tips_used, 1);
        assert_eq!(pipette.tips_used(), 1);
    }

    #[test]
    fn test_results_beyond_plate_are_skipped() {
        let rows = vec![(10.0, 10.0); 100];
        let mut pipette = RecordingPipette::new("p1000_single_gen2", 1000.0);
        let report =
            dispense_allocation(&mut pipette, &results(&rows), &plate(), &sources()).unwrap();
        assert_eq!(report.wells_planned, 96);
        assert_eq!(report.wells_skipped, 4);
        assert_eq!(report.transfers, 96 * 3);
        let last = transfers(pipette.steps()).pop().unwrap();
        assert_eq!(last.2, "H12");
    }

    #[test]
    fn test_hardware_error_aborts_run() {
        // A 96-channel head gets a single pick-up from one rack.
        let mut pipette = RecordingPipette::new("p300_multi_gen2", 300.0).with_channels(96);
        let err = dispense_allocation(
            &mut pipette,
            &results(&[(10.0, 20.0), (40.0, 0.0)]),
            &plate(),
            &sources(),
        )
        .unwrap_err();
        assert!(matches!(err, DispenseError::OutOfTips { used: 1, .. }));
        assert_eq!(pipette.transfer_count(), 2);
    }

    #[test]
    fn test_volume_above_pipette_maximum_is_split() {
        let mut pipette = RecordingPipette::new("p300_single_gen2", 300.0);
        let report = dispense_allocation(
            &mut pipette,
            &results(&[(400.0, 0.0)]),
            &plate(),
            &sources(),
        )
        .unwrap();
        assert_eq!(report.transfers, 1);
        assert_eq!(report.tips_used, 1);
        assert_eq!(
            transfers(pipette.steps()),
            vec![
                (200.0, "A2".to_string(), "A1".to_string()),
                (200.0, "A2".to_string(), "A1".to_string()),
            ]
        );
    }

    #[test]
    fn test_shortfalls() {
        let sources = sources();
        let totals = ReagentTotals {
            component_a: 12_000.0,
            component_b: 500.0,
            diluent: 1_000.0,
        };
        let shortfalls = sources.shortfalls(&totals);
        assert_eq!(shortfalls.len(), 1);
        assert_eq!(shortfalls[0].reagent, "Cu Stock Solution");
        assert_eq!(shortfalls[0].required_ul, 12_000.0);
    }
}
