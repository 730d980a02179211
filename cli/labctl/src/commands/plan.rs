//! Plan command: dry-run of the dispensing sequence.

use anyhow::{Context, Result};
use clap::Args;
use labplan_dispense::{dispense_allocation, DispenseReport, Shortfall, Step};
use serde::Serialize;
use tabled::Tabled;

use crate::output::{print_info, print_json, print_table, print_warning, volume, OutputFormat};

use super::{CommandContext, InputArgs};

/// Allocate the input and record every pipette operation the run would issue.
#[derive(Debug, Args)]
pub struct PlanCommand {
    #[command(flatten)]
    input: InputArgs,
}

/// Recorded step for table display.
#[derive(Tabled)]
pub(super) struct StepRow {
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "Action")]
    action: &'static str,
    #[tabled(rename = "Volume (µL)")]
    volume: String,
    #[tabled(rename = "From")]
    source: String,
    #[tabled(rename = "To")]
    destination: String,
}

impl StepRow {
    pub(super) fn new(index: usize, step: &Step) -> Self {
        let blank = || "-".to_string();
        let (action, volume, source, destination) = match step {
            Step::PickUpTip { tip } => ("pick up tip", blank(), format!("tip {}", tip + 1), blank()),
            Step::DropTip => ("drop tip", blank(), blank(), "trash".to_string()),
            Step::ReturnTip => ("return tip", blank(), blank(), "tip rack".to_string()),
            Step::BlowOut { location } => (
                "blow out",
                blank(),
                blank(),
                location
                    .as_ref()
                    .map_or_else(|| "trash".to_string(), ToString::to_string),
            ),
            Step::Transfer {
                volume: ul,
                source,
                destination,
                ..
            } => ("transfer", volume(*ul), source.to_string(), destination.to_string()),
        };
        Self {
            index: index + 1,
            action,
            volume,
            source,
            destination,
        }
    }
}

/// Rows for a recorded sequence.
pub(super) fn step_rows(steps: &[Step]) -> Vec<StepRow> {
    steps
        .iter()
        .enumerate()
        .map(|(index, step)| StepRow::new(index, step))
        .collect()
}

#[derive(Serialize)]
struct PlanView {
    pipette: String,
    report: DispenseReport,
    shortfalls: Vec<Shortfall>,
    steps: Vec<Step>,
}

impl PlanCommand {
    pub async fn run(self, ctx: CommandContext) -> Result<()> {
        let allocation = self.input.allocate(&ctx)?;
        let sources = ctx.config.sources()?;
        let plate = ctx.config.plate();

        let shortfalls = sources.shortfalls(&allocation.totals());
        for shortfall in &shortfalls {
            print_warning(&format!(
                "{} needs {} µL but only {} µL is loaded",
                shortfall.reagent,
                volume(shortfall.required_ul),
                volume(shortfall.loaded_ul),
            ));
        }

        let mut pipette = ctx.config.pipette.recording();
        let report = dispense_allocation(&mut pipette, &allocation.results, &plate, &sources)
            .context("Dispensing sequence failed")?;
        if report.wells_skipped > 0 {
            print_warning(&format!(
                "{} result(s) do not fit on {} and were skipped",
                report.wells_skipped, plate.load_name
            ));
        }

        let view = PlanView {
            pipette: ctx.config.pipette.name.clone(),
            report,
            shortfalls,
            steps: pipette.into_steps(),
        };

        match ctx.format {
            OutputFormat::Json => print_json(&view),
            OutputFormat::Table => {
                print_table(&step_rows(&view.steps));
                print_info(&format!(
                    "{} well(s), {} transfer(s), {} tip(s) with {}",
                    view.report.wells_planned,
                    view.report.transfers,
                    view.report.tips_used,
                    view.pipette
                ));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use labplan_dispense::Labware;

    #[test]
    fn test_step_rows() {
        let reservoir = Labware::reservoir_12("nest_12_reservoir_15ml", 5);
        let plate = Labware::plate_96("nest_96_wellplate_100ul_pcr_full_skirt", 2);
        let steps = vec![
            Step::PickUpTip { tip: 0 },
            Step::Transfer {
                volume: 70.0,
                source: reservoir.well_by_name("A1").unwrap(),
                destination: plate.well_by_name("B1").unwrap().top(),
                blow_out: false,
                touch_tip: false,
                mix_before: None,
                mix_after: None,
            },
            Step::BlowOut { location: None },
            Step::DropTip,
        ];

        let rows = step_rows(&steps);
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[0].index, 1);
        assert_eq!(rows[0].source, "tip 1");
        assert_eq!(rows[1].action, "transfer");
        assert_eq!(rows[1].volume, "70.00");
        assert!(rows[1].source.contains("A1"));
        assert!(rows[1].destination.contains("B1"));
        assert_eq!(rows[2].destination, "trash");
        assert_eq!(rows[3].action, "drop tip");
    }
}
