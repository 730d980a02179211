//! Calibrate command: dry-run of the pipette calibration ladder.

use anyhow::{Context, Result};
use clap::Args;
use labplan_dispense::{calibration_ladder, run_calibration, CalibrationReport, Step};
use serde::Serialize;

use crate::output::{print_info, print_json, print_table, print_warning, volume, OutputFormat};

use super::plan::step_rows;
use super::CommandContext;

/// Dispense increasing volumes of water into the tube rack for weighing.
#[derive(Debug, Args)]
pub struct CalibrateCommand {
    /// Volume increment between slots (µL).
    #[arg(long)]
    step: Option<f64>,

    /// Number of slots to fill.
    #[arg(long)]
    count: Option<usize>,
}

#[derive(Serialize)]
struct CalibrationView {
    pipette: String,
    report: CalibrationReport,
    steps: Vec<Step>,
}

impl CalibrateCommand {
    pub async fn run(self, ctx: CommandContext) -> Result<()> {
        let settings = &ctx.config.calibration;
        let step = self.step.unwrap_or(settings.step_ul);
        let count = self.count.unwrap_or(settings.slots);
        if !(step.is_finite() && step > 0.0) {
            anyhow::bail!("Calibration step must be a positive volume, got {step}");
        }

        let source = ctx
            .config
            .reservoir()
            .well_by_name(&settings.source_well)
            .context("Invalid calibration source well")?;
        let rack = ctx.config.tube_rack();

        let mut pipette = ctx.config.pipette.recording();
        let report = run_calibration(&mut pipette, &calibration_ladder(step, count), &source, &rack)
            .context("Calibration ladder failed")?;
        if report.skipped > 0 {
            print_warning(&format!(
                "{} volume(s) do not fit in {} and were skipped",
                report.skipped, rack.load_name
            ));
        }

        let view = CalibrationView {
            pipette: ctx.config.pipette.name.clone(),
            report,
            steps: pipette.into_steps(),
        };

        match ctx.format {
            OutputFormat::Json => print_json(&view),
            OutputFormat::Table => {
                print_table(&step_rows(&view.steps));
                let top = view.report.dispensed.last().map_or(0.0, |(_, ul)| *ul);
                print_info(&format!(
                    "{} slot(s) from {} µL to {} µL with {}",
                    view.report.dispensed.len(),
                    volume(step),
                    volume(top),
                    view.pipette
                ));
            }
        }

        Ok(())
    }
}
