//! Clean command: dry-run of the tip blow-out clean.

use anyhow::{Context, Result};
use clap::Args;
use labplan_dispense::{blow_out_clean, Step};
use serde::Serialize;

use crate::output::{print_json, print_success, print_table, OutputFormat};

use super::plan::step_rows;
use super::CommandContext;

/// Pick up each tip column, blow it out into the trash and return it.
#[derive(Debug, Args)]
pub struct CleanCommand {
    /// Number of pick-up / blow-out / return cycles.
    #[arg(long)]
    cycles: Option<usize>,
}

#[derive(Serialize)]
struct CleanView {
    pipette: String,
    cycles: usize,
    steps: Vec<Step>,
}

impl CleanCommand {
    pub async fn run(self, ctx: CommandContext) -> Result<()> {
        let settings = &ctx.config.cleaning;
        let cycles = self.cycles.unwrap_or(settings.cycles);

        let mut pipette = settings.pipette.recording();
        let cycles = blow_out_clean(&mut pipette, cycles).context("Blow-out clean failed")?;

        let view = CleanView {
            pipette: settings.pipette.name.clone(),
            cycles,
            steps: pipette.into_steps(),
        };

        match ctx.format {
            OutputFormat::Json => print_json(&view),
            OutputFormat::Table => {
                print_table(&step_rows(&view.steps));
                print_success(&format!("{} cycle(s) with {}", view.cycles, view.pipette));
            }
        }

        Ok(())
    }
}
