//! Allocate command.

use anyhow::Result;
use clap::Args;
use labplan_alloc::{Allocation, AllocationResult};
use tabled::Tabled;

use crate::output::{print_info, print_json, print_table, volume, OutputFormat};

use super::{CommandContext, InputArgs};

/// Compute the diluent volume that tops every well up to the target.
#[derive(Debug, Args)]
pub struct AllocateCommand {
    #[command(flatten)]
    pub input: InputArgs,
}

/// Allocation row for table display.
#[derive(Tabled)]
struct AllocationRow {
    #[tabled(rename = "Row")]
    row: usize,
    #[tabled(rename = "Reagent A (µL)")]
    component_a: String,
    #[tabled(rename = "Reagent B (µL)")]
    component_b: String,
    #[tabled(rename = "Total (µL)")]
    total: String,
    #[tabled(rename = "Diluent (µL)")]
    remaining: String,
    #[tabled(rename = "Flag")]
    flag: &'static str,
}

impl AllocationRow {
    fn new(row: usize, result: &AllocationResult, overfilled: bool) -> Self {
        Self {
            row: row + 1,
            component_a: volume(result.component_a),
            component_b: volume(result.component_b),
            total: volume(result.total),
            remaining: volume(result.remaining),
            flag: if overfilled { "OVERFILL" } else { "" },
        }
    }
}

fn rows(allocation: &Allocation) -> Vec<AllocationRow> {
    let overfilled = allocation.overfilled();
    allocation
        .results
        .iter()
        .enumerate()
        .map(|(index, result)| AllocationRow::new(index, result, overfilled.contains(&index)))
        .collect()
}

impl AllocateCommand {
    pub async fn run(self, ctx: CommandContext) -> Result<()> {
        let allocation = self.input.allocate(&ctx)?;

        match ctx.format {
            OutputFormat::Json => print_json(&allocation),
            OutputFormat::Table => {
                print_table(&rows(&allocation));
                let totals = allocation.totals();
                print_info(&format!(
                    "{} well(s) at {}: {} µL reagent A, {} µL reagent B, {} µL diluent",
                    allocation.len(),
                    allocation.target,
                    volume(totals.component_a),
                    volume(totals.component_b),
                    volume(totals.diluent),
                ));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use labplan_alloc::{ReagentRow, TargetVolume};

    #[test]
    fn test_rows_flag_overfilled_wells() {
        let allocation = Allocation::new(
            &[ReagentRow::new(10.0, 20.0), ReagentRow::new(60.0, 50.0)],
            TargetVolume::default(),
        );
        let rows = rows(&allocation);
        assert_eq!(rows[0].row, 1);
        assert_eq!(rows[0].remaining, "70.00");
        assert_eq!(rows[0].flag, "");
        assert_eq!(rows[1].total, "110.00");
        assert_eq!(rows[1].remaining, "0.00");
        assert_eq!(rows[1].flag, "OVERFILL");
    }
}
