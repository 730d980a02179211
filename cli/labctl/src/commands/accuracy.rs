//! Accuracy command.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use labplan_accuracy::{analyze, exclude_slots, samples_from_table, summarize, AccuracyRow, Summary};
use serde::Serialize;
use tabled::Tabled;

use crate::output::{print_info, print_json, print_table, volume, OutputFormat};

use super::CommandContext;

/// Per-slot dispense error of a weighed calibration run.
#[derive(Debug, Args)]
pub struct AccuracyCommand {
    /// CSV file, or directory of `<sheet>.csv` files, with the weighed volumes.
    #[arg(long, short)]
    input: PathBuf,

    /// Sheet to read from a workbook directory.
    #[arg(long)]
    sheet: Option<String>,

    /// Slots to leave out of the summary (e.g. --exclude 1,2,4).
    #[arg(long, value_delimiter = ',')]
    exclude: Vec<usize>,
}

/// Accuracy row for table display.
#[derive(Tabled)]
struct SlotRow {
    #[tabled(rename = "Slot")]
    slot: usize,
    #[tabled(rename = "Programmed (µL)")]
    programmed: String,
    #[tabled(rename = "Dispensed (µL)")]
    dispensed: String,
    #[tabled(rename = "Error (µL)")]
    error: String,
    #[tabled(rename = "% Error")]
    percent_error: String,
}

impl From<&AccuracyRow> for SlotRow {
    fn from(row: &AccuracyRow) -> Self {
        Self {
            slot: row.slot,
            programmed: volume(row.programmed),
            dispensed: volume(row.dispensed),
            error: volume(row.error),
            percent_error: volume(row.percent_error),
        }
    }
}

/// One line of the summary table.
#[derive(Tabled)]
struct StatRow {
    #[tabled(rename = "Statistic")]
    name: &'static str,
    #[tabled(rename = "% Error")]
    value: String,
}

fn stat_rows(summary: &Summary) -> Vec<StatRow> {
    let stat = |name, value: f64| StatRow {
        name,
        value: format!("{value:.4}"),
    };
    vec![
        stat("min", summary.min),
        stat("q1", summary.q1),
        stat("median", summary.median),
        stat("q3", summary.q3),
        stat("max", summary.max),
        stat("mean", summary.mean),
        stat("lower whisker", summary.lower_whisker),
        stat("upper whisker", summary.upper_whisker),
    ]
}

#[derive(Serialize)]
struct AccuracyView {
    rows: Vec<AccuracyRow>,
    excluded: Vec<usize>,
    summary: Option<Summary>,
}

impl AccuracyCommand {
    pub async fn run(self, ctx: CommandContext) -> Result<()> {
        let table = ctx.read_table(&self.input, self.sheet.as_deref())?;
        let samples = samples_from_table(&table, &ctx.config.accuracy)
            .with_context(|| format!("Failed to read samples from {:?}", self.input))?;
        let rows = exclude_slots(analyze(&samples)?, &self.exclude);

        let percent: Vec<f64> = rows.iter().map(|row| row.percent_error).collect();
        let view = AccuracyView {
            summary: summarize(&percent),
            rows,
            excluded: self.exclude,
        };

        match ctx.format {
            OutputFormat::Json => print_json(&view),
            OutputFormat::Table => {
                let slots: Vec<SlotRow> = view.rows.iter().map(SlotRow::from).collect();
                print_table(&slots);
                if let Some(summary) = &view.summary {
                    println!();
                    print_table(&stat_rows(summary));
                    if !summary.outliers.is_empty() {
                        print_info(&format!("Outliers (% error): {:?}", summary.outliers));
                    }
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use clap::Parser;

    #[derive(Debug, Parser)]
    struct Wrapper {
        #[command(flatten)]
        command: AccuracyCommand,
    }

    #[test]
    fn test_exclude_accepts_comma_list() {
        let parsed =
            Wrapper::try_parse_from(["accuracy", "--input", "p1000.csv", "--exclude", "1,2,4"])
                .unwrap();
        assert_eq!(parsed.command.exclude, vec![1, 2, 4]);
    }

    #[test]
    fn test_input_is_required() {
        assert!(Wrapper::try_parse_from(["accuracy"]).is_err());
    }

    #[test]
    fn test_stat_rows() {
        let summary = summarize(&[1.0, 2.0, 3.0, 4.0]).unwrap();
        let rows = stat_rows(&summary);
        assert_eq!(rows[2].name, "median");
        assert_eq!(rows[2].value, "2.5000");
    }
}
