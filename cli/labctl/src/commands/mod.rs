//! CLI commands.

mod accuracy;
mod allocate;
mod calibrate;
mod clean;
mod config;
mod plan;
mod speaker;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand};
use labplan_alloc::{allocate_table, Allocation, ColumnNames, TargetVolume};
use labplan_table::{CsvWorkbook, Table, TabularSource};
use tracing::{info, warn};

use crate::config::RunConfig;
use crate::error::CliError;
use crate::output::OutputFormat;

/// labplan CLI - Plan reagent dispensing for an OT-2 run.
#[derive(Debug, Parser)]
#[command(name = "labctl")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Output format.
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Table)]
    format: OutputFormat,

    /// Run configuration file (defaults to run.toml in the user config dir).
    #[arg(long, global = true, env = "LABPLAN_CONFIG")]
    config: Option<PathBuf>,

    /// More log output (-v info, -vv debug).
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Compute the diluent volume for every well.
    Allocate(allocate::AllocateCommand),

    /// Dry-run the dispensing sequence for an allocation.
    Plan(plan::PlanCommand),

    /// Dry-run the pipette calibration ladder.
    Calibrate(calibrate::CalibrateCommand),

    /// Dry-run the tip blow-out clean.
    Clean(clean::CleanCommand),

    /// Analyse weighed calibration results.
    Accuracy(accuracy::AccuracyCommand),

    /// Play the speaker test sound until it ends or Ctrl-C.
    SpeakerTest(speaker::SpeakerTestCommand),

    /// Inspect or create the run configuration.
    Config(config::ConfigCommand),

    /// Show CLI version.
    Version,
}

impl Cli {
    /// Tracing filter implied by `-v`.
    pub fn log_level(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            _ => "debug",
        }
    }

    /// Run the CLI command.
    pub async fn run(self) -> Result<()> {
        let format = self.format;
        let config_path = self.config;
        // Loaded on demand so `config` and `version` work with a broken file.
        let ctx = || -> Result<CommandContext> {
            Ok(CommandContext {
                config: RunConfig::load(config_path.as_deref())?,
                format,
            })
        };

        match self.command {
            Commands::Allocate(cmd) => cmd.run(ctx()?).await,
            Commands::Plan(cmd) => cmd.run(ctx()?).await,
            Commands::Calibrate(cmd) => cmd.run(ctx()?).await,
            Commands::Clean(cmd) => cmd.run(ctx()?).await,
            Commands::Accuracy(cmd) => cmd.run(ctx()?).await,
            Commands::SpeakerTest(cmd) => cmd.run(ctx()?).await,
            Commands::Config(cmd) => cmd.run(config_path.as_deref(), format).await,
            Commands::Version => {
                println!("labctl {}", env!("CARGO_PKG_VERSION"));
                Ok(())
            }
        }
    }
}

/// Shared command context.
pub struct CommandContext {
    pub config: RunConfig,
    pub format: OutputFormat,
}

impl CommandContext {
    /// Read one sheet of a workbook.
    pub fn read_table(&self, path: &Path, sheet: Option<&str>) -> Result<Table> {
        let table = CsvWorkbook::open(path)
            .read_sheet(sheet)
            .with_context(|| format!("Failed to read {:?}", path))?;
        info!(path = ?path, rows = table.len(), "input loaded");
        Ok(table)
    }
}

/// Input selection shared by `allocate` and `plan`.
#[derive(Debug, Args)]
pub struct InputArgs {
    /// CSV file, or directory of `<sheet>.csv` files.
    #[arg(long, short, env = "LABPLAN_INPUT")]
    input: Option<PathBuf>,

    /// Sheet to read from a workbook directory.
    #[arg(long)]
    sheet: Option<String>,

    /// Target volume per well (µL).
    #[arg(long)]
    target: Option<TargetVolume>,

    /// Column holding reagent A volumes.
    #[arg(long)]
    column_a: Option<String>,

    /// Column holding reagent B volumes.
    #[arg(long)]
    column_b: Option<String>,

    /// Fail when any well's reagents exceed the target.
    #[arg(long)]
    strict: bool,
}

impl InputArgs {
    /// Read the input and allocate it, flags taking precedence over config.
    pub fn allocate(&self, ctx: &CommandContext) -> Result<Allocation> {
        let input = &ctx.config.input;
        let path = self
            .input
            .as_deref()
            .or(input.path.as_deref())
            .ok_or(CliError::NoInput)?;
        let sheet = self.sheet.as_deref().or(input.sheet.as_deref());
        let columns = self.columns(&input.columns);
        let target = self.target.unwrap_or(ctx.config.target_volume_ul);

        let table = ctx.read_table(path, sheet)?;
        let allocation = allocate_table(&table, &columns, target)
            .with_context(|| format!("Failed to allocate {:?}", path))?;

        let overfilled = allocation.overfilled();
        for index in &overfilled {
            let result = &allocation.results[*index];
            warn!(
                row = index + 1,
                total_ul = result.total,
                target_ul = target.as_ul(),
                "reagents exceed the target volume; no diluent added"
            );
        }
        if self.strict && !overfilled.is_empty() {
            return Err(CliError::Overfilled {
                count: overfilled.len(),
                target_ul: target.as_ul(),
            }
            .into());
        }

        Ok(allocation)
    }

    fn columns(&self, configured: &ColumnNames) -> ColumnNames {
        ColumnNames {
            component_a: self
                .column_a
                .clone()
                .unwrap_or_else(|| configured.component_a.clone()),
            component_b: self
                .column_b
                .clone()
                .unwrap_or_else(|| configured.component_b.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::io::Write;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("labctl").chain(args.iter().copied())).unwrap()
    }

    fn input_args(cli: Cli) -> InputArgs {
        match cli.command {
            Commands::Allocate(cmd) => cmd.input,
            other => panic!("unexpected command {:?}", other),
        }
    }

    fn csv_file(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    fn ctx(config: RunConfig) -> CommandContext {
        CommandContext {
            config,
            format: OutputFormat::Table,
        }
    }

    #[test]
    fn test_verbosity_levels() {
        assert_eq!(parse(&["version"]).log_level(), "warn");
        assert_eq!(parse(&["-v", "version"]).log_level(), "info");
        assert_eq!(parse(&["-vvv", "version"]).log_level(), "debug");
    }

    #[test]
    fn test_format_flag() {
        assert_eq!(parse(&["version"]).format, OutputFormat::Table);
        assert_eq!(parse(&["--format", "json", "version"]).format, OutputFormat::Json);
        assert!(Cli::try_parse_from(["labctl", "--format", "yaml", "version"]).is_err());
    }

    #[test]
    fn test_negative_target_rejected_by_parser() {
        assert!(Cli::try_parse_from(["labctl", "allocate", "--target=-5"]).is_err());
    }

    #[test]
    fn test_flags_override_config() {
        let file = csv_file("Cu,Gly\n10,20\n");
        let mut config = RunConfig::default();
        config.input.path = Some(PathBuf::from("/nonexistent.csv"));
        config.target_volume_ul = TargetVolume::new(50.0).unwrap();

        let path = file.path().to_str().unwrap();
        let args = input_args(parse(&[
            "allocate",
            "--input",
            path,
            "--target",
            "200",
            "--column-a",
            "Cu",
            "--column-b",
            "Gly",
        ]));
        let allocation = args.allocate(&ctx(config)).unwrap();
        assert_eq!(allocation.target.as_ul(), 200.0);
        assert_eq!(allocation.results[0].remaining, 170.0);
    }

    #[test]
    fn test_config_supplies_missing_flags() {
        let file = csv_file("Cu Values,Glycine Values\n10,20\n");
        let mut config = RunConfig::default();
        config.input.path = Some(file.path().to_path_buf());
        config.target_volume_ul = TargetVolume::new(50.0).unwrap();

        let allocation = input_args(parse(&["allocate"])).allocate(&ctx(config)).unwrap();
        assert_eq!(allocation.results[0].remaining, 20.0);
    }

    #[test]
    fn test_no_input_is_error() {
        let err = input_args(parse(&["allocate"]))
            .allocate(&ctx(RunConfig::default()))
            .unwrap_err();
        assert!(matches!(err.downcast_ref::<CliError>(), Some(CliError::NoInput)));
    }

    #[test]
    fn test_strict_rejects_overfill() {
        let file = csv_file("Cu Values,Glycine Values\n60,50\n10,20\n");
        let path = file.path().to_str().unwrap();

        let lenient = input_args(parse(&["allocate", "--input", path]))
            .allocate(&ctx(RunConfig::default()))
            .unwrap();
        assert_eq!(lenient.overfilled(), vec![0]);
        assert_eq!(lenient.results[0].remaining, 0.0);

        let err = input_args(parse(&["allocate", "--input", path, "--strict"]))
            .allocate(&ctx(RunConfig::default()))
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<CliError>(),
            Some(CliError::Overfilled { count: 1, .. })
        ));
    }
}
