//! Config commands.

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Args, Subcommand};

use crate::config::{default_config_path, RunConfig};
use crate::error::CliError;
use crate::output::{print_json, print_success, OutputFormat};

/// Inspect or create the run configuration.
#[derive(Debug, Args)]
pub struct ConfigCommand {
    #[command(subcommand)]
    command: ConfigSubcommand,
}

#[derive(Debug, Subcommand)]
enum ConfigSubcommand {
    /// Print the effective configuration.
    Show,

    /// Print the configuration file path.
    Path,

    /// Write a configuration file with the defaults.
    Init {
        /// Overwrite an existing file.
        #[arg(long)]
        force: bool,
    },
}

impl ConfigCommand {
    pub async fn run(self, explicit: Option<&Path>, format: OutputFormat) -> Result<()> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => default_config_path()?,
        };

        match self.command {
            ConfigSubcommand::Show => show(explicit, format),
            ConfigSubcommand::Path => {
                match format {
                    OutputFormat::Json => print_json(&serde_json::json!({
                        "path": path,
                        "exists": path.exists(),
                    })),
                    OutputFormat::Table => println!("{}", path.display()),
                }
                Ok(())
            }
            ConfigSubcommand::Init { force } => init(path, force, format),
        }
    }
}

fn show(explicit: Option<&Path>, format: OutputFormat) -> Result<()> {
    let config = RunConfig::load(explicit)?;
    match format {
        OutputFormat::Json => print_json(&config),
        OutputFormat::Table => print!("{}", config.to_toml_string()?),
    }
    Ok(())
}

fn init(path: PathBuf, force: bool, format: OutputFormat) -> Result<()> {
    if path.exists() && !force {
        return Err(CliError::ConfigExists(path.display().to_string()).into());
    }
    RunConfig::default().save(&path)?;

    match format {
        OutputFormat::Json => print_json(&serde_json::json!({ "path": path, "written": true })),
        OutputFormat::Table => print_success(&format!("Wrote {}", path.display())),
    }
    Ok(())
}
