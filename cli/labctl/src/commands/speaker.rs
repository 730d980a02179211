//! Speaker self-test command.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use crate::error::CliError;
use crate::output::{print_info, print_json, print_success, OutputFormat};
use crate::speaker::{play, SelfTestOutcome};

use super::CommandContext;

/// Play the test sound until it ends or Ctrl-C is pressed.
#[derive(Debug, Args)]
pub struct SpeakerTestCommand {
    /// Audio file to play.
    #[arg(long)]
    audio: Option<PathBuf>,

    /// Audio player executable.
    #[arg(long)]
    player: Option<String>,
}

impl SpeakerTestCommand {
    pub async fn run(self, ctx: CommandContext) -> Result<()> {
        let settings = &ctx.config.speaker;
        let player = self.player.as_deref().unwrap_or(&settings.player);
        let audio = self.audio.as_deref().unwrap_or(&settings.audio_file);

        if ctx.format == OutputFormat::Table {
            print_info(&format!("Playing {}. Press Ctrl-C to stop.", audio.display()));
        }

        let cancel = async {
            // Without a signal handler the test can only end on its own.
            if tokio::signal::ctrl_c().await.is_err() {
                std::future::pending::<()>().await;
            }
        };
        let outcome = play(player, audio, cancel).await?;

        let label = match outcome {
            SelfTestOutcome::Completed => "completed",
            SelfTestOutcome::Cancelled => "cancelled",
            SelfTestOutcome::Failed(code) => {
                return Err(CliError::SelfTest(match code {
                    Some(code) => format!("{player} exited with status {code}"),
                    None => format!("{player} was terminated by a signal"),
                })
                .into());
            }
        };

        match ctx.format {
            OutputFormat::Json => print_json(&serde_json::json!({ "outcome": label })),
            OutputFormat::Table => print_success(&format!("Speaker test {label}")),
        }

        Ok(())
    }
}
