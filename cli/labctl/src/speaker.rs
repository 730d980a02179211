//! Speaker self-test.
//!
//! Plays an audio file through an external player and waits until the player
//! exits or the operator cancels. The player process never outlives the test:
//! it is killed on cancellation and on drop. On unix the player runs in its own
//! process group so a terminal Ctrl-C reaches only labctl.

use std::future::Future;
use std::path::Path;
use std::process::{ExitStatus, Stdio};

use anyhow::{Context, Result};
use tokio::process::Command;
use tracing::{debug, info};

/// How a self-test ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelfTestOutcome {
    /// The player finished on its own.
    Completed,
    /// The operator stopped the test.
    Cancelled,
    /// The player exited with a failure status (`None` when killed by a signal).
    Failed(Option<i32>),
}

/// Play `audio` with `player` until it exits or `cancel` resolves.
///
/// Fails only when the player cannot be started or waited on.
pub async fn play<F>(player: &str, audio: &Path, cancel: F) -> Result<SelfTestOutcome>
where
    F: Future<Output = ()>,
{
    let mut command = Command::new(player);
    command
        .arg(audio)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .kill_on_drop(true);
    #[cfg(unix)]
    command.process_group(0);

    let mut child = command
        .spawn()
        .with_context(|| format!("Failed to start audio player {player:?}"))?;
    info!(player, audio = %audio.display(), pid = ?child.id(), "speaker test started");

    tokio::select! {
        biased;

        () = cancel => {
            // Reap the player before returning.
            child.kill().await.context("Failed to stop audio player")?;
            info!("speaker test cancelled");
            Ok(SelfTestOutcome::Cancelled)
        }
        status = child.wait() => {
            let status = status.context("Failed to wait for audio player")?;
            debug!(%status, "audio player exited");
            Ok(outcome_of(status))
        }
    }
}

fn outcome_of(status: ExitStatus) -> SelfTestOutcome {
    if status.success() {
        SelfTestOutcome::Completed
    } else if interrupted(&status) {
        info!("audio player interrupted");
        SelfTestOutcome::Cancelled
    } else {
        SelfTestOutcome::Failed(status.code())
    }
}

/// A player stopped by SIGINT was interrupted by the operator.
#[cfg(unix)]
fn interrupted(status: &ExitStatus) -> bool {
    use std::os::unix::process::ExitStatusExt;

    const SIGINT: i32 = 2;
    status.signal() == Some(SIGINT)
}

#[cfg(not(unix))]
fn interrupted(_status: &ExitStatus) -> bool {
    false
}
