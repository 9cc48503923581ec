//! Shared process execution for the git and Azure CLI command builders.

use anyhow::{Context, Result};
use std::process::{Output, Stdio};
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;

use crate::core::SweepError;

/// Run `cmd` with stdout and stderr captured, enforcing an optional timeout.
///
/// `command_line` is the human-readable command line used in logs and errors.
/// A non-zero exit status is not an error here; callers map it to their own
/// [`SweepError`] variant so the captured streams reach the user verbatim.
pub(crate) async fn run_captured(
    mut cmd: Command,
    command_line: &str,
    timeout_duration: Option<Duration>,
) -> Result<Output> {
    cmd.stdin(Stdio::null());
    cmd.stdout(Stdio::piped());
    cmd.stderr(Stdio::piped());
    // Dropping the future on timeout must not leave the child running
    cmd.kill_on_drop(true);

    let output_future = cmd.output();

    if let Some(duration) = timeout_duration {
        match timeout(duration, output_future).await {
            Ok(result) => result.with_context(|| format!("Failed to execute {command_line}")),
            Err(_) => {
                tracing::warn!(
                    "Command timed out after {} seconds: {}",
                    duration.as_secs(),
                    command_line
                );
                Err(SweepError::CommandTimedOut {
                    command: command_line.to_string(),
                    seconds: duration.as_secs(),
                }
                .into())
            }
        }
    } else {
        output_future.await.with_context(|| format!("Failed to execute {command_line}"))
    }
}
