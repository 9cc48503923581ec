//! Builder for Azure CLI invocations.
//!
//! A smaller sibling of [`GitCommand`](crate::git::command_builder::GitCommand):
//! same timeout and capture behaviour, failures mapped to
//! [`SweepError::AzCommandError`].

use anyhow::Result;
use std::time::Duration;
use tokio::process::Command;

use crate::constants::DEFAULT_COMMAND_TIMEOUT;
use crate::core::SweepError;
use crate::utils::platform::get_az_command;
use crate::utils::process::run_captured;

/// An `az` invocation under construction.
pub struct AzCommand {
    args: Vec<String>,
    timeout_duration: Option<Duration>,
}

impl Default for AzCommand {
    fn default() -> Self {
        Self {
            args: Vec::new(),
            timeout_duration: Some(DEFAULT_COMMAND_TIMEOUT),
        }
    }
}

impl AzCommand {
    /// Creates an empty command with the default timeout.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds arguments in order.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Set a custom timeout for the command (None for no timeout)
    pub const fn with_timeout(mut self, duration: Option<Duration>) -> Self {
        self.timeout_duration = duration;
        self
    }

    /// `az acr repository show-manifests` for one repository, as JSON.
    pub fn show_manifests(registry: &str, repository: &str) -> Self {
        Self::new().args([
            "acr",
            "repository",
            "show-manifests",
            "--name",
            registry,
            "--repository",
            repository,
            "--output",
            "json",
        ])
    }

    /// `az acr repository delete` of one image by `<repository>@<digest>`.
    pub fn delete_image(registry: &str, repository: &str, digest: &str) -> Self {
        Self::new().args([
            "acr",
            "repository",
            "delete",
            "--name",
            registry,
            "--image",
            &format!("{repository}@{digest}"),
            "--yes",
        ])
    }

    /// The command line as shown in logs and errors.
    pub fn display(&self) -> String {
        format!("{} {}", get_az_command(), self.args.join(" "))
    }

    /// Run the command and return its stdout.
    ///
    /// # Errors
    ///
    /// - [`SweepError::AzCommandError`] on a non-zero exit status
    /// - [`SweepError::CommandTimedOut`] when the timeout elapses
    /// - a spawn error when `az` cannot be started
    pub async fn execute(self) -> Result<Vec<u8>> {
        let command_line = self.display();
        let mut cmd = Command::new(get_az_command());
        cmd.args(&self.args);

        tracing::debug!(target: "az", "Executing command: {}", command_line);
        let output = run_captured(cmd, &command_line, self.timeout_duration).await?;

        if !output.status.success() {
            tracing::debug!(
                target: "az",
                "Command failed with exit code: {:?}",
                output.status.code()
            );
            return Err(SweepError::AzCommandError {
                command: command_line,
                exit_code: output.status.code(),
                stdout: String::from_utf8_lossy(&output.stdout).to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            }
            .into());
        }

        Ok(output.stdout)
    }
}
