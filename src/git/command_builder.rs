//! Type-safe Git command builder for consistent command execution
//!
//! This module provides a fluent API for building and executing the read-only
//! git plumbing commands imgsweep needs, with uniform logging, timeouts and
//! error mapping.

use anyhow::Result;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::process::Command;

use crate::constants::DEFAULT_COMMAND_TIMEOUT;
use crate::core::SweepError;
use crate::utils::platform::get_git_command;
use crate::utils::process::run_captured;

/// Builder for constructing and executing git commands.
///
/// Output is always captured. A non-zero exit status becomes
/// [`SweepError::GitCommandError`] carrying the full command line, the exit
/// code and both captured streams, so nothing git printed is lost.
///
/// # Examples
///
/// ```rust,no_run
/// use imgsweep_cli::git::command_builder::GitCommand;
///
/// # async fn example() -> anyhow::Result<()> {
/// let commits = GitCommand::rev_list(["--remotes=origin", "--since=2~weeks~ago"])
///     .current_dir("/path/to/repo")
///     .execute_stdout()
///     .await?;
/// # Ok(())
/// # }
/// ```
///
/// # Default Configuration
///
/// - **Timeout**: 5 minutes
/// - **Working directory**: passed with `-C` when set, so the process working
///   directory never matters
/// - **Environment**: inherits from the parent process
pub struct GitCommand {
    /// Command arguments to pass to git (e.g., ["ls-tree", "HEAD"])
    args: Vec<String>,

    /// Repository directory, passed as `git -C <dir>`
    current_dir: Option<PathBuf>,

    /// Environment variables to set for the git process
    env_vars: Vec<(String, String)>,

    /// Maximum duration to wait for command completion (None = no timeout)
    timeout_duration: Option<Duration>,

    /// Optional context string for log messages
    context: Option<String>,
}

impl Default for GitCommand {
    fn default() -> Self {
        Self {
            args: Vec::new(),
            current_dir: None,
            env_vars: Vec::new(),
            timeout_duration: Some(DEFAULT_COMMAND_TIMEOUT),
            context: None,
        }
    }
}

impl GitCommand {
    /// Creates a new git command builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the repository the command runs against.
    pub fn current_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.current_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    /// Adds a single argument.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Adds multiple arguments in order.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Adds an environment variable for this invocation only.
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env_vars.push((key.into(), value.into()));
        self
    }

    /// Set a custom timeout for the command (None for no timeout)
    pub const fn with_timeout(mut self, duration: Option<Duration>) -> Self {
        self.timeout_duration = duration;
        self
    }

    /// Set a context for logging (e.g., the commit being inspected)
    ///
    /// With context, log messages carry the identifier so concurrent
    /// invocations can be told apart:
    /// ```text
    /// (3f2a9c1) Executing command: git -C /repo ls-tree 3f2a9c1 -- :/.travis.yml
    /// ```
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    /// Full argument list including the `-C <dir>` prefix.
    fn full_args(&self) -> Vec<String> {
        let mut full_args = Vec::with_capacity(self.args.len() + 2);
        if let Some(ref dir) = self.current_dir {
            full_args.push("-C".to_string());
            // Use the path as-is to avoid symlink resolution surprises
            full_args.push(dir.display().to_string());
        }
        full_args.extend(self.args.iter().cloned());
        full_args
    }

    /// The git subcommand, skipping the `-C <dir>` prefix.
    fn operation(&self) -> &str {
        self.args.first().map_or("unknown", String::as_str)
    }

    /// Execute the command and return the captured output.
    ///
    /// # Errors
    ///
    /// - [`SweepError::GitCommandError`] on a non-zero exit status
    /// - [`SweepError::CommandTimedOut`] when the timeout elapses
    /// - a spawn error when git cannot be started
    pub async fn execute(self) -> Result<GitCommandOutput> {
        let start = std::time::Instant::now();
        let git_command = get_git_command();
        let full_args = self.full_args();
        let command_line = format!("{} {}", git_command, full_args.join(" "));

        let mut cmd = Command::new(git_command);
        cmd.args(&full_args);
        for (key, value) in &self.env_vars {
            tracing::trace!(target: "git", "Setting env var: {}={}", key, value);
            cmd.env(key, value);
        }

        if let Some(ref ctx) = self.context {
            tracing::debug!(target: "git", "({}) Executing command: {}", ctx, command_line);
        } else {
            tracing::debug!(target: "git", "Executing command: {}", command_line);
        }

        let output = run_captured(cmd, &command_line, self.timeout_duration).await?;

        if !output.status.success() {
            let stdout = String::from_utf8_lossy(&output.stdout).to_string();
            let stderr = String::from_utf8_lossy(&output.stderr).to_string();

            tracing::debug!(
                target: "git",
                "Command failed with exit code: {:?}",
                output.status.code()
            );
            if !stderr.is_empty() {
                tracing::debug!(target: "git", "Error: {}", stderr.trim());
            }

            return Err(SweepError::GitCommandError {
                command: command_line,
                exit_code: output.status.code(),
                stdout,
                stderr,
            }
            .into());
        }

        let stderr = String::from_utf8_lossy(&output.stderr).to_string();
        if !stderr.is_empty() {
            if let Some(ref ctx) = self.context {
                tracing::debug!(target: "git", "({}) {}", ctx, stderr.trim());
            } else {
                tracing::debug!(target: "git", "{}", stderr.trim());
            }
        }

        let elapsed = start.elapsed();
        if elapsed.as_secs() > 1 {
            tracing::info!(target: "git::perf", "Git {} took {:.2}s", self.operation(), elapsed.as_secs_f64());
        } else if elapsed.as_millis() > 100 {
            tracing::debug!(target: "git::perf", "Git {} took {}ms", self.operation(), elapsed.as_millis());
        }

        Ok(GitCommandOutput {
            stdout: output.stdout,
            stderr,
        })
    }

    /// Execute the command and return stdout decoded as text.
    ///
    /// Invalid UTF-8 is replaced rather than rejected; the plumbing commands
    /// used here print hex object ids and paths.
    pub async fn execute_stdout(self) -> Result<String> {
        let output = self.execute().await?;
        Ok(output.stdout_lossy())
    }

    /// Execute the command and return the raw stdout bytes.
    pub async fn execute_bytes(self) -> Result<Vec<u8>> {
        let output = self.execute().await?;
        Ok(output.stdout)
    }

    /// Execute the command and check for success.
    pub async fn execute_success(self) -> Result<()> {
        self.execute().await?;
        Ok(())
    }
}

/// Output from a git command
#[derive(Debug)]
pub struct GitCommandOutput {
    /// Raw standard output
    pub stdout: Vec<u8>,
    /// Standard error output
    pub stderr: String,
}

impl GitCommandOutput {
    /// Standard output decoded as UTF-8, lossily.
    #[must_use]
    pub fn stdout_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }
}

// Convenience builders for the plumbing commands

impl GitCommand {
    /// `git rev-list <args...>`: commits selected by one root spec.
    pub fn rev_list<I, S>(root_args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new().arg("rev-list").args(root_args)
    }

    /// `git ls-tree <commit> -- <path>`: tree entries for one path at a commit.
    pub fn ls_tree(commit: &str, path: &str) -> Self {
        Self::new().args(["ls-tree", commit, "--", path])
    }

    /// `git show <object>`: raw content of an object.
    pub fn show(object: &str) -> Self {
        Self::new().args(["show", object])
    }

    /// `git rev-parse --git-dir`: succeeds only inside a repository.
    pub fn git_dir() -> Self {
        Self::new().args(["rev-parse", "--git-dir"])
    }
}
