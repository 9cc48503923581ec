//! Read-only access to repository history through the system `git` binary.
//!
//! The resolution engine only needs three operations, captured by the
//! [`HistoryBackend`] trait:
//!
//! - list the commits selected by one root spec (`git rev-list`)
//! - list the tree entries for one path at one commit (`git ls-tree`)
//! - fetch the raw content of a content object (`git show`)
//!
//! [`GitRepo`] implements them by shelling out through
//! [`GitCommand`](command_builder::GitCommand), the way Cargo's
//! `git-fetch-with-cli` does, so the user's git configuration applies
//! unchanged. Nothing here writes to the repository.
//!
//! Tests substitute an in-memory backend to count invocations.

pub mod command_builder;

use anyhow::{Context, Result};
use std::future::Future;
use std::path::{Path, PathBuf};

use crate::core::SweepError;
use crate::models::{CommitId, ContentObjectId, RootSpec};
use crate::utils::platform::{command_exists, get_git_command};
use command_builder::GitCommand;

/// The three read-only history operations the engine consumes.
///
/// Implementations return raw backend output; parsing it into ids is the
/// engine's job so that malformed output is diagnosed in one place. Every
/// method fails with [`SweepError::GitCommandError`] (or an equivalent typed
/// error) when the underlying invocation fails.
pub trait HistoryBackend: Sync {
    /// Output of `rev-list` for one root spec: one commit id per line.
    fn rev_list(&self, root: &RootSpec) -> impl Future<Output = Result<String>> + Send;

    /// Output of `ls-tree` for `path` at `commit`: lines of
    /// `<mode> <type> <id>\t<path>`, empty when the path is absent.
    fn ls_tree(
        &self,
        commit: &CommitId,
        path: &str,
    ) -> impl Future<Output = Result<String>> + Send;

    /// Raw bytes of a content object.
    fn show_object(
        &self,
        object: &ContentObjectId,
    ) -> impl Future<Output = Result<Vec<u8>>> + Send;
}

/// A local git repository inspected through the git CLI.
///
/// The path may be a working tree or a bare repository; every command runs
/// as `git -C <path> ...`.
///
/// ```rust,no_run
/// use imgsweep_cli::git::{GitRepo, HistoryBackend};
/// use imgsweep_cli::models::RootSpec;
///
/// # async fn example() -> anyhow::Result<()> {
/// let repo = GitRepo::new("/path/to/repo");
/// repo.ensure_valid().await?;
/// let commits = repo.rev_list(&RootSpec::new(["--tags", "-n", "1"])).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct GitRepo {
    path: PathBuf,
}

impl GitRepo {
    /// Creates a handle without checking that `path` is a repository.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Returns the repository path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Verifies the path exists and git recognises it as a repository.
    ///
    /// # Errors
    ///
    /// Returns [`SweepError::GitRepoInvalid`] when the path is missing or
    /// `git rev-parse --git-dir` fails there.
    pub async fn ensure_valid(&self) -> Result<()> {
        let invalid = || SweepError::GitRepoInvalid {
            path: self.path.display().to_string(),
        };

        if !self.path.exists() {
            return Err(invalid().into());
        }

        GitCommand::git_dir()
            .current_dir(&self.path)
            .execute_success()
            .await
            .map_err(|e| {
                tracing::debug!(target: "git", "rev-parse --git-dir failed: {}", e);
                anyhow::Error::from(invalid())
            })
    }
}

impl HistoryBackend for GitRepo {
    async fn rev_list(&self, root: &RootSpec) -> Result<String> {
        GitCommand::rev_list(root.args())
            .current_dir(&self.path)
            .with_context(root.to_string())
            .execute_stdout()
            .await
            .with_context(|| format!("Failed to list commits for root '{root}'"))
    }

    async fn ls_tree(&self, commit: &CommitId, path: &str) -> Result<String> {
        GitCommand::ls_tree(commit.as_str(), path)
            .current_dir(&self.path)
            .with_context(commit.as_str())
            .execute_stdout()
            .await
            .with_context(|| format!("Failed to list '{path}' at commit {commit}"))
    }

    async fn show_object(&self, object: &ContentObjectId) -> Result<Vec<u8>> {
        GitCommand::show(object.as_str())
            .current_dir(&self.path)
            .with_context(object.as_str())
            .execute_bytes()
            .await
            .with_context(|| format!("Failed to read object {object}"))
    }
}

/// Checks if git is available on PATH.
#[must_use]
pub fn is_git_installed() -> bool {
    command_exists(get_git_command())
}

/// Fails with [`SweepError::GitNotFound`] when git is not on PATH.
pub fn ensure_git_available() -> Result<()> {
    if !is_git_installed() {
        return Err(SweepError::GitNotFound.into());
    }
    Ok(())
}
