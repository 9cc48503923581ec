//! Git test helper utilities
//!
//! Builds real repositories for tests with a safe wrapper around git.

use anyhow::{Context, Result, bail};
use std::path::{Path, PathBuf};
use std::process::Command;

/// Git command wrapper for tests
///
/// Use this instead of raw `std::process::Command` when a test needs a
/// repository with specific history.
pub struct TestGit {
    repo_path: PathBuf,
}

impl TestGit {
    fn run_git_command_with_env(
        &self,
        args: &[&str],
        env: &[(&str, &str)],
        action: &str,
    ) -> Result<std::process::Output> {
        let output = Command::new("git")
            .args(args)
            .envs(env.iter().copied())
            .current_dir(&self.repo_path)
            .output()
            .with_context(|| action.to_string())?;

        if !output.status.success() {
            bail!("{} failed: {}", action, String::from_utf8_lossy(&output.stderr));
        }

        Ok(output)
    }

    fn run_git_command(&self, args: &[&str], action: &str) -> Result<std::process::Output> {
        self.run_git_command_with_env(args, &[], action)
    }

    /// Create a new TestGit instance for the given repository path
    pub fn new(repo_path: impl Into<PathBuf>) -> Self {
        Self {
            repo_path: repo_path.into(),
        }
    }

    /// Initialize a new git repository
    pub fn init(&self) -> Result<()> {
        self.run_git_command(&["init"], "Failed to initialize git repository")?;
        Ok(())
    }

    /// Configure git user for tests
    pub fn config_user(&self) -> Result<()> {
        self.run_git_command(
            &["config", "user.email", "test@imgsweep.example"],
            "Failed to configure git user email",
        )?;

        self.run_git_command(
            &["config", "user.name", "Test User"],
            "Failed to configure git user name",
        )?;
        Ok(())
    }

    /// Add all files to staging
    pub fn add_all(&self) -> Result<()> {
        self.run_git_command(&["add", "-A"], "Failed to add files to git")?;
        Ok(())
    }

    /// Create a commit with the given message
    pub fn commit(&self, message: &str) -> Result<()> {
        self.run_git_command(&["commit", "-m", message], "Failed to create git commit")?;
        Ok(())
    }

    /// Create a commit whose author and committer dates are `date`
    /// (any format git accepts, e.g. `2020-01-01T00:00:00Z`).
    pub fn commit_at(&self, message: &str, date: &str) -> Result<()> {
        self.run_git_command_with_env(
            &["commit", "-m", message],
            &[("GIT_AUTHOR_DATE", date), ("GIT_COMMITTER_DATE", date)],
            "Failed to create dated git commit",
        )?;
        Ok(())
    }

    /// Write `content` to `relative_path` (creating parent directories),
    /// commit everything, and return the new HEAD SHA.
    pub fn commit_file(&self, relative_path: &str, content: &str, message: &str) -> Result<String> {
        let path = self.repo_path.join(relative_path);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        std::fs::write(&path, content)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        self.add_all()?;
        self.commit(message)?;
        self.rev_parse_head()
    }

    /// Delete `relative_path`, commit, and return the new HEAD SHA.
    pub fn remove_file(&self, relative_path: &str, message: &str) -> Result<String> {
        self.run_git_command(
            &["rm", "-q", relative_path],
            &format!("Failed to remove: {}", relative_path),
        )?;
        self.commit(message)?;
        self.rev_parse_head()
    }

    /// Create a tag
    pub fn tag(&self, tag_name: &str) -> Result<()> {
        self.run_git_command(&["tag", tag_name], &format!("Failed to create tag: {}", tag_name))?;
        Ok(())
    }

    /// Return the repository path
    pub fn repo_path(&self) -> &Path {
        &self.repo_path
    }

    /// Get current commit SHA
    pub fn rev_parse_head(&self) -> Result<String> {
        let output =
            self.run_git_command(&["rev-parse", "HEAD"], "Failed to get current commit SHA")?;
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    /// Checkout a branch or commit
    pub fn checkout(&self, ref_name: &str) -> Result<()> {
        self.run_git_command(
            &["checkout", "-q", ref_name],
            &format!("Failed to checkout: {}", ref_name),
        )?;
        Ok(())
    }

    /// Create and checkout a branch
    pub fn create_branch(&self, branch_name: &str) -> Result<()> {
        self.run_git_command(
            &["checkout", "-q", "-b", branch_name],
            &format!("Failed to create branch: {}", branch_name),
        )?;
        Ok(())
    }

    /// Get the current branch name
    pub fn get_current_branch(&self) -> Result<String> {
        let output = self
            .run_git_command(&["branch", "--show-current"], "Failed to get current branch name")?;
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    /// Write the blob for `content` into the object database and return its id
    pub fn hash_object(&self, content: &str) -> Result<String> {
        let temp = self.repo_path.join(".imgsweep-hash-object");
        std::fs::write(&temp, content)
            .with_context(|| format!("Failed to write {}", temp.display()))?;
        let output = self.run_git_command(
            &["hash-object", "-w", ".imgsweep-hash-object"],
            "Failed to hash object",
        );
        std::fs::remove_file(&temp).ok();
        Ok(String::from_utf8_lossy(&output?.stdout).trim().to_string())
    }
}
