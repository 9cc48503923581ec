//! In-memory [`HistoryBackend`] for engine tests.
//!
//! Answers from fixed tables and records every call, so tests can assert how
//! often each operation ran without touching a real repository.

use anyhow::Result;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use crate::core::SweepError;
use crate::git::HistoryBackend;
use crate::models::{CommitId, ContentObjectId, RootSpec};

/// Scripted history backend.
///
/// ```rust,ignore
/// let backend = MemoryBackend::new()
///     .with_root(["--all"], ["c1", "c2"])
///     .with_blob("c1", "b1", "CI_BUILD_CONTAINER=r.azurecr.io/x:1\n")
///     .with_blob("c2", "b1", "CI_BUILD_CONTAINER=r.azurecr.io/x:1\n");
/// ```
#[derive(Default)]
pub struct MemoryBackend {
    roots: HashMap<Vec<String>, Vec<String>>,
    trees: HashMap<String, String>,
    objects: HashMap<String, Vec<u8>>,
    failing_commits: HashSet<String>,
    rev_list_calls: Mutex<Vec<RootSpec>>,
    ls_tree_calls: Mutex<Vec<CommitId>>,
    show_calls: Mutex<Vec<ContentObjectId>>,
}

impl MemoryBackend {
    /// An empty backend: every root fails, every tree is empty.
    pub fn new() -> Self {
        Self::default()
    }

    /// Commits printed by `rev-list` for the given root arguments.
    pub fn with_root<const A: usize, const C: usize>(
        mut self,
        args: [&str; A],
        commits: [&str; C],
    ) -> Self {
        self.roots.insert(
            args.iter().map(ToString::to_string).collect(),
            commits.iter().map(ToString::to_string).collect(),
        );
        self
    }

    /// Raw `ls-tree` output for a commit.
    pub fn with_tree(mut self, commit: &str, listing: &str) -> Self {
        self.trees.insert(commit.to_string(), listing.to_string());
        self
    }

    /// The tracked file at `commit` is blob `blob` with `content`.
    pub fn with_blob(self, commit: &str, blob: &str, content: &str) -> Self {
        let listing = format!("100644 blob {blob}\t.travis.yml\n");
        let mut backend = self.with_tree(commit, &listing);
        backend.objects.insert(blob.to_string(), content.as_bytes().to_vec());
        backend
    }

    /// Make `ls-tree` fail for `commit`.
    pub fn with_failing_commit(mut self, commit: &str) -> Self {
        self.failing_commits.insert(commit.to_string());
        self
    }

    /// Root specs passed to `rev_list`, in call order.
    pub fn rev_list_calls(&self) -> Vec<RootSpec> {
        self.rev_list_calls.lock().unwrap().clone()
    }

    /// Commits passed to `ls_tree`, in call order.
    pub fn ls_tree_calls(&self) -> Vec<CommitId> {
        self.ls_tree_calls.lock().unwrap().clone()
    }

    /// Objects passed to `show_object`, in call order.
    pub fn show_calls(&self) -> Vec<ContentObjectId> {
        self.show_calls.lock().unwrap().clone()
    }

    fn failure(command: String, stderr: &str) -> anyhow::Error {
        SweepError::GitCommandError {
            command,
            exit_code: Some(128),
            stdout: String::new(),
            stderr: stderr.to_string(),
        }
        .into()
    }
}

impl HistoryBackend for MemoryBackend {
    async fn rev_list(&self, root: &RootSpec) -> Result<String> {
        self.rev_list_calls.lock().unwrap().push(root.clone());
        match self.roots.get(root.args()) {
            Some(commits) => {
                let mut out = commits.join("\n");
                out.push('\n');
                Ok(out)
            }
            None => Err(Self::failure(
                format!("git rev-list {}", root.args().join(" ")),
                "fatal: bad revision",
            )),
        }
    }

    async fn ls_tree(&self, commit: &CommitId, path: &str) -> Result<String> {
        self.ls_tree_calls.lock().unwrap().push(commit.clone());
        if self.failing_commits.contains(commit.as_str()) {
            return Err(Self::failure(
                format!("git ls-tree {commit} -- {path}"),
                "fatal: not a tree object",
            ));
        }
        Ok(self.trees.get(commit.as_str()).cloned().unwrap_or_default())
    }

    async fn show_object(&self, object: &ContentObjectId) -> Result<Vec<u8>> {
        self.show_calls.lock().unwrap().push(object.clone());
        self.objects.get(object.as_str()).cloned().ok_or_else(|| {
            Self::failure(format!("git show {object}"), "fatal: bad object")
        })
    }
}
