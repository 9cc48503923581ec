//! Common test utilities for imgsweep integration tests
//!
//! [`SweepRepo`] owns a temporary directory holding a git repository plus a
//! scratch area for manifest listings and config files, and builds
//! `imgsweep` invocations isolated from the user's environment.

// Not every test file uses every helper
#![allow(dead_code)]

use anyhow::{Context, Result};
use assert_cmd::Command;
use chrono::{Duration, SecondsFormat, Utc};
use imgsweep_cli::test_utils::TestGit;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Prefix of live references under the default configuration.
pub const DEFAULT_PREFIX: &str = "bondciimages.azurecr.io/ubuntu-1604";

/// A `.travis.yml` naming `image` as the build container.
pub fn travis_yml(image: &str) -> String {
    format!(
        "language: cpp\nsudo: required\nservices:\n  - docker\nenv:\n  global:\n    - CI_BUILD_CONTAINER={image}\nscript:\n  - make\n"
    )
}

/// A `.travis.yml` using `tag` of the default repository.
pub fn travis_for_tag(tag: &str) -> String {
    travis_yml(&format!("{DEFAULT_PREFIX}:{tag}"))
}

/// One manifest entry for a listing: digest, tags and age in days.
pub struct ManifestEntry<'a> {
    pub digest: &'a str,
    pub tags: &'a [&'a str],
    pub days_old: i64,
}

/// Render `entries` the way `az acr repository show-manifests` does.
pub fn manifest_json(entries: &[ManifestEntry<'_>]) -> String {
    let now = Utc::now();
    let values: Vec<serde_json::Value> = entries
        .iter()
        .map(|entry| {
            serde_json::json!({
                "digest": entry.digest,
                "tags": entry.tags,
                "timestamp": (now - Duration::days(entry.days_old))
                    .to_rfc3339_opts(SecondsFormat::Micros, true),
            })
        })
        .collect();
    serde_json::Value::Array(values).to_string()
}

/// A repository under test together with its scratch directory.
pub struct SweepRepo {
    temp: TempDir,
    git: TestGit,
}

impl SweepRepo {
    /// Initialise an empty repository on branch `main`.
    pub fn new() -> Result<Self> {
        let temp = TempDir::new()?;
        let repo_path = temp.path().join("repo");
        std::fs::create_dir_all(&repo_path).context("Failed to create repo dir")?;

        let git = TestGit::new(&repo_path);
        git.init()?;
        git.config_user()?;
        git.create_branch("main")?;

        Ok(Self {
            temp,
            git,
        })
    }

    /// The repository path.
    pub fn path(&self) -> &Path {
        self.git.repo_path()
    }

    /// Git helper bound to the repository.
    pub fn git(&self) -> &TestGit {
        &self.git
    }

    /// Commit a `.travis.yml` using `tag` of the default repository.
    pub fn commit_tag(&self, tag: &str) -> Result<String> {
        self.git.commit_file(".travis.yml", &travis_for_tag(tag), &format!("Build with {tag}"))
    }

    /// Write a file next to (not inside) the repository.
    pub fn write_scratch(&self, name: &str, content: &str) -> Result<PathBuf> {
        let path = self.temp.path().join(name);
        std::fs::write(&path, content).with_context(|| format!("Failed to write {name}"))?;
        Ok(path)
    }

    /// A path next to the repository that does not exist.
    pub fn scratch_path(&self, name: &str) -> PathBuf {
        self.temp.path().join(name)
    }

    /// `imgsweep` isolated from user config, `RUST_LOG` and colour.
    pub fn command(&self) -> Command {
        let mut cmd = Command::cargo_bin("imgsweep").unwrap();
        cmd.env("IMGSWEEP_CONFIG", self.scratch_path("no-config.toml"))
            .env("NO_COLOR", "1")
            .env_remove("RUST_LOG");
        cmd
    }
}
