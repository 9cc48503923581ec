//! Command-line interface for imgsweep.
//!
//! One command, no subcommands:
//!
//! ```bash
//! imgsweep --repo-path ~/src/bond --min-age 30 '--remotes=origin;--since=2~weeks~ago' '--tags;-n;1'
//! ```
//!
//! Each positional argument is a root filter: the `;`-separated arguments of
//! one `git rev-list` invocation. The commits of all invocations together are
//! the live history. An image is kept if the tracked build configuration at
//! any of those commits names it, or if it is younger than `--min-age` days.
//!
//! # Flow
//!
//! 1. Set up logging from `--verbosity` (or `RUST_LOG`)
//! 2. Validate `--min-age` and load configuration
//! 3. Resolve the live tags; abort if there are none
//! 4. List manifests (from `az` or `--manifests`) and pick the garbage
//! 5. Delete the garbage, or only print it with `--dry-run`

use anyhow::Result;
use chrono::{Duration, Utc};
use clap::{Parser, ValueEnum};
use colored::Colorize;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use crate::config::SweepConfig;
use crate::core::SweepError;
use crate::garbage::collect_garbage;
use crate::git::{GitRepo, ensure_git_available};
use crate::live::{live_tags, require_live_tags};
use crate::models::{ImageTag, RootSpec};
use crate::registry::AzureRegistry;
use crate::utils::resolve_path;

const PROGRAM_DESCRIPTION: &str = "\
Remove images from an Azure Container Registry repository if they are no \
longer needed. Images are considered needed a) if they are referenced by the \
.travis.yml file in any of the commits included by the provided root filters, \
or b) if they are younger than the provided min-age.";

/// Log level names accepted by `--verbosity`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Verbosity {
    /// Debug output and above.
    #[value(name = "DEBUG")]
    Debug,
    /// Progress messages and above.
    #[value(name = "INFO")]
    Info,
    /// Warnings and errors (default).
    #[value(name = "WARNING")]
    Warning,
    /// Errors only.
    #[value(name = "ERROR")]
    Error,
    /// Errors only.
    #[value(name = "CRITICAL")]
    Critical,
    /// Everything, including trace output.
    #[value(name = "NOTSET")]
    NotSet,
}

impl Verbosity {
    /// The `tracing` filter directive for this level.
    #[must_use]
    pub const fn filter_directive(self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warning => "warn",
            Self::Error | Self::Critical => "error",
            Self::NotSet => "trace",
        }
    }
}

/// Remove unreferenced container images from a registry repository.
#[derive(Parser, Debug)]
#[command(name = "imgsweep", version, about, long_about = PROGRAM_DESCRIPTION)]
pub struct Cli {
    /// Path to the repository to inspect.
    #[arg(short = 'p', long)]
    repo_path: String,

    /// Semicolon-separated arguments for one invocation of `git rev-list`.
    ///
    /// The commits in the union of these invocations are used to find
    /// containers that are referenced by source code. Ex:
    /// '--remotes=origin;--since=2~weeks~ago' or '--tags;-n;1'.
    /// Options go before the root filters.
    #[arg(required = true, num_args = 1.., allow_hyphen_values = true)]
    root_filters: Vec<RootSpec>,

    /// Minimum time, in days, to keep containers around even if they are not
    /// referenced by the source code.
    #[arg(short = 'm', long, allow_negative_numbers = true)]
    min_age: i64,

    /// JSON file with container manifests to use instead of running an `az`
    /// command.
    #[arg(long)]
    manifests: Option<PathBuf>,

    /// Log level to emit to stderr. `RUST_LOG` takes precedence when set.
    #[arg(short, long, value_enum, ignore_case = true, default_value_t = Verbosity::Warning)]
    verbosity: Verbosity,

    /// Configuration file (default: `$IMGSWEEP_CONFIG`, then
    /// `~/.imgsweep/config.toml`).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Registry name, without `.azurecr.io`.
    #[arg(long)]
    registry: Option<String>,

    /// Repository inside the registry.
    #[arg(long)]
    repository: Option<String>,

    /// Pathspec of the build configuration file to scan.
    #[arg(long)]
    tracked_path: Option<String>,

    /// Maximum number of concurrent git invocations.
    #[arg(long)]
    max_parallel: Option<usize>,

    /// List the garbage manifests without deleting anything.
    #[arg(long)]
    dry_run: bool,
}

impl Cli {
    /// Run the sweep.
    ///
    /// # Errors
    ///
    /// Any failure aborts the run before (or between) deletions; see
    /// [`SweepError`] for the distinguishable cases.
    pub async fn execute(self) -> Result<()> {
        init_logging(self.verbosity);

        let min_age = self.min_age()?;
        let file_config = SweepConfig::load_with_optional(self.config.clone()).await?;
        let config = self.apply_overrides(file_config);
        tracing::debug!("Effective configuration: {:?}", config);

        ensure_git_available()?;
        let repo = GitRepo::new(resolve_path(&self.repo_path)?);
        repo.ensure_valid().await?;

        let tags = require_live_tags(live_tags(&repo, &self.root_filters, &config).await?)?;
        tracing::info!("Active tags: {{{}}}", sorted_tags(&tags).join(","));

        let registry = AzureRegistry::new(config.target()).with_manifest_file(self.manifests);
        let verb = if self.dry_run {
            "Would delete"
        } else {
            "Deleted"
        };
        let garbage =
            collect_garbage(&registry, &tags, min_age, Utc::now(), self.dry_run, |manifest| {
                println!("{} {} [{}]", verb, manifest.digest.cyan(), manifest.tags.join(", "));
            })
            .await?;

        if garbage.is_empty() {
            println!("{}", "No garbage manifests found".green());
        } else {
            println!("{} {} manifest(s)", verb.green().bold(), garbage.len());
        }

        Ok(())
    }

    /// `--min-age` as a duration.
    ///
    /// # Errors
    ///
    /// [`SweepError::InvalidMinAge`] for a negative value and
    /// [`SweepError::MinAgeOutOfRange`] for one too large for a [`Duration`].
    pub fn min_age(&self) -> Result<Duration> {
        if self.min_age < 0 {
            return Err(SweepError::InvalidMinAge {
                value: self.min_age,
            }
            .into());
        }
        Duration::try_days(self.min_age).ok_or_else(|| {
            SweepError::MinAgeOutOfRange {
                value: self.min_age,
            }
            .into()
        })
    }

    /// Layer command-line overrides on top of `config`.
    #[must_use]
    pub fn apply_overrides(&self, mut config: SweepConfig) -> SweepConfig {
        if let Some(ref registry) = self.registry {
            config.registry_name.clone_from(registry);
        }
        if let Some(ref repository) = self.repository {
            config.repository_name.clone_from(repository);
        }
        if let Some(ref tracked_path) = self.tracked_path {
            config.tracked_path.clone_from(tracked_path);
        }
        if let Some(max_parallel) = self.max_parallel {
            config.max_parallel = max_parallel;
        }
        config
    }

    /// The parsed root filters.
    #[must_use]
    pub fn root_filters(&self) -> &[RootSpec] {
        &self.root_filters
    }
}

/// Install the global `tracing` subscriber writing to stderr.
///
/// `RUST_LOG` wins over `verbosity` when set. Calling this twice keeps the
/// first subscriber.
pub fn init_logging(verbosity: Verbosity) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(verbosity.filter_directive()));

    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

fn sorted_tags(tags: &std::collections::HashSet<ImageTag>) -> Vec<&str> {
    let mut sorted: Vec<&str> = tags.iter().map(ImageTag::as_str).collect();
    sorted.sort_unstable();
    sorted
}
