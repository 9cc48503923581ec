//! Live-reference resolution.
//!
//! Computes which image tags are still referenced by the tracked build
//! configuration file anywhere in the retained part of a repository's
//! history. The pipeline runs four stages, each a batch transformation over
//! sets:
//!
//! 1. [`commits::resolve_commits`]: root specs to commit ids (union over roots)
//! 2. [`revisions::locate_revisions`]: commit ids to distinct blob ids of the
//!    tracked file
//! 3. [`references::extract_references`]: blob ids to image references
//! 4. [`tags::filter_and_map_tags`]: references to tags under the target
//!    registry repository
//!
//! Every root, commit and blob is visited once. Any backend failure aborts
//! the whole resolution; a partial live set is never returned.
//!
//! ```rust,no_run
//! use imgsweep_cli::config::SweepConfig;
//! use imgsweep_cli::git::GitRepo;
//! use imgsweep_cli::live::{live_tags, require_live_tags};
//! use imgsweep_cli::models::RootSpec;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let repo = GitRepo::new("/path/to/checkout");
//! let roots = vec![RootSpec::parse_semi_list("--remotes=origin;--since=2~weeks~ago")];
//! let tags = require_live_tags(live_tags(&repo, &roots, &SweepConfig::default()).await?)?;
//! # Ok(())
//! # }
//! ```

pub mod commits;
pub mod references;
pub mod revisions;
pub mod tags;

use anyhow::Result;
use std::collections::HashSet;

use crate::config::SweepConfig;
use crate::core::SweepError;
use crate::git::HistoryBackend;
use crate::models::{ImageReference, ImageTag, RootSpec};

/// All image references found in `tracked_path` across the commits selected
/// by `roots`, before any registry filtering.
///
/// # Errors
///
/// Propagates the first failure of any stage.
pub async fn live_images<B: HistoryBackend>(
    backend: &B,
    roots: &[RootSpec],
    tracked_path: &str,
    max_parallel: usize,
) -> Result<HashSet<ImageReference>> {
    let commit_ids = commits::resolve_commits(backend, roots).await?;
    tracing::info!("Found {} live commits", commit_ids.len());

    let blob_ids =
        revisions::locate_revisions(backend, &commit_ids, tracked_path, max_parallel).await?;
    tracing::info!("Found {} distinct revisions of {}", blob_ids.len(), tracked_path);

    references::extract_references(backend, &blob_ids, max_parallel).await
}

/// Live tags of the registry repository named by `config`.
///
/// # Errors
///
/// Propagates any failure of [`live_images`] and
/// [`SweepError::MalformedImageReference`] from tag mapping.
pub async fn live_tags<B: HistoryBackend>(
    backend: &B,
    roots: &[RootSpec],
    config: &SweepConfig,
) -> Result<HashSet<ImageTag>> {
    let images = live_images(backend, roots, &config.tracked_path, config.max_parallel).await?;
    tags::filter_and_map_tags(&images, &config.target())
}

/// Reject an empty live set.
///
/// # Errors
///
/// [`SweepError::EmptyLiveSet`] when `tags` is empty.
pub fn require_live_tags(tags: HashSet<ImageTag>) -> Result<HashSet<ImageTag>> {
    if tags.is_empty() {
        return Err(SweepError::EmptyLiveSet.into());
    }
    Ok(tags)
}
