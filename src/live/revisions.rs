//! Locating the revisions of the tracked file across a set of commits.

use anyhow::{Context, Result};
use futures::{StreamExt, TryStreamExt, stream};
use std::collections::HashSet;

use crate::core::SweepError;
use crate::git::HistoryBackend;
use crate::models::{CommitId, ContentObjectId};

/// Collect the distinct blob ids of `tracked_path` at every commit in `commits`.
///
/// Commits where the path is absent (empty listing) or is not a blob (e.g. a
/// tree or submodule entry) contribute nothing. Many commits usually share a
/// blob, which is why the result is a set: each blob is read once later.
///
/// Up to `max_parallel` listings run at once. Partial results are merged only
/// after every listing succeeded.
///
/// # Errors
///
/// - a failed `ls-tree` for any commit aborts the whole operation
/// - [`SweepError::TreeListingParse`] for a listing line with fewer than
///   three fields
pub async fn locate_revisions<B: HistoryBackend>(
    backend: &B,
    commits: &HashSet<CommitId>,
    tracked_path: &str,
    max_parallel: usize,
) -> Result<HashSet<ContentObjectId>> {
    let blob_ids = stream::iter(commits)
        .map(move |commit| async move {
            let listing = backend
                .ls_tree(commit, tracked_path)
                .await
                .with_context(|| format!("Locating '{tracked_path}' at commit {commit}"))?;
            parse_ls_tree(&listing)
        })
        .buffer_unordered(max_parallel.max(1))
        .try_fold(HashSet::new(), |mut acc, ids| async move {
            acc.extend(ids);
            Ok::<_, anyhow::Error>(acc)
        })
        .await?;

    tracing::debug!(
        "Found {} distinct revisions of '{}' across {} commits",
        blob_ids.len(),
        tracked_path,
        commits.len()
    );
    Ok(blob_ids)
}

/// Parse `git ls-tree` output into the ids of its blob entries.
///
/// Expected lines look like
/// `100644 blob cbe47c031fb164dca034aac640de08cf35170a68\t.travis.yml`.
/// Only the first three fields are inspected, so a path containing spaces
/// does not matter.
///
/// # Errors
///
/// Returns [`SweepError::TreeListingParse`] for any line with fewer than three
/// whitespace-separated fields.
pub fn parse_ls_tree(listing: &str) -> Result<Vec<ContentObjectId>> {
    let mut blob_ids = Vec::new();

    for line in listing.lines() {
        tracing::trace!("Parsing ls-tree output: \"{}\"", line);

        let mut fields = line.split_whitespace();
        let (Some(_mode), Some(object_type), Some(object_id)) =
            (fields.next(), fields.next(), fields.next())
        else {
            return Err(SweepError::TreeListingParse {
                line: line.to_string(),
            }
            .into());
        };

        if object_type == "blob" {
            blob_ids.push(ContentObjectId::from(object_id));
        }
    }

    Ok(blob_ids)
}
