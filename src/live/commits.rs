//! Commit selection: the union of the commits chosen by every root spec.

use anyhow::{Context, Result};
use std::collections::HashSet;

use crate::git::HistoryBackend;
use crate::models::{CommitId, RootSpec};

/// Resolve `roots` into the set of commits any of them selects.
///
/// The backend is asked once per root spec, in order; results are unioned, so
/// the outcome does not depend on the order of `roots`. The caller guarantees
/// `roots` is non-empty.
///
/// # Errors
///
/// The first failing `rev-list` invocation aborts resolution and is returned
/// unchanged apart from added context. There are no retries.
pub async fn resolve_commits<B: HistoryBackend>(
    backend: &B,
    roots: &[RootSpec],
) -> Result<HashSet<CommitId>> {
    let mut commit_ids = HashSet::new();

    for root in roots {
        tracing::debug!("Listing commits for root '{}'", root);
        let output = backend
            .rev_list(root)
            .await
            .with_context(|| format!("Resolving commits for root '{root}'"))?;

        let before = commit_ids.len();
        commit_ids.extend(parse_rev_list(&output));
        tracing::debug!(
            "Root '{}' added {} commits ({} total)",
            root,
            commit_ids.len() - before,
            commit_ids.len()
        );
    }

    Ok(commit_ids)
}

/// One commit id per non-empty line.
fn parse_rev_list(output: &str) -> impl Iterator<Item = CommitId> + '_ {
    output.lines().map(str::trim).filter(|line| !line.is_empty()).map(CommitId::from)
}
