//! Retention policy: which manifests may be deleted.
//!
//! A manifest is garbage when none of its tags is live and it is older than
//! the minimum age. Untagged manifests follow the same rule; having no tags
//! they can never be live, so only their age protects them.

use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashSet;

use crate::models::ImageTag;
use crate::registry::{Manifest, RegistryClient};

/// Select the manifests eligible for deletion.
///
/// Ages are compared strictly: a manifest exactly `min_age` old is kept.
/// The result preserves the order of `manifests`.
#[must_use]
pub fn find_garbage_manifests(
    min_age: Duration,
    live_tags: &HashSet<ImageTag>,
    manifests: &[Manifest],
    now: DateTime<Utc>,
) -> Vec<Manifest> {
    manifests
        .iter()
        .filter(|manifest| {
            let live =
                manifest.tags.iter().any(|tag| live_tags.contains(&ImageTag::from(tag.as_str())));
            if live {
                tracing::debug!("Keeping {}: live tags {:?}", manifest.digest, manifest.tags);
                return false;
            }

            let age = now.signed_duration_since(manifest.timestamp);
            if age <= min_age {
                tracing::debug!("Keeping {}: only {} days old", manifest.digest, age.num_days());
                return false;
            }
            true
        })
        .cloned()
        .collect()
}

/// List the registry, pick the garbage and delete it unless `dry_run`.
///
/// Deletions run one at a time in listing order and stop at the first
/// failure. `on_collected` sees each manifest as soon as it is deleted, or
/// every garbage manifest up front on a dry run. Returns the garbage
/// manifests, deleted or not.
///
/// # Errors
///
/// Propagates listing and deletion failures.
pub async fn collect_garbage<R, F>(
    registry: &R,
    live_tags: &HashSet<ImageTag>,
    min_age: Duration,
    now: DateTime<Utc>,
    dry_run: bool,
    mut on_collected: F,
) -> Result<Vec<Manifest>>
where
    R: RegistryClient,
    F: FnMut(&Manifest),
{
    let manifests = registry.list_manifests().await?;
    let garbage = find_garbage_manifests(min_age, live_tags, &manifests, now);
    tracing::info!("{} of {} manifests are garbage", garbage.len(), manifests.len());

    if dry_run {
        for manifest in &garbage {
            on_collected(manifest);
        }
        return Ok(garbage);
    }

    for manifest in &garbage {
        registry.delete_manifest(manifest).await?;
        on_collected(manifest);
    }

    Ok(garbage)
}
