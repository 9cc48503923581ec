//! Registry prefix filtering and tag mapping.

use anyhow::Result;
use std::collections::HashSet;

use crate::config::RegistryTarget;
use crate::core::SweepError;
use crate::models::{ImageReference, ImageTag};

/// Keep the references under `target`'s prefix and map each to its tag.
///
/// The prefix check is an exact `starts_with`, so
/// `evilbondciimages.azurecr.io/...` never matches `bondciimages.azurecr.io/...`.
/// References outside the prefix are logged at info level and skipped.
///
/// The tag is everything after the first `:` of the reference.
///
/// # Errors
///
/// [`SweepError::MalformedImageReference`] for a kept reference without a
/// `:` or with nothing after it.
pub fn filter_and_map_tags(
    references: &HashSet<ImageReference>,
    target: &RegistryTarget,
) -> Result<HashSet<ImageTag>> {
    let expected_prefix = target.expected_prefix();
    let mut sorted: Vec<&ImageReference> = references.iter().collect();
    sorted.sort();

    let mut tags = HashSet::new();
    for reference in sorted {
        if !reference.as_str().starts_with(&expected_prefix) {
            tracing::info!(
                "Ignoring image {} since it doesn't match {}",
                reference,
                expected_prefix
            );
            continue;
        }

        match reference.tag() {
            Some(tag) if !tag.as_str().is_empty() => {
                tags.insert(tag);
            }
            _ => {
                return Err(SweepError::MalformedImageReference {
                    reference: reference.to_string(),
                }
                .into());
            }
        }
    }

    Ok(tags)
}
