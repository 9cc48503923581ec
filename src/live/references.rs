//! Extraction of CI build container references from tracked-file content.
//!
//! The tracked build configuration names its container with an environment
//! variable assignment, for example:
//!
//! ```yaml
//! env:
//!   - CI_BUILD_CONTAINER=bondciimages.azurecr.io/ubuntu-1604:build-12345
//! ```
//!
//! The scan is line oriented: each line containing `CI_BUILD_CONTAINER=`
//! contributes everything after the token, minus trailing whitespace. Nothing
//! is validated here; a malformed value is passed on to tag mapping.

use anyhow::{Context, Result};
use futures::{StreamExt, TryStreamExt, stream};
use regex::bytes::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

use crate::constants::BUILD_CONTAINER_TOKEN;
use crate::git::HistoryBackend;
use crate::models::{ContentObjectId, ImageReference};

/// `(?m)` makes `^`/`$` match at line boundaries. With `-u`, `.` matches any
/// byte but `\n`, so lines that are not valid UTF-8 still match; the capture
/// runs to the end of the line, including any trailing `\r`.
static BUILD_CONTAINER_LINE: LazyLock<Regex> = LazyLock::new(|| {
    let pattern = format!(r"(?m-u)^.*{}(.+)$", regex::escape(BUILD_CONTAINER_TOKEN));
    Regex::new(&pattern).expect("build container pattern is a valid regex")
});

/// Scan raw file content for build container references.
///
/// Pure function of `content`; duplicate references collapse.
///
/// ```rust
/// use imgsweep_cli::live::references::scan_references;
///
/// let refs = scan_references(b"env:\n  - CI_BUILD_CONTAINER=r.azurecr.io/x:1  \n");
/// assert_eq!(refs.len(), 1);
/// assert!(refs.iter().any(|r| r.as_str() == "r.azurecr.io/x:1"));
/// ```
#[must_use]
pub fn scan_references(content: &[u8]) -> HashSet<ImageReference> {
    BUILD_CONTAINER_LINE
        .captures_iter(content)
        .filter_map(|caps| caps.get(1))
        .map(|m| String::from_utf8_lossy(m.as_bytes()).trim_end().to_string())
        .filter(|value| !value.is_empty())
        .map(ImageReference::from)
        .collect()
}

/// Read every object in `objects` and union the references found in them.
///
/// Each object is fetched exactly once; callers deduplicate ids beforehand
/// (a `HashSet` from [`locate_revisions`](super::revisions::locate_revisions)).
/// Up to `max_parallel` fetches run at once.
///
/// # Errors
///
/// A failed fetch of any object aborts the whole operation.
pub async fn extract_references<'a, B, I>(
    backend: &B,
    objects: I,
    max_parallel: usize,
) -> Result<HashSet<ImageReference>>
where
    B: HistoryBackend,
    I: IntoIterator<Item = &'a ContentObjectId>,
{
    let references = stream::iter(objects)
        .map(move |object| async move {
            let content = backend
                .show_object(object)
                .await
                .with_context(|| format!("Reading content object {object}"))?;
            let found = scan_references(&content);
            tracing::debug!("Object {} references {:?}", object, found);
            Ok::<_, anyhow::Error>(found)
        })
        .buffer_unordered(max_parallel.max(1))
        .try_fold(HashSet::new(), |mut acc, found| async move {
            acc.extend(found);
            Ok(acc)
        })
        .await?;

    tracing::debug!("Container references: {:?}", references);
    Ok(references)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::SweepError;
    use crate::test_utils::MemoryBackend;

    fn refs(values: &[&str]) -> HashSet<ImageReference> {
        values.iter().map(|v| ImageReference::from(*v)).collect()
    }

    #[test]
    fn test_scan_travis_style_env() {
        let content = b"language: cpp\nenv:\n  global:\n    - CI_BUILD_CONTAINER=bondciimages.azurecr.io/ubuntu-1604:build-12345\nscript: make\n";
        assert_eq!(
            scan_references(content),
            refs(&["bondciimages.azurecr.io/ubuntu-1604:build-12345"])
        );
    }

    #[test]
    fn test_scan_multiple_lines() {
        let content = b"- CI_BUILD_CONTAINER=a:1\n- FLAVOR=x CI_BUILD_CONTAINER=b:2\n- CI_BUILD_CONTAINER=a:1\n";
        assert_eq!(scan_references(content), refs(&["a:1", "b:2"]));
    }

    #[test]
    fn test_scan_trims_trailing_whitespace_and_cr() {
        let content = b"  - CI_BUILD_CONTAINER=r/x:1 \t\r\n";
        assert_eq!(scan_references(content), refs(&["r/x:1"]));
    }

    #[test]
    fn test_scan_lines_with_invalid_utf8() {
        let content = b"    - CI_BUILD_CONTAINER=bondciimages.azurecr.io/ubuntu-1604:abc # caf\xe9\n    - \xe9 CI_BUILD_CONTAINER=bondciimages.azurecr.io/ubuntu-1604:def\n";
        assert_eq!(
            scan_references(content),
            refs(&[
                "bondciimages.azurecr.io/ubuntu-1604:abc # caf\u{fffd}",
                "bondciimages.azurecr.io/ubuntu-1604:def",
            ])
        );
    }

    #[test]
    fn test_scan_line_without_prefix() {
        assert_eq!(scan_references(b"CI_BUILD_CONTAINER=r/x:1"), refs(&["r/x:1"]));
    }

    #[test]
    fn test_scan_passes_malformed_values_through() {
        assert_eq!(scan_references(b"- CI_BUILD_CONTAINER=not an image\n"), refs(&["not an image"]));
    }

    #[test]
    fn test_scan_requires_a_value() {
        assert!(scan_references(b"- CI_BUILD_CONTAINER=\n- CI_BUILD_CONTAINER=   \n").is_empty());
    }

    #[test]
    fn test_scan_ignores_other_variables() {
        assert!(scan_references(b"- OTHER_CONTAINER=r/x:1\n").is_empty());
    }

    #[tokio::test]
    async fn test_extract_reads_each_object_once() {
        let backend = MemoryBackend::new()
            .with_blob("c1", "b1", "- CI_BUILD_CONTAINER=r/x:1\n")
            .with_blob("c2", "b2", "- CI_BUILD_CONTAINER=r/x:2\n");
        let objects: HashSet<ContentObjectId> =
            ["b1", "b2"].into_iter().map(ContentObjectId::from).collect();

        let found = extract_references(&backend, &objects, 2).await.unwrap();
        assert_eq!(found, refs(&["r/x:1", "r/x:2"]));
        assert_eq!(backend.show_calls().len(), 2);
    }

    #[tokio::test]
    async fn test_extract_fetch_failure_is_fatal() {
        let backend = MemoryBackend::new().with_blob("c1", "b1", "x");
        let objects = [ContentObjectId::from("b1"), ContentObjectId::from("missing")];

        let err = extract_references(&backend, &objects, 1).await.unwrap_err();
        let typed = err.chain().find_map(|e| e.downcast_ref::<SweepError>());
        assert!(matches!(typed, Some(SweepError::GitCommandError { .. })));
    }
}
