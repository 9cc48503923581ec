//! Container registry access: manifest listing and deletion.
//!
//! [`RegistryClient`] is the seam between the sweep and a concrete registry.
//! [`AzureRegistry`](azure::AzureRegistry) drives the Azure CLI; listings may
//! also come from a JSON file captured earlier with
//! `az acr repository show-manifests ... --output json`.

pub mod az_command;
pub mod azure;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::path::Path;

use crate::core::SweepError;

pub use azure::AzureRegistry;

/// One image manifest in the registry repository.
///
/// Field names follow the Azure CLI output. Older CLI versions report
/// `timestamp`; newer ones report both `lastUpdateTime` and `createdTime`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawManifest")]
pub struct Manifest {
    /// Content digest, e.g. `sha256:4b0c...`.
    pub digest: String,
    /// Tags pointing at this manifest; empty for untagged manifests.
    pub tags: Vec<String>,
    /// When the manifest was last updated.
    pub timestamp: DateTime<Utc>,
}

/// A listing entry as the CLI writes it, before a timestamp is chosen.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawManifest {
    digest: String,
    #[serde(default)]
    tags: Vec<String>,
    timestamp: Option<DateTime<Utc>>,
    last_update_time: Option<DateTime<Utc>>,
    created_time: Option<DateTime<Utc>>,
}

impl TryFrom<RawManifest> for Manifest {
    type Error = String;

    fn try_from(raw: RawManifest) -> Result<Self, Self::Error> {
        let timestamp = raw
            .timestamp
            .or(raw.last_update_time)
            .or(raw.created_time)
            .ok_or_else(|| format!("manifest {} has no timestamp", raw.digest))?;
        Ok(Self {
            digest: raw.digest,
            tags: raw.tags,
            timestamp,
        })
    }
}

/// Lists and deletes manifests of one registry repository.
pub trait RegistryClient: Sync {
    /// All manifests currently in the repository.
    fn list_manifests(&self) -> impl Future<Output = Result<Vec<Manifest>>> + Send;

    /// Delete the image identified by `manifest.digest`.
    fn delete_manifest(&self, manifest: &Manifest) -> impl Future<Output = Result<()>> + Send;
}

/// Decode a manifest listing.
///
/// `source_name` identifies where the JSON came from in error messages.
///
/// # Errors
///
/// [`SweepError::ManifestParseError`] when `json` is not a list of manifests.
pub fn parse_manifests(json: &[u8], source_name: &str) -> Result<Vec<Manifest>> {
    serde_json::from_slice(json).map_err(|e| {
        SweepError::ManifestParseError {
            source_name: source_name.to_string(),
            reason: e.to_string(),
        }
        .into()
    })
}

/// Read a manifest listing from a JSON file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or does not decode.
pub async fn load_manifest_file(path: &Path) -> Result<Vec<Manifest>> {
    let content = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read manifests from {}", path.display()))?;
    let manifests = parse_manifests(&content, &path.display().to_string())?;
    tracing::debug!("Loaded {} manifests from {}", manifests.len(), path.display());
    Ok(manifests)
}
