//! Azure Container Registry client backed by the `az` CLI.

use anyhow::{Context, Result};
use std::path::PathBuf;

use super::az_command::AzCommand;
use super::{Manifest, RegistryClient, load_manifest_file, parse_manifests};
use crate::config::RegistryTarget;

/// One repository of an Azure Container Registry.
///
/// The user's existing `az login` session is used as is. When a manifest file
/// is set, listings are read from it instead of calling `az`; deletions always
/// go through `az`.
#[derive(Debug, Clone)]
pub struct AzureRegistry {
    target: RegistryTarget,
    manifest_file: Option<PathBuf>,
}

impl AzureRegistry {
    /// Client for `target` listing manifests through `az`.
    pub fn new(target: RegistryTarget) -> Self {
        Self {
            target,
            manifest_file: None,
        }
    }

    /// Read listings from `path` instead of calling `az`.
    #[must_use]
    pub fn with_manifest_file(mut self, path: Option<PathBuf>) -> Self {
        self.manifest_file = path;
        self
    }

    /// The repository this client operates on.
    #[must_use]
    pub fn target(&self) -> &RegistryTarget {
        &self.target
    }
}

impl RegistryClient for AzureRegistry {
    async fn list_manifests(&self) -> Result<Vec<Manifest>> {
        if let Some(ref path) = self.manifest_file {
            return load_manifest_file(path).await;
        }

        let cmd =
            AzCommand::show_manifests(&self.target.registry_name, &self.target.repository_name);
        let command_line = cmd.display();
        let stdout = cmd.execute().await.context("Failed to list registry manifests")?;
        let manifests = parse_manifests(&stdout, &command_line)?;
        tracing::debug!("Registry returned {} manifests", manifests.len());
        Ok(manifests)
    }

    async fn delete_manifest(&self, manifest: &Manifest) -> Result<()> {
        tracing::info!("Deleting {} (tags: {:?})", manifest.digest, manifest.tags);
        AzCommand::delete_image(
            &self.target.registry_name,
            &self.target.repository_name,
            &manifest.digest,
        )
        .execute()
        .await
        .with_context(|| format!("Failed to delete manifest {}", manifest.digest))?;
        Ok(())
    }
}
