//! In-memory [`RegistryClient`] that records deletions.

use anyhow::Result;
use std::collections::HashSet;
use std::sync::Mutex;

use crate::core::SweepError;
use crate::registry::{Manifest, RegistryClient};

/// Registry double serving a fixed listing.
#[derive(Default)]
pub struct MemoryRegistry {
    manifests: Vec<Manifest>,
    failing_deletes: HashSet<String>,
    deleted: Mutex<Vec<String>>,
}

impl MemoryRegistry {
    /// A registry listing `manifests`.
    pub fn new(manifests: Vec<Manifest>) -> Self {
        Self {
            manifests,
            ..Self::default()
        }
    }

    /// Make deleting `digest` fail like a failing `az` call.
    pub fn with_failing_delete(mut self, digest: &str) -> Self {
        self.failing_deletes.insert(digest.to_string());
        self
    }

    /// Digests deleted so far, in order.
    pub fn deleted(&self) -> Vec<String> {
        self.deleted.lock().unwrap().clone()
    }
}

impl RegistryClient for MemoryRegistry {
    async fn list_manifests(&self) -> Result<Vec<Manifest>> {
        Ok(self.manifests.clone())
    }

    async fn delete_manifest(&self, manifest: &Manifest) -> Result<()> {
        if self.failing_deletes.contains(&manifest.digest) {
            return Err(SweepError::AzCommandError {
                command: format!("az acr repository delete --image repo@{}", manifest.digest),
                exit_code: Some(1),
                stdout: String::new(),
                stderr: "ERROR: image not found".to_string(),
            }
            .into());
        }
        self.deleted.lock().unwrap().push(manifest.digest.clone());
        Ok(())
    }
}
