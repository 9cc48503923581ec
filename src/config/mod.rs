//! Configuration for imgsweep.
//!
//! Settings come from three layers, later layers winning:
//!
//! 1. Built-in defaults (see [`crate::constants`])
//! 2. A TOML config file: `--config`, else `$IMGSWEEP_CONFIG`, else
//!    `~/.imgsweep/config.toml`
//! 3. Command-line flags
//!
//! ```toml
//! registry_name = "bondciimages"
//! repository_name = "ubuntu-1604"
//! tracked_path = ":/.travis.yml"
//! max_parallel = 16
//! ```
//!
//! The resolved [`SweepConfig`] is passed explicitly to every stage; there is
//! no process-wide configuration state.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::constants::{
    DEFAULT_REGISTRY_NAME, DEFAULT_REPOSITORY_NAME, DEFAULT_TRACKED_PATH, REGISTRY_DOMAIN_SUFFIX,
    default_max_parallel,
};
use crate::core::SweepError;
use crate::utils::get_home_dir;

/// Environment variable naming an alternative config file.
pub const CONFIG_PATH_ENV: &str = "IMGSWEEP_CONFIG";

/// The registry repository whose images are being swept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryTarget {
    /// Registry name without the domain suffix, e.g. `bondciimages`.
    pub registry_name: String,
    /// Repository inside the registry, e.g. `ubuntu-1604`.
    pub repository_name: String,
}

impl RegistryTarget {
    /// Creates a target from registry and repository names.
    pub fn new(registry_name: impl Into<String>, repository_name: impl Into<String>) -> Self {
        Self {
            registry_name: registry_name.into(),
            repository_name: repository_name.into(),
        }
    }

    /// Prefix every live image reference must start with:
    /// `<registry_name>.azurecr.io/<repository_name>`.
    #[must_use]
    pub fn expected_prefix(&self) -> String {
        format!("{}{}/{}", self.registry_name, REGISTRY_DOMAIN_SUFFIX, self.repository_name)
    }
}

/// Resolved settings for one sweep.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SweepConfig {
    /// Azure Container Registry name.
    pub registry_name: String,
    /// Repository inside the registry.
    pub repository_name: String,
    /// Pathspec of the tracked build configuration file.
    pub tracked_path: String,
    /// Upper bound on concurrent git invocations per stage.
    pub max_parallel: usize,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            registry_name: DEFAULT_REGISTRY_NAME.to_string(),
            repository_name: DEFAULT_REPOSITORY_NAME.to_string(),
            tracked_path: DEFAULT_TRACKED_PATH.to_string(),
            max_parallel: default_max_parallel(),
        }
    }
}

impl SweepConfig {
    /// The registry repository this config points at.
    #[must_use]
    pub fn target(&self) -> RegistryTarget {
        RegistryTarget::new(&self.registry_name, &self.repository_name)
    }

    /// Load configuration, falling back to defaults when no file applies.
    ///
    /// An explicit `path` must exist. Without one, `$IMGSWEEP_CONFIG` and then
    /// the default location are tried, and a missing file there just means
    /// defaults.
    ///
    /// # Errors
    ///
    /// - [`SweepError::ConfigError`] when an explicit path does not exist
    /// - read or parse failures of the chosen file
    pub async fn load_with_optional(path: Option<PathBuf>) -> Result<Self> {
        if let Some(path) = path {
            if !path.exists() {
                return Err(SweepError::ConfigError {
                    message: format!("Config file not found: {}", path.display()),
                }
                .into());
            }
            return Self::load_from(&path).await;
        }

        let path = match std::env::var_os(CONFIG_PATH_ENV) {
            Some(value) => PathBuf::from(value),
            None => match Self::default_path() {
                Ok(path) => path,
                Err(e) => {
                    tracing::debug!("No default config location: {e}");
                    return Ok(Self::default());
                }
            },
        };

        if path.exists() {
            Self::load_from(&path).await
        } else {
            tracing::debug!("No config file at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific TOML file.
    ///
    /// Keys missing from the file keep their defaults; unknown keys are
    /// rejected.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not a valid config.
    pub async fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config from {}", path.display()))?;

        let config: Self = toml::from_str(&content).map_err(|e| SweepError::ConfigError {
            message: format!("Invalid config {}: {}", path.display(), e.message()),
        })?;

        tracing::debug!("Loaded config from {}: {:?}", path.display(), config);
        Ok(config)
    }

    /// `~/.imgsweep/config.toml`.
    ///
    /// # Errors
    ///
    /// Returns an error if the home directory cannot be determined.
    pub fn default_path() -> Result<PathBuf> {
        Ok(get_home_dir()?.join(".imgsweep").join("config.toml"))
    }
}
