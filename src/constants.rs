//! Global constants used throughout the imgsweep codebase.
//!
//! Timeouts, parallelism defaults, and the fixed conventions of the target
//! registry and build configuration.

use std::time::Duration;

/// Default timeout for a single git or Azure CLI invocation (5 minutes).
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(300);

/// Domain suffix of every Azure Container Registry login server.
///
/// Registry names from configuration are expanded to
/// `<registry_name>.azurecr.io`.
pub const REGISTRY_DOMAIN_SUFFIX: &str = ".azurecr.io";

/// Environment-variable assignment that names the CI build container.
pub const BUILD_CONTAINER_TOKEN: &str = "CI_BUILD_CONTAINER=";

/// Default registry name (without the domain suffix).
pub const DEFAULT_REGISTRY_NAME: &str = "bondciimages";

/// Default repository inside the registry.
pub const DEFAULT_REPOSITORY_NAME: &str = "ubuntu-1604";

/// Default tracked build-configuration path, as a root-relative pathspec.
pub const DEFAULT_TRACKED_PATH: &str = ":/.travis.yml";

/// Minimum number of parallel backend invocations regardless of CPU count.
pub const MIN_PARALLELISM: usize = 10;

/// Multiplier applied to CPU core count for default parallelism.
///
/// Git plumbing calls here are short and mostly wait on process startup, so
/// running a couple per core keeps the machine busy.
pub const PARALLELISM_CORE_MULTIPLIER: usize = 2;

/// Default number of concurrent backend invocations per stage.
#[must_use]
pub fn default_max_parallel() -> usize {
    let cores = std::thread::available_parallelism().map(std::num::NonZeroUsize::get).unwrap_or(1);
    std::cmp::max(MIN_PARALLELISM, cores * PARALLELISM_CORE_MULTIPLIER)
}
