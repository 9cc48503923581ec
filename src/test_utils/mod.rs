//! Test utilities for imgsweep
//!
//! Helpers shared by unit tests and the integration suite:
//! - [`TestGit`] builds real repositories with specific history
//! - [`MemoryBackend`] is a scripted history backend that records calls
//! - [`MemoryRegistry`] serves a fixed manifest listing and records deletions
//! - [`init_test_logging`] wires `tracing` output into the test harness
//!
//! Available under `cfg(test)` and the `test-utils` feature.

pub mod backend;
pub mod git_helper;
pub mod registry;

pub use backend::MemoryBackend;
pub use git_helper::TestGit;
pub use registry::MemoryRegistry;

use std::sync::Once;
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Global flag to ensure logging is only initialized once in tests
static INIT_LOGGING: Once = Once::new();

/// Initialize logging for tests.
///
/// Uses `level` when given, otherwise `RUST_LOG` when set, otherwise leaves
/// logging off. Safe to call from every test.
///
/// ```bash
/// RUST_LOG=debug cargo test
/// ```
pub fn init_test_logging(level: Option<Level>) {
    INIT_LOGGING.call_once(|| {
        let filter = if let Some(level) = level {
            EnvFilter::new(level.to_string())
        } else if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            return;
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true) // Show module targets like "git"
            .with_thread_ids(false)
            .try_init();
    });
}
