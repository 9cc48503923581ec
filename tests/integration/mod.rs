//! Integration test suite for imgsweep
//!
//! Builds real git repositories in temporary directories and runs both the
//! library pipeline and the `imgsweep` binary against them. Registry access is
//! replaced by `--manifests` listings with `--dry-run`, so no `az` login is
//! needed.
//!
//! # Running Integration Tests
//!
//! ```bash
//! cargo test --test integration
//! ```
//!
//! # Test Organization
//!
//! - **live_tags**: live-tag resolution over real history
//! - **cli**: end-to-end runs of the binary, including failure output

// Shared test utilities (from parent tests/ directory)
#[path = "../common/mod.rs"]
mod common;

mod cli;
mod live_tags;
