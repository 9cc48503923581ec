//! imgsweep - container image garbage collection driven by git history
//!
//! Removes images from an Azure Container Registry repository once nothing in
//! the retained part of a project's history refers to them any more. CI
//! builds run inside a container named by a `CI_BUILD_CONTAINER=` line in the
//! tracked build configuration (`.travis.yml` by default); every image named
//! there at any live commit must survive.
//!
//! # Architecture Overview
//!
//! The heart of the crate is the live-reference resolution engine in
//! [`live`]:
//!
//! ```text
//! root specs ──rev-list──▶ commits ──ls-tree──▶ blobs ──show──▶ references ──prefix──▶ live tags
//! ```
//!
//! - Several root specs combine by union, never intersection
//! - Commits sharing a revision of the tracked file cause one read, not many
//! - Any git failure aborts the run; a partial live set is never used
//! - An empty live set aborts the run before the registry is touched
//!
//! The live tags then feed the retention policy in [`garbage`], which deletes
//! manifests that have no live tag and are older than the minimum age.
//!
//! # Core Modules
//!
//! - [`live`] - Live-reference resolution engine
//! - [`git`] - Read-only history access through the system `git` binary
//! - [`models`] - Value types (commit ids, content object ids, references, tags)
//!
//! ## Outer Surfaces
//! - [`registry`] - Manifest listing and deletion through the Azure CLI
//! - [`garbage`] - Retention policy and the deletion driver
//! - [`config`] - TOML configuration with command-line overrides
//! - [`cli`] - Argument parsing, logging setup and orchestration
//!
//! ## Supporting Modules
//! - [`core`] - Error types and user-facing error rendering
//! - [`constants`] - Timeouts, defaults and fixed conventions
//! - [`utils`] - Platform helpers and process execution
//!
//! # Command-Line Usage
//!
//! ```bash
//! # Keep everything referenced from origin's branches in the last two weeks
//! # and from the latest tag, plus anything younger than 30 days
//! imgsweep -p ~/src/bond -m 30 '--remotes=origin;--since=2~weeks~ago' '--tags;-n;1'
//!
//! # Show what would be deleted, using a saved manifest listing
//! imgsweep -p . -m 7 --manifests manifests.json --dry-run '--all'
//! ```

// Core functionality modules
pub mod core;
pub mod git;
pub mod live;
pub mod models;

// Outer surfaces
pub mod cli;
pub mod config;
pub mod garbage;
pub mod registry;

// Supporting modules
pub mod constants;
pub mod utils;

// test_utils module is available for both unit tests and integration tests
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
