//! prefetch - offline dependency-cache planner
//!
//! Resolves, at package time, every remote artifact an "offline" build needs so
//! the artifacts can be pre-fetched into a local cache and the later build can
//! run without network access.
//!
//! # Architecture Overview
//!
//! The work happens in two explicit phases:
//!
//! 1. **Planning** ([`resolver::plan_artifact_fetches`]) walks the component
//!    configuration tree, expands each repository root template across the
//!    deployment axes (default repository root, platform, architecture), fetches
//!    every `index.yml` manifest eagerly and resolves the requested version
//!    against it. The result is an [`resolver::ArtifactPlan`].
//! 2. **Registration and execution** ([`tasks`]) registers one cache-fill task
//!    per URI under a single aggregate task. Artifact bytes are only downloaded
//!    when that aggregate task is invoked.
//!
//! # Core Modules
//!
//! - [`cache`] - Download cache trait and the on-disk HTTP/file implementation
//! - [`cli`] - Command-line interface for the `prefetch` binary
//! - [`config`] - Configuration store, component lists and `prefetch.toml` settings
//! - [`core`] - Error types and user-friendly error reporting
//! - [`package`] - Offline-gated entry point tying planning and registration together
//! - [`repository`] - Dependency declarations, template expansion and version indexes
//! - [`resolver`] - The resolution pipeline producing an artifact plan
//! - [`tasks`] - Task graph, idempotent cache-task registration and the task runner
//! - [`version`] - Tokenized wildcard version matching
//!
//! # Configuration Layout
//!
//! ```text
//! config/
//! ├── components.yml    # qualified component names grouped by kind
//! ├── repository.yml    # default_repository_root
//! ├── open_jdk_jre.yml  # one document per component
//! └── ...
//! ```
//!
//! A component document declares dependencies anywhere in its tree:
//!
//! ```yaml
//! jre:
//!   version: 1.8.0_+
//!   repository_root: "{default.repository.root}/openjdk/{platform}/{architecture}"
//! memory_calculator:
//!   version: 3.+
//!   repository_root: "{default.repository.root}/memory-calculator/{platform}/{architecture}"
//! ```

pub mod cache;
pub mod cli;
pub mod config;
pub mod constants;
pub mod core;
pub mod package;
pub mod repository;
pub mod resolver;
pub mod tasks;
pub mod version;

// test_utils module is available for both unit tests and integration tests
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
