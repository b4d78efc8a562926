//! Integration test suite for prefetch
//!
//! End-to-end tests over a `file://` repository built in a temporary
//! directory, so nothing here touches the network.
//!
//! ```bash
//! cargo test --test integration
//! ```
//!
//! # Test Organization
//!
//! - **common**: The shared project fixture
//! - **offline_cache**: Planning, registering and running the cache-fill tasks
//!   through the library API
//! - **cli**: The `prefetch` binary: `plan`, `package` and error reporting

mod common;

mod cli;
mod offline_cache;
