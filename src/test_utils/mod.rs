//! Test utilities for prefetch
//!
//! In-memory doubles for the configuration store and the download cache, an
//! on-disk repository fixture served over `file://`, and logging setup.
//!
//! # Example
//!
//! ```rust,no_run
//! use prefetch_cli::test_utils::{MemoryConfigurationStore, MemoryDownloadCache};
//!
//! let store = MemoryConfigurationStore::new()
//!     .with_document("components", "jres: [\"Buildpack::Jre::OpenJdkJRE\"]");
//! let cache = MemoryDownloadCache::new()
//!     .with_content("https://repo.example/index.yml", "1.2.0: https://artifacts/a.tgz");
//! ```

mod doubles;
pub mod fixtures;

pub use doubles::{MemoryConfigurationStore, MemoryDownloadCache};
pub use fixtures::RepositoryFixture;

use std::sync::Once;
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Global flag to ensure logging is only initialized once in tests
static INIT_LOGGING: Once = Once::new();

/// Initialize logging for tests.
///
/// Only the first call has an effect. Uses `level` when given, otherwise
/// `RUST_LOG`; with neither, tests stay silent.
///
/// ```bash
/// RUST_LOG=prefetch_cli=debug cargo test
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
            .with_target(true)
            .with_thread_ids(false)
            .try_init();
    });
}
