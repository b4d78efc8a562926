//! Global constants used throughout the prefetch codebase.
//!
//! File names, placeholder patterns, retry parameters and defaults that are
//! shared by more than one module live here so they stay discoverable.

use std::time::Duration;

/// File name of the version manifest below every expanded repository root.
pub const INDEX_FILE_NAME: &str = "index.yml";

/// Placeholder pattern for the globally configured default repository root.
///
/// The dots are regular-expression wildcards, matching the historical pattern.
pub const DEFAULT_REPOSITORY_ROOT_PATTERN: &str = r"\{default.repository.root\}";

/// Placeholder pattern for the target platform axis.
pub const PLATFORM_PATTERN: &str = r"\{platform\}";

/// Placeholder pattern for the target architecture axis.
pub const ARCHITECTURE_PATTERN: &str = r"\{architecture\}";

/// Configuration key holding a dependency's version specifier.
pub const VERSION_KEY: &str = "version";

/// Configuration key holding a dependency's repository root template.
pub const REPOSITORY_ROOT_KEY: &str = "repository_root";

/// Identifier of the configuration document listing all components.
pub const COMPONENTS_CONFIGURATION: &str = "components";

/// Identifier of the global repository configuration document.
pub const REPOSITORY_CONFIGURATION: &str = "repository";

/// Key of the default repository root inside the repository configuration.
pub const DEFAULT_REPOSITORY_ROOT_KEY: &str = "default_repository_root";

/// Extension of configuration documents in the file-backed store.
pub const CONFIGURATION_EXTENSION: &str = "yml";

/// Prefix of environment variables that override configuration documents.
///
/// `PREFETCH_CONFIG_OPEN_JDK_JRE` overrides the `open_jdk_jre` document.
pub const CONFIG_OVERRIDE_ENV_PREFIX: &str = "PREFETCH_CONFIG_";

/// Environment variable that forces offline packaging on.
pub const OFFLINE_ENV: &str = "PREFETCH_OFFLINE";

/// Default name of the settings file.
pub const SETTINGS_FILE_NAME: &str = "prefetch.toml";

/// Default name of the aggregate task every cache-fill task hangs off.
pub const DEFAULT_PACKAGE_TASK: &str = "package";

/// Extension of cached content files.
pub const CACHED_FILE_EXTENSION: &str = "cached";

/// Default number of cache-fill tasks run concurrently.
pub const DEFAULT_MAX_PARALLEL: usize = 8;

/// Number of attempts for a single HTTP download.
pub const DOWNLOAD_ATTEMPTS: usize = 3;

/// Base of the exponential download retry backoff, in milliseconds.
pub const DOWNLOAD_RETRY_BASE_MS: u64 = 100;

/// Maximum delay between download retries.
pub const DOWNLOAD_RETRY_MAX_DELAY: Duration = Duration::from_secs(2);

/// Timeout for a single HTTP request (60 seconds).
pub const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(60);
