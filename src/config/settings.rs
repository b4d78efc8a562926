//! Packaging settings (`prefetch.toml`).
//!
//! ```toml
//! offline = true
//! package_task = "package"
//! config_dir = "config"
//! cache_dir = "build/staging/resources/cache"
//! platforms = ["bionic", "trusty"]
//! architectures = ["x86_64"]
//! max_parallel = 8
//! ```
//!
//! Every key is optional. A missing settings file means all defaults, which
//! leaves offline packaging switched off.

use crate::constants::{DEFAULT_MAX_PARALLEL, DEFAULT_PACKAGE_TASK, OFFLINE_ENV};
use crate::core::PrefetchError;
use crate::repository::AxisCandidates;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;

fn default_package_task() -> String {
    DEFAULT_PACKAGE_TASK.to_string()
}

fn default_config_dir() -> PathBuf {
    PathBuf::from("config")
}

fn default_cache_dir() -> PathBuf {
    PathBuf::from("build/staging/resources/cache")
}

fn default_platforms() -> Vec<String> {
    vec!["bionic".to_string(), "trusty".to_string()]
}

fn default_architectures() -> Vec<String> {
    vec!["x86_64".to_string()]
}

const fn default_max_parallel() -> usize {
    DEFAULT_MAX_PARALLEL
}

/// Settings of one packaging run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrefetchSettings {
    /// Whether this is an offline package build. Nothing is planned or
    /// fetched unless this is set.
    #[serde(default)]
    pub offline: bool,

    /// Name of the aggregate task the cache-fill tasks are attached to.
    #[serde(default = "default_package_task")]
    pub package_task: String,

    /// Directory holding the `<identifier>.yml` configuration documents.
    #[serde(default = "default_config_dir")]
    pub config_dir: PathBuf,

    /// Directory of the download cache.
    #[serde(default = "default_cache_dir")]
    pub cache_dir: PathBuf,

    /// Platform candidates substituted for `{platform}`.
    #[serde(default = "default_platforms")]
    pub platforms: Vec<String>,

    /// Architecture candidates substituted for `{architecture}`.
    #[serde(default = "default_architectures")]
    pub architectures: Vec<String>,

    /// Maximum number of cache-fill tasks running at once.
    #[serde(default = "default_max_parallel")]
    pub max_parallel: usize,
}

impl Default for PrefetchSettings {
    fn default() -> Self {
        Self {
            offline: false,
            package_task: default_package_task(),
            config_dir: default_config_dir(),
            cache_dir: default_cache_dir(),
            platforms: default_platforms(),
            architectures: default_architectures(),
            max_parallel: default_max_parallel(),
        }
    }
}

impl PrefetchSettings {
    /// Load settings from `path`, or defaults when the file does not exist.
    ///
    /// Relative directories are resolved against the directory holding the
    /// settings file, and `~` is expanded.
    pub async fn load_or_default(path: &Path) -> Result<Self> {
        if fs::try_exists(path).await.unwrap_or(false) {
            Self::load_from(path).await
        } else {
            tracing::debug!("No settings file at {}, using defaults", path.display());
            let base = path.parent().unwrap_or_else(|| Path::new(""));
            Ok(Self::default().resolve_paths(base))
        }
    }

    /// Load and validate settings from an existing file.
    pub async fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read settings from {}", path.display()))?;

        let settings: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse settings from {}", path.display()))?;

        settings.validate(path)?;

        let base = path.parent().unwrap_or_else(|| Path::new(""));
        Ok(settings.resolve_paths(base))
    }

    /// Apply environment overrides: `PREFETCH_OFFLINE` set to `1`, `true` or
    /// `yes` switches offline packaging on.
    #[must_use]
    pub fn with_env_overrides(mut self, vars: impl IntoIterator<Item = (String, String)>) -> Self {
        for (key, value) in vars {
            if key == OFFLINE_ENV
                && matches!(value.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes")
            {
                self.offline = true;
            }
        }
        self
    }

    /// Deployment axis candidates for this run.
    pub fn axis_candidates(&self, default_repository_root: impl Into<String>) -> AxisCandidates {
        AxisCandidates::new(
            self.architectures.clone(),
            self.platforms.clone(),
            default_repository_root,
        )
    }

    fn validate(&self, path: &Path) -> Result<()> {
        let invalid = |reason: &str| PrefetchError::InvalidSettings {
            path: path.display().to_string(),
            reason: reason.to_string(),
        };

        if self.max_parallel == 0 {
            return Err(invalid("max_parallel must be greater than zero").into());
        }
        if self.package_task.trim().is_empty() {
            return Err(invalid("package_task must not be empty").into());
        }
        if self.platforms.is_empty() {
            return Err(invalid("platforms must list at least one platform").into());
        }
        if self.architectures.is_empty() {
            return Err(invalid("architectures must list at least one architecture").into());
        }

        Ok(())
    }

    fn resolve_paths(mut self, base: &Path) -> Self {
        self.config_dir = resolve_dir(base, &self.config_dir);
        self.cache_dir = resolve_dir(base, &self.cache_dir);
        self
    }
}

fn resolve_dir(base: &Path, dir: &Path) -> PathBuf {
    let expanded = PathBuf::from(shellexpand::tilde(&dir.to_string_lossy()).into_owned());
    if expanded.is_absolute() { expanded } else { base.join(expanded) }
}
