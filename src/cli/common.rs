//! Shared setup for CLI commands

use anyhow::Result;
use std::future::Future;
use std::path::{Path, PathBuf};

use crate::cache::Cache;
use crate::config::{FileConfigurationStore, PrefetchSettings};

/// Common trait for CLI command execution pattern
pub trait CommandExecutor: Sized {
    /// Execute the command against the settings at `settings_path`
    fn execute(self, settings_path: &Path) -> impl Future<Output = Result<()>> + Send
    where
        Self: Send,
    {
        async move {
            let context = CommandContext::load(settings_path).await?;
            self.execute_with_context(context).await
        }
    }

    /// Execute the command with an already loaded context
    fn execute_with_context(self, context: CommandContext)
    -> impl Future<Output = Result<()>> + Send;
}

/// Everything a command needs: settings, configuration store and cache
#[derive(Debug)]
pub struct CommandContext {
    /// Settings with environment overrides applied
    pub settings: PrefetchSettings,
    /// Path the settings were loaded from (the file may not exist)
    pub settings_path: PathBuf,
    /// Configuration documents below `settings.config_dir`
    pub store: FileConfigurationStore,
    /// Download cache in `settings.cache_dir`
    pub cache: Cache,
}

impl CommandContext {
    /// Load settings from `settings_path` and build the store and cache.
    pub async fn load(settings_path: &Path) -> Result<Self> {
        let settings = PrefetchSettings::load_or_default(settings_path)
            .await?
            .with_env_overrides(std::env::vars());
        Self::from_settings(settings, settings_path)
    }

    /// Build a context around already loaded settings.
    pub fn from_settings(settings: PrefetchSettings, settings_path: &Path) -> Result<Self> {
        tracing::debug!(
            "Using configuration from {} and cache in {}",
            settings.config_dir.display(),
            settings.cache_dir.display()
        );

        let store = FileConfigurationStore::new(&settings.config_dir).with_env_overrides();
        let cache = Cache::new(&settings.cache_dir)?;

        Ok(Self {
            settings,
            settings_path: settings_path.to_path_buf(),
            store,
            cache,
        })
    }
}

/// Human-readable byte count, e.g. `1.5 MiB`.
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KiB", "MiB", "GiB"];

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{value:.1} {}", UNITS[unit])
    }
}
