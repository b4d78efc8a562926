//! Configuration management for prefetch
//!
//! Two kinds of configuration feed the planner:
//!
//! 1. **Configuration documents** - YAML documents addressed by identifier
//!    (`components`, `repository`, one per component). They are read through the
//!    [`ConfigurationStore`] trait; [`FileConfigurationStore`] serves them from a
//!    directory of `<identifier>.yml` files.
//! 2. **Settings** ([`PrefetchSettings`], `prefetch.toml`) - the offline flag,
//!    deployment axis candidates, cache location and task options.
//!
//! # Document Overrides
//!
//! Any document can be overridden from the environment. The value of
//! `PREFETCH_CONFIG_<IDENTIFIER>` is parsed as YAML and deep-merged over the file:
//!
//! ```bash
//! PREFETCH_CONFIG_OPEN_JDK_JRE='{jre: {version: 11.+}}' prefetch plan
//! ```
//!
//! Mapping keys merge recursively; any other value replaces the original.

mod components;
mod settings;

pub use components::{component_ids, snake_case};
pub use settings::PrefetchSettings;

use crate::constants::{
    CONFIG_OVERRIDE_ENV_PREFIX, CONFIGURATION_EXTENSION, DEFAULT_REPOSITORY_ROOT_KEY,
    REPOSITORY_CONFIGURATION,
};
use crate::core::PrefetchError;
use anyhow::Result;
use serde_yaml::{Mapping, Value};
use std::collections::HashMap;
use std::future::Future;
use std::path::{Path, PathBuf};

/// A node of a configuration document: scalar, sequence or mapping.
///
/// Mappings keep the insertion order of the source document, which makes
/// traversal order deterministic.
pub type ConfigNode = Value;

/// Source of configuration documents.
pub trait ConfigurationStore {
    /// Load the document named `identifier`.
    ///
    /// Fails with [`PrefetchError::ConfigurationMissing`] when there is no
    /// backing document.
    fn load(&self, identifier: &str) -> impl Future<Output = Result<ConfigNode>> + Send;
}

/// Configuration store reading `<config_dir>/<identifier>.yml`.
#[derive(Debug, Clone)]
pub struct FileConfigurationStore {
    config_dir: PathBuf,
    overrides: HashMap<String, String>,
}

impl FileConfigurationStore {
    /// Create a store over `config_dir` with no overrides.
    pub fn new(config_dir: impl Into<PathBuf>) -> Self {
        Self {
            config_dir: config_dir.into(),
            overrides: HashMap::new(),
        }
    }

    /// Use the given raw YAML overrides, keyed by document identifier.
    #[must_use]
    pub fn with_overrides(mut self, overrides: HashMap<String, String>) -> Self {
        self.overrides = overrides;
        self
    }

    /// Use the `PREFETCH_CONFIG_*` overrides of the current process environment.
    #[must_use]
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(overrides_from_env(std::env::vars()))
    }

    /// Directory the documents are read from.
    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    /// Path of the document for `identifier`.
    pub fn document_path(&self, identifier: &str) -> PathBuf {
        self.config_dir.join(format!("{identifier}.{CONFIGURATION_EXTENSION}"))
    }
}

impl ConfigurationStore for FileConfigurationStore {
    async fn load(&self, identifier: &str) -> Result<ConfigNode> {
        let path = self.document_path(identifier);

        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(PrefetchError::ConfigurationMissing {
                    identifier: identifier.to_string(),
                    path: path.display().to_string(),
                }
                .into());
            }
            Err(e) => return Err(PrefetchError::IoError(e).into()),
        };

        let mut document = parse_document(identifier, &content)?;

        if let Some(raw) = self.overrides.get(identifier) {
            tracing::debug!("Applying environment override to configuration '{}'", identifier);
            let overlay = parse_document(identifier, raw)?;
            document = merge_nodes(document, overlay);
        }

        tracing::debug!("Loaded configuration '{}' from {}", identifier, path.display());
        Ok(document)
    }
}

/// Parse YAML text into a document; an empty document is an empty mapping.
pub fn parse_document(identifier: &str, content: &str) -> Result<ConfigNode> {
    let node: Value =
        serde_yaml::from_str(content).map_err(|e| PrefetchError::ConfigurationParseError {
            identifier: identifier.to_string(),
            reason: e.to_string(),
        })?;

    Ok(match node {
        Value::Null => Value::Mapping(Mapping::new()),
        other => other,
    })
}

/// Collect `PREFETCH_CONFIG_<ID>` overrides, keyed by lower-cased identifier.
pub fn overrides_from_env(
    vars: impl IntoIterator<Item = (String, String)>,
) -> HashMap<String, String> {
    vars.into_iter()
        .filter_map(|(key, value)| {
            key.strip_prefix(CONFIG_OVERRIDE_ENV_PREFIX)
                .filter(|id| !id.is_empty())
                .map(|id| (id.to_lowercase(), value))
        })
        .collect()
}

/// Deep-merge `overlay` over `base`.
///
/// When both sides are mappings their keys merge recursively; otherwise the
/// overlay wins.
pub fn merge_nodes(base: ConfigNode, overlay: ConfigNode) -> ConfigNode {
    match (base, overlay) {
        (Value::Mapping(mut base), Value::Mapping(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(&key) {
                    Some(existing) => {
                        let current = std::mem::replace(existing, Value::Null);
                        *existing = merge_nodes(current, value);
                    }
                    None => {
                        base.insert(key, value);
                    }
                }
            }
            Value::Mapping(base)
        }
        (_, overlay) => overlay,
    }
}

/// Text of a scalar node; numbers and booleans use their YAML spelling.
pub fn scalar_string(node: &ConfigNode) -> Option<String> {
    match node {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Non-empty text value stored under `key` in a mapping node.
pub fn string_field(node: &ConfigNode, key: &str) -> Option<String> {
    node.as_mapping()
        .and_then(|mapping| mapping.get(key))
        .and_then(scalar_string)
        .filter(|value| !value.is_empty())
}

/// Load the global default repository root, with one trailing `/` removed.
pub async fn load_default_repository_root<S: ConfigurationStore>(store: &S) -> Result<String> {
    let repository = store.load(REPOSITORY_CONFIGURATION).await?;

    let root = string_field(&repository, DEFAULT_REPOSITORY_ROOT_KEY).ok_or_else(|| {
        PrefetchError::ConfigurationValueMissing {
            identifier: REPOSITORY_CONFIGURATION.to_string(),
            key: DEFAULT_REPOSITORY_ROOT_KEY.to_string(),
        }
    })?;

    Ok(root.strip_suffix('/').unwrap_or(&root).to_string())
}
