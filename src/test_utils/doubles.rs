//! In-memory configuration store and download cache.

use crate::cache::DownloadCache;
use crate::config::{ConfigNode, ConfigurationStore, parse_document};
use crate::core::PrefetchError;
use anyhow::Result;
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, PoisonError};

/// Configuration store over YAML documents held in memory.
///
/// Records every identifier it is asked for, found or not.
#[derive(Debug, Default)]
pub struct MemoryConfigurationStore {
    documents: HashMap<String, String>,
    loaded: Mutex<Vec<String>>,
}

impl MemoryConfigurationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add the YAML document `content` under `identifier`.
    #[must_use]
    pub fn with_document(mut self, identifier: &str, content: &str) -> Self {
        self.documents.insert(identifier.to_string(), content.to_string());
        self
    }

    /// Identifiers requested so far, in request order.
    pub fn loaded(&self) -> Vec<String> {
        self.loaded.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

impl ConfigurationStore for MemoryConfigurationStore {
    async fn load(&self, identifier: &str) -> Result<ConfigNode> {
        self.loaded.lock().unwrap_or_else(PoisonError::into_inner).push(identifier.to_string());

        let content =
            self.documents.get(identifier).ok_or_else(|| PrefetchError::ConfigurationMissing {
                identifier: identifier.to_string(),
                path: format!("memory://{identifier}"),
            })?;

        parse_document(identifier, content)
    }
}

/// Download cache over content held in memory.
///
/// Records every requested URI, including ones that fail. Unknown URIs fail
/// with [`PrefetchError::FetchFailure`].
#[derive(Debug, Default)]
pub struct MemoryDownloadCache {
    contents: HashMap<String, Vec<u8>>,
    failing: HashSet<String>,
    requested: Mutex<Vec<String>>,
}

impl MemoryDownloadCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `content` for `uri`.
    #[must_use]
    pub fn with_content(mut self, uri: &str, content: impl AsRef<[u8]>) -> Self {
        self.contents.insert(uri.to_string(), content.as_ref().to_vec());
        self
    }

    /// Fail every request for `uri`, even if content was added for it.
    #[must_use]
    pub fn with_failure(mut self, uri: &str) -> Self {
        self.failing.insert(uri.to_string());
        self
    }

    /// URIs requested so far, in request order.
    pub fn requested(&self) -> Vec<String> {
        self.requested.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

impl DownloadCache for MemoryDownloadCache {
    async fn get(&self, uri: &str) -> Result<Vec<u8>> {
        self.requested.lock().unwrap_or_else(PoisonError::into_inner).push(uri.to_string());

        let failure = |reason: &str| PrefetchError::FetchFailure {
            uri: uri.to_string(),
            reason: reason.to_string(),
        };

        if self.failing.contains(uri) {
            return Err(failure("simulated failure").into());
        }

        self.contents.get(uri).cloned().ok_or_else(|| failure("no such content").into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_store_records_requests() {
        let store = MemoryConfigurationStore::new().with_document("repository", "a: 1");

        assert!(store.load("repository").await.is_ok());
        assert!(store.load("missing").await.is_err());
        assert_eq!(store.loaded(), vec!["repository", "missing"]);
    }

    #[tokio::test]
    async fn test_memory_cache_failure_overrides_content() {
        let cache = MemoryDownloadCache::new()
            .with_content("https://r/a", "a")
            .with_failure("https://r/a");

        assert!(cache.get("https://r/a").await.is_err());
        assert_eq!(cache.requested(), vec!["https://r/a"]);
    }
}
