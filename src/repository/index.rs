//! Version indexes (`index.yml`).
//!
//! An index maps every published version to the URI of its artifact:
//!
//! ```yaml
//! 1.8.0_282: https://repo.example/openjdk/bionic/x86_64/openjdk-1.8.0_282.tar.gz
//! 1.8.0_292: https://repo.example/openjdk/bionic/x86_64/openjdk-1.8.0_292.tar.gz
//! ```

use crate::core::PrefetchError;
use anyhow::Result;
use serde_yaml::Value;
use std::collections::BTreeMap;
use std::io::{BufRead, Read};

/// Parsed contents of one `index.yml`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct VersionIndex {
    uri: String,
    entries: BTreeMap<String, String>,
}

impl VersionIndex {
    /// Parse manifest `content` fetched from `uri`.
    ///
    /// Fails with [`PrefetchError::MalformedManifest`] unless the content is a
    /// mapping of scalar versions to string URIs.
    pub fn parse(uri: &str, content: &[u8]) -> Result<Self> {
        let malformed = |reason: String| PrefetchError::MalformedManifest {
            uri: uri.to_string(),
            reason,
        };

        let document: Value =
            serde_yaml::from_slice(content).map_err(|e| malformed(e.to_string()))?;
        if !document.is_mapping() {
            return Err(malformed("expected a mapping of versions to URIs".to_string()).into());
        }

        // Keys are read again as strings so plain scalars keep their spelling
        // (`1.10` must not become the number `1.1`).
        let mapping: BTreeMap<String, Value> =
            serde_yaml::from_slice(content).map_err(|e| malformed(e.to_string()))?;

        let mut entries = BTreeMap::new();
        for (version, value) in mapping {
            let Value::String(artifact) = value else {
                return Err(malformed(format!("URI of version '{version}' is not a string")).into());
            };
            entries.insert(version, artifact);
        }

        Ok(Self {
            uri: uri.to_string(),
            entries,
        })
    }

    /// Read and parse a manifest from `reader`.
    pub fn from_reader(uri: &str, reader: &mut dyn BufRead) -> Result<Self> {
        let mut content = Vec::new();
        reader.read_to_end(&mut content).map_err(|e| PrefetchError::MalformedManifest {
            uri: uri.to_string(),
            reason: e.to_string(),
        })?;
        Self::parse(uri, &content)
    }

    /// URI the index was fetched from.
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// Every version listed in the index.
    pub fn versions(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    /// Artifact URI of `version`.
    pub fn get(&self, version: &str) -> Option<&str> {
        self.entries.get(version).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
