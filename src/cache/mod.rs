//! Download cache for repository indexes and artifacts.
//!
//! Every URI is stored once, under a name derived from the URI itself:
//!
//! ```text
//! <cache_dir>/
//! ├── 3f1c…9a.cached   # sha256("https://repo.example/linux/x64/index.yml")
//! └── 7be0…12.cached   # sha256("https://repo.example/linux/x64/jre-1.2.1.tgz")
//! ```
//!
//! A hit returns the stored bytes without touching the network. A miss fetches
//! the content and writes it atomically (temp file in the cache directory, then
//! rename), so a crashed or concurrent fetch never leaves a partial entry.
//!
//! # Supported Schemes
//!
//! - `file://` URIs are read from the local filesystem
//! - `http://` and `https://` URIs are downloaded with a shared
//!   [`reqwest::Client`]; connection errors and `5xx` responses are retried
//!   with exponential backoff
//!
//! Anything else fails with [`PrefetchError::FetchFailure`], as does a cache
//! entry that cannot be read or stored.

use crate::constants::{
    CACHED_FILE_EXTENSION, DOWNLOAD_ATTEMPTS, DOWNLOAD_RETRY_BASE_MS, DOWNLOAD_RETRY_MAX_DELAY,
    DOWNLOAD_TIMEOUT,
};
use crate::core::PrefetchError;
use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use std::future::Future;
use std::io::{BufRead, Cursor, Write};
use std::path::{Path, PathBuf};
use tokio_retry::RetryIf;
use tokio_retry::strategy::ExponentialBackoff;

/// Source of URI content, fetching and persisting on a miss.
pub trait DownloadCache {
    /// Content of `uri`.
    ///
    /// Fails with [`PrefetchError::FetchFailure`] when the content cannot be
    /// obtained.
    fn get(&self, uri: &str) -> impl Future<Output = Result<Vec<u8>>> + Send;

    /// Content of `uri`, handed to `on_success` as a reader.
    fn get_with<T, F>(&self, uri: &str, on_success: F) -> impl Future<Output = Result<T>> + Send
    where
        Self: Sync,
        T: Send,
        F: FnOnce(&mut dyn BufRead) -> Result<T> + Send,
    {
        async move {
            let content = self.get(uri).await?;
            let mut reader = Cursor::new(content);
            on_success(&mut reader)
        }
    }
}

/// On-disk download cache.
#[derive(Debug, Clone)]
pub struct Cache {
    dir: PathBuf,
    client: reqwest::Client,
}

#[derive(Debug)]
struct HttpFailure {
    reason: String,
    retryable: bool,
}

impl Cache {
    /// Create a cache storing its entries in `dir`.
    ///
    /// The directory is created on the first write.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(DOWNLOAD_TIMEOUT)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            dir: dir.into(),
            client,
        })
    }

    /// Directory holding the cached entries.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path at which the content of `uri` is (or would be) stored.
    pub fn cache_path(&self, uri: &str) -> PathBuf {
        let digest = Sha256::digest(uri.as_bytes());
        self.dir.join(format!("{}.{CACHED_FILE_EXTENSION}", hex::encode(digest)))
    }

    /// Whether `uri` already has a cache entry.
    pub async fn is_cached(&self, uri: &str) -> bool {
        tokio::fs::try_exists(self.cache_path(uri)).await.unwrap_or(false)
    }

    async fn fetch(&self, uri: &str) -> Result<Vec<u8>> {
        let scheme = uri.split_once("://").map(|(scheme, _)| scheme.to_ascii_lowercase());

        match scheme.as_deref() {
            Some("file") => fetch_file(uri).await,
            Some("http" | "https") => self.fetch_http(uri).await,
            _ => Err(PrefetchError::FetchFailure {
                uri: uri.to_string(),
                reason: "unsupported URI scheme".to_string(),
            }
            .into()),
        }
    }

    async fn fetch_http(&self, uri: &str) -> Result<Vec<u8>> {
        let strategy = ExponentialBackoff::from_millis(DOWNLOAD_RETRY_BASE_MS)
            .max_delay(DOWNLOAD_RETRY_MAX_DELAY)
            .take(DOWNLOAD_ATTEMPTS.saturating_sub(1));

        let content = RetryIf::spawn(
            strategy,
            || async {
                let response = self.client.get(uri).send().await.map_err(|e| HttpFailure {
                    reason: e.to_string(),
                    retryable: e.is_connect() || e.is_timeout(),
                })?;

                let status = response.status();
                if !status.is_success() {
                    return Err(HttpFailure {
                        reason: format!("HTTP {status}"),
                        retryable: status.is_server_error(),
                    });
                }

                response.bytes().await.map(|bytes| bytes.to_vec()).map_err(|e| HttpFailure {
                    reason: e.to_string(),
                    retryable: true,
                })
            },
            |failure: &HttpFailure| {
                if failure.retryable {
                    tracing::debug!("Retrying {} after: {}", uri, failure.reason);
                }
                failure.retryable
            },
        )
        .await
        .map_err(|failure| PrefetchError::FetchFailure {
            uri: uri.to_string(),
            reason: failure.reason,
        })?;

        Ok(content)
    }

    async fn store(&self, uri: &str, content: &[u8]) -> Result<()> {
        let dir = self.dir.clone();
        let path = self.cache_path(uri);
        let content = content.to_vec();

        tokio::task::spawn_blocking(move || -> Result<()> {
            std::fs::create_dir_all(&dir)
                .with_context(|| format!("Failed to create cache directory: {}", dir.display()))?;

            let mut temp = tempfile::NamedTempFile::new_in(&dir)
                .with_context(|| format!("Failed to create temp file in {}", dir.display()))?;
            temp.write_all(&content).context("Failed to write cache entry")?;
            temp.as_file().sync_all().context("Failed to sync cache entry to disk")?;
            temp.persist(&path)
                .with_context(|| format!("Failed to persist cache entry: {}", path.display()))?;

            Ok(())
        })
        .await
        .context("Cache write task panicked")?
    }
}

impl DownloadCache for Cache {
    async fn get(&self, uri: &str) -> Result<Vec<u8>> {
        let path = self.cache_path(uri);

        match tokio::fs::read(&path).await {
            Ok(content) => {
                tracing::debug!("Cache hit for {}", uri);
                return Ok(content);
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                return Err(PrefetchError::FetchFailure {
                    uri: uri.to_string(),
                    reason: format!("failed to read cache entry {}: {e}", path.display()),
                }
                .into());
            }
        }

        tracing::debug!("Cache miss for {}, fetching", uri);
        let content = self.fetch(uri).await?;
        self.store(uri, &content).await.map_err(|e| PrefetchError::FetchFailure {
            uri: uri.to_string(),
            reason: format!("{e:#}"),
        })?;

        Ok(content)
    }
}

async fn fetch_file(uri: &str) -> Result<Vec<u8>> {
    let failure = |reason: String| PrefetchError::FetchFailure {
        uri: uri.to_string(),
        reason,
    };

    let path = reqwest::Url::parse(uri)
        .ok()
        .and_then(|url| url.to_file_path().ok())
        .ok_or_else(|| failure("not a valid local file URI".to_string()))?;

    tokio::fs::read(&path).await.map_err(|e| failure(format!("{}: {e}", path.display())).into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn file_uri(path: &Path) -> String {
        reqwest::Url::from_file_path(path).unwrap().to_string()
    }

    fn is_fetch_failure(err: &anyhow::Error) -> bool {
        matches!(err.downcast_ref::<PrefetchError>(), Some(PrefetchError::FetchFailure { .. }))
    }

    #[test]
    fn test_cache_path_is_uri_digest() {
        let cache = Cache::new("/tmp/prefetch-cache").unwrap();
        let path = cache.cache_path("https://repo.example/index.yml");

        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.ends_with(".cached"));
        assert_eq!(name.len(), 64 + ".cached".len());
        assert_eq!(path, cache.cache_path("https://repo.example/index.yml"));
        assert_ne!(path, cache.cache_path("https://repo.example/other.yml"));
    }

    #[tokio::test]
    async fn test_get_file_uri_populates_cache() {
        let source = TempDir::new().unwrap();
        let cache_dir = TempDir::new().unwrap();
        let file = source.path().join("index.yml");
        std::fs::write(&file, "1.2.0: https://artifacts/a.tgz\n").unwrap();

        let cache = Cache::new(cache_dir.path().join("cache")).unwrap();
        let uri = file_uri(&file);
        assert!(!cache.is_cached(&uri).await);

        let content = cache.get(&uri).await.unwrap();
        assert_eq!(content, b"1.2.0: https://artifacts/a.tgz\n");
        assert!(cache.is_cached(&uri).await);

        // served from the cache once the source is gone
        std::fs::remove_file(&file).unwrap();
        assert_eq!(cache.get(&uri).await.unwrap(), content);
    }

    #[tokio::test]
    async fn test_get_with_passes_reader() {
        let source = TempDir::new().unwrap();
        let file = source.path().join("artifact.txt");
        std::fs::write(&file, "first\nsecond\n").unwrap();

        let cache = Cache::new(source.path().join("cache")).unwrap();
        let lines = cache
            .get_with(&file_uri(&file), |reader| {
                Ok(reader.lines().collect::<std::io::Result<Vec<String>>>()?)
            })
            .await
            .unwrap();
        assert_eq!(lines, vec!["first", "second"]);
    }

    #[tokio::test]
    async fn test_missing_file_is_fetch_failure() {
        let temp = TempDir::new().unwrap();
        let cache = Cache::new(temp.path().join("cache")).unwrap();

        let err = cache.get(&file_uri(&temp.path().join("missing.yml"))).await.unwrap_err();
        assert!(is_fetch_failure(&err));
        assert!(!temp.path().join("cache").exists());
    }

    #[tokio::test]
    async fn test_unusable_cache_dir_is_fetch_failure() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("index.yml");
        std::fs::write(&file, "1.2.0: https://artifacts/a.tgz\n").unwrap();

        // the cache directory is a regular file: reading an entry fails
        let blocker = temp.path().join("not-a-dir");
        std::fs::write(&blocker, "").unwrap();
        let cache = Cache::new(&blocker).unwrap();

        let err = cache.get(&file_uri(&file)).await.unwrap_err();
        assert!(is_fetch_failure(&err));
        assert!(err.to_string().contains(&file_uri(&file)));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_failed_store_is_fetch_failure() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("index.yml");
        std::fs::write(&file, "1.2.0: https://artifacts/a.tgz\n").unwrap();

        // a dangling symlink: entries read as missing, but the directory cannot be created
        let dangling = temp.path().join("dangling");
        std::os::unix::fs::symlink(temp.path().join("gone"), &dangling).unwrap();
        let cache = Cache::new(&dangling).unwrap();

        let err = cache.get(&file_uri(&file)).await.unwrap_err();
        match err.downcast_ref::<PrefetchError>() {
            Some(PrefetchError::FetchFailure { uri, reason }) => {
                assert_eq!(uri, &file_uri(&file));
                assert!(reason.contains("Failed to create cache directory"), "{reason}");
            }
            other => panic!("expected FetchFailure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_unsupported_scheme_is_fetch_failure() {
        let temp = TempDir::new().unwrap();
        let cache = Cache::new(temp.path()).unwrap();

        assert!(is_fetch_failure(&cache.get("ftp://repo.example/index.yml").await.unwrap_err()));
        assert!(is_fetch_failure(&cache.get("not a uri").await.unwrap_err()));
    }
}
