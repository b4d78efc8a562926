//! On-disk fixtures: a configuration directory and a `file://` repository.

use anyhow::{Context, Result, anyhow};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A temporary project holding `config/`, `repository/` and `prefetch.toml`.
///
/// ```rust,no_run
/// use prefetch_cli::test_utils::RepositoryFixture;
///
/// # fn example() -> anyhow::Result<()> {
/// let fixture = RepositoryFixture::new()?;
/// let artifact = fixture.write_artifact("jre/linux/jre-1.2.1.tgz", b"jre")?;
/// fixture.write_index("jre/linux", &[("1.2.1", artifact.as_str())])?;
/// fixture.write_config(
///     "repository",
///     &format!("default_repository_root: {}", fixture.repository_uri()?),
/// )?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct RepositoryFixture {
    root: TempDir,
}

impl RepositoryFixture {
    pub fn new() -> Result<Self> {
        let root = TempDir::new().context("Failed to create fixture directory")?;
        std::fs::create_dir_all(root.path().join("config"))?;
        std::fs::create_dir_all(root.path().join("repository"))?;
        Ok(Self {
            root,
        })
    }

    pub fn path(&self) -> &Path {
        self.root.path()
    }

    pub fn config_dir(&self) -> PathBuf {
        self.root.path().join("config")
    }

    pub fn repository_dir(&self) -> PathBuf {
        self.root.path().join("repository")
    }

    pub fn settings_path(&self) -> PathBuf {
        self.root.path().join(crate::constants::SETTINGS_FILE_NAME)
    }

    /// `file://` URI of the repository directory, without a trailing `/`.
    pub fn repository_uri(&self) -> Result<String> {
        file_uri(&self.repository_dir())
    }

    /// `file://` URI of `relative` below the repository directory.
    pub fn file_uri(&self, relative: &str) -> Result<String> {
        file_uri(&self.repository_dir().join(relative))
    }

    /// Write `config/<identifier>.yml`.
    pub fn write_config(&self, identifier: &str, content: &str) -> Result<PathBuf> {
        let path = self.config_dir().join(format!("{identifier}.yml"));
        std::fs::write(&path, content)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(path)
    }

    /// Write `repository/<dir>/index.yml` listing `entries`.
    pub fn write_index(&self, dir: &str, entries: &[(&str, &str)]) -> Result<PathBuf> {
        let content: String = entries
            .iter()
            .map(|(version, uri)| format!("\"{version}\": \"{uri}\"\n"))
            .collect();
        self.write_repository_file(&format!("{dir}/index.yml"), content.as_bytes())
    }

    /// Write an artifact below the repository and return its `file://` URI.
    pub fn write_artifact(&self, relative: &str, content: &[u8]) -> Result<String> {
        self.write_repository_file(relative, content)?;
        self.file_uri(relative)
    }

    /// Write `prefetch.toml`.
    pub fn write_settings(&self, content: &str) -> Result<PathBuf> {
        let path = self.settings_path();
        std::fs::write(&path, content)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(path)
    }

    fn write_repository_file(&self, relative: &str, content: &[u8]) -> Result<PathBuf> {
        let path = self.repository_dir().join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, content)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(path)
    }
}

fn file_uri(path: &Path) -> Result<String> {
    let url = reqwest::Url::from_file_path(path)
        .map_err(|()| anyhow!("Not an absolute path: {}", path.display()))?;
    Ok(url.as_str().trim_end_matches('/').to_string())
}
