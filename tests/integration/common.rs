//! A buildpack-shaped project on top of [`RepositoryFixture`].
//!
//! Two components are declared: an OpenJDK JRE whose repository varies by
//! platform and architecture, and Tomcat with a nested lifecycle-support
//! dependency.

use anyhow::Result;
use prefetch_cli::test_utils::{RepositoryFixture, init_test_logging};

pub const JRE_VERSION: &str = "1.8.0_+";
pub const TOMCAT_VERSION: &str = "9.0.+";

/// Project fixture plus the artifact URIs it published.
pub struct TestProject {
    pub fixture: RepositoryFixture,
    pub jre_282: String,
    pub jre_292: String,
    pub tomcat_9_0_40: String,
    pub tomcat_9_0_41: String,
    pub tomcat_10: String,
    pub lifecycle: String,
}

impl TestProject {
    /// Write the repository, the configuration documents and `prefetch.toml`.
    pub fn new(offline: bool) -> Result<Self> {
        Self::with_versions(offline, JRE_VERSION, TOMCAT_VERSION)
    }

    pub fn with_versions(offline: bool, jre_version: &str, tomcat_version: &str) -> Result<Self> {
        init_test_logging(None);
        let fixture = RepositoryFixture::new()?;

        let jre_282 = fixture.write_artifact("openjdk/bionic/x86_64/jre-1.8.0_282.tgz", b"jre282")?;
        let jre_292 = fixture.write_artifact("openjdk/bionic/x86_64/jre-1.8.0_292.tgz", b"jre292")?;
        fixture.write_index(
            "openjdk/bionic/x86_64",
            &[("1.8.0_282", jre_282.as_str()), ("1.8.0_292", jre_292.as_str())],
        )?;

        let tomcat_9_0_40 = fixture.write_artifact("tomcat/tomcat-9.0.40.tgz", b"tomcat-9.0.40")?;
        let tomcat_9_0_41 = fixture.write_artifact("tomcat/tomcat-9.0.41.tgz", b"tomcat-9.0.41")?;
        let tomcat_10 = fixture.write_artifact("tomcat/tomcat-10.0.0.tgz", b"tomcat-10.0.0")?;
        fixture.write_index(
            "tomcat",
            &[
                ("9.0.40", tomcat_9_0_40.as_str()),
                ("9.0.41", tomcat_9_0_41.as_str()),
                ("10.0.0", tomcat_10.as_str()),
            ],
        )?;

        let lifecycle = fixture.write_artifact("lifecycle/lifecycle-3.0.0.jar", b"lifecycle")?;
        fixture.write_index("lifecycle", &[("3.0.0", lifecycle.as_str())])?;

        fixture.write_config(
            "repository",
            &format!("default_repository_root: \"{}/\"\n", fixture.repository_uri()?),
        )?;
        fixture.write_config(
            "components",
            "containers:\n  - \"Buildpack::Container::Tomcat\"\njres:\n  - \"Buildpack::Jre::OpenJdkJRE\"\n",
        )?;
        fixture.write_config(
            "open_jdk_jre",
            &format!(
                "jre:\n  version: \"{jre_version}\"\n  repository_root: \"{{default.repository.root}}/openjdk/{{platform}}/{{architecture}}\"\nmemory_sizes:\n  metaspace: 64m\n"
            ),
        )?;
        fixture.write_config(
            "tomcat",
            &format!(
                "tomcat:\n  version: \"{tomcat_version}\"\n  repository_root: \"{{default.repository.root}}/tomcat\"\nsupport:\n  lifecycle_support:\n    version: \"3.+\"\n    repository_root: \"{{default.repository.root}}/lifecycle\"\n"
            ),
        )?;

        fixture.write_settings(&format!(
            "offline = {offline}\nplatforms = [\"bionic\"]\narchitectures = [\"x86_64\"]\nmax_parallel = 2\n"
        ))?;

        Ok(Self {
            fixture,
            jre_282,
            jre_292,
            tomcat_9_0_40,
            tomcat_9_0_41,
            tomcat_10,
            lifecycle,
        })
    }

    pub fn cache_dir(&self) -> std::path::PathBuf {
        self.fixture.path().join("build/staging/resources/cache")
    }

    pub fn index_uri(&self, dir: &str) -> Result<String> {
        self.fixture.file_uri(&format!("{dir}/index.yml"))
    }
}
