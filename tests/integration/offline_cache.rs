use anyhow::Result;
use prefetch_cli::cache::Cache;
use prefetch_cli::config::{FileConfigurationStore, PrefetchSettings};
use prefetch_cli::core::PrefetchError;
use prefetch_cli::package::setup_dependency_cache;
use prefetch_cli::resolver::ArtifactPlan;
use prefetch_cli::tasks::{TaskGraph, TaskReport};
use prefetch_cli::version::WildcardVersionResolver;

use crate::common::TestProject;

async fn package(project: &TestProject) -> Result<(Option<ArtifactPlan>, TaskGraph, Cache)> {
    let settings = PrefetchSettings::load_from(&project.fixture.settings_path()).await?;
    let store = FileConfigurationStore::new(&settings.config_dir);
    let cache = Cache::new(&settings.cache_dir)?;
    let mut graph = TaskGraph::new();

    let plan =
        setup_dependency_cache(&settings, &store, &cache, &WildcardVersionResolver, &mut graph)
            .await?;
    Ok((plan, graph, cache))
}

async fn package_and_run(project: &TestProject) -> Result<(ArtifactPlan, TaskReport, Cache)> {
    let (plan, graph, cache) = package(project).await?;
    let plan = plan.expect("offline packaging is enabled");
    let report = graph.invoke("package", &cache, 2).await?;
    Ok((plan, report, cache))
}

#[tokio::test]
async fn test_offline_package_fills_cache() -> Result<()> {
    let project = TestProject::new(true)?;
    let (plan, report, cache) = package_and_run(&project).await?;

    assert_eq!(
        plan.manifest_uris,
        vec![
            project.index_uri("tomcat")?,
            project.index_uri("lifecycle")?,
            project.index_uri("openjdk/bionic/x86_64")?,
        ]
    );
    assert_eq!(
        plan.artifact_uris,
        vec![project.tomcat_9_0_41.clone(), project.lifecycle.clone(), project.jre_292.clone()]
    );
    assert!(plan.is_fully_resolved());

    for uri in plan.manifest_uris.iter().chain(&plan.artifact_uris) {
        assert!(cache.cache_path(uri).exists(), "{uri} should be cached");
    }
    assert_eq!(std::fs::read(cache.cache_path(&project.jre_292))?, b"jre292");

    for uri in [&project.jre_282, &project.tomcat_9_0_40, &project.tomcat_10] {
        assert!(!cache.cache_path(uri).exists(), "{uri} should not be cached");
    }

    assert_eq!(report.cached_uris.len(), 6);
    assert!(report.completed.contains(&"package".to_string()));
    assert_eq!(cache.dir(), project.cache_dir());
    Ok(())
}

#[tokio::test]
async fn test_registration_defers_artifact_downloads() -> Result<()> {
    let project = TestProject::new(true)?;
    let (plan, graph, cache) = package(&project).await?;
    let plan = plan.expect("offline packaging is enabled");

    // indexes are fetched while planning, artifacts only when the task runs
    for uri in &plan.manifest_uris {
        assert!(cache.cache_path(uri).exists());
    }
    for uri in &plan.artifact_uris {
        assert!(!cache.cache_path(uri).exists());
        assert!(graph.contains(uri));
    }
    assert_eq!(graph.prerequisites("package").len(), 6);
    Ok(())
}

#[tokio::test]
async fn test_offline_disabled_does_nothing() -> Result<()> {
    let project = TestProject::new(false)?;
    let (plan, graph, _cache) = package(&project).await?;

    assert!(plan.is_none());
    assert!(graph.is_empty());
    assert!(!project.cache_dir().exists());
    Ok(())
}

#[tokio::test]
async fn test_unresolved_version_is_skipped() -> Result<()> {
    let project = TestProject::with_versions(true, "11.+", "9.0.+")?;
    let (plan, _report, cache) = package_and_run(&project).await?;

    assert_eq!(plan.unresolved.len(), 1);
    assert_eq!(plan.unresolved[0].version, "11.+");
    assert_eq!(plan.unresolved[0].platform.as_deref(), Some("bionic"));
    assert_eq!(plan.unresolved[0].manifest_uri, project.index_uri("openjdk/bionic/x86_64")?);

    assert_eq!(plan.artifact_uris, vec![project.tomcat_9_0_41.clone(), project.lifecycle.clone()]);
    assert!(cache.cache_path(&project.tomcat_9_0_41).exists());
    Ok(())
}

#[tokio::test]
async fn test_missing_index_aborts_planning() -> Result<()> {
    let project = TestProject::new(true)?;
    std::fs::remove_file(project.fixture.repository_dir().join("lifecycle/index.yml"))?;

    let err = package(&project).await.err().expect("planning should fail");
    assert!(matches!(
        err.downcast_ref::<PrefetchError>(),
        Some(PrefetchError::FetchFailure { uri, .. }) if uri.ends_with("lifecycle/index.yml")
    ));
    Ok(())
}

#[tokio::test]
async fn test_missing_artifact_fails_package_task() -> Result<()> {
    let project = TestProject::new(true)?;
    std::fs::remove_file(project.fixture.repository_dir().join("tomcat/tomcat-9.0.41.tgz"))?;

    let (_plan, graph, cache) = package(&project).await?;
    let err = graph.invoke("package", &cache, 2).await.unwrap_err();

    assert!(matches!(
        err.downcast_ref::<PrefetchError>(),
        Some(PrefetchError::TaskFailed { task, failures: 1 }) if task == "package"
    ));
    // the other downloads of the wave still completed
    assert!(cache.cache_path(&project.jre_292).exists());
    Ok(())
}

#[tokio::test]
async fn test_second_run_is_served_from_cache() -> Result<()> {
    let project = TestProject::new(true)?;
    let (first, _, _) = package_and_run(&project).await?;

    std::fs::remove_dir_all(project.fixture.repository_dir())?;

    let (second, report, _) = package_and_run(&project).await?;
    assert_eq!(first, second);
    assert_eq!(report.cached_uris.len(), 6);
    Ok(())
}
