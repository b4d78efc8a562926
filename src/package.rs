//! Offline packaging setup: plan the dependency cache and register its tasks.

use crate::cache::DownloadCache;
use crate::config::{ConfigurationStore, PrefetchSettings, load_default_repository_root};
use crate::resolver::{ArtifactPlan, plan_artifact_fetches};
use crate::tasks::{CacheTaskRegistrar, TaskGraph};
use crate::version::VersionResolver;
use anyhow::Result;

/// Plan the offline dependency cache and register it under the package task.
///
/// Does nothing, and touches neither `store` nor `cache`, unless
/// `settings.offline` is set. Otherwise the default repository root is loaded,
/// every declaration's indexes are fetched and resolved, and each manifest and
/// artifact URI is registered as a cache-fill prerequisite of
/// `settings.package_task`. The tasks run when the caller invokes that task.
pub async fn setup_dependency_cache<S, C, R>(
    settings: &PrefetchSettings,
    store: &S,
    cache: &C,
    resolver: &R,
    graph: &mut TaskGraph,
) -> Result<Option<ArtifactPlan>>
where
    S: ConfigurationStore,
    C: DownloadCache + Sync,
    R: VersionResolver,
{
    if !settings.offline {
        tracing::debug!("Offline packaging is off, skipping dependency cache setup");
        return Ok(None);
    }

    let default_repository_root = load_default_repository_root(store).await?;
    let candidates = settings.axis_candidates(default_repository_root);

    let plan = plan_artifact_fetches(store, cache, resolver, &candidates).await?;

    let mut registrar = CacheTaskRegistrar::new(&settings.package_task);
    let registered = registrar.register_plan(graph, &plan);
    tracing::info!(
        "Registered {} cache task(s) under '{}'",
        registered,
        registrar.aggregate()
    );

    Ok(Some(plan))
}
