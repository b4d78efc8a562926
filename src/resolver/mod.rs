//! Resolution of dependency declarations into concrete artifact URIs.
//!
//! Planning is the first of two phases:
//!
//! 1. **Plan** ([`plan_artifact_fetches`]): expand every declaration into its
//!    `index.yml` URIs, fetch each index *now* through the download cache,
//!    resolve the requested version against it and collect the artifact URI.
//!    The result is an [`ArtifactPlan`]; nothing is scheduled yet.
//! 2. **Register** ([`crate::tasks::CacheTaskRegistrar::register_plan`]): turn
//!    the plan into cache-fill tasks that download the artifacts later, when the
//!    aggregate task runs.
//!
//! Index fetches are awaited one after another in declaration order. A fetch
//! failure or a malformed index aborts planning. A version that no index entry
//! satisfies only produces an [`UnresolvedVersion`] diagnostic; the remaining
//! indexes are still processed.

use crate::cache::DownloadCache;
use crate::config::ConfigurationStore;
use crate::repository::{
    AxisCandidates, DependencyDeclaration, IndexRequest, VersionIndex, compose_index_requests,
    load_declarations,
};
use crate::version::VersionResolver;
use anyhow::Result;
use serde::Serialize;
use std::fmt;

/// A version specifier that matched nothing in one index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnresolvedVersion {
    /// The requested specifier
    pub version: String,
    /// Platform candidate of the index, when the template used one
    pub platform: Option<String>,
    /// Architecture candidate of the index, when the template used one
    pub architecture: Option<String>,
    /// The index that was searched
    pub manifest_uri: String,
}

impl fmt::Display for UnresolvedVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Unable to resolve version '{}' for platform '{}'",
            self.version,
            self.platform.as_deref().unwrap_or_default()
        )
    }
}

/// Outcome of planning: what must be cached for an offline build.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ArtifactPlan {
    /// Every index fetched while planning, in fetch order
    pub manifest_uris: Vec<String>,
    /// Resolved artifact URIs, in resolution order; may repeat
    pub artifact_uris: Vec<String>,
    /// Indexes in which the requested version was not found
    pub unresolved: Vec<UnresolvedVersion>,
}

impl ArtifactPlan {
    /// Whether every requested version was found.
    pub fn is_fully_resolved(&self) -> bool {
        self.unresolved.is_empty()
    }
}

/// Load every declaration from `store` and plan its artifact fetches.
pub async fn plan_artifact_fetches<S, C, R>(
    store: &S,
    cache: &C,
    resolver: &R,
    candidates: &AxisCandidates,
) -> Result<ArtifactPlan>
where
    S: ConfigurationStore,
    C: DownloadCache + Sync,
    R: VersionResolver,
{
    let declarations = load_declarations(store).await?;
    resolve_artifact_uris(&declarations, cache, resolver, candidates).await
}

/// Plan the artifact fetches of an explicit list of declarations.
pub async fn resolve_artifact_uris<C, R>(
    declarations: &[DependencyDeclaration],
    cache: &C,
    resolver: &R,
    candidates: &AxisCandidates,
) -> Result<ArtifactPlan>
where
    C: DownloadCache + Sync,
    R: VersionResolver,
{
    let mut plan = ArtifactPlan::default();

    for declaration in declarations {
        for request in compose_index_requests(declaration, candidates) {
            plan.manifest_uris.push(request.uri.clone());

            let uri = request.uri.clone();
            let index = cache
                .get_with(&request.uri, |reader| VersionIndex::from_reader(&uri, reader))
                .await?;

            match resolve_in_index(declaration, &index, resolver) {
                Some(artifact) => {
                    tracing::debug!(
                        "Resolved {} version '{}' to {}",
                        declaration,
                        declaration.version(),
                        artifact
                    );
                    plan.artifact_uris.push(artifact);
                }
                None => {
                    let unresolved = unresolved(declaration, request);
                    tracing::warn!("{}", unresolved);
                    plan.unresolved.push(unresolved);
                }
            }
        }
    }

    tracing::info!(
        "Planned {} index(es) and {} artifact(s) from {} declaration(s)",
        plan.manifest_uris.len(),
        plan.artifact_uris.len(),
        declarations.len()
    );

    Ok(plan)
}

fn resolve_in_index<R: VersionResolver>(
    declaration: &DependencyDeclaration,
    index: &VersionIndex,
    resolver: &R,
) -> Option<String> {
    let version = resolver.resolve(declaration.version(), &index.versions())?;
    index.get(&version).map(str::to_string)
}

fn unresolved(declaration: &DependencyDeclaration, request: IndexRequest) -> UnresolvedVersion {
    UnresolvedVersion {
        version: declaration.version().to_string(),
        platform: request.platform,
        architecture: request.architecture,
        manifest_uri: request.uri,
    }
}
