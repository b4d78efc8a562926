use super::{TaskAction, TaskGraph};
use crate::resolver::ArtifactPlan;
use std::collections::HashSet;

/// Registers one cache-fill task per URI under an aggregate task.
///
/// Registration is idempotent per URI: the set of registered URIs guards the
/// single task definition and edge insertion for each of them.
#[derive(Debug, Clone)]
pub struct CacheTaskRegistrar {
    aggregate: String,
    registered: HashSet<String>,
}

impl CacheTaskRegistrar {
    pub fn new(aggregate: impl Into<String>) -> Self {
        Self {
            aggregate: aggregate.into(),
            registered: HashSet::new(),
        }
    }

    /// Name of the aggregate task.
    pub fn aggregate(&self) -> &str {
        &self.aggregate
    }

    /// Number of distinct URIs registered so far.
    pub fn len(&self) -> usize {
        self.registered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registered.is_empty()
    }

    /// Register a cache-fill task for `uri` as a prerequisite of the aggregate.
    ///
    /// Returns `false`, without touching the graph, when `uri` was already
    /// registered.
    pub fn register(&mut self, graph: &mut TaskGraph, uri: &str) -> bool {
        if !self.registered.insert(uri.to_string()) {
            tracing::debug!("Cache task for {} already registered", uri);
            return false;
        }

        graph.task(
            uri,
            &[],
            TaskAction::CacheFill {
                uri: uri.to_string(),
            },
        );
        graph.multitask(&self.aggregate, &[uri]);
        true
    }

    /// Register every manifest URI, then every artifact URI, of `plan`.
    ///
    /// Returns the number of newly registered URIs.
    pub fn register_plan(&mut self, graph: &mut TaskGraph, plan: &ArtifactPlan) -> usize {
        // the aggregate exists even when there is nothing to cache
        graph.multitask(&self.aggregate, &[]);

        let added = plan
            .manifest_uris
            .iter()
            .chain(&plan.artifact_uris)
            .filter(|uri| self.register(graph, uri))
            .count();

        tracing::debug!(
            "Registered {} cache task(s) under '{}' ({} total)",
            added,
            self.aggregate,
            self.registered.len()
        );
        added
    }
}
