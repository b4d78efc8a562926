//! Repository configuration: dependency declarations, URI template expansion
//! and version indexes.
//!
//! A *dependency declaration* is any subtree of a component's configuration
//! document that carries both a `version` specifier and a `repository_root`
//! template:
//!
//! ```yaml
//! jre:
//!   version: 1.8.0_+
//!   repository_root: "{default.repository.root}/openjdk/{platform}/{architecture}"
//! ```
//!
//! The template is expanded across the [`AxisCandidates`] of the run into one
//! `index.yml` URI per combination of candidates whose placeholder appears in
//! the template. Each index is a [`VersionIndex`] mapping versions to artifact
//! URIs.

mod declaration;
mod expansion;
mod index;

pub use declaration::{DependencyDeclaration, collect_declarations, load_declarations};
pub use expansion::{
    Axis, IndexRequest, Placeholder, compose_index_requests, compose_index_uris, expand_request,
    expand_requests,
};
pub use index::VersionIndex;

/// Candidate values for every deployment axis of a run.
///
/// Built once from the settings and the repository configuration, then only
/// read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AxisCandidates {
    architectures: Vec<String>,
    platforms: Vec<String>,
    default_repository_root: String,
}

impl AxisCandidates {
    /// Create the candidate set.
    pub fn new(
        architectures: Vec<String>,
        platforms: Vec<String>,
        default_repository_root: impl Into<String>,
    ) -> Self {
        Self {
            architectures,
            platforms,
            default_repository_root: default_repository_root.into(),
        }
    }

    /// Architecture candidates, in order.
    pub fn architectures(&self) -> &[String] {
        &self.architectures
    }

    /// Platform candidates, in order.
    pub fn platforms(&self) -> &[String] {
        &self.platforms
    }

    /// The single default repository root candidate.
    pub fn default_repository_root(&self) -> &str {
        &self.default_repository_root
    }

    /// Candidates for one axis.
    pub fn for_axis(&self, axis: Axis) -> &[String] {
        match axis {
            Axis::RepositoryRoot => std::slice::from_ref(&self.default_repository_root),
            Axis::Platform => &self.platforms,
            Axis::Architecture => &self.architectures,
        }
    }
}
