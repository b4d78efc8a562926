//! Repository root template expansion.
//!
//! A repository root template may reference three placeholders:
//!
//! | Placeholder                 | Axis                        |
//! |-----------------------------|-----------------------------|
//! | `{default.repository.root}` | [`Axis::RepositoryRoot`]    |
//! | `{platform}`                | [`Axis::Platform`]          |
//! | `{architecture}`            | [`Axis::Architecture`]      |
//!
//! Expansion is a Cartesian product over the axes a template actually uses:
//! a template that mentions `{platform}` and `{architecture}` becomes
//! `platforms × architectures` requests, while an axis whose placeholder is
//! absent never multiplies the result.
//!
//! ```rust
//! use prefetch_cli::repository::{AxisCandidates, DependencyDeclaration, compose_index_uris};
//!
//! let candidates = AxisCandidates::new(
//!     vec!["x64".to_string(), "arm64".to_string()],
//!     vec!["linux".to_string()],
//!     "https://repo.example",
//! );
//! let declaration = DependencyDeclaration::new(
//!     "jre",
//!     "1.2.+",
//!     "{default.repository.root}/{platform}/{architecture}/",
//! );
//!
//! assert_eq!(
//!     compose_index_uris(&declaration, &candidates),
//!     vec![
//!         "https://repo.example/linux/x64/index.yml",
//!         "https://repo.example/linux/arm64/index.yml",
//!     ]
//! );
//! ```

use super::{AxisCandidates, DependencyDeclaration};
use crate::constants::{
    ARCHITECTURE_PATTERN, DEFAULT_REPOSITORY_ROOT_PATTERN, INDEX_FILE_NAME, PLATFORM_PATTERN,
};
use anyhow::{Context, Result};
use regex::{NoExpand, Regex};
use std::fmt;
use std::sync::OnceLock;

/// A deployment axis a repository root can be expanded over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    /// The global default repository root
    RepositoryRoot,
    /// The target platform
    Platform,
    /// The target architecture
    Architecture,
}

impl Axis {
    /// Order in which the axes are expanded.
    pub const EXPANSION_ORDER: [Self; 3] =
        [Self::RepositoryRoot, Self::Platform, Self::Architecture];

    /// The placeholder pattern of this axis.
    pub const fn pattern(self) -> &'static str {
        match self {
            Self::RepositoryRoot => DEFAULT_REPOSITORY_ROOT_PATTERN,
            Self::Platform => PLATFORM_PATTERN,
            Self::Architecture => ARCHITECTURE_PATTERN,
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RepositoryRoot => write!(f, "repository_root"),
            Self::Platform => write!(f, "platform"),
            Self::Architecture => write!(f, "architecture"),
        }
    }
}

/// A compiled placeholder pattern for one axis.
#[derive(Debug, Clone)]
pub struct Placeholder {
    axis: Axis,
    pattern: Regex,
}

impl Placeholder {
    /// Compile a custom placeholder pattern for `axis`.
    pub fn new(axis: Axis, pattern: &str) -> Result<Self> {
        let pattern = Regex::new(pattern)
            .with_context(|| format!("Invalid placeholder pattern for {axis}: {pattern}"))?;
        Ok(Self {
            axis,
            pattern,
        })
    }

    /// The standard placeholder of `axis`, compiled once per process.
    pub fn for_axis(axis: Axis) -> &'static Self {
        static REPOSITORY_ROOT: OnceLock<Placeholder> = OnceLock::new();
        static PLATFORM: OnceLock<Placeholder> = OnceLock::new();
        static ARCHITECTURE: OnceLock<Placeholder> = OnceLock::new();

        let cell = match axis {
            Axis::RepositoryRoot => &REPOSITORY_ROOT,
            Axis::Platform => &PLATFORM,
            Axis::Architecture => &ARCHITECTURE,
        };
        cell.get_or_init(|| Self {
            axis,
            pattern: Regex::new(axis.pattern()).expect("static pattern compiles"),
        })
    }

    /// The axis this placeholder stands for.
    pub const fn axis(&self) -> Axis {
        self.axis
    }

    /// Whether `uri` references this placeholder.
    pub fn is_match(&self, uri: &str) -> bool {
        self.pattern.is_match(uri)
    }

    /// Replace every occurrence of the placeholder in `uri` with `candidate`,
    /// taken literally.
    pub fn substitute(&self, uri: &str, candidate: &str) -> String {
        self.pattern.replace_all(uri, NoExpand(candidate)).into_owned()
    }
}

/// One branch of a repository root expansion.
///
/// `uri` is the (partially) expanded template; the other fields record which
/// candidate produced this branch and are only used for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct IndexRequest {
    /// The URI, expanded as far as the stages applied so far
    pub uri: String,
    /// Platform candidate of this branch, once expanded
    pub platform: Option<String>,
    /// Architecture candidate of this branch, once expanded
    pub architecture: Option<String>,
    /// Default repository root of this branch, once expanded
    pub repository_root: Option<String>,
}

impl IndexRequest {
    /// Seed a request from an unexpanded template.
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            ..Self::default()
        }
    }

    /// A new request with `candidate` substituted for `placeholder` and
    /// recorded on the placeholder's axis.
    #[must_use]
    pub fn with_candidate(&self, placeholder: &Placeholder, candidate: &str) -> Self {
        let mut platform = self.platform.clone();
        let mut architecture = self.architecture.clone();
        let mut repository_root = self.repository_root.clone();

        let slot = match placeholder.axis() {
            Axis::RepositoryRoot => &mut repository_root,
            Axis::Platform => &mut platform,
            Axis::Architecture => &mut architecture,
        };
        *slot = Some(candidate.to_string());

        Self {
            uri: placeholder.substitute(&self.uri, candidate),
            platform,
            architecture,
            repository_root,
        }
    }

    /// A new request pointing at the `index.yml` below this one's URI.
    ///
    /// One trailing `/` is removed before the file name is appended.
    #[must_use]
    pub fn with_index_suffix(&self) -> Self {
        let base = self.uri.strip_suffix('/').unwrap_or(&self.uri);
        Self {
            uri: format!("{base}/{INDEX_FILE_NAME}"),
            ..self.clone()
        }
    }

    /// Candidate recorded for `axis`, if this branch was expanded on it.
    pub fn candidate(&self, axis: Axis) -> Option<&str> {
        match axis {
            Axis::RepositoryRoot => self.repository_root.as_deref(),
            Axis::Platform => self.platform.as_deref(),
            Axis::Architecture => self.architecture.as_deref(),
        }
    }
}

/// Expand one request over the candidates of one placeholder.
///
/// Returns one request per candidate, in candidate order, when the request's
/// URI references the placeholder; otherwise the request itself, unexpanded.
/// An empty candidate list drops a referencing request entirely.
pub fn expand_request(
    request: &IndexRequest,
    placeholder: &Placeholder,
    candidates: &[String],
) -> Vec<IndexRequest> {
    if placeholder.is_match(&request.uri) {
        candidates.iter().map(|candidate| request.with_candidate(placeholder, candidate)).collect()
    } else {
        vec![request.clone()]
    }
}

/// Expand every request over one placeholder and concatenate the results.
pub fn expand_requests(
    requests: &[IndexRequest],
    placeholder: &Placeholder,
    candidates: &[String],
) -> Vec<IndexRequest> {
    requests.iter().flat_map(|request| expand_request(request, placeholder, candidates)).collect()
}

/// Expand a declaration's repository root into its `index.yml` requests.
///
/// Stages run in [`Axis::EXPANSION_ORDER`] and the index file name is appended
/// last, exactly once per request.
pub fn compose_index_requests(
    declaration: &DependencyDeclaration,
    candidates: &AxisCandidates,
) -> Vec<IndexRequest> {
    let mut requests = vec![IndexRequest::new(declaration.repository_root())];

    for axis in Axis::EXPANSION_ORDER {
        let placeholder = Placeholder::for_axis(axis);
        requests = expand_requests(&requests, placeholder, candidates.for_axis(axis));
    }

    let requests: Vec<IndexRequest> =
        requests.iter().map(IndexRequest::with_index_suffix).collect();

    tracing::debug!(
        "Expanded repository root '{}' of {} into {} index URI(s)",
        declaration.repository_root(),
        declaration,
        requests.len()
    );

    requests
}

/// Expand a declaration's repository root into its `index.yml` URIs.
pub fn compose_index_uris(
    declaration: &DependencyDeclaration,
    candidates: &AxisCandidates,
) -> Vec<String> {
    compose_index_requests(declaration, candidates).into_iter().map(|request| request.uri).collect()
}
