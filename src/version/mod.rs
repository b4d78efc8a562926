//! Version resolution against the versions a repository index lists.
//!
//! Versions are tokenized as `major[.minor[.micro[_qualifier]]]` (see
//! [`TokenizedVersion`]). A specifier may end in the wildcard `+`, which
//! accepts any value of that component:
//!
//! | Specifier  | Accepts                       |
//! |------------|-------------------------------|
//! | `1.8.0_292`| exactly `1.8.0_292`           |
//! | `1.8.0_+`  | any `1.8.0` qualifier         |
//! | `11.+`     | any `11.x` release            |
//! | `+`        | anything                      |
//!
//! Among the accepted candidates the highest one wins.
//!
//! ```rust
//! use prefetch_cli::version::{VersionResolver, WildcardVersionResolver};
//!
//! let candidates = vec!["1.2.0".to_string(), "1.2.1".to_string(), "1.3.0".to_string()];
//! let resolved = WildcardVersionResolver.resolve("1.2.+", &candidates);
//! assert_eq!(resolved.as_deref(), Some("1.2.1"));
//! ```

mod tokenized;

pub use tokenized::{Component, Qualifier, TokenizedVersion, WILDCARD};

/// Picks the best candidate version for a specifier.
pub trait VersionResolver {
    /// Return the single best candidate matching `specifier`, or `None`.
    ///
    /// `None` covers both an unusable specifier and a specifier no candidate
    /// satisfies; callers do not distinguish the two.
    fn resolve(&self, specifier: &str, candidates: &[String]) -> Option<String>;
}

/// Resolver for tokenized versions with trailing wildcards.
#[derive(Debug, Clone, Copy, Default)]
pub struct WildcardVersionResolver;

impl VersionResolver for WildcardVersionResolver {
    fn resolve(&self, specifier: &str, candidates: &[String]) -> Option<String> {
        let specifier = match TokenizedVersion::parse(specifier) {
            Ok(specifier) => specifier,
            Err(e) => {
                tracing::debug!("{}", e);
                return None;
            }
        };

        candidates
            .iter()
            .filter_map(|candidate| match TokenizedVersion::parse(candidate) {
                Ok(version) if !version.is_wildcard() => Some((candidate, version)),
                Ok(_) => None,
                Err(e) => {
                    tracing::debug!("Skipping candidate: {}", e);
                    None
                }
            })
            .filter(|(_, version)| specifier.matches(version))
            .max_by(|(_, a), (_, b)| a.cmp(b))
            .map(|(candidate, _)| candidate.clone())
    }
}
