//! Tokenized versions: `major[.minor[.micro[_qualifier]]]`.

use crate::core::PrefetchError;
use regex::Regex;
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

/// Wildcard token matching any value of its component.
pub const WILDCARD: &str = "+";

/// A numeric version component.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Component {
    Number(u64),
    Wildcard,
}

/// The free-form qualifier after `_`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Qualifier {
    Text(String),
    Wildcard,
}

/// A parsed version such as `1.8.0_292`, `11.0.+` or `2.+`.
///
/// The major component is required. `+` may replace any component but only
/// the last one present. Versions without wildcards are *concrete* and have a
/// total order: major, minor and micro numerically (a missing component counts
/// as zero), then the qualifier, where an absent qualifier sorts first and
/// digit runs inside qualifiers compare numerically.
#[derive(Debug, Clone)]
pub struct TokenizedVersion {
    original: String,
    major: Component,
    minor: Option<Component>,
    micro: Option<Component>,
    qualifier: Option<Qualifier>,
}

fn version_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(
            r"^(\d+|\+)(?:\.(\d+|\+)(?:\.(\d+|\+)(?:_([-.a-zA-Z0-9]*|\+))?)?)?$",
        )
        .expect("static pattern compiles")
    })
}

fn parse_component(token: &str) -> Result<Component, PrefetchError> {
    if token == WILDCARD {
        return Ok(Component::Wildcard);
    }
    token.parse().map(Component::Number).map_err(|e| PrefetchError::InvalidVersion {
        version: token.to_string(),
        reason: format!("component out of range: {e}"),
    })
}

impl FromStr for TokenizedVersion {
    type Err = PrefetchError;

    fn from_str(version: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| PrefetchError::InvalidVersion {
            version: version.to_string(),
            reason: reason.to_string(),
        };

        let captures = version_pattern()
            .captures(version.trim())
            .ok_or_else(|| invalid("expected major[.minor[.micro[_qualifier]]]"))?;

        let major = parse_component(&captures[1])?;
        let minor = captures.get(2).map(|m| parse_component(m.as_str())).transpose()?;
        let micro = captures.get(3).map(|m| parse_component(m.as_str())).transpose()?;
        let qualifier = captures.get(4).map(|m| match m.as_str() {
            WILDCARD => Qualifier::Wildcard,
            text => Qualifier::Text(text.to_string()),
        });

        let parsed = Self {
            original: version.trim().to_string(),
            major,
            minor,
            micro,
            qualifier,
        };

        if parsed.has_inner_wildcard() {
            return Err(invalid("no components are allowed after a wildcard"));
        }

        Ok(parsed)
    }
}

impl TokenizedVersion {
    /// Parse a version string.
    pub fn parse(version: &str) -> Result<Self, PrefetchError> {
        version.parse()
    }

    /// Whether any component is a wildcard.
    pub fn is_wildcard(&self) -> bool {
        self.wildcard_flags().any(|wildcard| wildcard)
    }

    /// Whether this specifier accepts the concrete version `candidate`.
    ///
    /// Every component this version sets must equal the candidate's or be a
    /// wildcard. Components it omits accept anything.
    pub fn matches(&self, candidate: &Self) -> bool {
        fn component(spec: Option<Component>, candidate: Option<Component>) -> bool {
            match spec {
                None | Some(Component::Wildcard) => true,
                Some(number) => candidate == Some(number),
            }
        }

        let qualifier = match &self.qualifier {
            None | Some(Qualifier::Wildcard) => true,
            Some(text) => candidate.qualifier.as_ref() == Some(text),
        };

        component(Some(self.major), Some(candidate.major))
            && component(self.minor, candidate.minor)
            && component(self.micro, candidate.micro)
            && qualifier
    }

    /// The version text as given.
    pub fn as_str(&self) -> &str {
        &self.original
    }

    // One flag per component present, `true` where it is a wildcard.
    fn wildcard_flags(&self) -> impl Iterator<Item = bool> + '_ {
        let numbers = [Some(self.major), self.minor, self.micro]
            .into_iter()
            .map(|c| c.map(|c| c == Component::Wildcard));
        let qualifier =
            std::iter::once(self.qualifier.as_ref().map(|q| *q == Qualifier::Wildcard));
        numbers.chain(qualifier).map_while(|flag| flag)
    }

    fn has_inner_wildcard(&self) -> bool {
        let flags: Vec<bool> = self.wildcard_flags().collect();
        flags.iter().rev().skip(1).any(|wildcard| *wildcard)
    }

    fn numeric(component: Option<Component>) -> u64 {
        match component {
            Some(Component::Number(n)) => n,
            Some(Component::Wildcard) => u64::MAX,
            None => 0,
        }
    }
}

impl fmt::Display for TokenizedVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.original)
    }
}

impl Ord for TokenizedVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        Self::numeric(Some(self.major))
            .cmp(&Self::numeric(Some(other.major)))
            .then_with(|| Self::numeric(self.minor).cmp(&Self::numeric(other.minor)))
            .then_with(|| Self::numeric(self.micro).cmp(&Self::numeric(other.micro)))
            .then_with(|| compare_qualifiers(self.qualifier.as_ref(), other.qualifier.as_ref()))
    }
}

impl PartialOrd for TokenizedVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for TokenizedVersion {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for TokenizedVersion {}

fn compare_qualifiers(left: Option<&Qualifier>, right: Option<&Qualifier>) -> Ordering {
    match (left, right) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(Qualifier::Wildcard), Some(Qualifier::Wildcard)) => Ordering::Equal,
        (Some(Qualifier::Wildcard), Some(_)) => Ordering::Greater,
        (Some(_), Some(Qualifier::Wildcard)) => Ordering::Less,
        (Some(Qualifier::Text(left)), Some(Qualifier::Text(right))) => natural_cmp(left, right),
    }
}

/// Compare two strings chunk by chunk, digit runs by value.
fn natural_cmp(left: &str, right: &str) -> Ordering {
    let mut left_chunks = chunks(left);
    let mut right_chunks = chunks(right);

    loop {
        match (left_chunks.next(), right_chunks.next()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(l), Some(r)) => {
                let ordering = match (l.parse::<u64>(), r.parse::<u64>()) {
                    (Ok(l), Ok(r)) => l.cmp(&r),
                    _ => l.cmp(r),
                };
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
        }
    }
}

fn chunks(text: &str) -> impl Iterator<Item = &str> {
    let mut rest = text;
    std::iter::from_fn(move || {
        let first = rest.chars().next()?;
        let digit = first.is_ascii_digit();
        let end = rest.find(|c: char| c.is_ascii_digit() != digit).unwrap_or(rest.len());
        let (chunk, tail) = rest.split_at(end);
        rest = tail;
        Some(chunk)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(text: &str) -> TokenizedVersion {
        TokenizedVersion::parse(text).unwrap()
    }

    #[test]
    fn test_parse_valid_versions() {
        let valid = ["1", "1.2", "1.2.3", "1.8.0_292", "1.8.0_b-12.x", "+", "1.+", "1.2.+", "1.8.0_+"];
        for text in valid {
            assert!(TokenizedVersion::parse(text).is_ok(), "{text} should parse");
        }
        assert_eq!(v(" 1.2.3 ").as_str(), "1.2.3");
    }

    #[test]
    fn test_parse_invalid_versions() {
        let invalid = ["", "a.b", "1..2", "1.2.3.4", "1_beta", "+.1", "1.+.3", "1.2.+_x", "1.2.3_b!"];
        for text in invalid {
            assert!(TokenizedVersion::parse(text).is_err(), "{text} should not parse");
        }
    }

    #[test]
    fn test_is_wildcard() {
        assert!(v("1.2.+").is_wildcard());
        assert!(v("1.8.0_+").is_wildcard());
        assert!(!v("1.2.3").is_wildcard());
        assert!(!v("1.8.0_292").is_wildcard());
    }

    #[test]
    fn test_ordering() {
        assert!(v("1.2.1") > v("1.2.0"));
        assert!(v("1.10.0") > v("1.9.9"));
        assert!(v("2") > v("1.99.99"));
        assert_eq!(v("1.2"), v("1.2.0"));
        assert!(v("1.8.0_292") > v("1.8.0"));
        assert!(v("1.8.0_b10") > v("1.8.0_b9"));
        assert!(v("1.8.0_b") > v("1.8.0_a10"));
    }

    #[test]
    fn test_matches() {
        assert!(v("1.2.+").matches(&v("1.2.1")));
        assert!(v("1.2.+").matches(&v("1.2.0_beta")));
        assert!(!v("1.2.+").matches(&v("1.3.0")));
        assert!(v("1.2.+").matches(&v("1.2")));
        assert!(v("1").matches(&v("1.5.0")));
        assert!(v("+").matches(&v("42.0.1")));
        assert!(v("1.8.0_+").matches(&v("1.8.0_292")));
        assert!(!v("1.8.0_+").matches(&v("1.8.1_292")));
        assert!(v("1.8.0_292").matches(&v("1.8.0_292")));
        assert!(!v("1.8.0_292").matches(&v("1.8.0_291")));
        assert!(!v("1.8.0_292").matches(&v("1.8.0")));
    }

    #[test]
    fn test_natural_cmp() {
        assert_eq!(natural_cmp("b12", "b9"), Ordering::Greater);
        assert_eq!(natural_cmp("rc", "rc1"), Ordering::Less);
        assert_eq!(natural_cmp("abc", "abc"), Ordering::Equal);
    }
}
