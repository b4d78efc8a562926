//! Component identifiers from the `components` configuration document.
//!
//! `components.yml` groups fully qualified component names by kind:
//!
//! ```yaml
//! containers:
//!   - "Buildpack::Container::Tomcat"
//! jres:
//!   - "Buildpack::Jre::OpenJdkJRE"
//! frameworks:
//!   - "Buildpack::Framework::SpringAutoReconfiguration"
//! ```
//!
//! Each name maps to the configuration document of its last segment in snake
//! case: `tomcat`, `open_jdk_jre`, `spring_auto_reconfiguration`.

use crate::config::{ConfigNode, scalar_string};
use regex::Regex;
use serde_yaml::Value;
use std::sync::OnceLock;

/// Identifiers of every component listed in the `components` document.
///
/// Values may be single names or (nested) sequences of names; they are
/// flattened in document order.
pub fn component_ids(components: &ConfigNode) -> Vec<String> {
    let mut names = Vec::new();
    if let Some(mapping) = components.as_mapping() {
        for value in mapping.values() {
            flatten_names(value, &mut names);
        }
    }

    names
        .iter()
        .map(|name| snake_case(name.rsplit("::").next().unwrap_or(name)))
        .collect()
}

fn flatten_names(node: &Value, names: &mut Vec<String>) {
    match node {
        Value::Sequence(items) => {
            for item in items {
                flatten_names(item, names);
            }
        }
        other => {
            if let Some(name) = scalar_string(other) {
                names.push(name);
            }
        }
    }
}

/// Convert a `CamelCase` or `Qualified::Name` into `snake_case`.
///
/// `::` becomes `/`, acronym runs are split before their last capital
/// (`JREVersion` -> `jre_version`), and `-` becomes `_`.
pub fn snake_case(name: &str) -> String {
    static ACRONYM: OnceLock<Regex> = OnceLock::new();
    static WORD: OnceLock<Regex> = OnceLock::new();

    let acronym = ACRONYM
        .get_or_init(|| Regex::new(r"([A-Z]+)([A-Z][a-z])").expect("static pattern compiles"));
    let word =
        WORD.get_or_init(|| Regex::new(r"([a-z\d])([A-Z])").expect("static pattern compiles"));

    let name = name.replace("::", "/");
    let name = acronym.replace_all(&name, "${1}_${2}");
    let name = word.replace_all(&name, "${1}_${2}");
    name.replace('-', "_").to_lowercase()
}
