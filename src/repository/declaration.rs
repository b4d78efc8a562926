//! Dependency declarations found in component configuration documents.

use crate::config::{ConfigNode, ConfigurationStore, component_ids, scalar_string, string_field};
use crate::constants::{COMPONENTS_CONFIGURATION, REPOSITORY_ROOT_KEY, VERSION_KEY};
use anyhow::Result;
use std::fmt;

/// A configuration subtree carrying a version specifier and a repository root
/// template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyDeclaration {
    component: String,
    path: Vec<String>,
    version: String,
    repository_root: String,
}

impl DependencyDeclaration {
    /// Create a declaration found at the root of `component`'s document.
    pub fn new(
        component: impl Into<String>,
        version: impl Into<String>,
        repository_root: impl Into<String>,
    ) -> Self {
        Self {
            component: component.into(),
            path: Vec::new(),
            version: version.into(),
            repository_root: repository_root.into(),
        }
    }

    /// Set the key path leading to this declaration.
    #[must_use]
    pub fn at_path(mut self, path: Vec<String>) -> Self {
        self.path = path;
        self
    }

    /// Component identifier whose document holds this declaration.
    pub fn component(&self) -> &str {
        &self.component
    }

    /// Mapping keys from the document root to this declaration.
    pub fn path(&self) -> &[String] {
        &self.path
    }

    /// Version specifier, possibly with wildcard components.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Repository root template, possibly with placeholders.
    pub fn repository_root(&self) -> &str {
        &self.repository_root
    }

    // YAML reads an unquoted `1.10` as the number 1.1 before this sees it, so
    // such versions are reported and taken as parsed.
    fn from_node(component: &str, path: &[String], node: &ConfigNode) -> Option<Self> {
        let version = string_field(node, VERSION_KEY)?;
        if let Some(ConfigNode::Number(number)) = node.get(VERSION_KEY)
            && number.is_f64()
        {
            tracing::warn!(
                "Version {} of {} was read as a number and may have lost trailing zeros; quote it",
                number,
                component
            );
        }
        let repository_root = string_field(node, REPOSITORY_ROOT_KEY)?;
        Some(Self::new(component, version, repository_root).at_path(path.to_vec()))
    }
}

impl fmt::Display for DependencyDeclaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            write!(f, "{}", self.component)
        } else {
            write!(f, "{}:{}", self.component, self.path.join("."))
        }
    }
}

/// Collect every dependency declaration below `root`, depth first.
///
/// A qualifying mapping is not searched further. Only mapping children are
/// visited, in document order; sequences and scalars never are.
pub fn collect_declarations(component_id: &str, root: &ConfigNode) -> Vec<DependencyDeclaration> {
    let mut declarations = Vec::new();
    let mut path = Vec::new();
    walk(component_id, root, &mut path, &mut declarations);
    declarations
}

fn walk(
    component_id: &str,
    node: &ConfigNode,
    path: &mut Vec<String>,
    declarations: &mut Vec<DependencyDeclaration>,
) {
    let Some(mapping) = node.as_mapping() else {
        return;
    };

    if let Some(declaration) = DependencyDeclaration::from_node(component_id, path, node) {
        declarations.push(declaration);
        return;
    }

    for (key, child) in mapping {
        if child.is_mapping() {
            path.push(scalar_string(key).unwrap_or_default());
            walk(component_id, child, path, declarations);
            path.pop();
        }
    }
}

/// Load the `components` document and collect the declarations of every
/// component it lists, in component order.
pub async fn load_declarations<S: ConfigurationStore>(
    store: &S,
) -> Result<Vec<DependencyDeclaration>> {
    let components = store.load(COMPONENTS_CONFIGURATION).await?;
    let ids = component_ids(&components);
    tracing::debug!("Found {} component(s) to search for dependencies", ids.len());

    let mut declarations = Vec::new();
    for id in &ids {
        let document = store.load(id).await?;
        let found = collect_declarations(id, &document);
        tracing::debug!("Component '{}' declares {} dependency(ies)", id, found.len());
        declarations.extend(found);
    }

    Ok(declarations)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::PrefetchError;
    use crate::test_utils::MemoryConfigurationStore;

    fn yaml(text: &str) -> ConfigNode {
        serde_yaml::from_str(text).unwrap()
    }

    #[test]
    fn test_collects_exactly_qualifying_subtrees() {
        let root = yaml(
            r#"
version: 9.9.9
jre:
  version: 1.8.0_+
  repository_root: "{default.repository.root}/openjdk/{platform}/{architecture}"
  nested:
    version: 2.0.0
    repository_root: never-visited
memory_calculator:
  settings:
    version: 2.+
    repository_root: "{default.repository.root}/memory-calculator/{platform}"
  plain:
    key: value
missing_root:
  version: 1.0.0
empty_version:
  version: ""
  repository_root: https://repo.example
list:
  - version: 1.0.0
    repository_root: https://repo.example
"#,
        );

        let found = collect_declarations("open_jdk_jre", &root);
        assert_eq!(found.len(), 2);

        assert_eq!(found[0].component(), "open_jdk_jre");
        assert_eq!(found[0].path(), ["jre"]);
        assert_eq!(found[0].version(), "1.8.0_+");
        assert_eq!(found[1].path(), ["memory_calculator", "settings"]);
        assert_eq!(found[1].version(), "2.+");
        assert_eq!(found[1].to_string(), "open_jdk_jre:memory_calculator.settings");
    }

    #[test]
    fn test_root_itself_can_qualify() {
        let root = yaml(concat!(
            "version: 1.+\n",
            "repository_root: https://repo.example\n",
            "child: {version: 2, repository_root: x}\n",
        ));
        let found = collect_declarations("tomcat", &root);
        assert_eq!(
            found,
            vec![DependencyDeclaration::new("tomcat", "1.+", "https://repo.example")]
        );
    }

    #[test]
    fn test_numeric_version_is_accepted() {
        let root = yaml("agent:\n  version: 8\n  repository_root: https://repo.example\n");
        let found = collect_declarations("agent", &root);
        assert_eq!(found[0].version(), "8");
    }

    #[test]
    fn test_float_like_version_needs_quoting() {
        let root = yaml(concat!(
            "quoted:\n  version: \"1.10\"\n  repository_root: https://repo.example/a\n",
            "unquoted:\n  version: 1.10\n  repository_root: https://repo.example/b\n",
        ));
        let found = collect_declarations("tomcat", &root);

        assert_eq!(found[0].version(), "1.10");
        // YAML has already turned the unquoted value into the number 1.1
        assert_eq!(found[1].version(), "1.1");
    }

    #[test]
    fn test_non_mapping_root_yields_nothing() {
        assert!(collect_declarations("x", &yaml("- a\n- b\n")).is_empty());
        assert!(collect_declarations("x", &yaml("scalar")).is_empty());
    }

    #[tokio::test]
    async fn test_load_declarations_follows_components() {
        let store = MemoryConfigurationStore::new()
            .with_document(
                "components",
                concat!(
                    "jres: [\"Buildpack::Jre::OpenJdkJRE\"]\n",
                    "containers: [\"Buildpack::Container::Tomcat\"]\n",
                ),
            )
            .with_document(
                "open_jdk_jre",
                "jre:\n  version: 1.8.0_+\n  repository_root: https://repo.example/jre\n",
            )
            .with_document(
                "tomcat",
                "tomcat:\n  version: 9.+\n  repository_root: https://repo.example/tomcat\n",
            );

        let found = load_declarations(&store).await.unwrap();
        let components: Vec<&str> = found.iter().map(DependencyDeclaration::component).collect();
        assert_eq!(components, vec!["open_jdk_jre", "tomcat"]);
        assert_eq!(store.loaded(), vec!["components", "open_jdk_jre", "tomcat"]);
    }

    #[tokio::test]
    async fn test_load_declarations_missing_component_is_fatal() {
        let store = MemoryConfigurationStore::new().with_document(
            "components",
            "frameworks: [\"Buildpack::Framework::AppDynamicsAgent\"]\n",
        );

        let err = load_declarations(&store).await.unwrap_err();
        match err.downcast_ref::<PrefetchError>() {
            Some(PrefetchError::ConfigurationMissing {
                identifier,
                ..
            }) => assert_eq!(identifier, "app_dynamics_agent"),
            other => panic!("expected ConfigurationMissing, got {other:?}"),
        }
    }
}
