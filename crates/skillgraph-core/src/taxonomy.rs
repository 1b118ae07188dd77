//! Taxonomy ingestion: parse a versioned YAML document into a [`KnowledgeGraph`].
//!
//! Expected layout:
//!
//! ```yaml
//! version: "1.0"
//! domains:
//!   - id: metocean
//!     label: Metocean
//! nodes:
//!   - id: wave_loads
//!     label: Wave Loads
//!     domain: metocean
//!     tags: [loads]
//! edges:
//!   - source: wave_loads
//!     target: fatigue
//!     relation: causes
//!     weight: 0.8
//! skills_map:
//!   wave_loads: [wave-spectrum]
//! ```
//!
//! Structure is validated before anything is built: a malformed taxonomy is
//! rejected as a whole rather than partially loaded.

use crate::builder::GraphBuilder;
use crate::graph::{
    DEFAULT_RELATION, DEFAULT_WEIGHT, DomainInfo, GraphEdge, GraphNode, KnowledgeGraph,
};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_yaml::{Mapping, Value};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Top-level keys every taxonomy must carry, checked in this order.
const REQUIRED_KEYS: [&str; 3] = ["version", "nodes", "edges"];

/// Load-time structural errors. Any of these aborts construction.
#[derive(Debug, thiserror::Error)]
pub enum TaxonomyError {
    #[error("taxonomy file not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("failed to read taxonomy {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid taxonomy YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("taxonomy root must be a mapping")]
    NotAMapping,
    #[error("taxonomy is missing required key '{0}'")]
    MissingKey(&'static str),
    #[error("malformed '{key}' section: {source}")]
    Malformed {
        key: &'static str,
        source: serde_yaml::Error,
    },
    #[error("duplicate node id '{0}'")]
    DuplicateNode(String),
    #[error("edge {from} -> {to} references unknown node '{missing}'")]
    DanglingEdge {
        from: String,
        to: String,
        missing: String,
    },
    #[error("edge {from} -> {to} has weight {weight}, expected a value in [0, 1]")]
    InvalidWeight { from: String, to: String, weight: f64 },
}

#[derive(Debug, Deserialize)]
struct NodeSpec {
    id: String,
    #[serde(default)]
    label: Option<String>,
    #[serde(default)]
    domain: Option<String>,
    #[serde(default)]
    tags: Option<Vec<String>>,
    #[serde(default)]
    description: Option<String>,
}

impl NodeSpec {
    fn into_node(self) -> GraphNode {
        GraphNode {
            label: self.label.unwrap_or_else(|| self.id.clone()),
            id: self.id,
            domain: self.domain.unwrap_or_default(),
            tags: self.tags.unwrap_or_default(),
            description: self.description,
        }
    }
}

#[derive(Debug, Deserialize)]
struct EdgeSpec {
    source: String,
    target: String,
    #[serde(default)]
    relation: Option<String>,
    #[serde(default)]
    weight: Option<f64>,
}

impl EdgeSpec {
    fn into_edge(self) -> GraphEdge {
        GraphEdge {
            source: self.source,
            target: self.target,
            relation: self
                .relation
                .unwrap_or_else(|| DEFAULT_RELATION.to_string()),
            weight: self.weight.unwrap_or(DEFAULT_WEIGHT),
        }
    }
}

/// Builds a [`KnowledgeGraph`] from a taxonomy document.
///
/// Strict mode (the default) rejects edges whose endpoints are not declared
/// nodes. [`TaxonomyLoader::lenient`] keeps them as phantom edges and logs a
/// warning instead.
#[derive(Debug, Clone, Copy)]
pub struct TaxonomyLoader {
    strict_edges: bool,
}

impl Default for TaxonomyLoader {
    fn default() -> Self {
        Self { strict_edges: true }
    }
}

impl TaxonomyLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lenient() -> Self {
        Self {
            strict_edges: false,
        }
    }

    /// Read and parse a taxonomy file.
    pub fn load_from_file(&self, path: &Path) -> Result<KnowledgeGraph, TaxonomyError> {
        if !path.exists() {
            return Err(TaxonomyError::NotFound(path.to_path_buf()));
        }
        let content = fs::read_to_string(path).map_err(|source| TaxonomyError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let data: Value = serde_yaml::from_str(&content)?;
        self.build(data, Some(path))
    }

    /// Parse a taxonomy from YAML text.
    pub fn load_from_str(&self, yaml: &str) -> Result<KnowledgeGraph, TaxonomyError> {
        let data: Value = serde_yaml::from_str(yaml)?;
        self.build(data, None)
    }

    /// Validate an already-parsed document and build the graph from it.
    pub fn load_from_value(&self, data: Value) -> Result<KnowledgeGraph, TaxonomyError> {
        self.build(data, None)
    }

    fn build(
        &self,
        data: Value,
        source: Option<&Path>,
    ) -> Result<KnowledgeGraph, TaxonomyError> {
        let Value::Mapping(mut root) = data else {
            return Err(TaxonomyError::NotAMapping);
        };
        for key in REQUIRED_KEYS {
            if !root.contains_key(key) {
                return Err(TaxonomyError::MissingKey(key));
            }
        }

        let version = root.get("version").map(version_string).unwrap_or_default();
        let nodes: Vec<NodeSpec> = section(&mut root, "nodes")?;
        let edges: Vec<EdgeSpec> = section(&mut root, "edges")?;
        let skills: Option<HashMap<String, Vec<String>>> =
            optional_section(&mut root, "skills_map")?;
        let domains = match optional_section::<Vec<DomainInfo>>(&mut root, "domains") {
            Ok(domains) => domains.unwrap_or_default(),
            Err(e) => {
                tracing::warn!("ignoring unreadable domains list: {}", e);
                Vec::new()
            }
        };

        let mut builder = GraphBuilder::new();
        builder.version(version).domains(domains);
        if let Some(path) = source {
            builder.source(path);
        }

        for spec in nodes {
            if builder.contains_node(&spec.id) {
                return Err(TaxonomyError::DuplicateNode(spec.id));
            }
            builder.add_node(spec.into_node());
        }
        tracing::debug!("registered {} taxonomy nodes", builder.node_count());

        for spec in edges {
            let edge = spec.into_edge();
            self.check_edge(&builder, &edge)?;
            if builder.contains_edge(&edge.source, &edge.target) {
                tracing::warn!(
                    "duplicate edge {} -> {}; keeping the later definition",
                    edge.source,
                    edge.target
                );
            }
            builder.add_edge(edge);
        }

        if let Some(skills) = skills {
            for node_id in skills.keys() {
                if !builder.contains_node(node_id) {
                    tracing::warn!("skills_map entry for undeclared node '{}'", node_id);
                }
            }
            builder.set_skills_map(skills);
        }

        let graph = builder.build();
        tracing::info!(
            "loaded taxonomy v{}: {} nodes, {} edges",
            graph.metadata().version,
            graph.node_count(),
            graph.edge_count()
        );
        Ok(graph)
    }

    fn check_edge(
        &self,
        builder: &GraphBuilder,
        edge: &GraphEdge,
    ) -> Result<(), TaxonomyError> {
        if !edge.weight.is_finite() || !(0.0..=1.0).contains(&edge.weight) {
            return Err(TaxonomyError::InvalidWeight {
                from: edge.source.clone(),
                to: edge.target.clone(),
                weight: edge.weight,
            });
        }

        for endpoint in [&edge.source, &edge.target] {
            if builder.contains_node(endpoint) {
                continue;
            }
            if self.strict_edges {
                return Err(TaxonomyError::DanglingEdge {
                    from: edge.source.clone(),
                    to: edge.target.clone(),
                    missing: endpoint.clone(),
                });
            }
            tracing::warn!(
                "edge {} -> {} references unknown node '{}'",
                edge.source,
                edge.target,
                endpoint
            );
        }
        Ok(())
    }
}

/// Remove and deserialize a required section. A `null` value is malformed.
fn section<T: DeserializeOwned>(
    root: &mut Mapping,
    key: &'static str,
) -> Result<T, TaxonomyError> {
    let value = match root.remove(key) {
        None => return Err(TaxonomyError::MissingKey(key)),
        Some(Value::Null) => {
            return Err(TaxonomyError::Malformed {
                key,
                source: serde::de::Error::custom("section is empty"),
            });
        }
        Some(value) => value,
    };
    serde_yaml::from_value(value).map_err(|source| TaxonomyError::Malformed { key, source })
}

/// Remove and deserialize an optional section; absent or `null` yields `None`.
fn optional_section<T: DeserializeOwned>(
    root: &mut Mapping,
    key: &'static str,
) -> Result<Option<T>, TaxonomyError> {
    match root.remove(key) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => serde_yaml::from_value(value)
            .map(Some)
            .map_err(|source| TaxonomyError::Malformed { key, source }),
    }
}

/// The `version` key accepts any scalar; keep it as display text.
fn version_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        other => serde_yaml::to_string(other)
            .map(|s| s.trim_end().to_string())
            .unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_string_scalars() {
        assert_eq!(version_string(&Value::String("1.0".into())), "1.0");
        assert_eq!(version_string(&Value::Number(3_u64.into())), "3");
        assert_eq!(version_string(&Value::Bool(true)), "true");
        assert_eq!(version_string(&Value::Null), "");
    }

    #[test]
    fn test_node_spec_defaults() {
        let spec: NodeSpec = serde_yaml::from_str("id: fatigue").unwrap();
        let node = spec.into_node();
        assert_eq!(node.label, "fatigue");
        assert!(node.domain.is_empty());
        assert!(node.tags.is_empty());
        assert!(node.description.is_none());
    }

    #[test]
    fn test_node_spec_null_fields_treated_as_absent() {
        let spec: NodeSpec =
            serde_yaml::from_str("id: fatigue\nlabel: null\ntags: null").unwrap();
        let node = spec.into_node();
        assert_eq!(node.label, "fatigue");
        assert!(node.tags.is_empty());
    }

    #[test]
    fn test_edge_spec_defaults() {
        let spec: EdgeSpec = serde_yaml::from_str("source: a\ntarget: b").unwrap();
        let edge = spec.into_edge();
        assert_eq!(edge.relation, "relates_to");
        assert_eq!(edge.weight, 1.0);
    }

    #[test]
    fn test_edge_spec_integer_weight() {
        let spec: EdgeSpec = serde_yaml::from_str("source: a\ntarget: b\nweight: 0").unwrap();
        assert_eq!(spec.into_edge().weight, 0.0);
    }

    #[test]
    fn test_section_null_is_malformed() {
        let mut root: Mapping = serde_yaml::from_str("edges: ~").unwrap();
        let err = section::<Vec<EdgeSpec>>(&mut root, "edges").unwrap_err();
        assert!(matches!(err, TaxonomyError::Malformed { key: "edges", .. }));
        assert!(err.to_string().contains("'edges'"));
    }

    #[test]
    fn test_optional_section_null_is_none() {
        let mut root: Mapping = serde_yaml::from_str("skills_map: null").unwrap();
        let skills: Option<HashMap<String, Vec<String>>> =
            optional_section(&mut root, "skills_map").unwrap();
        assert!(skills.is_none());
    }
}
