//! Construction-only access to the concept graph.
//!
//! [`GraphBuilder`] is the single place nodes, edges and the skills map are
//! written. [`GraphBuilder::build`] finalizes it into a read-only
//! [`KnowledgeGraph`] with forward and reverse adjacency indexes.

use crate::graph::{DomainInfo, GraphEdge, GraphMetadata, GraphNode, KnowledgeGraph};
use chrono::Utc;
use std::collections::HashMap;
use std::path::PathBuf;

#[derive(Debug, Default)]
pub struct GraphBuilder {
    version: String,
    domains: Vec<DomainInfo>,
    source: Option<PathBuf>,
    nodes: Vec<GraphNode>,
    node_index: HashMap<String, usize>,
    edges: Vec<GraphEdge>,
    /// (source, target) → slot in `edges`; one edge per ordered pair.
    edge_index: HashMap<(String, String), usize>,
    skills: HashMap<String, Vec<String>>,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn version(&mut self, version: impl Into<String>) -> &mut Self {
        self.version = version.into();
        self
    }

    pub fn domains(&mut self, domains: Vec<DomainInfo>) -> &mut Self {
        self.domains = domains;
        self
    }

    pub fn source(&mut self, path: impl Into<PathBuf>) -> &mut Self {
        self.source = Some(path.into());
        self
    }

    /// Register a node keyed by its id. A repeated id overwrites the earlier
    /// node in place, keeping its original position.
    pub fn add_node(&mut self, node: GraphNode) -> &mut Self {
        match self.node_index.get(&node.id) {
            Some(&slot) => self.nodes[slot] = node,
            None => {
                self.node_index.insert(node.id.clone(), self.nodes.len());
                self.nodes.push(node);
            }
        }
        self
    }

    /// Register a directed edge. Endpoints are not checked here; validating them
    /// is the loader's job. A repeated (source, target) pair overwrites the
    /// earlier edge's relation and weight.
    pub fn add_edge(&mut self, edge: GraphEdge) -> &mut Self {
        let key = (edge.source.clone(), edge.target.clone());
        match self.edge_index.get(&key) {
            Some(&slot) => self.edges[slot] = edge,
            None => {
                self.edge_index.insert(key, self.edges.len());
                self.edges.push(edge);
            }
        }
        self
    }

    /// Replace the whole skills lookup table.
    pub fn set_skills_map(&mut self, skills: HashMap<String, Vec<String>>) -> &mut Self {
        self.skills = skills;
        self
    }

    pub fn contains_node(&self, id: &str) -> bool {
        self.node_index.contains_key(id)
    }

    pub fn contains_edge(&self, source: &str, target: &str) -> bool {
        self.edge_index
            .contains_key(&(source.to_string(), target.to_string()))
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Finalize into an immutable graph.
    pub fn build(self) -> KnowledgeGraph {
        let mut outgoing: HashMap<String, Vec<usize>> = HashMap::new();
        let mut incoming: HashMap<String, Vec<usize>> = HashMap::new();
        for (i, edge) in self.edges.iter().enumerate() {
            outgoing.entry(edge.source.clone()).or_default().push(i);
            incoming.entry(edge.target.clone()).or_default().push(i);
        }

        KnowledgeGraph {
            metadata: GraphMetadata {
                version: self.version,
                loaded_at: Utc::now(),
                domains: self.domains,
                source: self.source,
            },
            nodes: self.nodes,
            node_index: self.node_index,
            edges: self.edges,
            outgoing,
            incoming,
            skills: self.skills,
        }
    }
}
