//! Graph data model for the concept knowledge graph.
//!
//! A [`KnowledgeGraph`] is an immutable snapshot produced by
//! [`GraphBuilder::build`](crate::builder::GraphBuilder::build). Every query takes
//! `&self`, so a loaded graph can be shared freely between readers. Lookups against
//! unknown ids never fail; they degrade to `None` or an empty result.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};
use std::path::PathBuf;

/// Relation name used when a taxonomy edge does not declare one.
pub const DEFAULT_RELATION: &str = "relates_to";

/// Edge strength used when a taxonomy edge does not declare one.
pub const DEFAULT_WEIGHT: f64 = 1.0;

/// A concept node: one addressable engineering topic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: String,
    pub label: String,
    /// Owning domain id. Empty when the node is unclassified.
    #[serde(default)]
    pub domain: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl GraphNode {
    /// Create a node whose label defaults to its id.
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            label: id.clone(),
            id,
            domain: String::new(),
            tags: Vec::new(),
            description: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = domain.into();
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}

/// A directed, typed, weighted relationship between two concepts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphEdge {
    pub source: String,
    pub target: String,
    /// Relationship type, e.g. "determines" or "influences".
    pub relation: String,
    /// Relationship strength in `[0.0, 1.0]`; decays relevance across hops.
    pub weight: f64,
}

impl GraphEdge {
    /// Create an edge with the default relation and full weight.
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            relation: DEFAULT_RELATION.to_string(),
            weight: DEFAULT_WEIGHT,
        }
    }

    pub fn with_relation(mut self, relation: impl Into<String>) -> Self {
        self.relation = relation.into();
        self
    }

    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }
}

/// Informational domain record from the taxonomy's `domains` list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainInfo {
    pub id: String,
    #[serde(default)]
    pub label: String,
}

impl DomainInfo {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
        }
    }

    /// The label, falling back to the id when none was given.
    pub fn display_label(&self) -> &str {
        if self.label.is_empty() {
            &self.id
        } else {
            &self.label
        }
    }
}

/// Provenance and descriptive data recorded at load time.
#[derive(Debug, Clone, Serialize)]
pub struct GraphMetadata {
    /// Taxonomy `version` value, rendered as a string.
    pub version: String,
    pub loaded_at: DateTime<Utc>,
    pub domains: Vec<DomainInfo>,
    /// File the taxonomy was read from, when it came from disk.
    pub source: Option<PathBuf>,
}

impl GraphMetadata {
    /// Display label for a domain id, if the taxonomy declared one.
    pub fn domain_label(&self, domain: &str) -> Option<&str> {
        self.domains
            .iter()
            .find(|d| d.id == domain)
            .map(DomainInfo::display_label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Walk {
    /// Follow edges source → target.
    Forward,
    /// Follow edges target → source.
    Reverse,
}

/// The concept graph: a node table keyed by id plus forward and reverse adjacency.
///
/// Edges whose endpoints were never registered as nodes are kept structurally.
/// Traversals pass through such "phantom" ids, but node-returning queries omit them
/// since there is no node data to return.
#[derive(Debug, Clone)]
pub struct KnowledgeGraph {
    pub(crate) metadata: GraphMetadata,
    /// Nodes in insertion order.
    pub(crate) nodes: Vec<GraphNode>,
    /// Node id → slot in `nodes`.
    pub(crate) node_index: HashMap<String, usize>,
    pub(crate) edges: Vec<GraphEdge>,
    /// Node id → indices into `edges` where the node is the source.
    pub(crate) outgoing: HashMap<String, Vec<usize>>,
    /// Node id → indices into `edges` where the node is the target.
    pub(crate) incoming: HashMap<String, Vec<usize>>,
    pub(crate) skills: HashMap<String, Vec<String>>,
}

impl KnowledgeGraph {
    pub fn metadata(&self) -> &GraphMetadata {
        &self.metadata
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn get_node(&self, id: &str) -> Option<&GraphNode> {
        self.node_index.get(id).map(|&slot| &self.nodes[slot])
    }

    pub fn contains_node(&self, id: &str) -> bool {
        self.node_index.contains_key(id)
    }

    pub fn all_nodes(&self) -> &[GraphNode] {
        &self.nodes
    }

    pub fn all_edges(&self) -> &[GraphEdge] {
        &self.edges
    }

    pub fn get_nodes_by_domain(&self, domain: &str) -> Vec<&GraphNode> {
        self.nodes.iter().filter(|n| n.domain == domain).collect()
    }

    pub fn get_nodes_by_tag(&self, tag: &str) -> Vec<&GraphNode> {
        self.nodes.iter().filter(|n| n.has_tag(tag)).collect()
    }

    /// Distinct non-empty domain ids in first-seen node order.
    pub fn domains(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.nodes
            .iter()
            .map(|n| n.domain.as_str())
            .filter(|d| !d.is_empty() && seen.insert(*d))
            .collect()
    }

    pub fn get_edge(&self, source: &str, target: &str) -> Option<&GraphEdge> {
        self.get_edges_from(source)
            .into_iter()
            .find(|e| e.target == target)
    }

    pub fn get_edges_from(&self, id: &str) -> Vec<&GraphEdge> {
        Self::edges_at(&self.outgoing, id)
            .map(|i| &self.edges[i])
            .collect()
    }

    pub fn get_edges_to(&self, id: &str) -> Vec<&GraphEdge> {
        Self::edges_at(&self.incoming, id)
            .map(|i| &self.edges[i])
            .collect()
    }

    /// Direct successors that have node data.
    pub fn get_neighbors(&self, id: &str) -> Vec<&GraphNode> {
        self.step(id, Walk::Forward)
            .filter_map(|n| self.get_node(n))
            .collect()
    }

    /// Direct predecessors that have node data.
    pub fn get_predecessors(&self, id: &str) -> Vec<&GraphNode> {
        self.step(id, Walk::Reverse)
            .filter_map(|n| self.get_node(n))
            .collect()
    }

    /// Nodes reachable from `id` by breadth-first traversal, excluding `id`.
    ///
    /// `max_depth = None` computes the full transitive closure; `Some(n)` stops
    /// after `n` hops.
    pub fn reachable_from(&self, id: &str, max_depth: Option<usize>) -> Vec<&GraphNode> {
        self.closure(id, max_depth, Walk::Forward)
            .into_iter()
            .filter_map(|n| self.get_node(n))
            .collect()
    }

    /// Every node from which `id` is reachable, excluding `id`.
    pub fn ancestors_of(&self, id: &str) -> Vec<&GraphNode> {
        self.closure(id, None, Walk::Reverse)
            .into_iter()
            .filter_map(|n| self.get_node(n))
            .collect()
    }

    /// Nodes that are ancestors of (or equal to) both `a` and `b`, minus `a` and `b`.
    /// Returned in node insertion order.
    pub fn common_ancestors(&self, a: &str, b: &str) -> Vec<&GraphNode> {
        let left: HashSet<&str> = self
            .closure(a, None, Walk::Reverse)
            .into_iter()
            .chain(std::iter::once(a))
            .collect();
        let right: HashSet<&str> = self
            .closure(b, None, Walk::Reverse)
            .into_iter()
            .chain(std::iter::once(b))
            .collect();

        self.nodes
            .iter()
            .filter(|n| n.id != a && n.id != b)
            .filter(|n| left.contains(n.id.as_str()) && right.contains(n.id.as_str()))
            .collect()
    }

    /// Shortest directed path by hop count. Edge weights are not considered.
    ///
    /// Returns `None` when either endpoint is unknown or no path exists.
    pub fn shortest_path(&self, source: &str, target: &str) -> Option<Vec<String>> {
        let start = self.get_node(source)?.id.as_str();
        if !self.contains_node(target) {
            return None;
        }
        if source == target {
            return Some(vec![source.to_string()]);
        }

        let mut parents: HashMap<&str, &str> = HashMap::new();
        let mut visited: HashSet<&str> = HashSet::from([start]);
        let mut queue: VecDeque<&str> = VecDeque::from([start]);

        while let Some(current) = queue.pop_front() {
            for next in self.step(current, Walk::Forward) {
                if !visited.insert(next) {
                    continue;
                }
                parents.insert(next, current);
                if next == target {
                    return Some(unwind_path(&parents, next));
                }
                queue.push_back(next);
            }
        }

        None
    }

    /// Skills attached directly to `id`.
    pub fn skills_for_node(&self, id: &str) -> &[String] {
        self.skills.get(id).map(Vec::as_slice).unwrap_or_default()
    }

    /// The whole skills lookup table.
    pub fn skills_map(&self) -> &HashMap<String, Vec<String>> {
        &self.skills
    }

    /// Every skill id in the skills map, sorted and deduplicated.
    pub fn all_skills(&self) -> Vec<&str> {
        self.skills
            .values()
            .flatten()
            .map(String::as_str)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Nodes that list `skill` among their direct skills.
    pub fn nodes_for_skill(&self, skill: &str) -> Vec<&GraphNode> {
        self.nodes
            .iter()
            .filter(|n| self.skills_for_node(&n.id).iter().any(|s| s == skill))
            .collect()
    }

    /// Registered nodes with neither incoming nor outgoing edges.
    pub fn isolated_nodes(&self) -> Vec<&GraphNode> {
        self.nodes
            .iter()
            .filter(|n| !self.outgoing.contains_key(&n.id) && !self.incoming.contains_key(&n.id))
            .collect()
    }

    /// Edge endpoints that have no node data, in first-seen order.
    pub fn phantom_ids(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.edges
            .iter()
            .flat_map(|e| [e.source.as_str(), e.target.as_str()])
            .filter(|id| !self.contains_node(id) && seen.insert(*id))
            .collect()
    }

    /// Whether any directed cycle exists (self-loops included), via Kahn's algorithm.
    pub fn has_cycle(&self) -> bool {
        let mut in_degree: HashMap<&str, usize> = HashMap::new();
        for node in &self.nodes {
            in_degree.entry(node.id.as_str()).or_insert(0);
        }
        for edge in &self.edges {
            in_degree.entry(edge.source.as_str()).or_insert(0);
            *in_degree.entry(edge.target.as_str()).or_insert(0) += 1;
        }

        let total = in_degree.len();
        let mut ready: Vec<&str> = in_degree
            .iter()
            .filter(|&(_, &deg)| deg == 0)
            .map(|(&id, _)| id)
            .collect();
        let mut processed = 0;

        while let Some(id) = ready.pop() {
            processed += 1;
            for next in self.step(id, Walk::Forward) {
                if let Some(deg) = in_degree.get_mut(next) {
                    *deg -= 1;
                    if *deg == 0 {
                        ready.push(next);
                    }
                }
            }
        }

        processed < total
    }

    fn edges_at<'a>(
        index: &'a HashMap<String, Vec<usize>>,
        id: &str,
    ) -> impl Iterator<Item = usize> + 'a {
        index.get(id).into_iter().flatten().copied()
    }

    /// Ids one hop away from `id` in the given direction, phantoms included.
    fn step<'a>(&'a self, id: &'a str, walk: Walk) -> impl Iterator<Item = &'a str> + 'a {
        let index = match walk {
            Walk::Forward => &self.outgoing,
            Walk::Reverse => &self.incoming,
        };
        Self::edges_at(index, id).map(move |i| {
            let edge = &self.edges[i];
            match walk {
                Walk::Forward => edge.target.as_str(),
                Walk::Reverse => edge.source.as_str(),
            }
        })
    }

    /// Resolve `id` to the graph's own copy of the string, phantoms included.
    fn known_id(&self, id: &str) -> Option<&str> {
        if let Some(node) = self.get_node(id) {
            return Some(node.id.as_str());
        }
        self.outgoing
            .get_key_value(id)
            .or_else(|| self.incoming.get_key_value(id))
            .map(|(key, _)| key.as_str())
    }

    /// Breadth-first closure from `id`, excluding `id`, in discovery order.
    /// A visited id is never expanded twice, so cycles terminate.
    fn closure(&self, id: &str, max_depth: Option<usize>, walk: Walk) -> Vec<&str> {
        let mut order = Vec::new();
        let Some(start) = self.known_id(id) else {
            return order;
        };

        let mut visited: HashSet<&str> = HashSet::from([start]);
        let mut queue: VecDeque<(&str, usize)> = VecDeque::from([(start, 0)]);

        while let Some((current, depth)) = queue.pop_front() {
            if max_depth.is_some_and(|limit| depth >= limit) {
                continue;
            }
            for next in self.step(current, walk) {
                if visited.insert(next) {
                    order.push(next);
                    queue.push_back((next, depth + 1));
                }
            }
        }

        order
    }
}

fn unwind_path(parents: &HashMap<&str, &str>, target: &str) -> Vec<String> {
    let mut path = vec![target.to_string()];
    let mut current = target;
    while let Some(&previous) = parents.get(current) {
        path.push(previous.to_string());
        current = previous;
    }
    path.reverse();
    path
}
