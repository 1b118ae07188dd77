//! SessionAdvisor: rank skills reachable from a set of entry concepts.
//!
//! Relevance starts at 1.0 on each entry node and decays multiplicatively along
//! every hop by `edge.weight * HOP_DECAY`. A skill reachable along several paths
//! keeps its strongest relevance (max-wins, never summed).

use serde::Serialize;
use skillgraph_core::graph::KnowledgeGraph;
use std::collections::{HashMap, HashSet};

/// Per-hop attenuation applied on top of the edge weight.
pub const HOP_DECAY: f64 = 0.7;

/// Propagation depth used when callers have no preference.
pub const DEFAULT_DEPTH: usize = 2;

/// Propagation depth used by [`SessionAdvisor::suggest_skills_for_domain`].
pub const DOMAIN_DEPTH: usize = 1;

/// A recommended skill and the concept it is attached to.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkillSuggestion {
    pub skill: String,
    /// Node the skill is attached to on its strongest path.
    pub source_node: String,
    /// Rounded to 4 decimal places; always within `[0.0, 1.0]`.
    pub relevance: f64,
}

/// Relevance-propagation recommender over a loaded graph.
#[derive(Debug, Clone, Copy)]
pub struct SessionAdvisor<'g> {
    graph: &'g KnowledgeGraph,
}

/// Best relevance recorded per skill, in first-recorded order.
#[derive(Default)]
struct Scoreboard {
    order: Vec<SkillSuggestion>,
    index: HashMap<String, usize>,
}

impl Scoreboard {
    fn offer(&mut self, skill: &str, source_node: &str, relevance: f64) {
        match self.index.get(skill) {
            Some(&slot) => {
                let current = &mut self.order[slot];
                if relevance > current.relevance {
                    current.relevance = relevance;
                    current.source_node = source_node.to_string();
                }
            }
            None => {
                self.index.insert(skill.to_string(), self.order.len());
                self.order.push(SkillSuggestion {
                    skill: skill.to_string(),
                    source_node: source_node.to_string(),
                    relevance,
                });
            }
        }
    }

    /// Sorted by relevance descending; ties keep first-recorded order.
    fn into_ranked(self) -> Vec<SkillSuggestion> {
        let mut ranked: Vec<SkillSuggestion> = self
            .order
            .into_iter()
            .map(|mut s| {
                s.relevance = round4(s.relevance);
                s
            })
            .collect();
        ranked.sort_by(|a, b| b.relevance.total_cmp(&a.relevance));
        ranked
    }
}

impl<'g> SessionAdvisor<'g> {
    pub fn new(graph: &'g KnowledgeGraph) -> Self {
        Self { graph }
    }

    /// Rank skills reachable within `depth` hops of the entry nodes.
    ///
    /// Unknown entry ids are dropped; if none are known the result is empty.
    /// `depth = 0` returns only skills attached directly to the entries.
    pub fn suggest_skills<S: AsRef<str>>(
        &self,
        entry_nodes: &[S],
        depth: usize,
    ) -> Vec<SkillSuggestion> {
        let mut valid = Vec::with_capacity(entry_nodes.len());
        for id in entry_nodes {
            let id = id.as_ref();
            if self.graph.contains_node(id) {
                valid.push(id);
            } else {
                tracing::debug!("dropping unknown entry node '{}'", id);
            }
        }
        if valid.is_empty() {
            return Vec::new();
        }

        let mut scores = Scoreboard::default();
        for entry in valid {
            self.propagate(entry, depth, &mut scores);
        }
        scores.into_ranked()
    }

    /// Suggestions seeded from every node in `domain`, one hop deep.
    pub fn suggest_skills_for_domain(&self, domain: &str) -> Vec<SkillSuggestion> {
        let entries: Vec<&str> = self
            .graph
            .get_nodes_by_domain(domain)
            .into_iter()
            .map(|n| n.id.as_str())
            .collect();
        self.suggest_skills(&entries, DOMAIN_DEPTH)
    }

    /// Depth-limited DFS from one entry node with its own visited set.
    ///
    /// Uses an explicit stack; children are pushed in reverse so nodes are visited
    /// in the same order as the recursive walk.
    fn propagate(&self, entry: &str, depth: usize, scores: &mut Scoreboard) {
        let mut visited: HashSet<&str> = HashSet::new();
        let mut stack: Vec<(&str, f64, usize)> = vec![(entry, 1.0, depth)];

        while let Some((node, relevance, remaining)) = stack.pop() {
            if !visited.insert(node) {
                continue;
            }
            for skill in self.graph.skills_for_node(node) {
                scores.offer(skill, node, relevance);
            }
            if remaining == 0 {
                continue;
            }
            for edge in self.graph.get_edges_from(node).into_iter().rev() {
                if visited.contains(edge.target.as_str()) {
                    continue;
                }
                let child = relevance * edge.weight * HOP_DECAY;
                stack.push((edge.target.as_str(), child, remaining - 1));
            }
        }
    }
}

fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}
