//! Consumers of a loaded concept graph.
//!
//! Provides the SessionAdvisor (relevance-propagating skill suggestions) and the
//! GraphVisualizer (Mermaid flowcharts and standalone HTML reports).

pub mod advisor;
pub mod export;
