//! Core types for the skillgraph concept knowledge graph.
//!
//! Provides the concept data model ([`graph::KnowledgeGraph`]), the construction-only
//! [`builder::GraphBuilder`], YAML taxonomy loading, and workspace configuration.

pub mod builder;
pub mod config;
pub mod graph;
pub mod taxonomy;
