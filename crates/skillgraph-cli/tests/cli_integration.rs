//! Integration tests for skillgraph-cli functionality.
//! Tests the underlying library functions that the CLI commands invoke.

use skillgraph_core::config::SkillgraphConfig;
use skillgraph_core::taxonomy::{TaxonomyError, TaxonomyLoader};
use skillgraph_nav::advisor::{DEFAULT_DEPTH, SessionAdvisor};
use skillgraph_nav::export::GraphVisualizer;
use std::fs;
use std::path::{Path, PathBuf};

fn sample_taxonomy() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../../taxonomy/engineering.yaml")
}

const SMALL_TAXONOMY: &str = r#"
version: "0.1"
nodes:
  - id: a
    domain: core
  - id: b
    domain: core
edges:
  - source: a
    target: b
skills_map:
  a: [alpha]
  b: [beta]
"#;

fn write_project(config: &str) -> tempfile::TempDir {
    let tmp = tempfile::tempdir().unwrap();
    fs::create_dir_all(tmp.path().join(".skillgraph")).unwrap();
    fs::write(tmp.path().join(".skillgraph/config.toml"), config).unwrap();
    fs::create_dir_all(tmp.path().join("data")).unwrap();
    fs::write(tmp.path().join("data/small.yaml"), SMALL_TAXONOMY).unwrap();
    tmp
}

#[test]
fn test_config_points_at_project_taxonomy() {
    let tmp = write_project("[taxonomy]\npath = \"data/small.yaml\"\n");
    let config = SkillgraphConfig::load(tmp.path()).unwrap();
    let path = config.taxonomy_path(tmp.path());
    assert_eq!(path, tmp.path().join("data/small.yaml"));

    let graph = TaxonomyLoader::new().load_from_file(&path).unwrap();
    assert_eq!(graph.node_count(), 2);
    assert_eq!(graph.metadata().version, "0.1");
    assert_eq!(graph.metadata().source.as_deref(), Some(path.as_path()));
}

#[test]
fn test_missing_default_taxonomy_is_not_found() {
    let tmp = tempfile::tempdir().unwrap();
    let config = SkillgraphConfig::load(tmp.path()).unwrap();
    let result = TaxonomyLoader::new().load_from_file(&config.taxonomy_path(tmp.path()));
    assert!(matches!(result, Err(TaxonomyError::NotFound(_))));
}

#[test]
fn test_lenient_config_keeps_dangling_edges() {
    let tmp = write_project("[taxonomy]\npath = \"data/loose.yaml\"\nlenient = true\n");
    fs::write(
        tmp.path().join("data/loose.yaml"),
        "version: 1\nnodes:\n  - id: a\nedges:\n  - source: a\n    target: ghost\n",
    )
    .unwrap();

    let config = SkillgraphConfig::load(tmp.path()).unwrap();
    assert!(config.taxonomy.lenient);
    let path = config.taxonomy_path(tmp.path());

    assert!(TaxonomyLoader::new().load_from_file(&path).is_err());
    let graph = TaxonomyLoader::lenient().load_from_file(&path).unwrap();
    assert_eq!(graph.phantom_ids(), vec!["ghost"]);
}

#[test]
fn test_suggest_on_sample_taxonomy() {
    let graph = TaxonomyLoader::new().load_from_file(&sample_taxonomy()).unwrap();
    let mut suggestions =
        SessionAdvisor::new(&graph).suggest_skills(&["hull_form".to_string()], DEFAULT_DEPTH);
    assert_eq!(suggestions[0].skill, "hull-design");

    suggestions.truncate(2);
    let json = serde_json::to_string_pretty(&suggestions).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed.as_array().unwrap().len(), 2);
    assert_eq!(parsed[0]["source_node"], "hull_form");
}

#[test]
fn test_path_and_ancestor_queries_on_sample_taxonomy() {
    let graph = TaxonomyLoader::new().load_from_file(&sample_taxonomy()).unwrap();

    let path = graph.shortest_path("hull_form", "fatigue").unwrap();
    assert_eq!(path.join(" -> "), "hull_form -> rao -> mooring_loads -> fatigue");
    assert!(graph.shortest_path("fatigue", "hull_form").is_none());

    let common: Vec<&str> = graph
        .common_ancestors("fatigue", "mooring_loads")
        .iter()
        .map(|n| n.id.as_str())
        .collect();
    assert!(common.contains(&"hull_form"));
    assert!(common.contains(&"wave_spectrum"));
    assert!(!common.contains(&"riser_loads"));
}

#[test]
fn test_validate_checks_on_sample_taxonomy() {
    let graph = TaxonomyLoader::new().load_from_file(&sample_taxonomy()).unwrap();
    let isolated: Vec<&str> = graph.isolated_nodes().iter().map(|n| n.id.as_str()).collect();
    assert_eq!(isolated, vec!["cathodic_protection"]);
    assert!(graph.phantom_ids().is_empty());
    assert!(!graph.has_cycle());
    assert!(
        graph
            .skills_map()
            .keys()
            .all(|id| graph.contains_node(id))
    );
}

#[test]
fn test_export_html_to_file() {
    let graph = TaxonomyLoader::new().load_from_file(&sample_taxonomy()).unwrap();
    let tmp = tempfile::tempdir().unwrap();
    let out = tmp.path().join("out/report.html");

    GraphVisualizer::new(&graph)
        .with_cdn_url("https://example.org/mermaid.js")
        .write_html_report(&out, "Engineering")
        .unwrap();

    let html = fs::read_to_string(&out).unwrap();
    assert!(html.contains("https://example.org/mermaid.js"));
    assert!(html.contains("subgraph domain_structural[&quot;Structural Integrity&quot;]"));
    assert!(html.contains("mooring_loads --&gt;|causes| fatigue"));
}
