//! CLI binary for skillgraph: query a concept taxonomy and suggest skills.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use skillgraph_core::config::SkillgraphConfig;
use skillgraph_core::graph::{GraphNode, KnowledgeGraph};
use skillgraph_core::taxonomy::TaxonomyLoader;
use skillgraph_nav::advisor::{SessionAdvisor, SkillSuggestion};
use skillgraph_nav::export::GraphVisualizer;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "skillgraph", about = "Concept knowledge graph and skill advisor")]
struct Cli {
    /// Project root directory (defaults to current directory)
    #[arg(short, long, global = true)]
    project: Option<PathBuf>,

    /// Taxonomy YAML file (overrides .skillgraph/config.toml)
    #[arg(short, long, global = true)]
    taxonomy: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show taxonomy statistics
    Info,

    /// Suggest skills starting from one or more concepts
    Suggest {
        /// Entry concept IDs
        #[arg(required = true)]
        nodes: Vec<String>,

        /// Propagation depth (defaults to config, then 2)
        #[arg(short, long)]
        depth: Option<usize>,

        /// Maximum number of suggestions (0 = all)
        #[arg(short, long)]
        limit: Option<usize>,

        /// Print suggestions as JSON
        #[arg(long)]
        json: bool,
    },

    /// Suggest skills for every concept in a domain
    Domain {
        /// Domain ID
        domain: String,

        /// Print suggestions as JSON
        #[arg(long)]
        json: bool,
    },

    /// List concepts reachable downstream of a concept
    Reachable {
        /// Starting concept ID
        node: String,

        /// Maximum traversal depth (unbounded if omitted)
        #[arg(long)]
        max_depth: Option<usize>,
    },

    /// List concepts upstream of a concept
    Ancestors {
        /// Concept ID
        node: String,
    },

    /// List concepts upstream of both concepts
    Common {
        a: String,
        b: String,
    },

    /// Shortest path (fewest hops) between two concepts
    Path {
        source: String,
        target: String,
    },

    /// Export the graph as a Mermaid flowchart or an HTML report
    Export {
        /// Output format: mermaid, html
        #[arg(short, long, default_value = "mermaid")]
        format: String,

        /// Group nodes by domain even when `export.group_by_domain = false`
        #[arg(long, conflicts_with = "flat")]
        grouped: bool,

        /// Do not group nodes by domain (overrides `export.group_by_domain`)
        #[arg(long)]
        flat: bool,

        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// HTML report title (defaults to config)
        #[arg(long)]
        title: Option<String>,
    },

    /// Check the taxonomy for isolated concepts, phantom IDs, and cycles
    Validate,
}

fn get_project_root(cli: &Cli) -> Result<PathBuf> {
    match &cli.project {
        Some(p) => Ok(p.clone()),
        None => std::env::current_dir().context("failed to get current directory"),
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let project_root = get_project_root(&cli)?;
    let config = SkillgraphConfig::load(&project_root)?;
    let taxonomy_path = cli
        .taxonomy
        .clone()
        .unwrap_or_else(|| config.taxonomy_path(&project_root));
    let graph = load_graph(&config, &taxonomy_path)?;

    match cli.command {
        Commands::Info => cmd_info(&graph),
        Commands::Suggest {
            nodes,
            depth,
            limit,
            json,
        } => cmd_suggest(
            &graph,
            &nodes,
            depth.unwrap_or(config.advisor.depth),
            limit.unwrap_or(config.advisor.limit),
            json,
        ),
        Commands::Domain { domain, json } => cmd_domain(&graph, &domain, json),
        Commands::Reachable { node, max_depth } => cmd_reachable(&graph, &node, max_depth),
        Commands::Ancestors { node } => cmd_ancestors(&graph, &node),
        Commands::Common { a, b } => cmd_common(&graph, &a, &b),
        Commands::Path { source, target } => cmd_path(&graph, &source, &target),
        Commands::Export {
            format,
            grouped,
            flat,
            output,
            title,
        } => {
            let group_by_domain = resolve_grouping(grouped, flat, config.export.group_by_domain);
            let title = title.unwrap_or_else(|| config.export.title.clone());
            cmd_export(
                &graph,
                &config,
                &format,
                group_by_domain,
                output.as_deref(),
                &title,
            )
        }
        Commands::Validate => cmd_validate(&graph),
    }
}

/// `--flat` and `--grouped` win over the configured default.
fn resolve_grouping(grouped: bool, flat: bool, configured: bool) -> bool {
    match (grouped, flat) {
        (true, _) => true,
        (_, true) => false,
        _ => configured,
    }
}

fn load_graph(config: &SkillgraphConfig, path: &Path) -> Result<KnowledgeGraph> {
    let loader = if config.taxonomy.lenient {
        TaxonomyLoader::lenient()
    } else {
        TaxonomyLoader::new()
    };
    tracing::debug!("loading taxonomy from {}", path.display());
    loader
        .load_from_file(path)
        .with_context(|| format!("failed to load taxonomy {}", path.display()))
}

fn cmd_info(graph: &KnowledgeGraph) -> Result<()> {
    let meta = graph.metadata();
    println!("Taxonomy v{}", meta.version);
    if let Some(source) = &meta.source {
        println!("Source: {}", source.display());
    }
    println!("Loaded: {}", meta.loaded_at.format("%Y-%m-%d %H:%M:%S UTC"));
    println!();
    println!("Concepts: {}", graph.node_count());
    println!("Relationships: {}", graph.edge_count());
    println!("Skills: {}", graph.all_skills().len());

    let domains = graph.domains();
    println!("Domains: {}", domains.len());
    for domain in domains {
        let label = meta.domain_label(domain).unwrap_or(domain);
        println!(
            "  {} ({} concepts)",
            label,
            graph.get_nodes_by_domain(domain).len()
        );
    }
    let unclassified = graph.get_nodes_by_domain("").len();
    if unclassified > 0 {
        println!("  unclassified ({} concepts)", unclassified);
    }

    Ok(())
}

fn cmd_suggest(
    graph: &KnowledgeGraph,
    nodes: &[String],
    depth: usize,
    limit: usize,
    json: bool,
) -> Result<()> {
    for id in nodes {
        if !graph.contains_node(id) {
            eprintln!("Unknown concept: {}", id);
        }
    }

    let mut suggestions = SessionAdvisor::new(graph).suggest_skills(nodes, depth);
    if limit > 0 {
        suggestions.truncate(limit);
    }
    print_suggestions(&suggestions, json)
}

fn cmd_domain(graph: &KnowledgeGraph, domain: &str, json: bool) -> Result<()> {
    if graph.get_nodes_by_domain(domain).is_empty() {
        eprintln!("No concepts in domain: {}", domain);
    }
    let suggestions = SessionAdvisor::new(graph).suggest_skills_for_domain(domain);
    print_suggestions(&suggestions, json)
}

fn print_suggestions(suggestions: &[SkillSuggestion], json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(suggestions)?);
        return Ok(());
    }
    if suggestions.is_empty() {
        eprintln!("No skills found.");
        return Ok(());
    }
    for s in suggestions {
        println!("{:.4}  {}  (via {})", s.relevance, s.skill, s.source_node);
    }
    Ok(())
}

fn print_nodes(nodes: &[&GraphNode]) {
    for node in nodes {
        if node.domain.is_empty() {
            println!("  {} ({})", node.id, node.label);
        } else {
            println!("  {} ({}) [{}]", node.id, node.label, node.domain);
        }
    }
}

fn cmd_reachable(graph: &KnowledgeGraph, node: &str, max_depth: Option<usize>) -> Result<()> {
    if !graph.contains_node(node) {
        eprintln!("Concept not found: {}", node);
        return Ok(());
    }
    let reachable = graph.reachable_from(node, max_depth);
    println!("{} concept(s) reachable from {}:", reachable.len(), node);
    print_nodes(&reachable);
    Ok(())
}

fn cmd_ancestors(graph: &KnowledgeGraph, node: &str) -> Result<()> {
    if !graph.contains_node(node) {
        eprintln!("Concept not found: {}", node);
        return Ok(());
    }
    let ancestors = graph.ancestors_of(node);
    println!("{} ancestor(s) of {}:", ancestors.len(), node);
    print_nodes(&ancestors);
    Ok(())
}

fn cmd_common(graph: &KnowledgeGraph, a: &str, b: &str) -> Result<()> {
    let common = graph.common_ancestors(a, b);
    println!("{} common ancestor(s) of {} and {}:", common.len(), a, b);
    print_nodes(&common);
    Ok(())
}

fn cmd_path(graph: &KnowledgeGraph, source: &str, target: &str) -> Result<()> {
    match graph.shortest_path(source, target) {
        Some(path) => println!("{}", path.join(" -> ")),
        None => println!("No path from {} to {}", source, target),
    }
    Ok(())
}

fn cmd_export(
    graph: &KnowledgeGraph,
    config: &SkillgraphConfig,
    format: &str,
    group_by_domain: bool,
    output: Option<&Path>,
    title: &str,
) -> Result<()> {
    let mut visualizer = GraphVisualizer::new(graph);
    if let Some(url) = &config.export.cdn_url {
        visualizer = visualizer.with_cdn_url(url.as_str());
    }

    match format {
        "mermaid" | "md" => {
            let diagram = visualizer.to_mermaid(group_by_domain);
            match output {
                Some(path) => {
                    std::fs::write(path, diagram)
                        .with_context(|| format!("failed to write {}", path.display()))?;
                    eprintln!("Wrote Mermaid diagram to {}", path.display());
                }
                None => print!("{}", diagram),
            }
        }
        "html" => match output {
            Some(path) => {
                visualizer.write_html_report(path, title)?;
                eprintln!("Wrote HTML report to {}", path.display());
            }
            None => print!("{}", visualizer.to_html_report(title)),
        },
        _ => anyhow::bail!("Unknown export format: {}. Use 'mermaid' or 'html'.", format),
    }

    Ok(())
}

fn cmd_validate(graph: &KnowledgeGraph) -> Result<()> {
    let mut issues = 0;

    // 1. Concepts with no relationships at all
    for node in graph.isolated_nodes() {
        println!("WARN: isolated concept: {}", node.id);
        issues += 1;
    }

    // 2. Edge endpoints without a node declaration
    for id in graph.phantom_ids() {
        println!("WARN: edge references undeclared concept: {}", id);
        issues += 1;
    }

    // 3. skills_map entries for undeclared concepts
    let mut orphan_skills: Vec<&String> = graph
        .skills_map()
        .keys()
        .filter(|id| !graph.contains_node(id))
        .collect();
    orphan_skills.sort();
    for id in orphan_skills {
        println!("WARN: skills_map references undeclared concept: {}", id);
        issues += 1;
    }

    // 4. Cycles
    if graph.has_cycle() {
        println!("WARN: graph contains a cycle");
        issues += 1;
    }

    if issues == 0 {
        eprintln!("Taxonomy is valid. No integrity issues found.");
        eprintln!(
            "  {} concepts, {} relationships, {} skills",
            graph.node_count(),
            graph.edge_count(),
            graph.all_skills().len()
        );
        Ok(())
    } else {
        anyhow::bail!("found {} integrity issue(s)", issues)
    }
}
