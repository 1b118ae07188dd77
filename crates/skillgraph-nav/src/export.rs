//! Render the concept graph as a Mermaid flowchart or a standalone HTML report.

use anyhow::{Context, Result};
use skillgraph_core::graph::{GraphNode, KnowledgeGraph};
use std::fmt::Write;
use std::fs;
use std::path::Path;

/// Mermaid script loaded by HTML reports unless overridden.
pub const MERMAID_CDN_URL: &str = "https://cdn.jsdelivr.net/npm/mermaid@10/dist/mermaid.min.js";

/// Subgraph title for nodes without a domain.
pub const UNCLASSIFIED: &str = "Unclassified";

/// Formatting layer over a loaded graph. Performs no validation of its own.
#[derive(Debug, Clone)]
pub struct GraphVisualizer<'g> {
    graph: &'g KnowledgeGraph,
    cdn_url: String,
}

impl<'g> GraphVisualizer<'g> {
    pub fn new(graph: &'g KnowledgeGraph) -> Self {
        Self {
            graph,
            cdn_url: MERMAID_CDN_URL.to_string(),
        }
    }

    /// Use a different Mermaid script URL in HTML reports.
    pub fn with_cdn_url(mut self, url: impl Into<String>) -> Self {
        self.cdn_url = url.into();
        self
    }

    /// Mermaid flowchart source. The first line is always `graph TD`.
    ///
    /// With `group_by_domain`, nodes are wrapped in one `subgraph` per domain and
    /// domainless nodes go into a trailing "Unclassified" block. Subgraph ids carry
    /// a `domain_` prefix to keep them apart from node ids. Edges are always
    /// declared after the node blocks.
    ///
    /// An empty relation is drawn as an unlabeled arrow.
    pub fn to_mermaid(&self, group_by_domain: bool) -> String {
        let mut out = String::new();
        writeln!(out, "graph TD").unwrap();

        if group_by_domain {
            self.write_grouped_nodes(&mut out);
        } else {
            for node in self.graph.all_nodes() {
                write_node(&mut out, node, 1);
            }
        }

        for edge in self.graph.all_edges() {
            let source = mermaid_safe_id(&edge.source);
            let target = mermaid_safe_id(&edge.target);
            if edge.relation.is_empty() {
                writeln!(out, "    {} --> {}", source, target).unwrap();
            } else {
                writeln!(
                    out,
                    "    {} -->|{}| {}",
                    source,
                    mermaid_edge_label(&edge.relation),
                    target
                )
                .unwrap();
            }
        }

        out
    }

    fn write_grouped_nodes(&self, out: &mut String) {
        for domain in self.graph.domains() {
            let title = self
                .graph
                .metadata()
                .domain_label(domain)
                .unwrap_or(domain);
            writeln!(
                out,
                "    subgraph {}[\"{}\"]",
                subgraph_id(domain),
                mermaid_safe_text(title)
            )
            .unwrap();
            for node in self.graph.get_nodes_by_domain(domain) {
                write_node(out, node, 2);
            }
            writeln!(out, "    end").unwrap();
        }

        let unclassified = self.graph.get_nodes_by_domain("");
        if !unclassified.is_empty() {
            writeln!(out, "    subgraph {}", UNCLASSIFIED).unwrap();
            for node in unclassified {
                write_node(out, node, 2);
            }
            writeln!(out, "    end").unwrap();
        }
    }

    /// Standalone HTML page rendering the domain-grouped diagram in the browser.
    pub fn to_html_report(&self, title: &str) -> String {
        let title = html_escape(title);
        let diagram = html_escape(&self.to_mermaid(true));
        format!(
            r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <title>{title}</title>
  <script src="{cdn}"></script>
  <style>
    body {{ font-family: sans-serif; margin: 2rem; }}
    .mermaid {{ background: #fafafa; padding: 1rem; }}
  </style>
</head>
<body>
  <h1>{title}</h1>
  <p>{nodes} concepts, {edges} relationships</p>
  <pre class="mermaid">
{diagram}</pre>
  <script>mermaid.initialize({{ startOnLoad: true }});</script>
</body>
</html>
"#,
            cdn = html_escape(&self.cdn_url),
            nodes = self.graph.node_count(),
            edges = self.graph.edge_count(),
        )
    }

    /// Write the HTML report to `path`, creating parent directories as needed.
    pub fn write_html_report(&self, path: &Path, title: &str) -> Result<()> {
        if let Some(dir) = path.parent()
            && !dir.as_os_str().is_empty()
        {
            fs::create_dir_all(dir)
                .with_context(|| format!("failed to create directory {}", dir.display()))?;
        }
        fs::write(path, self.to_html_report(title))
            .with_context(|| format!("failed to write report to {}", path.display()))?;
        tracing::info!("wrote graph report to {}", path.display());
        Ok(())
    }
}

fn write_node(out: &mut String, node: &GraphNode, indent: usize) {
    writeln!(
        out,
        "{}{}[\"{}\"]",
        "    ".repeat(indent),
        mermaid_safe_id(&node.id),
        mermaid_safe_text(&node.label)
    )
    .unwrap();
}

/// Make an ID safe for Mermaid (hyphens and spaces become underscores).
/// `end` is a keyword that closes a subgraph, so it gets a trailing underscore.
fn mermaid_safe_id(id: &str) -> String {
    let safe = id.replace(['-', ' '], "_");
    if safe.eq_ignore_ascii_case("end") {
        format!("{}_", safe)
    } else {
        safe
    }
}

fn subgraph_id(domain: &str) -> String {
    format!("domain_{}", domain.replace(['-', ' '], "_"))
}

/// Double quotes would terminate a Mermaid label early.
fn mermaid_safe_text(text: &str) -> String {
    text.replace('"', "'")
}

/// Edge labels are delimited by pipes.
fn mermaid_edge_label(text: &str) -> String {
    mermaid_safe_text(text).replace('|', "/")
}

fn html_escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}
