use criterion::{Criterion, criterion_group, criterion_main};
use skillgraph_core::builder::GraphBuilder;
use skillgraph_core::graph::*;
use skillgraph_nav::advisor::SessionAdvisor;
use skillgraph_nav::export::GraphVisualizer;
use std::collections::HashMap;
use std::hint::black_box;

/// Layered graph: `width` concepts per layer, each linked to two concepts in the
/// next layer, every third concept carrying a skill.
fn build_layered_graph(layers: usize, width: usize) -> KnowledgeGraph {
    let mut builder = GraphBuilder::new();
    let mut skills = HashMap::new();

    for layer in 0..layers {
        for i in 0..width {
            let id = format!("c_{}_{}", layer, i);
            builder.add_node(
                GraphNode::new(&id)
                    .with_label(format!("Concept {}.{}", layer, i))
                    .with_domain(format!("domain_{}", i % 4)),
            );
            if (layer * width + i) % 3 == 0 {
                skills.insert(id, vec![format!("skill_{}", i)]);
            }
        }
    }
    for layer in 0..layers.saturating_sub(1) {
        for i in 0..width {
            let source = format!("c_{}_{}", layer, i);
            for offset in [0, 1] {
                let target = format!("c_{}_{}", layer + 1, (i + offset) % width);
                builder.add_edge(GraphEdge::new(&source, target).with_weight(0.9));
            }
        }
    }
    builder.set_skills_map(skills);
    builder.build()
}

fn bench_suggest_shallow(c: &mut Criterion) {
    let graph = build_layered_graph(10, 50);
    let advisor = SessionAdvisor::new(&graph);

    c.bench_function("suggest_depth_2_500_nodes", |b| {
        b.iter(|| advisor.suggest_skills(black_box(&["c_0_0", "c_0_10"]), 2))
    });
}

fn bench_suggest_deep(c: &mut Criterion) {
    let graph = build_layered_graph(10, 50);
    let advisor = SessionAdvisor::new(&graph);

    c.bench_function("suggest_depth_9_500_nodes", |b| {
        b.iter(|| advisor.suggest_skills(black_box(&["c_0_0"]), 9))
    });
}

fn bench_reachable(c: &mut Criterion) {
    let graph = build_layered_graph(20, 100);

    c.bench_function("reachable_from_2000_nodes", |b| {
        b.iter(|| graph.reachable_from(black_box("c_0_0"), None).len())
    });
}

fn bench_mermaid(c: &mut Criterion) {
    let graph = build_layered_graph(10, 50);
    let visualizer = GraphVisualizer::new(&graph);

    c.bench_function("mermaid_grouped_500_nodes", |b| {
        b.iter(|| visualizer.to_mermaid(black_box(true)))
    });
}

criterion_group!(
    benches,
    bench_suggest_shallow,
    bench_suggest_deep,
    bench_reachable,
    bench_mermaid,
);
criterion_main!(benches);
