//! BFS/DFS traversal layering.
//!
//! Both traversals walk the component of a seed node and produce a
//! [`TraversalTree`]: the discovery-tree edges, a per-node layer index (BFS
//! depth, or DFS recursion depth), and the discovery order. The tree can be
//! turned back into a [`GraphEngine`] so a traversal can itself be laid out
//! and rendered next to its source graph.

use serde::Serialize;
use std::collections::{HashMap, VecDeque};

use crate::graph::GraphEngine;

/// Result of a BFS or DFS walk.
#[derive(Debug, Clone, Serialize)]
pub struct TraversalTree {
    /// The seed node's name.
    pub root: String,
    /// Node names in discovery order (root first).
    pub order: Vec<String>,
    /// Discovery-tree edges as (parent, child) name pairs.
    pub edges: Vec<(String, String)>,
    /// Layer index per discovered node: BFS depth or DFS recursion depth.
    pub layers: HashMap<String, u32>,
}

impl TraversalTree {
    /// Build a graph of the discovery tree, edges named `parent->child`.
    pub fn to_graph(&self) -> GraphEngine {
        let mut graph = GraphEngine::new();
        graph.add_node(&self.root);
        for (parent, child) in &self.edges {
            graph.add_edge(&format!("{parent}->{child}"), parent, child);
        }
        graph
    }
}

/// Resolve the seed to a slot: a named node if given, otherwise the first
/// node in the graph. None when the graph is empty or the name is unknown.
fn resolve_seed(graph: &GraphEngine, seed: Option<&str>) -> Option<usize> {
    match seed {
        Some(name) => graph.node_id(name).and_then(|id| graph.slot_of(id)),
        None => (graph.node_count() > 0).then_some(0),
    }
}

fn name_of(graph: &GraphEngine, slot: usize) -> String {
    graph
        .node_name_by_slot(slot)
        .unwrap_or_default()
        .to_string()
}

/// Breadth-first layering from the seed.
pub fn bfs_tree(graph: &GraphEngine, seed: Option<&str>) -> Option<TraversalTree> {
    let root = resolve_seed(graph, seed)?;
    let n = graph.node_count() as usize;

    let mut layer = vec![u32::MAX; n];
    let mut order = Vec::new();
    let mut edges = Vec::new();
    let mut queue = VecDeque::new();

    layer[root] = 0;
    order.push(root);
    queue.push_back(root);

    while let Some(v) = queue.pop_front() {
        for u in graph.neighbor_slots(v) {
            if layer[u] != u32::MAX {
                continue;
            }
            layer[u] = layer[v] + 1;
            order.push(u);
            edges.push((v, u));
            queue.push_back(u);
        }
    }

    Some(assemble(graph, root, order, edges, &layer))
}

/// Depth-first layering from the seed; layer is the recursion depth.
pub fn dfs_tree(graph: &GraphEngine, seed: Option<&str>) -> Option<TraversalTree> {
    let root = resolve_seed(graph, seed)?;
    let n = graph.node_count() as usize;

    let mut layer = vec![u32::MAX; n];
    let mut order = Vec::new();
    let mut edges = Vec::new();

    layer[root] = 0;
    order.push(root);
    dfs_visit(graph, root, 0, &mut layer, &mut order, &mut edges);

    Some(assemble(graph, root, order, edges, &layer))
}

fn dfs_visit(
    graph: &GraphEngine,
    v: usize,
    depth: u32,
    layer: &mut [u32],
    order: &mut Vec<usize>,
    edges: &mut Vec<(usize, usize)>,
) {
    for u in graph.neighbor_slots(v) {
        if layer[u] != u32::MAX {
            continue;
        }
        layer[u] = depth + 1;
        order.push(u);
        edges.push((v, u));
        dfs_visit(graph, u, depth + 1, layer, order, edges);
    }
}

fn assemble(
    graph: &GraphEngine,
    root: usize,
    order: Vec<usize>,
    edges: Vec<(usize, usize)>,
    layer: &[u32],
) -> TraversalTree {
    let layers = order
        .iter()
        .map(|&slot| (name_of(graph, slot), layer[slot]))
        .collect();
    TraversalTree {
        root: name_of(graph, root),
        order: order.iter().map(|&slot| name_of(graph, slot)).collect(),
        edges: edges
            .into_iter()
            .map(|(a, b)| (name_of(graph, a), name_of(graph, b)))
            .collect(),
        layers,
    }
}
