//! GraphEngine - Core graph data structure.
//!
//! The GraphEngine stores the graph topology using petgraph's StableGraph
//! and maintains SoA (Structure of Arrays) buffers for node positions and
//! the per-step displacement scratch used by the layout strategies.
//!
//! Nodes and edges are keyed by opaque unique names. Insertion is
//! idempotent: adding a name that already exists returns the existing
//! handle and never duplicates adjacency. Adding an edge auto-creates
//! missing endpoint nodes, so a graph can be built from an edge list alone.

use petgraph::Undirected;
use petgraph::stable_graph::{EdgeIndex, NodeIndex, StableGraph};
use petgraph::visit::{EdgeRef, IntoEdgeReferences};
use std::collections::HashMap;

use super::edge::EdgeId;
use super::node::{NodeId, NodeState};
use crate::spatial::Rect;
use crate::vec2::Vec2;

/// The core graph engine.
///
/// This struct manages:
/// - Graph topology via petgraph (undirected for layout purposes)
/// - Position and displacement buffers in SoA layout
/// - Node state (pinned)
/// - Name and ID mapping between host identities and internal indices
pub struct GraphEngine {
    /// The underlying graph structure. Node weights are the stable NodeIds.
    graph: StableGraph<NodeId, (), Undirected>,

    /// Map from stable NodeId to petgraph NodeIndex
    node_id_to_index: HashMap<NodeId, NodeIndex>,

    /// Map from node name to its stable NodeId
    node_name_to_id: HashMap<String, NodeId>,

    /// Node names by slot (insertion order; slots are dense)
    node_names: Vec<String>,

    /// Map from stable EdgeId to petgraph EdgeIndex
    edge_id_to_index: HashMap<EdgeId, EdgeIndex>,

    /// Map from edge name to its stable EdgeId
    edge_name_to_id: HashMap<String, EdgeId>,

    /// Next node ID to assign
    next_node_id: u32,

    /// Next edge ID to assign
    next_edge_id: u32,

    /// X positions (SoA layout)
    pos_x: Vec<f32>,

    /// Y positions (SoA layout)
    pos_y: Vec<f32>,

    /// X displacement scratch (SoA layout, transient per layout step)
    disp_x: Vec<f32>,

    /// Y displacement scratch (SoA layout, transient per layout step)
    disp_y: Vec<f32>,

    /// Node states (pinned)
    states: Vec<NodeState>,
}

impl GraphEngine {
    /// Create a new empty graph engine.
    pub fn new() -> Self {
        Self::with_capacity(0, 0)
    }

    /// Create a graph engine with pre-allocated capacity.
    pub fn with_capacity(node_capacity: usize, edge_capacity: usize) -> Self {
        Self {
            graph: StableGraph::with_capacity(node_capacity, edge_capacity),
            node_id_to_index: HashMap::with_capacity(node_capacity),
            node_name_to_id: HashMap::with_capacity(node_capacity),
            node_names: Vec::with_capacity(node_capacity),
            edge_id_to_index: HashMap::with_capacity(edge_capacity),
            edge_name_to_id: HashMap::with_capacity(edge_capacity),
            next_node_id: 0,
            next_edge_id: 0,
            pos_x: Vec::with_capacity(node_capacity),
            pos_y: Vec::with_capacity(node_capacity),
            disp_x: Vec::with_capacity(node_capacity),
            disp_y: Vec::with_capacity(node_capacity),
            states: Vec::with_capacity(node_capacity),
        }
    }

    // =========================================================================
    // Node Operations
    // =========================================================================

    /// Add a node by name, or return the existing one.
    ///
    /// Idempotent: inserting a name that already exists returns the existing
    /// NodeId and changes nothing.
    pub fn add_node(&mut self, name: &str) -> NodeId {
        if let Some(&id) = self.node_name_to_id.get(name) {
            return id;
        }

        let id = NodeId(self.next_node_id);
        self.next_node_id += 1;

        let index = self.graph.add_node(id);
        self.node_id_to_index.insert(id, index);
        self.node_name_to_id.insert(name.to_string(), id);
        self.node_names.push(name.to_string());

        self.pos_x.push(0.0);
        self.pos_y.push(0.0);
        self.disp_x.push(0.0);
        self.disp_y.push(0.0);
        self.states.push(NodeState::new());

        id
    }

    /// Look up a node's ID by name.
    pub fn node_id(&self, name: &str) -> Option<NodeId> {
        self.node_name_to_id.get(name).copied()
    }

    /// Look up a node's name by ID.
    pub fn node_name(&self, id: NodeId) -> Option<&str> {
        self.slot_of(id).map(|slot| self.node_names[slot].as_str())
    }

    /// Look up a node's name by SoA slot.
    pub fn node_name_by_slot(&self, slot: usize) -> Option<&str> {
        self.node_names.get(slot).map(String::as_str)
    }

    /// The SoA slot of a node.
    pub fn slot_of(&self, id: NodeId) -> Option<usize> {
        self.node_id_to_index.get(&id).map(|index| index.index())
    }

    /// Get the number of nodes.
    pub fn node_count(&self) -> u32 {
        self.graph.node_count() as u32
    }

    /// Pin a node (exclude from layout movement).
    pub fn pin_node(&mut self, name: &str) {
        if let Some(slot) = self.node_id(name).and_then(|id| self.slot_of(id)) {
            self.states[slot].set_pinned(true);
        }
    }

    /// Unpin a node.
    pub fn unpin_node(&mut self, name: &str) {
        if let Some(slot) = self.node_id(name).and_then(|id| self.slot_of(id)) {
            self.states[slot].set_pinned(false);
        }
    }

    /// Check if a node is pinned.
    pub fn is_node_pinned(&self, name: &str) -> bool {
        self.node_id(name)
            .and_then(|id| self.slot_of(id))
            .map(|slot| self.states[slot].is_pinned())
            .unwrap_or(false)
    }

    /// Check if a slot's node is pinned.
    #[inline]
    pub fn is_pinned_slot(&self, slot: usize) -> bool {
        self.states.get(slot).map(|s| s.is_pinned()).unwrap_or(false)
    }

    // =========================================================================
    // Edge Operations
    // =========================================================================

    /// Add an edge by name between two named nodes, creating any missing
    /// endpoint node on the way.
    ///
    /// Idempotent: inserting an edge name that already exists returns the
    /// existing EdgeId and does not grow adjacency lists.
    pub fn add_edge(&mut self, name: &str, node0: &str, node1: &str) -> EdgeId {
        if let Some(&id) = self.edge_name_to_id.get(name) {
            return id;
        }

        let n0 = self.add_node(node0);
        let n1 = self.add_node(node1);

        let id = EdgeId(self.next_edge_id);
        self.next_edge_id += 1;

        // Endpoints exist by construction at this point.
        let i0 = self.node_id_to_index[&n0];
        let i1 = self.node_id_to_index[&n1];
        let index = self.graph.add_edge(i0, i1, ());
        self.edge_id_to_index.insert(id, index);
        self.edge_name_to_id.insert(name.to_string(), id);

        id
    }

    /// Look up an edge's ID by name.
    pub fn edge_id(&self, name: &str) -> Option<EdgeId> {
        self.edge_name_to_id.get(name).copied()
    }

    /// The endpoint NodeIds of an edge.
    pub fn edge_endpoints(&self, id: EdgeId) -> Option<(NodeId, NodeId)> {
        let index = self.edge_id_to_index.get(&id)?;
        let (a, b) = self.graph.edge_endpoints(*index)?;
        Some((*self.graph.node_weight(a)?, *self.graph.node_weight(b)?))
    }

    /// Get the number of edges.
    pub fn edge_count(&self) -> u32 {
        self.graph.edge_count() as u32
    }

    /// Endpoint slot pairs of every edge, for the layout attraction passes.
    pub fn edge_slot_pairs(&self) -> Vec<(usize, usize)> {
        self.graph
            .edge_references()
            .map(|e| (e.source().index(), e.target().index()))
            .collect()
    }

    /// Neighbor names of a node.
    pub fn neighbors(&self, name: &str) -> Vec<String> {
        let Some(index) = self
            .node_id(name)
            .and_then(|id| self.node_id_to_index.get(&id).copied())
        else {
            return Vec::new();
        };
        self.graph
            .neighbors(index)
            .map(|n| self.node_names[n.index()].clone())
            .collect()
    }

    /// Neighbor slots of a node's slot.
    pub fn neighbor_slots(&self, slot: usize) -> Vec<usize> {
        self.graph
            .neighbors(NodeIndex::new(slot))
            .map(|n| n.index())
            .collect()
    }

    /// Degree of a node (number of incident edges).
    pub fn degree(&self, name: &str) -> usize {
        let Some(index) = self
            .node_id(name)
            .and_then(|id| self.node_id_to_index.get(&id).copied())
        else {
            return 0;
        };
        self.graph.edges(index).count()
    }

    // =========================================================================
    // Position / Displacement Access
    // =========================================================================

    /// A node's position by slot.
    #[inline]
    pub fn position(&self, slot: usize) -> Vec2 {
        Vec2::new(self.pos_x[slot], self.pos_y[slot])
    }

    /// Set a node's position by slot.
    #[inline]
    pub fn set_position(&mut self, slot: usize, pos: Vec2) {
        self.pos_x[slot] = pos.x;
        self.pos_y[slot] = pos.y;
    }

    /// A node's position by name.
    pub fn position_of(&self, name: &str) -> Option<Vec2> {
        self.node_id(name)
            .and_then(|id| self.slot_of(id))
            .map(|slot| self.position(slot))
    }

    /// Set a node's position by name.
    pub fn set_position_of(&mut self, name: &str, pos: Vec2) {
        if let Some(slot) = self.node_id(name).and_then(|id| self.slot_of(id)) {
            self.set_position(slot, pos);
        }
    }

    /// A node's accumulated displacement by slot.
    #[inline]
    pub fn displacement(&self, slot: usize) -> Vec2 {
        Vec2::new(self.disp_x[slot], self.disp_y[slot])
    }

    /// Overwrite a node's displacement by slot.
    #[inline]
    pub fn set_displacement(&mut self, slot: usize, disp: Vec2) {
        self.disp_x[slot] = disp.x;
        self.disp_y[slot] = disp.y;
    }

    /// Accumulate onto a node's displacement by slot.
    #[inline]
    pub fn add_displacement(&mut self, slot: usize, delta: Vec2) {
        self.disp_x[slot] += delta.x;
        self.disp_y[slot] += delta.y;
    }

    /// Zero every displacement accumulator.
    pub fn reset_displacements(&mut self) {
        self.disp_x.fill(0.0);
        self.disp_y.fill(0.0);
    }

    /// Get X positions slice.
    pub fn positions_x(&self) -> &[f32] {
        &self.pos_x
    }

    /// Get Y positions slice.
    pub fn positions_y(&self) -> &[f32] {
        &self.pos_y
    }

    // =========================================================================
    // Bounds / Extent
    // =========================================================================

    /// Get the bounding box of all node positions as
    /// `(min_x, min_y, max_x, max_y)`, or None if the graph is empty.
    pub fn bounds(&self) -> Option<(f32, f32, f32, f32)> {
        if self.graph.node_count() == 0 {
            return None;
        }

        let mut min_x = f32::INFINITY;
        let mut max_x = f32::NEG_INFINITY;
        let mut min_y = f32::INFINITY;
        let mut max_y = f32::NEG_INFINITY;

        for node_index in self.graph.node_indices() {
            let i = node_index.index();
            let x = self.pos_x[i];
            let y = self.pos_y[i];
            if x < min_x {
                min_x = x;
            }
            if x > max_x {
                max_x = x;
            }
            if y < min_y {
                min_y = y;
            }
            if y > max_y {
                max_y = y;
            }
        }

        Some((min_x, min_y, max_x, max_y))
    }

    /// The graph's extent as a rectangle that is always usable as a quadtree
    /// root region: an empty graph yields the unit-ish rectangle
    /// `(-1, -1)..(1, 1)` and a degenerate axis (all nodes sharing one
    /// coordinate) is padded by one unit on each side.
    pub fn extent(&self) -> Rect {
        let Some((mut min_x, mut min_y, mut max_x, mut max_y)) = self.bounds() else {
            return Rect::new(-1.0, -1.0, 1.0, 1.0);
        };

        if max_x <= min_x {
            min_x -= 1.0;
            max_x += 1.0;
        }
        if max_y <= min_y {
            min_y -= 1.0;
            max_y += 1.0;
        }

        Rect::new(min_x, min_y, max_x, max_y)
    }

    // =========================================================================
    // Utilities
    // =========================================================================

    /// Clear all nodes and edges, resetting the engine to its initial state.
    pub fn clear(&mut self) {
        self.graph.clear();
        self.node_id_to_index.clear();
        self.node_name_to_id.clear();
        self.node_names.clear();
        self.edge_id_to_index.clear();
        self.edge_name_to_id.clear();
        self.next_node_id = 0;
        self.next_edge_id = 0;
        self.pos_x.clear();
        self.pos_y.clear();
        self.disp_x.clear();
        self.disp_y.clear();
        self.states.clear();
    }
}

impl Default for GraphEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_node() {
        let mut engine = GraphEngine::new();
        let id = engine.add_node("a");

        assert_eq!(engine.node_count(), 1);
        assert_eq!(engine.node_id("a"), Some(id));
        assert_eq!(engine.node_name(id), Some("a"));
    }

    #[test]
    fn test_add_node_idempotent() {
        let mut engine = GraphEngine::new();
        let first = engine.add_node("a");
        let second = engine.add_node("a");

        assert_eq!(first, second);
        assert_eq!(engine.node_count(), 1);
    }

    #[test]
    fn test_add_edge_auto_creates_endpoints() {
        let mut engine = GraphEngine::new();
        let edge = engine.add_edge("a->b", "a", "b");

        assert_eq!(engine.node_count(), 2);
        assert_eq!(engine.edge_count(), 1);

        let (n0, n1) = engine.edge_endpoints(edge).unwrap();
        let names = [engine.node_name(n0).unwrap(), engine.node_name(n1).unwrap()];
        assert!(names.contains(&"a"));
        assert!(names.contains(&"b"));
    }

    #[test]
    fn test_add_edge_idempotent_no_adjacency_growth() {
        let mut engine = GraphEngine::new();
        let first = engine.add_edge("a->b", "a", "b");
        let second = engine.add_edge("a->b", "a", "b");

        assert_eq!(first, second);
        assert_eq!(engine.edge_count(), 1);
        assert_eq!(engine.neighbors("a"), vec!["b".to_string()]);
        assert_eq!(engine.degree("a"), 1);
    }

    #[test]
    fn test_undirected_adjacency() {
        let mut engine = GraphEngine::new();
        engine.add_edge("a->b", "a", "b");
        engine.add_edge("a->c", "a", "c");

        let mut neighbors = engine.neighbors("a");
        neighbors.sort();
        assert_eq!(neighbors, vec!["b".to_string(), "c".to_string()]);
        // Undirected: b sees a as a neighbor even though the edge is named
        // directionally.
        assert_eq!(engine.neighbors("b"), vec!["a".to_string()]);
        assert_eq!(engine.degree("a"), 2);
        assert_eq!(engine.degree("b"), 1);
    }

    #[test]
    fn test_positions_and_displacements() {
        let mut engine = GraphEngine::new();
        engine.add_node("a");
        engine.set_position_of("a", Vec2::new(3.0, -2.0));

        assert_eq!(engine.position_of("a"), Some(Vec2::new(3.0, -2.0)));
        assert_eq!(engine.position(0), Vec2::new(3.0, -2.0));

        engine.add_displacement(0, Vec2::new(1.0, 1.0));
        engine.add_displacement(0, Vec2::new(0.5, -0.5));
        assert_eq!(engine.displacement(0), Vec2::new(1.5, 0.5));

        engine.reset_displacements();
        assert_eq!(engine.displacement(0), Vec2::ZERO);
    }

    #[test]
    fn test_pin_unpin() {
        let mut engine = GraphEngine::new();
        engine.add_node("a");

        assert!(!engine.is_node_pinned("a"));
        engine.pin_node("a");
        assert!(engine.is_node_pinned("a"));
        assert!(engine.is_pinned_slot(0));
        engine.unpin_node("a");
        assert!(!engine.is_node_pinned("a"));
    }

    #[test]
    fn test_bounds() {
        let mut engine = GraphEngine::new();
        engine.add_node("a");
        engine.add_node("b");
        engine.set_position_of("a", Vec2::new(-10.0, -5.0));
        engine.set_position_of("b", Vec2::new(10.0, 5.0));

        assert_eq!(engine.bounds(), Some((-10.0, -5.0, 10.0, 5.0)));
    }

    #[test]
    fn test_extent_empty_graph() {
        let engine = GraphEngine::new();
        assert_eq!(engine.extent(), Rect::new(-1.0, -1.0, 1.0, 1.0));
    }

    #[test]
    fn test_extent_pads_degenerate_axes() {
        let mut engine = GraphEngine::new();
        engine.add_node("a");
        engine.add_node("b");
        // Both on the same vertical line: zero width.
        engine.set_position_of("a", Vec2::new(4.0, 0.0));
        engine.set_position_of("b", Vec2::new(4.0, 10.0));

        let ext = engine.extent();
        assert_eq!(ext, Rect::new(3.0, 0.0, 5.0, 10.0));
        assert!(ext.width() > 0.0);
    }

    #[test]
    fn test_edge_slot_pairs() {
        let mut engine = GraphEngine::new();
        engine.add_edge("a->b", "a", "b");
        engine.add_edge("b->c", "b", "c");

        let mut pairs = engine.edge_slot_pairs();
        pairs.sort();
        assert_eq!(pairs, vec![(0, 1), (1, 2)]);
    }

    #[test]
    fn test_clear() {
        let mut engine = GraphEngine::new();
        engine.add_edge("a->b", "a", "b");
        engine.clear();

        assert_eq!(engine.node_count(), 0);
        assert_eq!(engine.edge_count(), 0);
        assert_eq!(engine.node_id("a"), None);

        // Reusable after clear: ids restart, names rebind.
        let id = engine.add_node("a");
        assert_eq!(id, NodeId(0));
    }
}
