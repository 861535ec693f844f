//! Magnet Graph - WASM Module
//!
//! This module provides the force-directed layout engine and graph
//! traversal algorithms for the Magnet Graph visualization library. It is
//! compiled to WebAssembly and exposes a JavaScript-friendly API via
//! wasm-bindgen.
//!
//! # Architecture
//!
//! - `graph`: Graph data structure using petgraph's StableGraph, keyed by
//!   opaque node/edge names with idempotent insertion
//! - `spatial`: Region quadtree with mass aggregation for Barnes-Hut
//! - `layout`: Interchangeable layout strategies (random, grid,
//!   Fruchterman-Reingold, Barnes-Hut, Eades spring) behind a step-based
//!   contract, plus the run-to-convergence driver
//! - `algorithms`: BFS/DFS traversal layering
//! - `vec2`: 2-D vector math

use js_sys::Float32Array;
use serde::de::DeserializeOwned;
use wasm_bindgen::prelude::*;

pub mod algorithms;
pub mod graph;
pub mod layout;
pub mod spatial;
pub mod vec2;

use algorithms::{bfs_tree, dfs_tree};
use graph::GraphEngine;
use layout::{
    BarnesHut, CancelToken, FruchtermanReingold, GridLayout, Layout, RandomLayout, Spring,
};

/// Initialize the WASM module.
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

#[cfg(target_arch = "wasm32")]
fn log(message: &str) {
    web_sys::console::log_1(&message.into());
}

#[cfg(not(target_arch = "wasm32"))]
fn log(_message: &str) {}

/// Deserialize an optional config object, falling back to defaults when the
/// host passes nothing.
fn parse_config<T: Default + DeserializeOwned>(value: JsValue) -> Result<T, JsValue> {
    if value.is_undefined() || value.is_null() {
        Ok(T::default())
    } else {
        serde_wasm_bindgen::from_value(value).map_err(|e| JsValue::from_str(&e.to_string()))
    }
}

/// Main entry point for the layout engine.
///
/// Wraps the internal GraphEngine together with the active layout strategy
/// and provides the public API exposed to JavaScript.
#[wasm_bindgen]
pub struct MagnetGraphWasm {
    engine: GraphEngine,
    active: Option<Box<dyn Layout>>,
    cancel: CancelToken,
}

#[wasm_bindgen]
impl MagnetGraphWasm {
    /// Create a new empty engine.
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self {
            engine: GraphEngine::new(),
            active: None,
            cancel: CancelToken::new(),
        }
    }

    /// Create an engine with pre-allocated capacity.
    #[wasm_bindgen(js_name = withCapacity)]
    pub fn with_capacity(node_capacity: usize, edge_capacity: usize) -> Self {
        Self {
            engine: GraphEngine::with_capacity(node_capacity, edge_capacity),
            active: None,
            cancel: CancelToken::new(),
        }
    }

    // =========================================================================
    // Graph Building
    // =========================================================================

    /// Add a node by name, or fetch the existing one. Returns its stable id.
    #[wasm_bindgen(js_name = addNode)]
    pub fn add_node(&mut self, name: &str) -> u32 {
        self.engine.add_node(name).0
    }

    /// Add an edge by name between two named nodes, creating missing
    /// endpoints. Returns the stable edge id.
    #[wasm_bindgen(js_name = addEdge)]
    pub fn add_edge(&mut self, name: &str, node0: &str, node1: &str) -> u32 {
        self.engine.add_edge(name, node0, node1).0
    }

    /// Get the number of nodes.
    #[wasm_bindgen(js_name = nodeCount)]
    pub fn node_count(&self) -> u32 {
        self.engine.node_count()
    }

    /// Get the number of edges.
    #[wasm_bindgen(js_name = edgeCount)]
    pub fn edge_count(&self) -> u32 {
        self.engine.edge_count()
    }

    /// Neighbor names of a node.
    #[wasm_bindgen(js_name = getNeighbors)]
    pub fn get_neighbors(&self, name: &str) -> Vec<String> {
        self.engine.neighbors(name)
    }

    /// Degree of a node.
    pub fn degree(&self, name: &str) -> u32 {
        self.engine.degree(name) as u32
    }

    /// Clear all nodes and edges and drop the active layout.
    pub fn clear(&mut self) {
        self.engine.clear();
        self.active = None;
    }

    // =========================================================================
    // Positions
    // =========================================================================

    /// Get a node's X position.
    #[wasm_bindgen(js_name = getNodeX)]
    pub fn get_node_x(&self, name: &str) -> Option<f32> {
        self.engine.position_of(name).map(|p| p.x)
    }

    /// Get a node's Y position.
    #[wasm_bindgen(js_name = getNodeY)]
    pub fn get_node_y(&self, name: &str) -> Option<f32> {
        self.engine.position_of(name).map(|p| p.y)
    }

    /// Set a node's position.
    #[wasm_bindgen(js_name = setNodePosition)]
    pub fn set_node_position(&mut self, name: &str, x: f32, y: f32) {
        self.engine.set_position_of(name, vec2::Vec2::new(x, y));
    }

    /// Pin a node (excluded from layout movement, still exerts forces).
    #[wasm_bindgen(js_name = pinNode)]
    pub fn pin_node(&mut self, name: &str) {
        self.engine.pin_node(name);
    }

    /// Unpin a node.
    #[wasm_bindgen(js_name = unpinNode)]
    pub fn unpin_node(&mut self, name: &str) {
        self.engine.unpin_node(name);
    }

    /// Check if a node is pinned.
    #[wasm_bindgen(js_name = isNodePinned)]
    pub fn is_node_pinned(&self, name: &str) -> bool {
        self.engine.is_node_pinned(name)
    }

    /// Get a zero-copy view of X positions, indexed by node slot.
    ///
    /// # Safety
    ///
    /// The returned view is invalidated if any Rust allocation occurs.
    /// Use immediately for GPU upload, do not store.
    #[wasm_bindgen(js_name = getPositionsXView)]
    pub fn get_positions_x_view(&self) -> Float32Array {
        unsafe { Float32Array::view(self.engine.positions_x()) }
    }

    /// Get a zero-copy view of Y positions, indexed by node slot.
    ///
    /// # Safety
    ///
    /// The returned view is invalidated if any Rust allocation occurs.
    /// Use immediately for GPU upload, do not store.
    #[wasm_bindgen(js_name = getPositionsYView)]
    pub fn get_positions_y_view(&self) -> Float32Array {
        unsafe { Float32Array::view(self.engine.positions_y()) }
    }

    /// Get a pointer to the X positions buffer, for re-creating views after
    /// WASM memory growth.
    #[wasm_bindgen(js_name = positionsXPtr)]
    pub fn positions_x_ptr(&self) -> *const f32 {
        self.engine.positions_x().as_ptr()
    }

    /// Get the length of the positions buffer.
    #[wasm_bindgen(js_name = positionsLen)]
    pub fn positions_len(&self) -> usize {
        self.engine.positions_x().len()
    }

    /// Get the bounding box of all nodes as [min_x, min_y, max_x, max_y],
    /// or None if the graph is empty. Rendering hosts use this for viewport
    /// transforms.
    #[wasm_bindgen(js_name = getBounds)]
    pub fn get_bounds(&self) -> Option<Vec<f32>> {
        self.engine
            .bounds()
            .map(|(min_x, min_y, max_x, max_y)| vec![min_x, min_y, max_x, max_y])
    }

    // =========================================================================
    // Layout
    // =========================================================================

    /// Select the active layout strategy by name:
    /// `random | grid | fruchterman_reingold | barnes_hut | spring`.
    ///
    /// `config` is an optional plain object matching the strategy's config
    /// struct; omitted fields take their defaults.
    #[wasm_bindgen(js_name = useLayout)]
    pub fn use_layout(&mut self, algorithm: &str, config: JsValue) -> Result<(), JsValue> {
        let layout: Box<dyn Layout> = match algorithm {
            "random" => Box::new(RandomLayout::new(parse_config(config)?)),
            "grid" => Box::new(GridLayout::new(parse_config(config)?)),
            "fruchterman_reingold" => {
                Box::new(FruchtermanReingold::new(&self.engine, parse_config(config)?))
            }
            "barnes_hut" => Box::new(BarnesHut::new(&self.engine, parse_config(config)?)),
            "spring" => Box::new(Spring::new(&self.engine, parse_config(config)?)),
            other => {
                return Err(JsValue::from_str(&format!(
                    "unknown layout algorithm: {other}"
                )));
            }
        };
        self.active = Some(layout);
        self.cancel = CancelToken::new();
        Ok(())
    }

    /// Advance the active layout one step. Returns true once converged.
    #[wasm_bindgen(js_name = stepLayout)]
    pub fn step_layout(&mut self) -> Result<bool, JsValue> {
        match self.active.as_deref_mut() {
            Some(layout) => Ok(layout.advance_one_step(&mut self.engine)),
            None => Err(JsValue::from_str("no active layout; call useLayout first")),
        }
    }

    /// Drive the active layout until convergence, the step budget, or
    /// cancellation. Returns the number of steps executed.
    #[wasm_bindgen(js_name = runLayout)]
    pub fn run_layout(&mut self, max_steps: u32) -> Result<u32, JsValue> {
        let Some(active) = self.active.as_deref_mut() else {
            return Err(JsValue::from_str("no active layout; call useLayout first"));
        };
        let outcome = layout::run(active, &mut self.engine, max_steps, &self.cancel);
        if outcome.converged {
            log(&format!("layout converged after {} steps", outcome.steps));
        }
        if outcome.cancelled {
            // Arm a fresh token so the next run is not stillborn.
            self.cancel = CancelToken::new();
        }
        Ok(outcome.steps)
    }

    /// Request cooperative cancellation of the driver loop. Takes effect at
    /// the next step boundary.
    #[wasm_bindgen(js_name = cancelLayout)]
    pub fn cancel_layout(&self) {
        self.cancel.cancel();
    }

    /// Whether the active layout has converged.
    #[wasm_bindgen(js_name = layoutConverged)]
    pub fn layout_converged(&self) -> bool {
        self.active.as_deref().map(|l| l.converged()).unwrap_or(false)
    }

    /// Accumulated system energy of the last step.
    #[wasm_bindgen(js_name = layoutEnergy)]
    pub fn layout_energy(&self) -> f32 {
        self.active.as_deref().map(|l| l.energy()).unwrap_or(0.0)
    }

    /// Current step size ("advance"/temperature) of the active layout.
    #[wasm_bindgen(js_name = layoutStepSize)]
    pub fn layout_step_size(&self) -> f32 {
        self.active.as_deref().map(|l| l.step_size()).unwrap_or(0.0)
    }

    // =========================================================================
    // Traversal
    // =========================================================================

    /// Compute the BFS discovery tree and layering from a seed node (the
    /// first node when omitted). Returns `{root, order, edges, layers}`, or
    /// null for an empty graph / unknown seed.
    #[wasm_bindgen(js_name = computeBfsTree)]
    pub fn compute_bfs_tree(&self, seed: Option<String>) -> Result<JsValue, JsValue> {
        match bfs_tree(&self.engine, seed.as_deref()) {
            Some(tree) => {
                serde_wasm_bindgen::to_value(&tree).map_err(|e| JsValue::from_str(&e.to_string()))
            }
            None => Ok(JsValue::NULL),
        }
    }

    /// Compute the DFS discovery tree and layering from a seed node (the
    /// first node when omitted). Returns `{root, order, edges, layers}`, or
    /// null for an empty graph / unknown seed.
    #[wasm_bindgen(js_name = computeDfsTree)]
    pub fn compute_dfs_tree(&self, seed: Option<String>) -> Result<JsValue, JsValue> {
        match dfs_tree(&self.engine, seed.as_deref()) {
            Some(tree) => {
                serde_wasm_bindgen::to_value(&tree).map_err(|e| JsValue::from_str(&e.to_string()))
            }
            None => Ok(JsValue::NULL),
        }
    }
}

impl Default for MagnetGraphWasm {
    fn default() -> Self {
        Self::new()
    }
}
