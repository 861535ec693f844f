//! Barnes-Hut force-directed layout.
//!
//! Same physical model as [`super::FruchtermanReingold`], but all-pairs
//! repulsion is approximated hierarchically: a quadtree is rebuilt from the
//! graph's extent every step, an aggregate pass fills per-region mass and
//! centroid, and distant regions act as single point-masses whenever
//! `size / distance < θ`. Region size is the geometric mean `sqrt(w·h)` of
//! the region rectangle.
//!
//! When a region is too close to aggregate, its own points contribute as
//! exact point-masses and its four children are recursed into, so θ → 0
//! degenerates to the exact direct sum.
//!
//! Convergence uses root-mean-square energy normalized by node count, since
//! the approximation introduces noise that a raw energy test would mistake
//! for motion. The threshold scales with the graph: min(c, n/100).

use serde::{Deserialize, Serialize};

use super::{Canvas, CoolingSchedule, Layout, attraction, ideal_edge_length, repulsion};
use crate::graph::GraphEngine;
use crate::spatial::{QuadPoint, QuadTree};
use crate::vec2::Vec2;

/// Configuration for [`BarnesHut`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct BarnesHutConfig {
    pub canvas: Canvas,
    /// Explicit ideal edge length `k`; derived from the canvas and node
    /// count when absent.
    pub ideal_edge_length: Option<f32>,
    /// Aggregation threshold θ: regions with size/distance below it act as
    /// one point-mass. Lower is more exact, higher is faster.
    pub theta: f32,
    /// Quadtree leaf capacity (points per region before subdividing).
    pub leaf_capacity: usize,
    /// Cooling factor t.
    pub cooling_factor: f32,
    /// Initial step size ("advance").
    pub initial_step: f32,
    /// Consecutive energy improvements required before cooling.
    pub progress_window: u32,
    /// Upper bound for the node-count-scaled convergence threshold.
    pub convergence_constant: f32,
}

impl Default for BarnesHutConfig {
    fn default() -> Self {
        Self {
            canvas: Canvas::default(),
            ideal_edge_length: None,
            theta: 1.0,
            leaf_capacity: 6,
            cooling_factor: 0.95,
            initial_step: 25.0,
            progress_window: 5,
            convergence_constant: 3.0,
        }
    }
}

/// The O(n log n) approximate force simulation.
pub struct BarnesHut {
    k: f32,
    theta: f32,
    leaf_capacity: usize,
    step: f32,
    cooling: CoolingSchedule,
    convergence_constant: f32,
    energy: f32,
    converged: bool,
}

impl BarnesHut {
    pub fn new(graph: &GraphEngine, config: BarnesHutConfig) -> Self {
        let k = config
            .ideal_edge_length
            .unwrap_or_else(|| ideal_edge_length(config.canvas, graph.node_count() as usize));
        Self {
            k,
            theta: config.theta,
            leaf_capacity: config.leaf_capacity,
            step: config.initial_step,
            cooling: CoolingSchedule::new(config.cooling_factor, config.progress_window),
            convergence_constant: config.convergence_constant,
            energy: f32::INFINITY,
            converged: false,
        }
    }

    /// Build the step's quadtree over the graph's current extent and fill
    /// its aggregates. All positions lie within the extent by construction,
    /// so no insertion is rejected here.
    pub fn build_tree(&self, graph: &GraphEngine) -> QuadTree {
        let mut tree = QuadTree::new(graph.extent(), self.leaf_capacity);
        for slot in 0..graph.node_count() as usize {
            tree.insert(QuadPoint::new(graph.position(slot), slot as u32));
        }
        tree.compute_aggregates();
        tree
    }

    /// Approximate repulsion on a point from everything inside `region`.
    pub fn repulsion_at(&self, region: &QuadTree, pos: Vec2) -> Vec2 {
        if region.mass() <= 0.0 {
            return Vec2::ZERO;
        }

        let delta = pos - region.center_of_mass();
        let r = delta.length();
        if r <= 0.0 {
            return Vec2::ZERO;
        }

        let bounds = region.bounds();
        let size = (bounds.width() * bounds.height()).sqrt();

        match region.children() {
            Some(children) if size / r >= self.theta => {
                // Too close to aggregate: own points exactly, children
                // recursively.
                let mut force = Vec2::ZERO;
                for p in region.own_points() {
                    let delta = pos - p.pos;
                    let d = delta.length();
                    if d > 0.0 {
                        force += delta * (repulsion(self.k, d) / d);
                    }
                }
                for child in children.iter() {
                    force += self.repulsion_at(child, pos);
                }
                force
            }
            // Leaf, or far enough away: the whole region is one point-mass
            // at its centroid.
            _ => delta * (repulsion(self.k, r) * region.mass() / r),
        }
    }
}

impl Layout for BarnesHut {
    fn advance_one_step(&mut self, graph: &mut GraphEngine) -> bool {
        if self.converged {
            return true;
        }

        let n = graph.node_count() as usize;
        if n == 0 {
            self.converged = true;
            return true;
        }

        let tree = self.build_tree(graph);
        let previous_energy = self.energy;
        self.energy = 0.0;

        // Repulsion via the tree; replaces the displacement outright.
        for v in 0..n {
            let force = self.repulsion_at(&tree, graph.position(v));
            graph.set_displacement(v, force);
        }

        // Attraction: each edge pulls its endpoints together.
        for (a, b) in graph.edge_slot_pairs() {
            let delta = graph.position(a) - graph.position(b);
            let d = delta.length();
            if d > 0.0 {
                let f = delta * (attraction(self.k, d) / d);
                graph.add_displacement(a, -f);
                graph.add_displacement(b, f);
            }
        }

        // Move, clamped to the step size.
        for v in 0..n {
            let disp = graph.displacement(v);
            let m = disp.length();
            self.energy += m * m;
            if m <= 0.0 || graph.is_pinned_slot(v) {
                continue;
            }
            graph.set_position(v, graph.position(v) + disp.clamp_length(self.step));
        }

        // Convergence is tested against this step's energy, before cooling.
        let rms = self.energy.sqrt() / (n as f32 * 10.0);
        let threshold = self.convergence_constant.min(n as f32 / 100.0);
        if rms < threshold || self.step < 1.0 {
            self.converged = true;
        }

        self.cooling
            .update(&mut self.step, self.energy, previous_energy);

        self.converged
    }

    fn converged(&self) -> bool {
        self.converged
    }

    fn energy(&self) -> f32 {
        self.energy
    }

    fn step_size(&self) -> f32 {
        self.step
    }
}
