//! Eades spring embedder (1984).
//!
//! Edges act as logarithmic springs: the force along an edge is
//! `log10(d / natural_length) · force_scale`, attractive when stretched past
//! the natural length and repulsive when compressed. There is no steady-state
//! repulsion between non-adjacent nodes; instead, once the largest per-node
//! displacement falls below a threshold, a single one-shot expansion pass
//! applies inverse-distance repulsion between all pairs and scales it down
//! onto positions.
//!
//! This strategy never reports convergence: `advance_one_step` returns
//! false every step and the caller stops it externally (step budget or
//! cancellation).

use serde::{Deserialize, Serialize};

use super::{Canvas, Layout, ideal_edge_length, repulsion};
use crate::graph::GraphEngine;
use crate::vec2::Vec2;

/// Configuration for [`Spring`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct SpringConfig {
    pub canvas: Canvas,
    /// Explicit `k` for the expansion trigger and repulsion pass; derived
    /// from the canvas and node count when absent.
    pub ideal_edge_length: Option<f32>,
    /// Spring rest length (Eades' c2).
    pub natural_length: f32,
    /// Force multiplier (Eades' c4).
    pub force_scale: f32,
    /// Whether the one-shot expansion pass is armed.
    pub expansion: bool,
}

impl Default for SpringConfig {
    fn default() -> Self {
        Self {
            canvas: Canvas::default(),
            ideal_edge_length: None,
            natural_length: 25.0,
            force_scale: 10.0,
            expansion: true,
        }
    }
}

/// The Eades spring embedder.
pub struct Spring {
    k: f32,
    natural_length: f32,
    force_scale: f32,
    expansion_pending: bool,
    energy: f32,
}

impl Spring {
    pub fn new(graph: &GraphEngine, config: SpringConfig) -> Self {
        let k = config
            .ideal_edge_length
            .unwrap_or_else(|| ideal_edge_length(config.canvas, graph.node_count() as usize));
        Self {
            k,
            // Non-positive rest lengths would poison the logarithm.
            natural_length: config.natural_length.max(1e-6),
            force_scale: config.force_scale,
            expansion_pending: config.expansion,
            energy: 0.0,
        }
    }

    /// Whether the one-shot expansion pass has not fired yet.
    pub fn expansion_pending(&self) -> bool {
        self.expansion_pending
    }

    /// One-shot all-pairs inverse-distance repulsion, scaled down onto
    /// positions.
    fn expand(&self, graph: &mut GraphEngine) {
        let n = graph.node_count() as usize;
        graph.reset_displacements();

        for a in 0..n {
            let pa = graph.position(a);
            let mut disp = Vec2::ZERO;
            for b in 0..n {
                if a == b {
                    continue;
                }
                let delta = pa - graph.position(b);
                let d = delta.length();
                if d > 0.0 {
                    disp += delta * (repulsion(self.k, d) / d);
                }
            }
            graph.set_displacement(a, disp);
        }

        let scale = 0.1 / self.force_scale;
        for v in 0..n {
            if graph.is_pinned_slot(v) {
                continue;
            }
            let disp = graph.displacement(v);
            graph.set_position(v, graph.position(v) + disp * scale);
        }
    }
}

impl Layout for Spring {
    fn advance_one_step(&mut self, graph: &mut GraphEngine) -> bool {
        let n = graph.node_count() as usize;
        if n == 0 {
            return false;
        }

        graph.reset_displacements();

        // Spring force per edge. Zero-length edges are skipped: the log of a
        // non-positive ratio is not a force.
        for (a, b) in graph.edge_slot_pairs() {
            let delta = graph.position(a) - graph.position(b);
            let d = delta.length();
            if d <= 0.0 {
                continue;
            }
            let f = delta * ((d / self.natural_length).log10() * self.force_scale / d);
            graph.add_displacement(a, -f);
            graph.add_displacement(b, f);
        }

        // Move by the full displacement; no step clamp in this model.
        let mut max_disp = 0.0f32;
        self.energy = 0.0;
        for v in 0..n {
            let disp = graph.displacement(v);
            let m = disp.length();
            self.energy += m * m;
            max_disp = max_disp.max(m);
            if m <= 0.0 || graph.is_pinned_slot(v) {
                continue;
            }
            graph.set_position(v, graph.position(v) + disp);
        }

        if self.expansion_pending && max_disp * (n as f32) < self.k {
            self.expansion_pending = false;
            self.expand(graph);
        }

        false
    }

    fn converged(&self) -> bool {
        false
    }

    fn energy(&self) -> f32 {
        self.energy
    }
}
