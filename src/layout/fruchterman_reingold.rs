//! Fruchterman-Reingold force-directed layout (1991), with the cooling
//! improvement described by R. Fletcher (2000).
//!
//! Direct O(n²) all-pairs repulsion plus per-edge attraction. Each step
//! moves every node along its accumulated displacement, clamped to the
//! current step size ("advance"), and the step size decays under the
//! Fletcher schedule: after five consecutive energy improvements, or
//! immediately when energy regresses. The step size is therefore
//! non-increasing over the whole run.

use serde::{Deserialize, Serialize};

use super::{Canvas, CoolingSchedule, Layout, attraction, ideal_edge_length, repulsion};
use crate::graph::GraphEngine;
use crate::vec2::Vec2;

/// Configuration for [`FruchtermanReingold`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct FruchtermanReingoldConfig {
    pub canvas: Canvas,
    /// Explicit ideal edge length `k`; derived from the canvas and node
    /// count when absent.
    pub ideal_edge_length: Option<f32>,
    /// Cooling factor t, multiplied into the step size when cooling.
    pub cooling_factor: f32,
    /// Initial step size ("advance").
    pub initial_step: f32,
    /// Converged once the summed movement magnitude, or the step size
    /// itself, drops below this.
    pub convergence_threshold: f32,
    /// Consecutive energy improvements required before cooling.
    pub progress_window: u32,
}

impl Default for FruchtermanReingoldConfig {
    fn default() -> Self {
        Self {
            canvas: Canvas::default(),
            ideal_edge_length: None,
            cooling_factor: 0.95,
            initial_step: 20.0,
            convergence_threshold: 1e-3,
            progress_window: 5,
        }
    }
}

/// The direct O(n²) force simulation.
pub struct FruchtermanReingold {
    k: f32,
    step: f32,
    threshold: f32,
    cooling: CoolingSchedule,
    energy: f32,
    converged: bool,
}

impl FruchtermanReingold {
    pub fn new(graph: &GraphEngine, config: FruchtermanReingoldConfig) -> Self {
        let k = config
            .ideal_edge_length
            .unwrap_or_else(|| ideal_edge_length(config.canvas, graph.node_count() as usize));
        Self {
            k,
            step: config.initial_step,
            threshold: config.convergence_threshold,
            cooling: CoolingSchedule::new(config.cooling_factor, config.progress_window),
            energy: f32::INFINITY,
            converged: false,
        }
    }

    /// The ideal edge length this instance settled on.
    pub fn ideal_edge_length(&self) -> f32 {
        self.k
    }
}

impl Layout for FruchtermanReingold {
    fn advance_one_step(&mut self, graph: &mut GraphEngine) -> bool {
        if self.converged {
            return true;
        }

        let n = graph.node_count() as usize;
        let previous_energy = self.energy;
        self.energy = 0.0;
        graph.reset_displacements();

        // Repulsion: every pair pushes apart. Coincident nodes contribute
        // nothing (zero-magnitude guard).
        for v in 0..n {
            let pv = graph.position(v);
            let mut disp = Vec2::ZERO;
            for u in 0..n {
                if u == v {
                    continue;
                }
                let delta = pv - graph.position(u);
                let d = delta.length();
                if d > 0.0 {
                    disp += delta * (repulsion(self.k, d) / d);
                }
            }
            graph.set_displacement(v, disp);
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

        // Move, clamped to the step size. Energy uses the raw displacement
        // magnitudes, before clamping.
        let mut motion = Vec2::ZERO;
        for v in 0..n {
            let disp = graph.displacement(v);
            let m = disp.length();
            self.energy += m * m;
            if m <= 0.0 || graph.is_pinned_slot(v) {
                continue;
            }
            let movement = disp.clamp_length(self.step);
            graph.set_position(v, graph.position(v) + movement);
            motion += movement;
        }

        self.cooling
            .update(&mut self.step, self.energy, previous_energy);

        if motion.length() < self.threshold || self.step < self.threshold {
            self.converged = true;
        }

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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::placement::{RandomConfig, RandomLayout};

    fn triangle() -> GraphEngine {
        let mut g = GraphEngine::new();
        g.add_edge("A->B", "A", "B");
        g.add_edge("B->C", "B", "C");
        g.add_edge("C->A", "C", "A");
        g.set_position_of("A", Vec2::new(0.0, 0.0));
        g.set_position_of("B", Vec2::new(1.0, 0.0));
        g.set_position_of("C", Vec2::new(0.0, 1.0));
        g
    }

    fn four_cycle() -> GraphEngine {
        let mut g = GraphEngine::new();
        g.add_edge("a->b", "a", "b");
        g.add_edge("b->c", "b", "c");
        g.add_edge("c->d", "c", "d");
        g.add_edge("d->a", "d", "a");
        g
    }

    #[test]
    fn test_triangle_step_moves_all_nodes_no_collapse() {
        let mut g = triangle();
        let before: Vec<_> = (0..3).map(|s| g.position(s)).collect();

        let config = FruchtermanReingoldConfig {
            ideal_edge_length: Some(50.0),
            initial_step: 20.0,
            ..Default::default()
        };
        let mut layout = FruchtermanReingold::new(&g, config);
        assert_eq!(layout.ideal_edge_length(), 50.0);
        layout.advance_one_step(&mut g);

        let after: Vec<_> = (0..3).map(|s| g.position(s)).collect();
        for (b, a) in before.iter().zip(&after) {
            assert_ne!(b, a, "every node must move");
            assert!(a.x.is_finite() && a.y.is_finite());
        }
        for i in 0..3 {
            for j in i + 1..3 {
                assert!(
                    (after[i] - after[j]).length() > 0.0,
                    "nodes {i} and {j} collapsed"
                );
            }
        }
    }

    #[test]
    fn test_step_size_non_increasing() {
        let mut g = four_cycle();
        RandomLayout::new(RandomConfig {
            seed: 1,
            ..Default::default()
        })
        .advance_one_step(&mut g);

        let mut layout = FruchtermanReingold::new(&g, FruchtermanReingoldConfig::default());
        let mut last = layout.step_size();
        for _ in 0..200 {
            if layout.advance_one_step(&mut g) {
                break;
            }
            let step = layout.step_size();
            assert!(step <= last, "step size increased: {step} > {last}");
            last = step;
        }
    }

    #[test]
    fn test_converges_on_four_cycle() {
        let mut g = four_cycle();
        RandomLayout::new(RandomConfig {
            seed: 3,
            ..Default::default()
        })
        .advance_one_step(&mut g);

        let config = FruchtermanReingoldConfig {
            cooling_factor: 0.9,
            ..Default::default()
        };
        let mut layout = FruchtermanReingold::new(&g, config);
        let mut steps = 0;
        while !layout.advance_one_step(&mut g) {
            steps += 1;
            assert!(steps < 1000, "did not converge within 1000 steps");
        }
        assert!(layout.converged());

        // No two nodes collapsed onto each other.
        for i in 0..4 {
            for j in i + 1..4 {
                assert!((g.position(i) - g.position(j)).length() > 0.0);
            }
        }

        // Terminal: further steps are no-ops.
        let frozen: Vec<_> = (0..4).map(|s| g.position(s)).collect();
        assert!(layout.advance_one_step(&mut g));
        for (slot, &p) in frozen.iter().enumerate() {
            assert_eq!(g.position(slot), p);
        }
    }

    #[test]
    fn test_coincident_nodes_stay_finite() {
        let mut g = GraphEngine::new();
        g.add_edge("a->b", "a", "b");
        // Both nodes at the exact same point: direction is undefined and
        // must be treated as zero force.
        g.set_position_of("a", Vec2::new(5.0, 5.0));
        g.set_position_of("b", Vec2::new(5.0, 5.0));

        let mut layout = FruchtermanReingold::new(&g, FruchtermanReingoldConfig::default());
        layout.advance_one_step(&mut g);

        for slot in 0..2 {
            let p = g.position(slot);
            assert!(p.x.is_finite() && p.y.is_finite());
        }
        assert!(layout.energy().is_finite());
    }

    #[test]
    fn test_pinned_node_never_moves() {
        let mut g = triangle();
        g.pin_node("A");
        let pinned = g.position_of("A").unwrap();

        let mut layout = FruchtermanReingold::new(&g, FruchtermanReingoldConfig::default());
        for _ in 0..20 {
            if layout.advance_one_step(&mut g) {
                break;
            }
        }
        assert_eq!(g.position_of("A"), Some(pinned));
    }

    #[test]
    fn test_single_node_converges() {
        let mut g = GraphEngine::new();
        g.add_node("only");
        let mut layout = FruchtermanReingold::new(&g, FruchtermanReingoldConfig::default());
        assert!(layout.advance_one_step(&mut g));
    }
}
