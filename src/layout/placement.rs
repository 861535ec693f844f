//! Single-shot placements: random scatter and deterministic grid.
//!
//! Neither is a simulation. Both place every node on the first step and
//! report convergence immediately; subsequent steps change nothing.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use super::{Canvas, Layout};
use crate::graph::GraphEngine;
use crate::vec2::Vec2;

/// Configuration for [`RandomLayout`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct RandomConfig {
    pub canvas: Canvas,
    /// RNG seed; the same seed over the same graph reproduces the placement.
    pub seed: u64,
}

impl Default for RandomConfig {
    fn default() -> Self {
        Self {
            canvas: Canvas::default(),
            seed: 0,
        }
    }
}

/// Uniform random placement inside the canvas.
pub struct RandomLayout {
    canvas: Canvas,
    rng: StdRng,
    placed: bool,
}

impl RandomLayout {
    pub fn new(config: RandomConfig) -> Self {
        Self {
            canvas: config.canvas,
            rng: StdRng::seed_from_u64(config.seed),
            placed: false,
        }
    }
}

impl Layout for RandomLayout {
    fn advance_one_step(&mut self, graph: &mut GraphEngine) -> bool {
        if !self.placed {
            let half_w = self.canvas.width / 2.0;
            let half_h = self.canvas.height / 2.0;
            for slot in 0..graph.node_count() as usize {
                if graph.is_pinned_slot(slot) {
                    continue;
                }
                let x = self.rng.gen_range(-half_w..=half_w);
                let y = self.rng.gen_range(-half_h..=half_h);
                graph.set_position(slot, Vec2::new(x, y));
            }
            self.placed = true;
        }
        true
    }

    fn converged(&self) -> bool {
        self.placed
    }
}

/// Configuration for [`GridLayout`].
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    pub canvas: Canvas,
}

/// Near-square grid placement: side = ceil(sqrt(n)), cells spaced evenly
/// across the canvas in slot order.
pub struct GridLayout {
    canvas: Canvas,
    placed: bool,
}

impl GridLayout {
    pub fn new(config: GridConfig) -> Self {
        Self {
            canvas: config.canvas,
            placed: false,
        }
    }
}

impl Layout for GridLayout {
    fn advance_one_step(&mut self, graph: &mut GraphEngine) -> bool {
        if !self.placed {
            let n = graph.node_count() as usize;
            if n > 0 {
                let side = (n as f32).sqrt().ceil() as usize;
                let cell_w = self.canvas.width / side as f32;
                let cell_h = self.canvas.height / side as f32;
                let half_w = self.canvas.width / 2.0;
                let half_h = self.canvas.height / 2.0;

                for slot in 0..n {
                    if graph.is_pinned_slot(slot) {
                        continue;
                    }
                    let col = slot % side;
                    let row = slot / side;
                    let x = -half_w + (col as f32 + 0.5) * cell_w;
                    let y = -half_h + (row as f32 + 0.5) * cell_h;
                    graph.set_position(slot, Vec2::new(x, y));
                }
            }
            self.placed = true;
        }
        true
    }

    fn converged(&self) -> bool {
        self.placed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph_with_nodes(n: usize) -> GraphEngine {
        let mut g = GraphEngine::new();
        for i in 0..n {
            g.add_node(&format!("n{i}"));
        }
        g
    }

    #[test]
    fn test_random_converges_immediately() {
        let mut g = graph_with_nodes(5);
        let mut layout = RandomLayout::new(RandomConfig::default());
        assert!(!layout.converged());
        assert!(layout.advance_one_step(&mut g));
        assert!(layout.converged());
    }

    #[test]
    fn test_random_places_within_canvas() {
        let mut g = graph_with_nodes(50);
        let config = RandomConfig {
            canvas: Canvas::new(200.0, 100.0),
            seed: 7,
        };
        let mut layout = RandomLayout::new(config);
        layout.advance_one_step(&mut g);

        for slot in 0..50 {
            let p = g.position(slot);
            assert!(p.x >= -100.0 && p.x <= 100.0);
            assert!(p.y >= -50.0 && p.y <= 50.0);
        }
    }

    #[test]
    fn test_random_deterministic_for_same_seed() {
        let mut a = graph_with_nodes(10);
        let mut b = graph_with_nodes(10);
        let config = RandomConfig {
            seed: 42,
            ..Default::default()
        };
        RandomLayout::new(config).advance_one_step(&mut a);
        RandomLayout::new(config).advance_one_step(&mut b);

        for slot in 0..10 {
            assert_eq!(a.position(slot), b.position(slot));
        }
    }

    #[test]
    fn test_random_second_step_is_noop() {
        let mut g = graph_with_nodes(5);
        let mut layout = RandomLayout::new(RandomConfig::default());
        layout.advance_one_step(&mut g);
        let before: Vec<_> = (0..5).map(|s| g.position(s)).collect();

        assert!(layout.advance_one_step(&mut g));
        for (slot, &p) in before.iter().enumerate() {
            assert_eq!(g.position(slot), p);
        }
    }

    #[test]
    fn test_random_respects_pinned() {
        let mut g = graph_with_nodes(3);
        g.set_position_of("n1", Vec2::new(123.0, 456.0));
        g.pin_node("n1");

        let mut layout = RandomLayout::new(RandomConfig::default());
        layout.advance_one_step(&mut g);
        assert_eq!(g.position_of("n1"), Some(Vec2::new(123.0, 456.0)));
    }

    #[test]
    fn test_grid_near_square_side() {
        let mut g = graph_with_nodes(10);
        let config = GridConfig {
            canvas: Canvas::new(400.0, 400.0),
        };
        let mut layout = GridLayout::new(config);
        assert!(layout.advance_one_step(&mut g));

        // side = ceil(sqrt(10)) = 4, cell = 100: first node at (-150, -150),
        // fifth wraps to the second row.
        assert_eq!(g.position(0), Vec2::new(-150.0, -150.0));
        assert_eq!(g.position(3), Vec2::new(150.0, -150.0));
        assert_eq!(g.position(4), Vec2::new(-150.0, -50.0));
    }

    #[test]
    fn test_grid_positions_distinct_and_in_canvas() {
        let mut g = graph_with_nodes(23);
        let mut layout = GridLayout::new(GridConfig::default());
        layout.advance_one_step(&mut g);

        let positions: Vec<_> = (0..23).map(|s| g.position(s)).collect();
        for (i, a) in positions.iter().enumerate() {
            assert!(a.x.abs() <= 500.0 && a.y.abs() <= 500.0);
            for b in &positions[i + 1..] {
                assert_ne!(a, b, "grid produced coincident nodes");
            }
        }
    }

    #[test]
    fn test_grid_empty_graph() {
        let mut g = GraphEngine::new();
        let mut layout = GridLayout::new(GridConfig::default());
        assert!(layout.advance_one_step(&mut g));
    }
}
