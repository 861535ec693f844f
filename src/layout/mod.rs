//! Layout strategies for graph visualization.
//!
//! Five interchangeable strategies implement the [`Layout`] trait's
//! step-based contract: [`RandomLayout`] and [`GridLayout`] are single-shot
//! placements, [`FruchtermanReingold`] is the direct O(n²) force simulation,
//! [`BarnesHut`] approximates repulsion through a quadtree for O(n log n)
//! scaling, and [`Spring`] is the Eades spring embedder. A driver loop
//! ([`run`]) advances the active strategy until convergence, a step budget,
//! or cooperative cancellation.
//!
//! Every step is a pure, bounded CPU computation that mutates node positions
//! in place and never fails: degenerate geometry (coincident nodes,
//! zero-length edges) contributes zero force instead of raising.

pub mod barnes_hut;
pub mod fruchterman_reingold;
pub mod placement;
pub mod spring;

pub use barnes_hut::{BarnesHut, BarnesHutConfig};
pub use fruchterman_reingold::{FruchtermanReingold, FruchtermanReingoldConfig};
pub use placement::{GridConfig, GridLayout, RandomConfig, RandomLayout};
pub use spring::{Spring, SpringConfig};

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::graph::GraphEngine;

/// The virtual drawing area layouts place nodes into, centered on the
/// origin. Also the basis for the ideal edge length `k`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Canvas {
    pub width: f32,
    pub height: f32,
}

impl Default for Canvas {
    fn default() -> Self {
        Self {
            width: 1000.0,
            height: 1000.0,
        }
    }
}

impl Canvas {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    #[inline]
    pub fn area(self) -> f32 {
        self.width * self.height
    }
}

/// Ideal edge length for a canvas and node count. The node count is coerced
/// to at least 1.
pub(crate) fn ideal_edge_length(canvas: Canvas, node_count: usize) -> f32 {
    (canvas.area() / node_count.max(1) as f32).sqrt()
}

/// Repulsion kernel: k²/d.
#[inline]
pub(crate) fn repulsion(k: f32, d: f32) -> f32 {
    (k * k) / d
}

/// Attraction kernel: d²/k.
#[inline]
pub(crate) fn attraction(k: f32, d: f32) -> f32 {
    (d * d) / k
}

/// Fletcher (2000) cooling: shrink the step size only after `window`
/// consecutive energy improvements, or immediately when energy regresses.
/// An isolated improvement never cools.
#[derive(Debug, Clone)]
pub(crate) struct CoolingSchedule {
    factor: f32,
    window: u32,
    progress: u32,
}

impl CoolingSchedule {
    pub(crate) fn new(factor: f32, window: u32) -> Self {
        Self {
            factor,
            window: window.max(1),
            progress: 0,
        }
    }

    pub(crate) fn update(&mut self, step_size: &mut f32, energy: f32, previous_energy: f32) {
        if energy < previous_energy {
            self.progress += 1;
            if self.progress >= self.window {
                self.progress = 0;
                *step_size *= self.factor;
            }
        } else {
            self.progress = 0;
            *step_size *= self.factor;
        }
    }
}

/// The uniform strategy contract: advance one simulation step, mutating node
/// positions in place, and report whether the layout has converged.
///
/// Convergence is terminal: once a strategy reports `true`, further steps
/// are no-ops that keep returning `true`. [`Spring`] is the exception: it
/// never converges and must be stopped externally.
pub trait Layout {
    /// Run one step against the graph. Returns true once converged.
    fn advance_one_step(&mut self, graph: &mut GraphEngine) -> bool;

    /// Whether the strategy has reached its terminal state.
    fn converged(&self) -> bool;

    /// Accumulated system energy of the last step (sum of squared
    /// displacement magnitudes). A liveness observable for hosts.
    fn energy(&self) -> f32 {
        0.0
    }

    /// Current step-size ("advance"/temperature). A liveness observable: an
    /// underflow to exactly zero without convergence indicates starvation.
    fn step_size(&self) -> f32 {
        0.0
    }
}

/// Cooperative cancellation flag shared between a driver loop and its host.
///
/// Checked once per step, before the step runs, so a step always completes
/// fully before cancellation takes effect.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Takes effect at the next step boundary.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

/// Result of a [`run`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOutcome {
    /// Steps actually executed.
    pub steps: u32,
    /// Whether the strategy reported convergence.
    pub converged: bool,
    /// Whether the loop stopped because the token was cancelled.
    pub cancelled: bool,
}

/// Drive a layout to convergence, a step budget, or cancellation.
///
/// This is a tight loop with no yielding; interactive hosts should run it on
/// a background worker, or call `advance_one_step` themselves at whatever
/// cadence suits them.
pub fn run(
    layout: &mut dyn Layout,
    graph: &mut GraphEngine,
    max_steps: u32,
    cancel: &CancelToken,
) -> RunOutcome {
    let mut steps = 0;
    while steps < max_steps {
        if cancel.is_cancelled() {
            return RunOutcome {
                steps,
                converged: layout.converged(),
                cancelled: true,
            };
        }
        let converged = layout.advance_one_step(graph);
        steps += 1;
        if converged {
            return RunOutcome {
                steps,
                converged: true,
                cancelled: false,
            };
        }
    }
    RunOutcome {
        steps,
        converged: layout.converged(),
        cancelled: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct CountingLayout {
        steps_until_converged: u32,
        steps_seen: u32,
    }

    impl Layout for CountingLayout {
        fn advance_one_step(&mut self, _graph: &mut GraphEngine) -> bool {
            self.steps_seen += 1;
            self.converged()
        }

        fn converged(&self) -> bool {
            self.steps_seen >= self.steps_until_converged
        }
    }

    #[test]
    fn test_ideal_edge_length_coerces_node_count() {
        let canvas = Canvas::new(100.0, 100.0);
        // Zero nodes must not divide by zero.
        assert_eq!(ideal_edge_length(canvas, 0), 100.0);
        assert_eq!(ideal_edge_length(canvas, 4), 50.0);
    }

    #[test]
    fn test_cooling_requires_sustained_improvement() {
        let mut schedule = CoolingSchedule::new(0.5, 5);
        let mut step = 10.0;

        // Four improvements in a row: no cooling yet.
        for i in 0..4 {
            schedule.update(&mut step, 10.0 - i as f32, 11.0 - i as f32);
            assert_eq!(step, 10.0);
        }
        // Fifth consecutive improvement cools.
        schedule.update(&mut step, 5.0, 6.0);
        assert_eq!(step, 5.0);
    }

    #[test]
    fn test_cooling_immediate_on_regression() {
        let mut schedule = CoolingSchedule::new(0.5, 5);
        let mut step = 10.0;

        schedule.update(&mut step, 5.0, 4.0);
        assert_eq!(step, 5.0);

        // The regression also reset the progress counter: a single
        // improvement afterwards must not cool again.
        schedule.update(&mut step, 3.0, 4.0);
        assert_eq!(step, 5.0);
    }

    #[test]
    fn test_run_until_converged() {
        let mut graph = GraphEngine::new();
        let mut layout = CountingLayout {
            steps_until_converged: 3,
            steps_seen: 0,
        };
        let outcome = run(&mut layout, &mut graph, 100, &CancelToken::new());
        assert_eq!(
            outcome,
            RunOutcome {
                steps: 3,
                converged: true,
                cancelled: false
            }
        );
    }

    #[test]
    fn test_run_step_budget() {
        let mut graph = GraphEngine::new();
        let mut layout = CountingLayout {
            steps_until_converged: u32::MAX,
            steps_seen: 0,
        };
        let outcome = run(&mut layout, &mut graph, 10, &CancelToken::new());
        assert_eq!(outcome.steps, 10);
        assert!(!outcome.converged);
        assert!(!outcome.cancelled);
    }

    #[test]
    fn test_run_cancellation_before_first_step() {
        let mut graph = GraphEngine::new();
        let mut layout = CountingLayout {
            steps_until_converged: u32::MAX,
            steps_seen: 0,
        };
        let cancel = CancelToken::new();
        cancel.cancel();
        let outcome = run(&mut layout, &mut graph, 10, &cancel);
        assert_eq!(outcome.steps, 0);
        assert!(outcome.cancelled);
        assert_eq!(layout.steps_seen, 0);
    }
}
