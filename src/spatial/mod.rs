//! Spatial partitioning for the Barnes-Hut approximation.
//!
//! This module provides a region quadtree with bottom-up mass aggregation.
//! The tree is rebuilt from current node positions every Barnes-Hut step and
//! discarded afterwards; it has no life beyond one step.

mod quadtree;

pub use quadtree::{Circle, QuadPoint, QuadTree, QueryRange, Rect};
