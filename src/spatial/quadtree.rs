//! Region quadtree with mass aggregation for Barnes-Hut repulsion.
//!
//! The tree partitions a fixed bounding rectangle into four quadrants
//! (I = NE, II = NW, III = SW, IV = SE) whenever a region fills up. It is
//! build-once/read-many: the Barnes-Hut layout rebuilds it from scratch every
//! step because node positions change every step, so there are no delete or
//! rebalance operations.
//!
//! Aggregates (subtree point count as "mass" and the mass-weighted centroid)
//! are filled by a separate bottom-up pass after all insertions, not
//! maintained incrementally.

use crate::vec2::Vec2;

/// Subdivision stops at this depth; overfull regions at the cap simply keep
/// appending points. Bounds recursion when many points coincide.
const MAX_SUBDIVISION_DEPTH: u32 = 16;

/// Axis-aligned rectangle, normalized so `min_* <= max_*`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub min_x: f32,
    pub min_y: f32,
    pub max_x: f32,
    pub max_y: f32,
}

impl Rect {
    /// Create a rectangle from two corner points, in any order.
    pub fn new(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Self {
            min_x: x0.min(x1),
            min_y: y0.min(y1),
            max_x: x0.max(x1),
            max_y: y0.max(y1),
        }
    }

    #[inline]
    pub fn width(&self) -> f32 {
        self.max_x - self.min_x
    }

    #[inline]
    pub fn height(&self) -> f32 {
        self.max_y - self.min_y
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        Vec2::new(
            (self.min_x + self.max_x) / 2.0,
            (self.min_y + self.max_y) / 2.0,
        )
    }

    /// Boundary-inclusive point containment.
    #[inline]
    pub fn contains_point(&self, p: Vec2) -> bool {
        self.min_x <= p.x && p.x <= self.max_x && self.min_y <= p.y && p.y <= self.max_y
    }

    /// Rectangle overlap test (touching edges count as intersecting).
    #[inline]
    pub fn intersects_rect(&self, other: &Rect) -> bool {
        !(other.min_x > self.max_x
            || other.max_x < self.min_x
            || other.min_y > self.max_y
            || other.max_y < self.min_y)
    }
}

/// A circular query range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Circle {
    pub x: f32,
    pub y: f32,
    pub r: f32,
}

impl Circle {
    pub fn new(x: f32, y: f32, r: f32) -> Self {
        Self { x, y, r }
    }
}

/// Ranges accepted by [`QuadTree::query`].
pub trait QueryRange {
    fn contains(&self, p: Vec2) -> bool;
    fn intersects(&self, rect: &Rect) -> bool;
}

impl QueryRange for Rect {
    fn contains(&self, p: Vec2) -> bool {
        self.contains_point(p)
    }

    fn intersects(&self, rect: &Rect) -> bool {
        self.intersects_rect(rect)
    }
}

impl QueryRange for Circle {
    fn contains(&self, p: Vec2) -> bool {
        let dx = p.x - self.x;
        let dy = p.y - self.y;
        dx * dx + dy * dy <= self.r * self.r
    }

    fn intersects(&self, rect: &Rect) -> bool {
        // Distance from the center to the nearest point of the rectangle.
        let nx = self.x.clamp(rect.min_x, rect.max_x);
        let ny = self.y.clamp(rect.min_y, rect.max_y);
        let dx = self.x - nx;
        let dy = self.y - ny;
        dx * dx + dy * dy <= self.r * self.r
    }
}

/// A stored point: a position plus the owning node's slot index.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuadPoint {
    pub pos: Vec2,
    pub node: u32,
}

impl QuadPoint {
    pub fn new(pos: Vec2, node: u32) -> Self {
        Self { pos, node }
    }
}

/// A region quadtree node.
pub struct QuadTree {
    bounds: Rect,
    capacity: usize,
    depth: u32,
    points: Vec<QuadPoint>,
    children: Option<Box<[QuadTree; 4]>>,
    mass: f32,
    center_of_mass: Vec2,
}

impl QuadTree {
    /// Create an empty tree over `bounds`. A capacity below 1 is coerced to 1
    /// so subdivision always terminates.
    pub fn new(bounds: Rect, capacity: usize) -> Self {
        Self::with_depth(bounds, capacity.max(1), 0)
    }

    fn with_depth(bounds: Rect, capacity: usize, depth: u32) -> Self {
        Self {
            bounds,
            capacity,
            depth,
            points: Vec::new(),
            children: None,
            mass: 0.0,
            center_of_mass: Vec2::ZERO,
        }
    }

    #[inline]
    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    pub fn is_divided(&self) -> bool {
        self.children.is_some()
    }

    /// Points held directly by this region (not its children).
    #[inline]
    pub fn own_points(&self) -> &[QuadPoint] {
        &self.points
    }

    /// The four child quadrants (I..IV), if subdivided.
    #[inline]
    pub fn children(&self) -> Option<&[QuadTree; 4]> {
        self.children.as_deref()
    }

    /// Subtree point count, valid after [`QuadTree::compute_aggregates`].
    #[inline]
    pub fn mass(&self) -> f32 {
        self.mass
    }

    /// Subtree centroid, valid after [`QuadTree::compute_aggregates`].
    #[inline]
    pub fn center_of_mass(&self) -> Vec2 {
        self.center_of_mass
    }

    /// Insert a point. Returns `false` (without storing anything) if the
    /// point lies outside this region's rectangle.
    ///
    /// Once a region has reached capacity it subdivides lazily and delegates
    /// to the first child quadrant containing the point, tried in I, II, III,
    /// IV order. Boundary points may lie in more than one quadrant; the first
    /// match wins.
    pub fn insert(&mut self, point: QuadPoint) -> bool {
        if !self.bounds.contains_point(point.pos) {
            return false;
        }

        if self.points.len() < self.capacity || self.depth >= MAX_SUBDIVISION_DEPTH {
            self.points.push(point);
            return true;
        }

        if self.children.is_none() {
            self.subdivide();
        }

        let Some(children) = self.children.as_mut() else {
            return false;
        };
        children[0].insert(point)
            || children[1].insert(point)
            || children[2].insert(point)
            || children[3].insert(point)
    }

    /// Split this region at the midpoint of both axes.
    fn subdivide(&mut self) {
        let b = self.bounds;
        let c = b.center();
        let depth = self.depth + 1;

        self.children = Some(Box::new([
            // I: north-east
            Self::with_depth(Rect::new(c.x, c.y, b.max_x, b.max_y), self.capacity, depth),
            // II: north-west
            Self::with_depth(Rect::new(b.min_x, c.y, c.x, b.max_y), self.capacity, depth),
            // III: south-west
            Self::with_depth(Rect::new(b.min_x, b.min_y, c.x, c.y), self.capacity, depth),
            // IV: south-east
            Self::with_depth(Rect::new(c.x, b.min_y, b.max_x, c.y), self.capacity, depth),
        ]));
    }

    /// Collect every contained point that falls inside `range` into `found`,
    /// pruning subtrees whose rectangle does not intersect the range.
    ///
    /// The accumulator is caller-supplied and accumulates across calls; pass
    /// a fresh vector when an independent result set is required.
    pub fn query(&self, range: &impl QueryRange, found: &mut Vec<QuadPoint>) {
        if !range.intersects(&self.bounds) {
            return;
        }

        for p in &self.points {
            if range.contains(p.pos) {
                found.push(*p);
            }
        }

        if let Some(children) = &self.children {
            for child in children.iter() {
                child.query(range, found);
            }
        }
    }

    /// Bottom-up aggregate pass: fill `mass` and `center_of_mass` for every
    /// region from its own points and its children's aggregates.
    pub fn compute_aggregates(&mut self) {
        let mut mass = self.points.len() as f32;
        let mut weighted = Vec2::ZERO;
        for p in &self.points {
            weighted += p.pos;
        }

        if let Some(children) = self.children.as_mut() {
            for child in children.iter_mut() {
                child.compute_aggregates();
                if child.mass > 0.0 {
                    mass += child.mass;
                    weighted += child.center_of_mass * child.mass;
                }
            }
        }

        self.mass = mass;
        self.center_of_mass = if mass > 0.0 {
            weighted * (1.0 / mass)
        } else {
            Vec2::ZERO
        };
    }
}
