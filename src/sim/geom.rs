//! Planar geometry for blocks and static bodies
//!
//! Every body occupies an axis-aligned footprint on the play plane:
//! - center: position of the body
//! - half_extents: half width/height (zero for point-like bodies)

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Fixed slide direction of a block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    /// Unit vector on the play plane (+y is Up)
    #[inline]
    pub fn vector(self) -> Vec2 {
        match self {
            Direction::Up => Vec2::Y,
            Direction::Down => Vec2::NEG_Y,
            Direction::Left => Vec2::NEG_X,
            Direction::Right => Vec2::X,
        }
    }
}

/// Axis-aligned footprint of a body
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Footprint {
    pub center: Vec2,
    pub half_extents: Vec2,
}

impl Footprint {
    pub fn new(center: Vec2, half_extents: Vec2) -> Self {
        Self {
            center,
            half_extents: half_extents.abs(),
        }
    }

    /// A zero-size footprint
    pub fn point(center: Vec2) -> Self {
        Self::new(center, Vec2::ZERO)
    }

    #[inline]
    pub fn min(&self) -> Vec2 {
        self.center - self.half_extents
    }

    #[inline]
    pub fn max(&self) -> Vec2 {
        self.center + self.half_extents
    }

    /// Check if a point is inside (boundary included)
    pub fn contains(&self, p: Vec2) -> bool {
        let d = (p - self.center).abs();
        d.x <= self.half_extents.x && d.y <= self.half_extents.y
    }

    /// Parametric span `(t_enter, t_exit)` where the infinite line
    /// `origin + dir * t` overlaps this footprint (slab method).
    ///
    /// `dir` must be a unit vector. Returns `None` if the line misses. The
    /// boundary counts as overlap, so zero-size footprints lying exactly on the
    /// line are found.
    pub fn ray_span(&self, origin: Vec2, dir: Vec2) -> Option<(f32, f32)> {
        let min = self.min();
        let max = self.max();
        let mut t_enter = f32::NEG_INFINITY;
        let mut t_exit = f32::INFINITY;

        for axis in 0..2 {
            let o = origin[axis];
            let d = dir[axis];
            if d.abs() < 1e-6 {
                // Parallel to this slab: must already be inside it
                if o < min[axis] || o > max[axis] {
                    return None;
                }
            } else {
                let t1 = (min[axis] - o) / d;
                let t2 = (max[axis] - o) / d;
                let (near, far) = if t1 <= t2 { (t1, t2) } else { (t2, t1) };
                t_enter = t_enter.max(near);
                t_exit = t_exit.min(far);
                if t_enter > t_exit {
                    return None;
                }
            }
        }

        Some((t_enter, t_exit))
    }
}
