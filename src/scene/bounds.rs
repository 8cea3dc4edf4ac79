//! Axis-aligned bounds and the box-vs-box measurements behind spatial
//! analysis.

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// A scene axis, reported as a single character in host-facing output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Axis {
    X,
    Y,
    Z,
}

/// Axis-aligned bounding box with a precomputed center.
///
/// The all-zero box is the canonical representation of "no geometry";
/// layers with empty meshes carry it instead of an infinite or inverted
/// box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
    pub center: Vec3,
}

impl Aabb {
    /// The empty (all-zero) box.
    pub const ZERO: Aabb = Aabb {
        min: Vec3::ZERO,
        max: Vec3::ZERO,
        center: Vec3::ZERO,
    };

    #[must_use]
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self {
            min,
            max,
            center: (min + max) * 0.5,
        }
    }

    /// Scans a flat `[x, y, z, x, y, z, ...]` position stream. Empty input
    /// yields [`Aabb::ZERO`].
    #[must_use]
    pub fn from_positions(positions: &[f32]) -> Self {
        if positions.len() < 3 {
            return Self::ZERO;
        }
        let mut min = Vec3::splat(f32::INFINITY);
        let mut max = Vec3::splat(f32::NEG_INFINITY);
        for chunk in positions.chunks_exact(3) {
            let p = Vec3::new(chunk[0], chunk[1], chunk[2]);
            min = min.min(p);
            max = max.max(p);
        }
        Self::new(min, max)
    }

    #[must_use]
    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    #[must_use]
    pub fn union(&self, other: &Aabb) -> Aabb {
        Aabb::new(self.min.min(other.min), self.max.max(other.max))
    }

    /// True when the boxes share positive volume on every axis.
    #[must_use]
    pub fn overlaps(&self, other: &Aabb) -> bool {
        self.penetration(other).is_some()
    }

    /// Separating gap between two non-overlapping boxes: the axis with the
    /// largest positive separation and its magnitude. Touching or
    /// overlapping boxes report a zero-magnitude gap on the least-bad axis.
    #[must_use]
    pub fn gap(&self, other: &Aabb) -> (Axis, f32) {
        let mut best = (Axis::X, f32::NEG_INFINITY);
        for (axis, a_min, a_max, b_min, b_max) in self.axis_spans(other) {
            let gap = (a_min - b_max).max(b_min - a_max).max(0.0);
            if gap > best.1 {
                best = (axis, gap);
            }
        }
        best
    }

    /// Penetration depth of two overlapping boxes: the shallowest positive
    /// overlap and its axis. `None` when any axis fails to overlap.
    #[must_use]
    pub fn penetration(&self, other: &Aabb) -> Option<(Axis, f32)> {
        let mut best: Option<(Axis, f32)> = None;
        for (axis, a_min, a_max, b_min, b_max) in self.axis_spans(other) {
            let overlap = a_max.min(b_max) - a_min.max(b_min);
            if overlap <= 0.0 {
                return None;
            }
            if best.is_none_or(|(_, depth)| overlap < depth) {
                best = Some((axis, overlap));
            }
        }
        best
    }

    #[must_use]
    pub fn center_distance(&self, other: &Aabb) -> f32 {
        self.center.distance(other.center)
    }

    fn axis_spans(&self, other: &Aabb) -> [(Axis, f32, f32, f32, f32); 3] {
        [
            (Axis::X, self.min.x, self.max.x, other.min.x, other.max.x),
            (Axis::Y, self.min.y, self.max.y, other.min.y, other.max.y),
            (Axis::Z, self.min.z, self.max.z, other.min.z, other.max.z),
        ]
    }
}

impl Default for Aabb {
    fn default() -> Self {
        Self::ZERO
    }
}
