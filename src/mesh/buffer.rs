//! Growable vertex streams and the emitter contract.
//!
//! A [`MeshBuffer`] is the only way procedural code produces geometry: three
//! parallel `f32` arrays (positions, colors, normals) where vertices
//! `3k, 3k+1, 3k+2` form triangle `k`. There is no index buffer; every
//! triangle owns its vertices. Emitters take values, never references into
//! the buffer, so the doubling allocator is free to move storage.

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Default first allocation, in vertex slots.
pub const INITIAL_VERTEX_CAPACITY: usize = 300_000;

/// Renderer-agnostic triangle soup with per-vertex colors and normals.
///
/// Invariant: `positions.len() == colors.len() == normals.len()
/// == vertex_count * 3`. Normals are zero-filled until a caller supplies
/// one through [`emit_smooth_triangle`](Self::emit_smooth_triangle); the
/// `has_custom_normals` flag tells the renderer whether to synthesize face
/// normals instead.
#[derive(Debug)]
pub struct MeshBuffer {
    positions: Vec<f32>,
    colors: Vec<f32>,
    normals: Vec<f32>,
    vertex_count: u32,
    /// Current allocation in vertex slots
    capacity: usize,
    initial_capacity: usize,
    has_custom_normals: bool,
}

impl MeshBuffer {
    #[must_use]
    pub fn new() -> Self {
        Self::with_initial_capacity(INITIAL_VERTEX_CAPACITY)
    }

    /// Creates a buffer whose first allocation will hold `initial` vertices.
    ///
    /// Storage is not allocated until the first emission.
    #[must_use]
    pub fn with_initial_capacity(initial: usize) -> Self {
        Self {
            positions: Vec::new(),
            colors: Vec::new(),
            normals: Vec::new(),
            vertex_count: 0,
            capacity: 0,
            initial_capacity: initial.max(3),
            has_custom_normals: false,
        }
    }

    // ========================================================================
    // Emission
    // ========================================================================

    /// Emits one flat-shaded triangle. The color applies to all three
    /// vertices; normals stay zero and `has_custom_normals` is unchanged.
    pub fn emit_triangle(&mut self, p1: Vec3, p2: Vec3, p3: Vec3, color: Vec3) {
        self.ensure_capacity(3);
        for p in [p1, p2, p3] {
            self.push_vertex(p, Vec3::ZERO, color);
        }
    }

    /// Emits a quad as two triangles `(p1, p2, p3)` and `(p1, p3, p4)`,
    /// preserving the caller's winding.
    pub fn emit_quad(&mut self, p1: Vec3, p2: Vec3, p3: Vec3, p4: Vec3, color: Vec3) {
        self.emit_triangle(p1, p2, p3, color);
        self.emit_triangle(p1, p3, p4, color);
    }

    /// Emits one triangle with per-vertex normals and sets
    /// `has_custom_normals`.
    pub fn emit_smooth_triangle(
        &mut self,
        p1: Vec3,
        n1: Vec3,
        p2: Vec3,
        n2: Vec3,
        p3: Vec3,
        n3: Vec3,
        color: Vec3,
    ) {
        self.ensure_capacity(3);
        self.push_vertex(p1, n1, color);
        self.push_vertex(p2, n2, color);
        self.push_vertex(p3, n3, color);
        self.has_custom_normals = true;
    }

    fn push_vertex(&mut self, p: Vec3, n: Vec3, color: Vec3) {
        self.positions.extend_from_slice(&[p.x, p.y, p.z]);
        self.normals.extend_from_slice(&[n.x, n.y, n.z]);
        self.colors.extend_from_slice(&[color.x, color.y, color.z]);
        self.vertex_count += 1;
    }

    /// Doubles capacity until `additional` more vertices fit. The first
    /// allocation jumps straight to the configured initial capacity.
    fn ensure_capacity(&mut self, additional: usize) {
        let needed = self.vertex_count as usize + additional;
        if needed <= self.capacity {
            return;
        }
        let mut new_capacity = if self.capacity == 0 {
            self.initial_capacity
        } else {
            self.capacity
        };
        while new_capacity < needed {
            new_capacity *= 2;
        }
        if self.capacity > 0 {
            log::info!(
                "Expanding MeshBuffer capacity: {} -> {} vertices",
                self.capacity,
                new_capacity
            );
        }
        let floats = new_capacity * 3;
        self.positions.reserve_exact(floats - self.positions.len());
        self.colors.reserve_exact(floats - self.colors.len());
        self.normals.reserve_exact(floats - self.normals.len());
        self.capacity = new_capacity;
    }

    /// Moves every vertex of `other` onto the end of this buffer.
    pub fn append(&mut self, other: &MeshBuffer) {
        if other.vertex_count == 0 {
            return;
        }
        self.ensure_capacity(other.vertex_count as usize);
        self.positions.extend_from_slice(&other.positions);
        self.colors.extend_from_slice(&other.colors);
        self.normals.extend_from_slice(&other.normals);
        self.vertex_count += other.vertex_count;
        self.has_custom_normals |= other.has_custom_normals;
    }

    /// Drops all vertices but keeps the allocation.
    pub fn clear(&mut self) {
        self.positions.clear();
        self.colors.clear();
        self.normals.clear();
        self.vertex_count = 0;
        self.has_custom_normals = false;
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    #[must_use]
    pub fn vertex_count(&self) -> u32 {
        self.vertex_count
    }

    #[must_use]
    pub fn triangle_count(&self) -> u32 {
        self.vertex_count / 3
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vertex_count == 0
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[must_use]
    pub fn has_custom_normals(&self) -> bool {
        self.has_custom_normals
    }

    #[must_use]
    pub fn positions(&self) -> &[f32] {
        &self.positions
    }

    #[must_use]
    pub fn colors(&self) -> &[f32] {
        &self.colors
    }

    #[must_use]
    pub fn normals(&self) -> &[f32] {
        &self.normals
    }

    /// Reads back vertex `i` as a point.
    #[must_use]
    pub fn position(&self, i: u32) -> Option<Vec3> {
        let base = i.checked_mul(3)? as usize;
        let slice = self.positions.get(base..base + 3)?;
        Some(Vec3::new(slice[0], slice[1], slice[2]))
    }

    /// Reads back the normal of vertex `i`.
    #[must_use]
    pub fn normal(&self, i: u32) -> Option<Vec3> {
        let base = i.checked_mul(3)? as usize;
        let slice = self.normals.get(base..base + 3)?;
        Some(Vec3::new(slice[0], slice[1], slice[2]))
    }
}

impl Default for MeshBuffer {
    fn default() -> Self {
        Self::new()
    }
}

/// Optional PBR-ish surface parameters a snippet may set for its layer.
///
/// Unset fields are the renderer's concern; the engine never fills in
/// defaults. Later calls replace earlier values field by field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MaterialHints {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub roughness: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metalness: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f32>,
}

impl MaterialHints {
    /// Overlays `other`, keeping existing values where `other` is unset.
    pub fn merge(&mut self, other: MaterialHints) {
        if other.roughness.is_some() {
            self.roughness = other.roughness;
        }
        if other.metalness.is_some() {
            self.metalness = other.metalness;
        }
        if other.opacity.is_some() {
            self.opacity = other.opacity;
        }
    }
}
