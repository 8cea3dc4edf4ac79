//! Layers: one generation's geometry plus its metadata.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::mesh::buffer::{MaterialHints, MeshBuffer};
use crate::scene::bounds::Aabb;

/// The conventional scene volume handed to every generation.
///
/// The core treats it as an opaque constant: it becomes the `SCENE_*`
/// bindings inside the sandbox and is never mutated or enforced against
/// emitted geometry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SceneBounds {
    pub min: Vec3,
    pub max: Vec3,
    pub center: Vec3,
}

impl SceneBounds {
    #[must_use]
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self {
            min,
            max,
            center: (min + max) * 0.5,
        }
    }
}

impl Default for SceneBounds {
    /// The conventional volume: X ∈ [−3, 3], Y ∈ [−1.5, 1.5], Z ∈ [−6, −1],
    /// ground plane at Y = −1.5, center at (0, 0, −3).
    fn default() -> Self {
        Self::new(Vec3::new(-3.0, -1.5, -6.0), Vec3::new(3.0, 1.5, -1.0))
    }
}

/// One committed generation: an owned triangle soup plus everything the
/// renderer and the next LLM turn need to know about it.
///
/// Layers are independent; removing one never alters another. Ids are
/// assigned by the store and never reused.
#[derive(Debug)]
pub struct Layer {
    pub id: String,
    pub description: String,
    pub mesh: MeshBuffer,
    pub material: MaterialHints,
    pub bounds: Aabb,
    pub vertex_count: u32,
}

impl Layer {
    /// Packages a drained mesh into a layer, computing bounds and counts.
    #[must_use]
    pub fn new(id: String, description: String, mesh: MeshBuffer, material: MaterialHints) -> Self {
        let bounds = Aabb::from_positions(mesh.positions());
        let vertex_count = mesh.vertex_count();
        Self {
            id,
            description,
            mesh,
            material,
            bounds,
            vertex_count,
        }
    }

    /// Snapshot for the LLM-facing scene summary.
    #[must_use]
    pub fn meta(&self) -> LayerMeta {
        LayerMeta {
            id: self.id.clone(),
            description: self.description.clone(),
            bounds: self.bounds,
            vertex_count: self.vertex_count,
        }
    }

    // ========================================================================
    // Render-facing data
    // ========================================================================

    #[must_use]
    pub fn positions(&self) -> &[f32] {
        self.mesh.positions()
    }

    #[must_use]
    pub fn colors(&self) -> &[f32] {
        self.mesh.colors()
    }

    /// Per-vertex normals; meaningful only when
    /// [`has_custom_normals`](Self::has_custom_normals) is true, otherwise
    /// the renderer synthesizes face normals.
    #[must_use]
    pub fn normals(&self) -> &[f32] {
        self.mesh.normals()
    }

    #[must_use]
    pub fn has_custom_normals(&self) -> bool {
        self.mesh.has_custom_normals()
    }
}

/// Derived, shareable summary of a layer. Holds no mesh memory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerMeta {
    pub id: String,
    pub description: String,
    pub bounds: Aabb,
    pub vertex_count: u32,
}
