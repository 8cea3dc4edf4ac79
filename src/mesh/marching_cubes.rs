//! Iso-surface extraction with gradient normals.
//!
//! Samples a signed distance field on a dense `(R+1)³` grid, then walks the
//! `R³` cells emitting triangles from the verbatim lookup tables in
//! [`tables`](super::tables). Vertex normals come from central-difference
//! gradients of the field at each edge crossing, which gives smooth shading
//! without any mesh-level normal averaging.
//!
//! The field is abstracted behind [`FieldSampler`] so a caller can plug in
//! anything from a plain closure pair to a sandboxed user function whose
//! evaluation can fail or be interrupted.

use std::convert::Infallible;

use glam::Vec3;

use crate::mesh::buffer::MeshBuffer;
use crate::mesh::tables::{CORNER_OFFSETS, EDGE_CORNERS, EDGE_TABLE, TRI_TABLE};

/// A colored scalar field the mesher can query at arbitrary points.
///
/// `distance` follows the SDF convention (negative inside). Both methods
/// may fail; the mesher stops at the first error and propagates it.
pub trait FieldSampler {
    type Error;

    fn distance(&mut self, p: Vec3) -> Result<f32, Self::Error>;
    fn color(&mut self, p: Vec3) -> Result<Vec3, Self::Error>;
}

/// Adapter turning a pair of infallible closures into a [`FieldSampler`].
pub struct ClosureField<S, C> {
    pub sdf: S,
    pub color: C,
}

impl<S, C> FieldSampler for ClosureField<S, C>
where
    S: FnMut(Vec3) -> f32,
    C: FnMut(Vec3) -> Vec3,
{
    type Error = Infallible;

    fn distance(&mut self, p: Vec3) -> Result<f32, Infallible> {
        Ok((self.sdf)(p))
    }

    fn color(&mut self, p: Vec3) -> Result<Vec3, Infallible> {
        Ok((self.color)(p))
    }
}

/// Extracts the zero level set of `field` over `[b_min, b_max]` at
/// `resolution` cells per axis, emitting smooth triangles into `mesh`.
///
/// Degenerate bounds (any axis where `b_min >= b_max`) emit nothing.
/// Resolution is clamped up to 1.
pub fn try_marching_cubes<F: FieldSampler>(
    mesh: &mut MeshBuffer,
    b_min: Vec3,
    b_max: Vec3,
    resolution: u32,
    field: &mut F,
) -> Result<(), F::Error> {
    if !(b_min.x < b_max.x && b_min.y < b_max.y && b_min.z < b_max.z) {
        return Ok(());
    }
    let r = resolution.max(1) as usize;
    let n = r + 1;
    let cell = (b_max - b_min) / r as f32;
    let eps = cell.x.max(cell.y).max(cell.z) * 0.5;

    // Dense field sampling, row-major iz*(n*n) + iy*n + ix
    let mut values = vec![0.0_f32; n * n * n];
    for iz in 0..n {
        for iy in 0..n {
            for ix in 0..n {
                let p = b_min + cell * Vec3::new(ix as f32, iy as f32, iz as f32);
                values[iz * n * n + iy * n + ix] = field.distance(p)?;
            }
        }
    }

    let mut corner_vals = [0.0_f32; 8];
    let mut corner_pos = [Vec3::ZERO; 8];

    for iz in 0..r {
        for iy in 0..r {
            for ix in 0..r {
                let mut cube_index = 0_usize;
                for (c, off) in CORNER_OFFSETS.iter().enumerate() {
                    let gx = ix + off[0];
                    let gy = iy + off[1];
                    let gz = iz + off[2];
                    let v = values[gz * n * n + gy * n + gx];
                    corner_vals[c] = v;
                    corner_pos[c] = b_min + cell * Vec3::new(gx as f32, gy as f32, gz as f32);
                    if v < 0.0 {
                        cube_index |= 1 << c;
                    }
                }

                let edges = EDGE_TABLE[cube_index];
                if edges == 0 {
                    continue;
                }

                // Surface crossing + gradient normal on every crossed edge
                let mut edge_verts: [Option<(Vec3, Vec3)>; 12] = [None; 12];
                for (e, corners) in EDGE_CORNERS.iter().enumerate() {
                    if edges & (1 << e) == 0 {
                        continue;
                    }
                    let v0 = corner_vals[corners[0]];
                    let v1 = corner_vals[corners[1]];
                    // Tangent edge: both ends on the surface
                    let t = if v0 == v1 {
                        0.5
                    } else {
                        (v0 / (v0 - v1)).clamp(0.0, 1.0)
                    };
                    let p = corner_pos[corners[0]].lerp(corner_pos[corners[1]], t);
                    let normal = gradient_normal(field, p, eps)?;
                    edge_verts[e] = Some((p, normal));
                }

                let tris = &TRI_TABLE[cube_index];
                let mut i = 0;
                while i + 2 < tris.len() && tris[i] >= 0 {
                    let (Some(a), Some(b), Some(c)) = (
                        edge_verts[tris[i] as usize],
                        edge_verts[tris[i + 1] as usize],
                        edge_verts[tris[i + 2] as usize],
                    ) else {
                        i += 3;
                        continue;
                    };
                    let centroid = (a.0 + b.0 + c.0) / 3.0;
                    let color = field.color(centroid)?;
                    mesh.emit_smooth_triangle(a.0, a.1, b.0, b.1, c.0, c.1, color);
                    i += 3;
                }
            }
        }
    }

    Ok(())
}

/// Infallible convenience wrapper over [`try_marching_cubes`].
pub fn marching_cubes<S, C>(
    mesh: &mut MeshBuffer,
    b_min: Vec3,
    b_max: Vec3,
    resolution: u32,
    sdf: S,
    color: C,
) where
    S: FnMut(Vec3) -> f32,
    C: FnMut(Vec3) -> Vec3,
{
    let mut field = ClosureField { sdf, color };
    match try_marching_cubes(mesh, b_min, b_max, resolution, &mut field) {
        Ok(()) => (),
        Err(never) => match never {},
    }
}

/// Normalized central-difference gradient of the field at `p`.
///
/// A vanishing gradient (flat or symmetric field) falls back to +Y so the
/// emitted normal is always unit length.
fn gradient_normal<F: FieldSampler>(field: &mut F, p: Vec3, eps: f32) -> Result<Vec3, F::Error> {
    let dx = field.distance(p + Vec3::new(eps, 0.0, 0.0))?
        - field.distance(p - Vec3::new(eps, 0.0, 0.0))?;
    let dy = field.distance(p + Vec3::new(0.0, eps, 0.0))?
        - field.distance(p - Vec3::new(0.0, eps, 0.0))?;
    let dz = field.distance(p + Vec3::new(0.0, 0.0, eps))?
        - field.distance(p - Vec3::new(0.0, 0.0, eps))?;
    let g = Vec3::new(dx, dy, dz);
    let len = g.length();
    if len > 1e-12 && len.is_finite() {
        Ok(g / len)
    } else {
        Ok(Vec3::Y)
    }
}
