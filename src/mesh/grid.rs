//! Heightfield grid emitter for terrain-like surfaces.

use std::convert::Infallible;

use glam::Vec3;

use crate::mesh::buffer::MeshBuffer;

/// A surface sampled over the XZ plane.
///
/// Same shape as [`FieldSampler`](super::FieldSampler): both queries can
/// fail so sandboxed user functions can drive the grid.
pub trait Heightfield {
    type Error;

    fn height(&mut self, x: f32, z: f32) -> Result<f32, Self::Error>;
    fn color(&mut self, x: f32, z: f32) -> Result<Vec3, Self::Error>;
}

/// Adapter turning a pair of infallible closures into a [`Heightfield`].
pub struct ClosureHeightfield<H, C> {
    pub height: H,
    pub color: C,
}

impl<H, C> Heightfield for ClosureHeightfield<H, C>
where
    H: FnMut(f32, f32) -> f32,
    C: FnMut(f32, f32) -> Vec3,
{
    type Error = Infallible;

    fn height(&mut self, x: f32, z: f32) -> Result<f32, Infallible> {
        Ok((self.height)(x, z))
    }

    fn color(&mut self, x: f32, z: f32) -> Result<Vec3, Infallible> {
        Ok((self.color)(x, z))
    }
}

/// Emits a `res_x × res_z` quad grid over the rectangle `(x0, z0)–(x1, z1)`.
///
/// Heights are precomputed at the `(res_x+1)·(res_z+1)` grid vertices; each
/// cell is one quad colored at its centroid. Winding faces +Y.
pub fn try_grid<F: Heightfield>(
    mesh: &mut MeshBuffer,
    x0: f32,
    z0: f32,
    x1: f32,
    z1: f32,
    res_x: u32,
    res_z: u32,
    field: &mut F,
) -> Result<(), F::Error> {
    if res_x == 0 || res_z == 0 {
        return Ok(());
    }
    let (nx, nz) = (res_x as usize + 1, res_z as usize + 1);
    let dx = (x1 - x0) / res_x as f32;
    let dz = (z1 - z0) / res_z as f32;

    let mut heights = vec![0.0_f32; nx * nz];
    for iz in 0..nz {
        for ix in 0..nx {
            let x = x0 + dx * ix as f32;
            let z = z0 + dz * iz as f32;
            heights[iz * nx + ix] = field.height(x, z)?;
        }
    }

    for iz in 0..res_z as usize {
        for ix in 0..res_x as usize {
            let xa = x0 + dx * ix as f32;
            let xb = xa + dx;
            let za = z0 + dz * iz as f32;
            let zb = za + dz;

            let p00 = Vec3::new(xa, heights[iz * nx + ix], za);
            let p10 = Vec3::new(xb, heights[iz * nx + ix + 1], za);
            let p01 = Vec3::new(xa, heights[(iz + 1) * nx + ix], zb);
            let p11 = Vec3::new(xb, heights[(iz + 1) * nx + ix + 1], zb);

            let color = field.color(xa + dx * 0.5, za + dz * 0.5)?;
            mesh.emit_quad(p00, p01, p11, p10, color);
        }
    }

    Ok(())
}

/// Infallible convenience wrapper over [`try_grid`].
pub fn grid<H, C>(
    mesh: &mut MeshBuffer,
    x0: f32,
    z0: f32,
    x1: f32,
    z1: f32,
    res_x: u32,
    res_z: u32,
    height: H,
    color: C,
) where
    H: FnMut(f32, f32) -> f32,
    C: FnMut(f32, f32) -> Vec3,
{
    let mut field = ClosureHeightfield { height, color };
    match try_grid(mesh, x0, z0, x1, z1, res_x, res_z, &mut field) {
        Ok(()) => (),
        Err(never) => match never {},
    }
}
