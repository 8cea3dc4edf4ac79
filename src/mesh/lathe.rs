//! Surface of revolution.

use glam::{Vec2, Vec3};

use crate::mesh::buffer::MeshBuffer;

/// Revolves a 2D profile around a vertical axis through `center`.
///
/// The profile is a bottom-to-top list of `(radius, y_offset)` pairs; each
/// adjacent pair sweeps one band of `segments` quads. A zero radius
/// collapses its ring to a pole and the band becomes a triangle fan, so
/// closed shapes (vases, spheres, drops) need no special-casing by the
/// caller. Winding keeps outward normals pointing away from the axis.
///
/// Profiles shorter than 2 points and `segments < 3` emit nothing.
pub fn lathe(
    mesh: &mut MeshBuffer,
    center: Vec3,
    profile: &[Vec2],
    segments: u32,
    angle_offset: f32,
    color: Vec3,
) {
    if profile.len() < 2 || segments < 3 {
        return;
    }

    let ring_point = |r: f32, y: f32, angle: f32| -> Vec3 {
        Vec3::new(
            center.x + r * angle.cos(),
            center.y + y,
            center.z + r * angle.sin(),
        )
    };

    let step = std::f32::consts::TAU / segments as f32;

    for pair in profile.windows(2) {
        let (r0, y0) = (pair[0].x, pair[0].y);
        let (r1, y1) = (pair[1].x, pair[1].y);

        if r0 == 0.0 && r1 == 0.0 {
            continue;
        }

        for s in 0..segments {
            let a = angle_offset + step * s as f32;
            let b = a + step;

            if r0 == 0.0 {
                // Bottom pole: fan up to the next ring
                let pole = ring_point(0.0, y0, a);
                mesh.emit_triangle(pole, ring_point(r1, y1, a), ring_point(r1, y1, b), color);
            } else if r1 == 0.0 {
                // Top pole: fan down from the previous ring
                let pole = ring_point(0.0, y1, a);
                mesh.emit_triangle(ring_point(r0, y0, a), pole, ring_point(r0, y0, b), color);
            } else {
                mesh.emit_quad(
                    ring_point(r0, y0, a),
                    ring_point(r1, y1, a),
                    ring_point(r1, y1, b),
                    ring_point(r0, y0, b),
                    color,
                );
            }
        }
    }
}
