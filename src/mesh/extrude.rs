//! Profile extrusion along a 3D path.
//!
//! Sweeps a 2D cross-section along a polyline spine using rotation-
//! minimizing frames computed with the double-reflection method. Unlike a
//! naive Frenet frame, the frames only roll as much as the path geometry
//! itself demands, so tubes do not spontaneously twist on near-straight or
//! inflecting spines.

use glam::{Vec2, Vec3};

use crate::mesh::buffer::MeshBuffer;

/// One orthonormal frame along the path.
#[derive(Debug, Clone, Copy)]
struct Frame {
    tangent: Vec3,
    normal: Vec3,
    binormal: Vec3,
}

/// Sweeps `profile` (in frame-local `(u, v)` coordinates) along `path`.
///
/// When `closed` is true the profile's last point connects back to its
/// first, forming a tube. Profiles or paths shorter than 2 emit nothing.
/// Duplicate adjacent path points inherit the previous frame instead of
/// producing a degenerate one.
pub fn extrude_path(
    mesh: &mut MeshBuffer,
    profile: &[Vec2],
    path: &[Vec3],
    closed: bool,
    color: Vec3,
) {
    if profile.len() < 2 || path.len() < 2 {
        return;
    }

    let frames = compute_frames(path);

    // Place profile rings in world space
    let mut rings: Vec<Vec<Vec3>> = Vec::with_capacity(path.len());
    for (point, frame) in path.iter().zip(&frames) {
        let ring: Vec<Vec3> = profile
            .iter()
            .map(|p| *point + frame.normal * p.x + frame.binormal * p.y)
            .collect();
        rings.push(ring);
    }

    let p = profile.len();
    let spans = if closed { p } else { p - 1 };

    for k in 0..rings.len() - 1 {
        let (r0, r1) = (&rings[k], &rings[k + 1]);
        for j in 0..spans {
            let j2 = (j + 1) % p;
            mesh.emit_quad(r0[j], r0[j2], r1[j2], r1[j], color);
        }
    }
}

/// Per-vertex tangents by one-sided/centered differences, then frame
/// propagation by double reflection.
fn compute_frames(path: &[Vec3]) -> Vec<Frame> {
    let n = path.len();
    let mut tangents = vec![Vec3::ZERO; n];

    let mut last_good = Vec3::Z;
    for k in 0..n {
        let diff = if k == 0 {
            path[1] - path[0]
        } else if k == n - 1 {
            path[n - 1] - path[n - 2]
        } else {
            path[k + 1] - path[k - 1]
        };
        tangents[k] = match diff.try_normalize() {
            Some(t) => {
                last_good = t;
                t
            }
            // Zero-length segment: carry the previous direction
            None => last_good,
        };
    }

    let mut frames = Vec::with_capacity(n);
    frames.push(initial_frame(tangents[0]));

    for k in 1..n {
        let prev: Frame = frames[k - 1];
        let v1 = path[k] - path[k - 1];
        let c1 = v1.dot(v1);
        if c1 <= f32::EPSILON {
            frames.push(prev);
            continue;
        }

        // Reflect the previous normal and tangent through the plane
        // bisecting the segment
        let r_l = prev.normal - v1 * (2.0 / c1) * v1.dot(prev.normal);
        let t_l = prev.tangent - v1 * (2.0 / c1) * v1.dot(prev.tangent);

        // Second reflection aligns the reflected tangent with the real one
        let v2 = tangents[k] - t_l;
        let c2 = v2.dot(v2);
        let normal = if c2 <= f32::EPSILON {
            r_l
        } else {
            r_l - v2 * (2.0 / c2) * v2.dot(r_l)
        };

        let normal = normal.normalize_or_zero();
        let tangent = tangents[k];
        frames.push(Frame {
            tangent,
            normal,
            binormal: tangent.cross(normal),
        });
    }

    frames
}

fn initial_frame(tangent: Vec3) -> Frame {
    // Any axis not parallel to the tangent seeds the frame
    let helper = if tangent.x.abs() < 0.9 { Vec3::X } else { Vec3::Y };
    let normal = tangent.cross(helper).normalize_or_zero();
    let normal = if normal == Vec3::ZERO { Vec3::Y } else { normal };
    Frame {
        tangent,
        normal,
        binormal: tangent.cross(normal),
    }
}
