//! Primitive distance functions.
//!
//! The exact primitives (sphere, box, capsule, torus, cone, cylinder,
//! octahedron, tapered cylinder) return true Euclidean distance. Ellipsoid
//! and hex prism are sign-correct approximations, which is all the mesher
//! needs: the zero crossing is exact even where the gradient is not unit
//! length.

use glam::{Vec2, Vec3};

/// Sphere of radius `r` centered at the origin.
#[must_use]
pub fn sd_sphere(p: Vec3, r: f32) -> f32 {
    p.length() - r
}

/// Axis-aligned box with half-extents `(sx, sy, sz)`.
#[must_use]
pub fn sd_box(p: Vec3, sx: f32, sy: f32, sz: f32) -> f32 {
    let q = p.abs() - Vec3::new(sx, sy, sz);
    q.max(Vec3::ZERO).length() + q.x.max(q.y.max(q.z)).min(0.0)
}

/// Capsule around the segment `a → b` with radius `r`.
#[must_use]
pub fn sd_capsule(p: Vec3, a: Vec3, b: Vec3, r: f32) -> f32 {
    let pa = p - a;
    let ba = b - a;
    let denom = ba.dot(ba);
    // Zero-length segment degenerates to a sphere at `a`
    if denom <= f32::EPSILON {
        return pa.length() - r;
    }
    let h = (pa.dot(ba) / denom).clamp(0.0, 1.0);
    (pa - ba * h).length() - r
}

/// Torus in the XZ plane: major radius `big_r`, tube radius `r`.
#[must_use]
pub fn sd_torus(p: Vec3, big_r: f32, r: f32) -> f32 {
    let q = Vec2::new(Vec2::new(p.x, p.z).length() - big_r, p.y);
    q.length() - r
}

/// Cone with its tip at the origin, opening down −Y to a base of radius `r`
/// at `y = -h`.
#[must_use]
pub fn sd_cone(p: Vec3, r: f32, h: f32) -> f32 {
    let q = Vec2::new(r, -h);
    let w = Vec2::new(Vec2::new(p.x, p.z).length(), p.y);
    let a = w - q * (w.dot(q) / q.dot(q)).clamp(0.0, 1.0);
    let b = w - q * Vec2::new((w.x / q.x).clamp(0.0, 1.0), 1.0);
    let k = q.y.signum();
    let d = a.dot(a).min(b.dot(b));
    let s = (k * (w.x * q.y - w.y * q.x)).max(k * (w.y - q.y));
    d.sqrt() * s.signum()
}

/// Half-space `p·n − d`. The normal is expected to be unit length.
#[must_use]
pub fn sd_plane(p: Vec3, n: Vec3, d: f32) -> f32 {
    p.dot(n) - d
}

/// Capped cylinder along the Y axis: radius `r`, half-height `half_h`.
#[must_use]
pub fn sd_cylinder(p: Vec3, r: f32, half_h: f32) -> f32 {
    let d = Vec2::new(Vec2::new(p.x, p.z).length() - r, p.y.abs() - half_h);
    d.x.max(d.y).min(0.0) + d.max(Vec2::ZERO).length()
}

/// Ellipsoid with semi-axes `(rx, ry, rz)`. Sign-correct approximation.
#[must_use]
pub fn sd_ellipsoid(p: Vec3, rx: f32, ry: f32, rz: f32) -> f32 {
    let r = Vec3::new(rx, ry, rz);
    let k0 = (p / r).length();
    let k1 = (p / (r * r)).length();
    if k1 <= f32::EPSILON {
        // Query at the center of a degenerate ellipsoid
        return -rx.min(ry).min(rz);
    }
    k0 * (k0 - 1.0) / k1
}

/// Regular octahedron with "size" `s` (distance from center to vertex).
#[must_use]
pub fn sd_octahedron(p: Vec3, s: f32) -> f32 {
    let p = p.abs();
    let m = p.x + p.y + p.z - s;
    let q = if 3.0 * p.x < m {
        p
    } else if 3.0 * p.y < m {
        Vec3::new(p.y, p.z, p.x)
    } else if 3.0 * p.z < m {
        Vec3::new(p.z, p.x, p.y)
    } else {
        return m * 0.577_350_27;
    };
    let k = (0.5 * (q.z - q.y + s)).clamp(0.0, s);
    Vec3::new(q.x, q.y - s + k, q.z - k).length()
}

/// Hexagonal prism standing on the Y axis: half-height `h`, in-radius `r`.
/// Sign-correct approximation.
#[must_use]
pub fn sd_hex_prism(p: Vec3, h: f32, r: f32) -> f32 {
    let q = p.abs();
    let hex = (q.x * 0.866_025_4 + q.z * 0.5).max(q.z) - r;
    hex.max(q.y - h)
}

/// Cone frustum along the Y axis: radius `r1` at `y = -h`, `r2` at `y = +h`.
#[must_use]
pub fn sd_tapered_cylinder(p: Vec3, r1: f32, r2: f32, h: f32) -> f32 {
    let q = Vec2::new(Vec2::new(p.x, p.z).length(), p.y);
    let k1 = Vec2::new(r2, h);
    let k2 = Vec2::new(r2 - r1, 2.0 * h);
    let ca = Vec2::new(
        q.x - q.x.min(if q.y < 0.0 { r1 } else { r2 }),
        q.y.abs() - h,
    );
    let denom = k2.dot(k2);
    let cb = if denom <= f32::EPSILON {
        // r1 == r2 and h == 0: a flat disc
        ca
    } else {
        q - k1 + k2 * ((k1 - q).dot(k2) / denom).clamp(0.0, 1.0)
    };
    let s = if cb.x < 0.0 && ca.y < 0.0 { -1.0 } else { 1.0 };
    s * ca.dot(ca).min(cb.dot(cb)).sqrt()
}
