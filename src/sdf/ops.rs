//! Boolean, smoothing, and domain operators.
//!
//! Boolean and smoothing operators combine raw distances. The smooth
//! variants use the polynomial blend: `h = clamp(0.5 + 0.5·(d2−d1)/k, 0, 1)`
//! then mix with a `k·h·(1−h)` bulge term, which keeps the field continuous
//! where the shapes meet. Domain operators transform query coordinates and
//! are applied before the distance call.

fn mix(a: f32, b: f32, t: f32) -> f32 {
    a * (1.0 - t) + b * t
}

// ============================================================================
// Sharp booleans
// ============================================================================

#[must_use]
pub fn op_union(d1: f32, d2: f32) -> f32 {
    d1.min(d2)
}

/// Removes the second shape from the first.
#[must_use]
pub fn op_subtract(d1: f32, d2: f32) -> f32 {
    d1.max(-d2)
}

#[must_use]
pub fn op_intersect(d1: f32, d2: f32) -> f32 {
    d1.max(d2)
}

/// Region inside exactly one of the two shapes.
#[must_use]
pub fn op_xor(d1: f32, d2: f32) -> f32 {
    d1.min(d2).max(-d1.max(d2))
}

// ============================================================================
// Smooth booleans
// ============================================================================

#[must_use]
pub fn op_smooth_union(d1: f32, d2: f32, k: f32) -> f32 {
    if k <= 0.0 {
        return op_union(d1, d2);
    }
    let h = (0.5 + 0.5 * (d2 - d1) / k).clamp(0.0, 1.0);
    mix(d2, d1, h) - k * h * (1.0 - h)
}

#[must_use]
pub fn op_smooth_subtract(d1: f32, d2: f32, k: f32) -> f32 {
    if k <= 0.0 {
        return op_subtract(d1, d2);
    }
    let h = (0.5 - 0.5 * (d2 + d1) / k).clamp(0.0, 1.0);
    mix(d1, -d2, h) + k * h * (1.0 - h)
}

#[must_use]
pub fn op_smooth_intersect(d1: f32, d2: f32, k: f32) -> f32 {
    if k <= 0.0 {
        return op_intersect(d1, d2);
    }
    let h = (0.5 - 0.5 * (d2 - d1) / k).clamp(0.0, 1.0);
    mix(d2, d1, h) + k * h * (1.0 - h)
}

// ============================================================================
// Chamfered and stepped booleans
// ============================================================================

const SQRT_HALF: f32 = std::f32::consts::FRAC_1_SQRT_2;

/// Union with a 45° chamfer of width `k` along the seam.
#[must_use]
pub fn op_chamfer_union(d1: f32, d2: f32, k: f32) -> f32 {
    d1.min(d2).min((d1 - k + d2) * SQRT_HALF)
}

#[must_use]
pub fn op_chamfer_intersect(d1: f32, d2: f32, k: f32) -> f32 {
    d1.max(d2).max((d1 + k + d2) * SQRT_HALF)
}

#[must_use]
pub fn op_chamfer_subtract(d1: f32, d2: f32, k: f32) -> f32 {
    op_chamfer_intersect(d1, -d2, k)
}

/// Union with `n` steps carved over a radius `r` along the seam.
#[must_use]
pub fn op_stairs_union(d1: f32, d2: f32, r: f32, n: f32) -> f32 {
    if n < 1.0 || r <= 0.0 {
        return op_union(d1, d2);
    }
    let s = r / n;
    let u = d2 - r;
    d1.min(d2)
        .min(0.5 * (u + d1 + ((u - d1 + s).rem_euclid(2.0 * s) - s).abs()))
}

#[must_use]
pub fn op_stairs_intersect(d1: f32, d2: f32, r: f32, n: f32) -> f32 {
    -op_stairs_union(-d1, -d2, r, n)
}

#[must_use]
pub fn op_stairs_subtract(d1: f32, d2: f32, r: f32, n: f32) -> f32 {
    -op_stairs_union(-d1, d2, r, n)
}

// ============================================================================
// Distance modifiers
// ============================================================================

/// Rounds edges by shrinking the distance field.
#[must_use]
pub fn op_round(d: f32, r: f32) -> f32 {
    d - r
}

/// Offsets the field by an arbitrary displacement value.
#[must_use]
pub fn op_displace(d: f32, x: f32) -> f32 {
    d + x
}

/// Hollows a solid into a shell of thickness `t` (onioning).
#[must_use]
pub fn op_shell(d: f32, t: f32) -> f32 {
    d.abs() - t
}

// ============================================================================
// Domain operators
// ============================================================================

/// Mirrors one coordinate across its zero plane.
#[must_use]
pub fn dom_mirror(x: f32) -> f32 {
    x.abs()
}

/// Repeats one coordinate with period `s`, centered on each cell.
#[must_use]
pub fn dom_repeat(x: f32, s: f32) -> f32 {
    if s <= 0.0 {
        return x;
    }
    x.rem_euclid(s) - s * 0.5
}

/// Twists the XZ plane around Y by angle `k·y`.
#[must_use]
pub fn dom_twist(x: f32, y: f32, z: f32, k: f32) -> (f32, f32, f32) {
    let a = k * y;
    let (s, c) = a.sin_cos();
    (c * x - s * z, y, s * x + c * z)
}

/// Bends the XY plane by angle `k·x`.
#[must_use]
pub fn dom_bend(x: f32, y: f32, k: f32) -> (f32, f32) {
    let a = k * x;
    let (s, c) = a.sin_cos();
    (c * x - s * y, s * x + c * y)
}

/// Rotates the XZ plane around Y by `theta`.
#[must_use]
pub fn dom_rotate_y(x: f32, z: f32, theta: f32) -> (f32, f32) {
    let (s, c) = theta.sin_cos();
    (c * x - s * z, s * x + c * z)
}
