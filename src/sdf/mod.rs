//! Signed distance functions and combinators.
//!
//! Distances are negative inside a surface, positive outside, zero on it.
//! All primitives are translation-invariant: callers position a shape by
//! subtracting its center from the query point before the call. Operators
//! work on raw distances and know nothing about position; domain operators
//! transform the query point before the distance call.

pub mod ops;
pub mod primitives;

pub use ops::{
    dom_bend, dom_mirror, dom_repeat, dom_rotate_y, dom_twist, op_chamfer_intersect,
    op_chamfer_subtract, op_chamfer_union, op_displace, op_intersect, op_round, op_shell,
    op_smooth_intersect, op_smooth_subtract, op_smooth_union, op_stairs_intersect,
    op_stairs_subtract, op_stairs_union, op_subtract, op_union, op_xor,
};
pub use primitives::{
    sd_box, sd_capsule, sd_cone, sd_cylinder, sd_ellipsoid, sd_hex_prism, sd_octahedron, sd_plane,
    sd_sphere, sd_tapered_cylinder, sd_torus,
};
