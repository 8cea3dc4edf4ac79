//! SDF Library Tests
//!
//! Tests for:
//! - Primitive sign and distance correctness at known points
//! - Boolean, smooth, and modifier operators
//! - Domain operators (mirror, repeat, twist, bend, rotateY)

use glam::Vec3;
use limn::sdf::{
    dom_bend, dom_mirror, dom_repeat, dom_rotate_y, dom_twist, op_chamfer_union, op_displace,
    op_intersect, op_round, op_shell, op_smooth_intersect, op_smooth_subtract, op_smooth_union,
    op_stairs_union, op_subtract, op_union, op_xor, sd_box, sd_capsule, sd_cone, sd_cylinder,
    sd_ellipsoid, sd_hex_prism, sd_octahedron, sd_plane, sd_sphere, sd_tapered_cylinder, sd_torus,
};

const EPSILON: f32 = 1e-4;

fn approx(a: f32, b: f32) -> bool {
    (a - b).abs() < EPSILON
}

// ============================================================================
// Primitives
// ============================================================================

#[test]
fn sphere_distances() {
    assert!(approx(sd_sphere(Vec3::ZERO, 1.0), -1.0));
    assert!(approx(sd_sphere(Vec3::new(1.0, 0.0, 0.0), 1.0), 0.0));
    assert!(approx(sd_sphere(Vec3::new(3.0, 0.0, 0.0), 1.0), 2.0));
}

#[test]
fn box_distances() {
    // Exact distance outside a face
    assert!(approx(sd_box(Vec3::new(2.0, 0.0, 0.0), 1.0, 1.0, 1.0), 1.0));
    // Inside: negative distance to the nearest face
    assert!(approx(sd_box(Vec3::new(0.5, 0.0, 0.0), 1.0, 1.0, 1.0), -0.5));
    // Corner distance is Euclidean
    let d = sd_box(Vec3::new(2.0, 2.0, 0.0), 1.0, 1.0, 1.0);
    assert!(approx(d, std::f32::consts::SQRT_2));
}

#[test]
fn capsule_degenerates_to_sphere() {
    let a = Vec3::new(0.0, 1.0, 0.0);
    let d = sd_capsule(Vec3::new(0.0, 3.0, 0.0), a, a, 0.5);
    assert!(approx(d, 1.5));
}

#[test]
fn capsule_between_endpoints() {
    let a = Vec3::new(-1.0, 0.0, 0.0);
    let b = Vec3::new(1.0, 0.0, 0.0);
    // Directly above the middle of the segment
    assert!(approx(sd_capsule(Vec3::new(0.0, 1.0, 0.0), a, b, 0.25), 0.75));
    // On the axis inside
    assert!(approx(sd_capsule(Vec3::ZERO, a, b, 0.25), -0.25));
}

#[test]
fn torus_ring_is_zero_set() {
    // A point on the center ring is exactly -r deep
    assert!(approx(sd_torus(Vec3::new(1.0, 0.0, 0.0), 1.0, 0.25), -0.25));
    // On the outer equator
    assert!(approx(sd_torus(Vec3::new(1.25, 0.0, 0.0), 1.0, 0.25), 0.0));
}

#[test]
fn cone_tip_and_base() {
    // Tip at the origin
    assert!(approx(sd_cone(Vec3::ZERO, 0.5, 1.0), 0.0));
    // Center of the base disc at y = -h is inside
    assert!(sd_cone(Vec3::new(0.0, -0.9, 0.0), 0.5, 1.0) < 0.0);
    // Above the tip is outside
    assert!(sd_cone(Vec3::new(0.0, 0.5, 0.0), 0.5, 1.0) > 0.0);
}

#[test]
fn plane_half_space() {
    let n = Vec3::Y;
    assert!(approx(sd_plane(Vec3::new(5.0, 2.0, 3.0), n, 0.0), 2.0));
    assert!(approx(sd_plane(Vec3::new(0.0, -1.0, 0.0), n, 0.0), -1.0));
    // Offset plane
    assert!(approx(sd_plane(Vec3::new(0.0, 2.0, 0.0), n, 1.0), 1.0));
}

#[test]
fn cylinder_distances() {
    assert!(approx(sd_cylinder(Vec3::new(2.0, 0.0, 0.0), 1.0, 1.0), 1.0));
    assert!(approx(sd_cylinder(Vec3::new(0.0, 2.0, 0.0), 1.0, 1.0), 1.0));
    assert!(sd_cylinder(Vec3::ZERO, 1.0, 1.0) < 0.0);
}

#[test]
fn ellipsoid_signs() {
    assert!(sd_ellipsoid(Vec3::ZERO, 1.0, 2.0, 3.0) < 0.0);
    assert!(approx(sd_ellipsoid(Vec3::new(1.0, 0.0, 0.0), 1.0, 2.0, 3.0), 0.0));
    assert!(sd_ellipsoid(Vec3::new(2.0, 0.0, 0.0), 1.0, 2.0, 3.0) > 0.0);
}

#[test]
fn octahedron_vertices_on_surface() {
    for v in [Vec3::X, Vec3::Y, Vec3::Z, -Vec3::X, -Vec3::Y, -Vec3::Z] {
        let d = sd_octahedron(v * 2.0, 2.0);
        assert!(d.abs() < 1e-3, "octahedron vertex {v:?} gave {d}");
    }
    assert!(sd_octahedron(Vec3::ZERO, 2.0) < 0.0);
}

#[test]
fn hex_prism_signs() {
    assert!(sd_hex_prism(Vec3::ZERO, 1.0, 1.0) < 0.0);
    assert!(sd_hex_prism(Vec3::new(0.0, 2.0, 0.0), 1.0, 1.0) > 0.0);
    assert!(sd_hex_prism(Vec3::new(3.0, 0.0, 0.0), 1.0, 1.0) > 0.0);
}

#[test]
fn tapered_cylinder_radii() {
    // Wide at the bottom, narrow at the top
    let inside_bottom = sd_tapered_cylinder(Vec3::new(0.7, -0.9, 0.0), 1.0, 0.2, 1.0);
    assert!(inside_bottom < 0.0, "got {inside_bottom}");
    let outside_top = sd_tapered_cylinder(Vec3::new(0.7, 0.9, 0.0), 1.0, 0.2, 1.0);
    assert!(outside_top > 0.0, "got {outside_top}");
}

// ============================================================================
// Operators
// ============================================================================

#[test]
fn sharp_booleans() {
    assert!(approx(op_union(1.0, 2.0), 1.0));
    assert!(approx(op_intersect(1.0, 2.0), 2.0));
    assert!(approx(op_subtract(1.0, -2.0), 2.0));
    assert!(approx(op_subtract(-1.0, 2.0), -1.0));
}

#[test]
fn xor_inside_exactly_one() {
    // Inside first, outside second
    assert!(op_xor(-1.0, 2.0) < 0.0);
    // Inside both
    assert!(op_xor(-1.0, -2.0) > 0.0);
    // Outside both
    assert!(op_xor(1.0, 2.0) > 0.0);
}

#[test]
fn smooth_union_bounds() {
    // Far apart the smooth union matches the sharp one
    assert!(approx(op_smooth_union(5.0, 0.5, 0.1), 0.5));
    // Near the blend it can only deepen, never shrink
    let sharp = op_union(0.1, 0.12);
    let smooth = op_smooth_union(0.1, 0.12, 0.3);
    assert!(smooth <= sharp + EPSILON);
}

#[test]
fn smooth_ops_with_zero_k_match_sharp() {
    assert!(approx(op_smooth_union(1.0, 2.0, 0.0), op_union(1.0, 2.0)));
    assert!(approx(
        op_smooth_subtract(1.0, 2.0, 0.0),
        op_subtract(1.0, 2.0)
    ));
    assert!(approx(
        op_smooth_intersect(1.0, 2.0, 0.0),
        op_intersect(1.0, 2.0)
    ));
}

#[test]
fn chamfer_union_cuts_the_corner() {
    // Far from the seam it behaves like min
    assert!(approx(op_chamfer_union(5.0, 0.5, 0.1), 0.5));
    // At the seam the chamfer term wins
    let d = op_chamfer_union(0.2, 0.2, 0.3);
    assert!(d < 0.2);
}

#[test]
fn stairs_union_reduces_to_union_for_bad_params() {
    assert!(approx(op_stairs_union(1.0, 2.0, 0.0, 4.0), 1.0));
    assert!(approx(op_stairs_union(1.0, 2.0, 0.5, 0.0), 1.0));
}

#[test]
fn distance_modifiers() {
    assert!(approx(op_round(1.0, 0.25), 0.75));
    assert!(approx(op_displace(1.0, -0.5), 0.5));
    assert!(approx(op_shell(-0.5, 0.1), 0.4));
    assert!(approx(op_shell(0.5, 0.1), 0.4));
}

// ============================================================================
// Domain operators
// ============================================================================

#[test]
fn mirror_folds_space() {
    assert!(approx(dom_mirror(-2.0), 2.0));
    assert!(approx(dom_mirror(2.0), 2.0));
}

#[test]
fn repeat_is_periodic_and_centered() {
    let a = dom_repeat(0.3, 2.0);
    let b = dom_repeat(0.3 + 2.0, 2.0);
    let c = dom_repeat(0.3 - 6.0, 2.0);
    assert!(approx(a, b));
    assert!(approx(a, c));
    // Output stays within one centered cell
    for i in -20..20 {
        let v = dom_repeat(i as f32 * 0.37, 2.0);
        assert!((-1.0..=1.0).contains(&v));
    }
}

#[test]
fn twist_preserves_radius_and_height() {
    let (x, y, z) = dom_twist(0.8, 0.5, 0.3, 3.0);
    assert!(approx(y, 0.5));
    let r_before = (0.8_f32 * 0.8 + 0.3 * 0.3).sqrt();
    let r_after = (x * x + z * z).sqrt();
    assert!(approx(r_before, r_after));
}

#[test]
fn twist_at_zero_height_is_identity() {
    let (x, y, z) = dom_twist(0.8, 0.0, 0.3, 3.0);
    assert!(approx(x, 0.8) && approx(y, 0.0) && approx(z, 0.3));
}

#[test]
fn bend_preserves_length_in_plane() {
    let (x, y) = dom_bend(0.6, 0.4, 2.0);
    let before = (0.6_f32 * 0.6 + 0.4 * 0.4).sqrt();
    let after = (x * x + y * y).sqrt();
    assert!(approx(before, after));
}

#[test]
fn rotate_y_quarter_turn() {
    let (x, z) = dom_rotate_y(1.0, 0.0, std::f32::consts::FRAC_PI_2);
    assert!(x.abs() < 1e-5);
    assert!(approx(z, 1.0));
}
