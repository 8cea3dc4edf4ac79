//! Sweep, Revolve, and Grid Tests
//!
//! Tests for:
//! - Lathe band/pole triangle accounting and radial positions
//! - Extrusion along straight and curved paths with RMF stability
//! - Heightfield grid counts, bounds, and +Y winding

use glam::{Vec2, Vec3};
use limn::mesh::{extrude_path, grid, lathe, MeshBuffer};
use limn::scene::Aabb;

const EPSILON: f32 = 1e-4;

// ============================================================================
// Lathe
// ============================================================================

#[test]
fn lathe_cone_emits_cap_triangles() {
    let mut mesh = MeshBuffer::with_initial_capacity(256);
    // One segment from radius r at the bottom to a pole at the top
    let profile = [Vec2::new(0.5, 0.0), Vec2::new(0.0, 1.0)];
    lathe(&mut mesh, Vec3::ZERO, &profile, 12, 0.0, Vec3::ONE);
    // Pole band: one triangle per angular step
    assert_eq!(mesh.vertex_count(), 12 * 3);
}

#[test]
fn lathe_degenerate_profile_emits_nothing() {
    let mut mesh = MeshBuffer::with_initial_capacity(64);
    let profile = [Vec2::new(0.0, 0.0), Vec2::new(0.0, 1.0)];
    lathe(&mut mesh, Vec3::ZERO, &profile, 12, 0.0, Vec3::ONE);
    assert_eq!(mesh.vertex_count(), 0, "two poles span no surface");
}

#[test]
fn lathe_band_is_quads() {
    let mut mesh = MeshBuffer::with_initial_capacity(256);
    let profile = [Vec2::new(0.5, 0.0), Vec2::new(0.5, 1.0)];
    lathe(&mut mesh, Vec3::ZERO, &profile, 16, 0.0, Vec3::ONE);
    // One quad (six vertices) per angular step
    assert_eq!(mesh.vertex_count(), 16 * 6);
}

#[test]
fn lathe_respects_center_and_radius() {
    let mut mesh = MeshBuffer::with_initial_capacity(256);
    let center = Vec3::new(1.0, 2.0, -3.0);
    let profile = [Vec2::new(0.5, 0.0), Vec2::new(0.5, 1.0)];
    lathe(&mut mesh, center, &profile, 24, 0.0, Vec3::ONE);
    for i in 0..mesh.vertex_count() {
        let p = mesh.position(i).unwrap();
        let radial = Vec2::new(p.x - center.x, p.z - center.z).length();
        assert!((radial - 0.5).abs() < EPSILON, "radius drifted: {radial}");
        assert!(p.y >= center.y - EPSILON && p.y <= center.y + 1.0 + EPSILON);
    }
}

#[test]
fn lathe_short_profile_emits_nothing() {
    let mut mesh = MeshBuffer::with_initial_capacity(64);
    lathe(&mut mesh, Vec3::ZERO, &[Vec2::new(0.5, 0.0)], 12, 0.0, Vec3::ONE);
    assert_eq!(mesh.vertex_count(), 0);
    lathe(&mut mesh, Vec3::ZERO, &[], 12, 0.0, Vec3::ONE);
    assert_eq!(mesh.vertex_count(), 0);
}

#[test]
fn lathe_outward_winding() {
    let mut mesh = MeshBuffer::with_initial_capacity(256);
    let profile = [Vec2::new(0.5, 0.0), Vec2::new(0.5, 1.0)];
    lathe(&mut mesh, Vec3::ZERO, &profile, 16, 0.0, Vec3::ONE);
    for t in 0..mesh.triangle_count() {
        let a = mesh.position(t * 3).unwrap();
        let b = mesh.position(t * 3 + 1).unwrap();
        let c = mesh.position(t * 3 + 2).unwrap();
        let face = (b - a).cross(c - a);
        let centroid = (a + b + c) / 3.0;
        let radial = Vec3::new(centroid.x, 0.0, centroid.z);
        assert!(
            face.dot(radial) > 0.0,
            "triangle {t} faces the axis instead of away from it"
        );
    }
}

// ============================================================================
// Extrusion
// ============================================================================

fn circle_profile(radius: f32, points: usize) -> Vec<Vec2> {
    (0..points)
        .map(|i| {
            let a = std::f32::consts::TAU * i as f32 / points as f32;
            Vec2::new(radius * a.cos(), radius * a.sin())
        })
        .collect()
}

#[test]
fn extrude_straight_path_makes_a_cylinder() {
    let mut mesh = MeshBuffer::with_initial_capacity(1024);
    let profile = circle_profile(0.25, 16);
    let path: Vec<Vec3> = (0..8).map(|i| Vec3::new(0.0, i as f32 * 0.5, 0.0)).collect();
    extrude_path(&mut mesh, &profile, &path, true, Vec3::ONE);

    assert_eq!(mesh.vertex_count(), 7 * 16 * 6, "7 spans × 16 wraps × 2 tris");
    // Every vertex sits on the cylinder of radius 0.25 around the Y axis
    for i in 0..mesh.vertex_count() {
        let p = mesh.position(i).unwrap();
        let radial = Vec2::new(p.x, p.z).length();
        assert!(
            (radial - 0.25).abs() < 1e-3,
            "vertex {p:?} off the cylinder (r = {radial})"
        );
    }
}

#[test]
fn extrude_open_profile_leaves_a_seam() {
    let mut mesh = MeshBuffer::with_initial_capacity(256);
    let profile = [Vec2::new(-0.5, 0.0), Vec2::new(0.5, 0.0)];
    let path = [Vec3::ZERO, Vec3::Y];
    extrude_path(&mut mesh, &profile, &path, false, Vec3::ONE);
    // One span between two rings: a single quad
    assert_eq!(mesh.vertex_count(), 6);
}

#[test]
fn extrude_short_inputs_emit_nothing() {
    let mut mesh = MeshBuffer::with_initial_capacity(64);
    extrude_path(&mut mesh, &circle_profile(0.2, 8), &[Vec3::ZERO], true, Vec3::ONE);
    assert_eq!(mesh.vertex_count(), 0, "single-point path");
    extrude_path(&mut mesh, &[Vec2::ZERO], &[Vec3::ZERO, Vec3::Y], true, Vec3::ONE);
    assert_eq!(mesh.vertex_count(), 0, "single-point profile");
}

#[test]
fn extrude_duplicate_path_points_inherit_frames() {
    let mut mesh = MeshBuffer::with_initial_capacity(512);
    let profile = circle_profile(0.2, 8);
    // Duplicate point in the middle of a straight spine
    let path = [
        Vec3::new(0.0, 0.0, 0.0),
        Vec3::new(0.0, 1.0, 0.0),
        Vec3::new(0.0, 1.0, 0.0),
        Vec3::new(0.0, 2.0, 0.0),
    ];
    extrude_path(&mut mesh, &profile, &path, true, Vec3::ONE);
    assert!(mesh.vertex_count() > 0);
    for i in 0..mesh.vertex_count() {
        let p = mesh.position(i).unwrap();
        assert!(p.is_finite(), "degenerate segment produced {p:?}");
    }
}

#[test]
fn rmf_does_not_twist_on_a_gentle_curve() {
    // Sweep along a quarter arc; ring radii must stay constant around the
    // local spine even as the frame turns
    let mut mesh = MeshBuffer::with_initial_capacity(4096);
    let profile = circle_profile(0.1, 12);
    let path: Vec<Vec3> = (0..=24)
        .map(|i| {
            let t = std::f32::consts::FRAC_PI_2 * i as f32 / 24.0;
            Vec3::new(t.cos(), t.sin(), 0.0) * 2.0
        })
        .collect();
    extrude_path(&mut mesh, &profile, &path, true, Vec3::ONE);

    for i in 0..mesh.vertex_count() {
        let p = mesh.position(i).unwrap();
        // Distance from the arc (circle of radius 2 in the XY plane)
        let arc_distance = (Vec2::new(p.x, p.y).length() - 2.0).hypot(p.z);
        assert!(
            (arc_distance - 0.1).abs() < 0.02,
            "tube wall drifted to {arc_distance} at {p:?}"
        );
    }
}

// ============================================================================
// Grid
// ============================================================================

#[test]
fn flat_grid_counts_and_bounds() {
    let mut mesh = MeshBuffer::with_initial_capacity(4096);
    grid(
        &mut mesh,
        -3.0,
        -6.0,
        3.0,
        0.0,
        20,
        20,
        |_, _| -1.5,
        |_, _| Vec3::new(0.35, 0.32, 0.28),
    );
    assert_eq!(mesh.vertex_count(), 20 * 20 * 6);
    assert!(!mesh.has_custom_normals());

    let bounds = Aabb::from_positions(mesh.positions());
    assert!((bounds.min.x + 3.0).abs() < EPSILON);
    assert!((bounds.max.x - 3.0).abs() < EPSILON);
    assert!((bounds.min.y + 1.5).abs() < EPSILON);
    assert!((bounds.max.y + 1.5).abs() < EPSILON);
    assert!((bounds.min.z + 6.0).abs() < EPSILON);
    assert!(bounds.max.z.abs() < EPSILON);
}

#[test]
fn grid_faces_up() {
    let mut mesh = MeshBuffer::with_initial_capacity(256);
    grid(&mut mesh, 0.0, 0.0, 1.0, 1.0, 2, 2, |_, _| 0.0, |_, _| Vec3::ONE);
    for t in 0..mesh.triangle_count() {
        let a = mesh.position(t * 3).unwrap();
        let b = mesh.position(t * 3 + 1).unwrap();
        let c = mesh.position(t * 3 + 2).unwrap();
        let face = (b - a).cross(c - a);
        assert!(face.y > 0.0, "triangle {t} faces downward");
    }
}

#[test]
fn grid_samples_height_fn() {
    let mut mesh = MeshBuffer::with_initial_capacity(1024);
    grid(
        &mut mesh,
        0.0,
        0.0,
        4.0,
        4.0,
        8,
        8,
        |x, z| x + z,
        |_, _| Vec3::ONE,
    );
    for i in 0..mesh.vertex_count() {
        let p = mesh.position(i).unwrap();
        assert!(
            (p.y - (p.x + p.z)).abs() < EPSILON,
            "height mismatch at {p:?}"
        );
    }
}

#[test]
fn grid_zero_resolution_emits_nothing() {
    let mut mesh = MeshBuffer::with_initial_capacity(64);
    grid(&mut mesh, 0.0, 0.0, 1.0, 1.0, 0, 4, |_, _| 0.0, |_, _| Vec3::ONE);
    assert_eq!(mesh.vertex_count(), 0);
}
