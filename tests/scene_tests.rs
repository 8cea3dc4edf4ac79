//! Scene Model Tests
//!
//! Tests for:
//! - Aabb construction, union, overlap, gap, penetration symmetry
//! - Spatial analysis ordering, nearest tie-breaking
//! - LayerStore insertion order, id monotonicity, removal

use glam::Vec3;
use limn::mesh::{MaterialHints, MeshBuffer};
use limn::scene::{analyze, Aabb, Axis, Layer, LayerStore};

const EPSILON: f32 = 1e-5;

fn approx(a: f32, b: f32) -> bool {
    (a - b).abs() < EPSILON
}

fn aabb(min: [f32; 3], max: [f32; 3]) -> Aabb {
    Aabb::new(Vec3::from_array(min), Vec3::from_array(max))
}

// ============================================================================
// Aabb
// ============================================================================

#[test]
fn from_positions_scans_min_max_center() {
    let positions = [1.0, 2.0, 3.0, -1.0, 0.0, 5.0, 0.0, -2.0, 4.0];
    let bounds = Aabb::from_positions(&positions);
    assert_eq!(bounds.min, Vec3::new(-1.0, -2.0, 3.0));
    assert_eq!(bounds.max, Vec3::new(1.0, 2.0, 5.0));
    assert_eq!(bounds.center, Vec3::new(0.0, 0.0, 4.0));
}

#[test]
fn empty_positions_yield_zero_bounds() {
    let bounds = Aabb::from_positions(&[]);
    assert_eq!(bounds, Aabb::ZERO);
}

#[test]
fn union_covers_both() {
    let a = aabb([-1.0, -1.0, -1.0], [1.0, 1.0, 1.0]);
    let b = aabb([0.0, 0.0, 0.0], [3.0, 3.0, 3.0]);
    let u = a.union(&b);
    assert_eq!(u.min, Vec3::splat(-1.0));
    assert_eq!(u.max, Vec3::splat(3.0));
}

#[test]
fn overlap_requires_all_axes() {
    let a = aabb([0.0, 0.0, 0.0], [1.0, 1.0, 1.0]);
    let b = aabb([0.5, 0.5, 0.5], [2.0, 2.0, 2.0]);
    let c = aabb([0.5, 5.0, 0.5], [2.0, 6.0, 2.0]);
    assert!(a.overlaps(&b));
    assert!(!a.overlaps(&c), "separated on Y");
}

#[test]
fn gap_picks_the_largest_separating_axis() {
    let a = aabb([0.0, 0.0, 0.0], [1.0, 1.0, 1.0]);
    // 2 apart on X, 5 apart on Z
    let b = aabb([3.0, 0.0, 6.0], [4.0, 1.0, 7.0]);
    let (axis, magnitude) = a.gap(&b);
    assert_eq!(axis, Axis::Z);
    assert!(approx(magnitude, 5.0));
}

#[test]
fn gap_is_symmetric() {
    let a = aabb([0.0, 0.0, 0.0], [1.0, 1.0, 1.0]);
    let b = aabb([0.0, 4.0, 0.0], [1.0, 5.0, 1.0]);
    let (axis_ab, mag_ab) = a.gap(&b);
    let (axis_ba, mag_ba) = b.gap(&a);
    assert_eq!(axis_ab, axis_ba);
    assert!(approx(mag_ab, mag_ba));
    assert_eq!(axis_ab, Axis::Y);
    assert!(approx(mag_ab, 3.0));
}

#[test]
fn penetration_picks_the_shallowest_axis() {
    let a = aabb([0.0, 0.0, 0.0], [2.0, 2.0, 2.0]);
    // Overlaps 0.5 on X, 2.0 on Y, 1.0 on Z
    let b = aabb([1.5, 0.0, 1.0], [4.0, 2.0, 5.0]);
    let (axis, depth) = a.penetration(&b).expect("boxes overlap");
    assert_eq!(axis, Axis::X);
    assert!(approx(depth, 0.5));
}

#[test]
fn penetration_absent_without_overlap() {
    let a = aabb([0.0, 0.0, 0.0], [1.0, 1.0, 1.0]);
    let b = aabb([2.0, 0.0, 0.0], [3.0, 1.0, 1.0]);
    assert!(a.penetration(&b).is_none());
}

#[test]
fn center_distance_is_euclidean() {
    let a = aabb([0.0, 0.0, 0.0], [2.0, 2.0, 2.0]);
    let b = aabb([3.0, 4.0, 1.0], [5.0, 8.0, 1.0]);
    // Centers (1,1,1) and (4,6,1)
    assert!(approx(a.center_distance(&b), 5.0));
}

// ============================================================================
// Spatial analysis
// ============================================================================

fn layer_with_bounds(store: &mut LayerStore, description: &str, min: [f32; 3], max: [f32; 3]) {
    let mut mesh = MeshBuffer::with_initial_capacity(8);
    mesh.emit_triangle(
        Vec3::from_array(min),
        Vec3::from_array(max),
        Vec3::from_array(min).midpoint(Vec3::from_array(max)),
        Vec3::ONE,
    );
    let id = store.next_layer_id();
    store.insert(Layer::new(
        id,
        description.to_string(),
        mesh,
        MaterialHints::default(),
    ));
}

#[test]
fn analysis_absent_for_empty_scene() {
    let bounds = aabb([0.0, 0.0, 0.0], [1.0, 1.0, 1.0]);
    assert!(analyze(&bounds, &[]).is_none());
}

#[test]
fn analysis_covers_all_layers_in_order() {
    let mut store = LayerStore::new();
    layer_with_bounds(&mut store, "first", [0.0, 0.0, 0.0], [1.0, 1.0, 1.0]);
    layer_with_bounds(&mut store, "second", [10.0, 0.0, 0.0], [11.0, 1.0, 1.0]);

    let incoming = aabb([0.5, 0.0, 0.0], [1.5, 1.0, 1.0]);
    let analysis = analyze(&incoming, &store.meta()).expect("two prior layers");

    assert_eq!(analysis.relations.len(), 2);
    assert_eq!(analysis.relations[0].description, "first");
    assert_eq!(analysis.relations[1].description, "second");

    let first = &analysis.relations[0];
    assert!(first.overlaps);
    assert!(first.penetration.is_some());
    assert!(first.gap.is_none());

    let second = &analysis.relations[1];
    assert!(!second.overlaps);
    let gap = second.gap.expect("distant layer reports a gap");
    assert_eq!(gap.axis, Axis::X);
    assert!(approx(gap.magnitude, 8.5));

    assert_eq!(analysis.nearest, analysis.relations[0].id);
}

#[test]
fn nearest_tie_breaks_on_insertion_order() {
    let mut store = LayerStore::new();
    // Two layers equidistant from the probe
    layer_with_bounds(&mut store, "left", [-3.0, 0.0, 0.0], [-1.0, 1.0, 1.0]);
    layer_with_bounds(&mut store, "right", [1.0, 0.0, 0.0], [3.0, 1.0, 1.0]);

    let incoming = aabb([-0.5, 0.0, 0.0], [0.5, 1.0, 1.0]);
    let analysis = analyze(&incoming, &store.meta()).unwrap();
    assert_eq!(analysis.nearest, analysis.relations[0].id, "first wins ties");
}

// ============================================================================
// Layer store
// ============================================================================

#[test]
fn ids_are_monotonic_and_never_reused() {
    let mut store = LayerStore::new();
    layer_with_bounds(&mut store, "a", [0.0; 3], [1.0; 3]);
    layer_with_bounds(&mut store, "b", [0.0; 3], [1.0; 3]);
    assert_eq!(store.meta()[0].id, "layer-0");
    assert_eq!(store.meta()[1].id, "layer-1");

    store.remove("layer-0").expect("layer-0 exists");
    layer_with_bounds(&mut store, "c", [0.0; 3], [1.0; 3]);
    let ids: Vec<String> = store.meta().into_iter().map(|m| m.id).collect();
    assert_eq!(ids, ["layer-1", "layer-2"], "removed ids are not recycled");
}

#[test]
fn remove_unknown_returns_none() {
    let mut store = LayerStore::new();
    assert!(store.remove("layer-99").is_none());
}

#[test]
fn removal_leaves_other_layers_untouched() {
    let mut store = LayerStore::new();
    layer_with_bounds(&mut store, "keep", [0.0; 3], [1.0; 3]);
    layer_with_bounds(&mut store, "drop", [2.0; 3], [3.0; 3]);
    let kept_before = store.get("layer-0").unwrap().vertex_count;

    store.remove("layer-1");
    assert_eq!(store.len(), 1);
    assert_eq!(store.get("layer-0").unwrap().vertex_count, kept_before);
    assert_eq!(store.get("layer-0").unwrap().description, "keep");
}

#[test]
fn clear_empties_but_keeps_counting() {
    let mut store = LayerStore::new();
    layer_with_bounds(&mut store, "a", [0.0; 3], [1.0; 3]);
    store.clear();
    assert!(store.is_empty());
    layer_with_bounds(&mut store, "b", [0.0; 3], [1.0; 3]);
    assert_eq!(store.meta()[0].id, "layer-1");
}

#[test]
fn layer_meta_matches_layer() {
    let mut store = LayerStore::new();
    layer_with_bounds(&mut store, "solo", [-1.0, -2.0, -3.0], [1.0, 2.0, -1.0]);
    let layer = store.get("layer-0").unwrap();
    let meta = &store.meta()[0];
    assert_eq!(meta.id, layer.id);
    assert_eq!(meta.vertex_count, layer.vertex_count);
    assert_eq!(meta.bounds, layer.bounds);
    assert_eq!(meta.vertex_count, 3);
}

#[test]
fn empty_layer_has_zero_bounds() {
    let mesh = MeshBuffer::with_initial_capacity(8);
    let layer = Layer::new(
        "layer-7".to_string(),
        String::new(),
        mesh,
        MaterialHints::default(),
    );
    assert_eq!(layer.bounds, Aabb::ZERO);
    assert_eq!(layer.vertex_count, 0);
}
