//! Engine Facade Tests
//!
//! End-to-end scenarios through `Engine::generate`:
//! - Centered sphere, ground grid, twisted torus
//! - Forbidden source and runtime failures leave the scene unchanged
//! - Spatial analysis between generations
//! - Reproducibility, cancellation, removal, serialization

use std::time::Duration;

use limn::engine::{Engine, EngineSettings, GenerationRequest};
use limn::errors::LimnError;
use limn::scene::SceneBounds;

fn engine() -> Engine {
    let _ = env_logger::builder().is_test(true).try_init();
    Engine::new(SceneBounds::default())
}

// ============================================================================
// End-to-end scenarios
// ============================================================================

#[test]
fn centered_sphere_scenario() {
    let mut engine = engine();
    let summary = engine
        .generate("sphere_mesh(0, 0, -3, 0.5, 0.8, 0.3, 0.2, 48)", "a sphere", 1)
        .expect("sphere generation");

    assert!(
        (8_000..=48_000).contains(&summary.vertex_count),
        "vertex count {} outside expectations",
        summary.vertex_count
    );
    assert_eq!(summary.triangles, summary.vertex_count / 3);
    assert!(summary.warnings.is_empty(), "warnings: {:?}", summary.warnings);

    let bounds = summary.bounds;
    let tolerance = 0.03;
    assert!((bounds.min.x + 0.5).abs() < tolerance);
    assert!((bounds.max.x - 0.5).abs() < tolerance);
    assert!((bounds.min.y + 0.5).abs() < tolerance);
    assert!((bounds.max.y - 0.5).abs() < tolerance);
    assert!((bounds.min.z + 3.5).abs() < tolerance);
    assert!((bounds.max.z + 2.5).abs() < tolerance);

    let layer = engine.layer(&summary.layer_id).expect("layer committed");
    assert!(layer.has_custom_normals());
    assert_eq!(summary.top_center[1], bounds.max.y);
    assert_eq!(summary.bottom_center[1], bounds.min.y);
}

#[test]
fn ground_grid_scenario() {
    let mut engine = engine();
    let summary = engine
        .generate(
            "grid(-3, -6, 3, 0, 20, 20, -1.5, [0.35, 0.32, 0.28])",
            "ground",
            1,
        )
        .expect("grid generation");

    assert_eq!(summary.vertex_count, 20 * 20 * 6);
    let bounds = summary.bounds;
    assert_eq!(bounds.min.to_array(), [-3.0, -1.5, -6.0]);
    assert_eq!(bounds.max.to_array(), [3.0, -1.5, 0.0]);

    let layer = engine.layer(&summary.layer_id).unwrap();
    assert!(!layer.has_custom_normals());
}

#[test]
fn twisted_torus_scenario() {
    let mut engine = engine();
    let summary = engine
        .generate(
            "sdf_mesh(
                fn (x, y, z) {
                    let q = twist(x, y, z + 3, 3.0)
                    return sdTorus(q, 0.5, 0.15)
                },
                [0.6, 0.6, 0.9],
                [-0.85, -0.25, -3.85], [0.85, 0.25, -2.15], 60)",
            "twisted torus",
            1,
        )
        .expect("torus generation");

    assert!(summary.vertex_count > 0);
    assert!(summary.warnings.is_empty(), "warnings: {:?}", summary.warnings);
    let center = summary.bounds.center;
    assert!(center.x.abs() < 0.05);
    assert!(center.y.abs() < 0.05);
    assert!((center.z + 3.0).abs() < 0.05);
}

// ============================================================================
// Failure paths
// ============================================================================

#[test]
fn forbidden_source_is_rejected_before_execution() {
    let mut engine = engine();
    let err = engine
        .generate("fetch('https://x')", "bad", 1)
        .unwrap_err();
    assert!(matches!(err, LimnError::Validation(_)), "got {err}");
    assert_eq!(engine.layer_count(), 0, "no layer on validation failure");
}

#[test]
fn runtime_divide_adds_no_layer() {
    let mut engine = engine();
    let err = engine
        .generate("sphere_mesh(0 / 0, 0, -3, 0.5, 1, 1, 1)", "nan sphere", 1)
        .unwrap_err();
    assert!(
        matches!(err, LimnError::Runtime { .. } | LimnError::MeshValidation(_)),
        "got {err}"
    );
    assert_eq!(engine.layer_count(), 0);
}

#[test]
fn hard_vertex_limit_discards_the_mesh() {
    let mut settings = EngineSettings::default();
    settings.limits.hard_vertex_limit = 30;
    let mut engine = Engine::with_settings(SceneBounds::default(), settings);

    let err = engine
        .generate(
            "for (let i = 0; i < 20; i++) {
                emit_triangle([i, 0, 0], [i + 1, 0, 0], [i, 1, 0], [1, 1, 1])
            }",
            "too big",
            1,
        )
        .unwrap_err();
    assert!(matches!(err, LimnError::MeshValidation(_)), "got {err}");
    assert_eq!(engine.layer_count(), 0);
}

#[test]
fn empty_source_yields_empty_layer_with_warning() {
    let mut engine = engine();
    let summary = engine.generate("", "nothing", 1).expect("empty generation");
    assert_eq!(summary.vertex_count, 0);
    assert!(
        summary.warnings.iter().any(|w| w.contains("zero vertices")),
        "warnings: {:?}",
        summary.warnings
    );
    assert_eq!(summary.bounds.min.to_array(), [0.0; 3]);
    assert_eq!(summary.bounds.max.to_array(), [0.0; 3]);
    assert_eq!(engine.layer_count(), 1);
}

#[test]
fn timeout_is_surfaced() {
    let settings = EngineSettings {
        timeout: Duration::from_millis(200),
        fuel_check_interval: 64,
        ..EngineSettings::default()
    };
    let mut engine = Engine::with_settings(SceneBounds::default(), settings);
    let err = engine
        .generate("let i = 0\nwhile (true) { i += 1 }", "spin", 1)
        .unwrap_err();
    assert!(matches!(err, LimnError::Timeout { .. }), "got {err}");
    assert!(err.is_retryable());
    assert_eq!(engine.layer_count(), 0);
}

#[test]
fn cancellation_from_another_thread() {
    let mut engine = engine();
    let token = engine.cancel_token();
    let canceller = std::thread::spawn(move || {
        std::thread::sleep(Duration::from_millis(100));
        token.cancel();
    });
    let err = engine
        .generate("let i = 0\nwhile (true) { i += 1 }", "spin", 1)
        .unwrap_err();
    canceller.join().unwrap();
    assert!(matches!(err, LimnError::Cancelled), "got {err}");
    assert_eq!(engine.layer_count(), 0);
}

// ============================================================================
// Spatial analysis between generations
// ============================================================================

#[test]
fn second_sphere_reports_penetration() {
    let mut engine = engine();
    engine
        .generate("sphere_mesh(0, 0, -3, 0.5, 1, 1, 1, 32)", "first", 1)
        .expect("first sphere");
    let summary = engine
        .generate("sphere_mesh(0.3, 0, -3, 0.5, 1, 1, 1, 32)", "second", 1)
        .expect("second sphere");

    let relations = summary
        .spatial_relationships
        .expect("analysis against one prior layer");
    assert_eq!(relations.len(), 1);
    let relation = &relations[0];
    assert!(relation.overlaps);
    let penetration = relation.penetration.expect("overlapping spheres");
    assert_eq!(penetration.axis, limn::scene::Axis::X);
    assert!(
        (penetration.magnitude - 0.7).abs() < 0.05,
        "penetration {} should be about 0.7",
        penetration.magnitude
    );
    assert!(
        (relation.center_distance - 0.3).abs() < 0.05,
        "center distance {} should be about 0.3",
        relation.center_distance
    );
    assert_eq!(summary.nearest.as_deref(), Some(relation.id.as_str()));
}

#[test]
fn first_generation_has_no_analysis() {
    let mut engine = engine();
    let summary = engine
        .generate("sphere_mesh(0, 0, -3, 0.3, 1, 1, 1, 16)", "solo", 1)
        .unwrap();
    assert!(summary.spatial_relationships.is_none());
    assert!(summary.nearest.is_none());
}

// ============================================================================
// Reproducibility and bookkeeping
// ============================================================================

#[test]
fn same_inputs_are_bitwise_reproducible() {
    let source = "let h = fbm2(1.5, 2.5) * 0.5 + random() * 0.1
        grid(-1, -1, 1, 1, 8, 8, fn (x, z) { return h + noise2(x, z) * 0.2 }, [0.5, 0.5, 0.5])";

    let mut a = engine();
    let mut b = engine();
    let id_a = a.generate(source, "terrain", 12345).unwrap().layer_id;
    let id_b = b.generate(source, "terrain", 12345).unwrap().layer_id;

    let layer_a = a.layer(&id_a).unwrap();
    let layer_b = b.layer(&id_b).unwrap();
    assert_eq!(layer_a.positions(), layer_b.positions());
    assert_eq!(layer_a.colors(), layer_b.colors());

    let mut c = engine();
    let id_c = c.generate(source, "terrain", 54321).unwrap().layer_id;
    assert_ne!(
        a.layer(&id_a).unwrap().positions(),
        c.layer(&id_c).unwrap().positions(),
        "different seeds should move the terrain"
    );
}

#[test]
fn remove_and_clear() {
    let mut engine = engine();
    let first = engine
        .generate("emit_triangle([0,0,0],[1,0,0],[0,1,0],[1,1,1])", "a", 1)
        .unwrap();
    engine
        .generate("emit_triangle([2,0,0],[3,0,0],[2,1,0],[1,1,1])", "b", 1)
        .unwrap();

    assert_eq!(engine.list_meta().len(), 2);
    engine.remove(&first.layer_id).expect("removing a live layer");
    assert_eq!(engine.list_meta().len(), 1);

    let err = engine.remove(&first.layer_id).unwrap_err();
    assert!(matches!(err, LimnError::UnknownLayer(_)));

    engine.clear();
    assert_eq!(engine.layer_count(), 0);
}

#[test]
fn list_meta_preserves_insertion_order() {
    let mut engine = engine();
    for (i, name) in ["ground", "tree", "rock"].iter().enumerate() {
        engine
            .generate(
                &format!("emit_triangle([{i},0,0],[{i},1,0],[{i},0,1],[1,1,1])"),
                name,
                1,
            )
            .unwrap();
    }
    let names: Vec<String> = engine
        .list_meta()
        .into_iter()
        .map(|m| m.description)
        .collect();
    assert_eq!(names, ["ground", "tree", "rock"]);
}

#[test]
fn request_payload_round_trips_through_serde() -> anyhow::Result<()> {
    let payload = r#"{"code": "emit_triangle([0,0,0],[1,0,0],[0,1,0],[1,1,1])", "description": "from json"}"#;
    let request: GenerationRequest = serde_json::from_str(payload)?;

    let mut engine = engine();
    let summary = engine.generate_request(&request, 9)?;
    assert_eq!(summary.vertex_count, 3);

    let out = serde_json::to_value(&summary)?;
    assert_eq!(out["layer_id"], "layer-0");
    assert_eq!(out["triangles"], 1);
    assert!(out["bounds"]["min"].is_array());
    assert!(out.get("spatial_relationships").is_none());
    Ok(())
}
