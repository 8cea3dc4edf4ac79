//! Sandbox Tests
//!
//! Tests for:
//! - Parsing and static validation (denylist, URL literals, depth cap)
//! - Language semantics through the runner: bindings, loops, functions,
//!   arrays, objects, builtins
//! - Error reporting with user-source line numbers
//! - Timeout and cancellation behavior

use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;

use limn::errors::LimnError;
use limn::sandbox::{
    parse, run_sandbox, validate, SandboxConfig, SandboxOutput, FORBIDDEN_IDENTIFIERS,
};
use limn::scene::SceneBounds;

fn config() -> SandboxConfig {
    SandboxConfig {
        timeout: Duration::from_secs(30),
        fuel_check_interval: 256,
        initial_vertex_capacity: 4096,
    }
}

fn run(source: &str) -> Result<SandboxOutput, LimnError> {
    run_sandbox(
        source.to_string(),
        7,
        SceneBounds::default(),
        &config(),
        Arc::new(AtomicBool::new(false)),
    )
}

fn run_ok(source: &str) -> SandboxOutput {
    match run(source) {
        Ok(output) => output,
        Err(err) => panic!("snippet failed: {err}\n{source}"),
    }
}

// ============================================================================
// Static validation
// ============================================================================

#[test]
fn every_forbidden_identifier_is_rejected() {
    for name in FORBIDDEN_IDENTIFIERS {
        let source = format!("let x = {name}");
        let program = parse(&source).expect("denylisted names still parse");
        let result = validate(&program, 64);
        assert!(result.is_err(), "'{name}' slipped through validation");
    }
}

#[test]
fn forbidden_identifier_in_call_position() {
    let program = parse("fetch('x')").unwrap();
    assert!(validate(&program, 64).is_err());
}

#[test]
fn forbidden_url_literals() {
    for url in [
        "\"https://example.com\"",
        "\"http://example.com\"",
        "\"data:text/html,hi\"",
        "\"blob:abc\"",
    ] {
        let program = parse(&format!("let u = {url}")).unwrap();
        assert!(validate(&program, 64).is_err(), "{url} slipped through");
    }
}

#[test]
fn plain_strings_are_fine() {
    let program = parse("let s = 'hello there'").unwrap();
    assert!(validate(&program, 64).is_ok());
}

#[test]
fn nesting_depth_is_capped() {
    // 80 nested array literals
    let source = format!("let x = {}1{}", "[".repeat(80), "]".repeat(80));
    let program = parse(&source).unwrap();
    assert!(validate(&program, 64).is_err());
    assert!(validate(&program, 128).is_ok());
}

#[test]
fn syntax_errors_carry_lines() {
    let err = parse("let a = 1\nlet b = )").unwrap_err();
    assert_eq!(err.line, 2);
}

// ============================================================================
// Language semantics
// ============================================================================

#[test]
fn empty_source_runs_and_emits_nothing() {
    let output = run_ok("");
    assert_eq!(output.mesh.vertex_count(), 0);
}

#[test]
fn loops_and_arithmetic_drive_emission() {
    let output = run_ok(
        "for (let i = 0; i < 5; i++) {
            emit_triangle([i, 0, 0], [i + 1, 0, 0], [i, 1, 0], [1, 1, 1])
        }",
    );
    assert_eq!(output.mesh.vertex_count(), 15);
}

#[test]
fn while_loop_and_compound_assignment() {
    let output = run_ok(
        "let i = 0
         while (i < 3) {
            emit_triangle(i, 0, 0, i + 1, 0, 0, i, 1, 0, 1, 1, 1)
            i += 1
         }",
    );
    assert_eq!(output.mesh.vertex_count(), 9);
}

#[test]
fn functions_and_closures() {
    let output = run_ok(
        "let height = 2
         fn bar(x) {
            emit_triangle([x, 0, 0], [x + 1, 0, 0], [x, height, 0], [1, 0, 0])
         }
         bar(0)
         bar(5)",
    );
    assert_eq!(output.mesh.vertex_count(), 6);
    // The closure captured `height`
    assert_eq!(output.mesh.position(2).map(|p| p.y), Some(2.0));
}

#[test]
fn arrays_push_and_len() {
    let output = run_ok(
        "let pts = []
         for (let i = 0; i <= 4; i++) {
            push(pts, [0.2, i * 0.25])
         }
         if (len(pts) == 5) {
            lathe(0, 0, -3, pts, 8, [1, 1, 1])
         }",
    );
    // Four profile bands of eight quads
    assert_eq!(output.mesh.vertex_count(), 4 * 8 * 6);
}

#[test]
fn conditionals_and_ternary() {
    let output = run_ok(
        "let n = 3 > 2 ? 2 : 99
         if (n == 2 && !(n != 2)) {
            emit_quad([0,0,0], [1,0,0], [1,1,0], [0,1,0], [0.5, 0.5, 0.5])
         } else {
            emit_triangle([0,0,0], [1,0,0], [0,1,0], [1,1,1])
         }",
    );
    assert_eq!(output.mesh.vertex_count(), 6);
}

#[test]
fn set_material_merges_fields() {
    let output = run_ok(
        "set_material({roughness: 0.25, opacity: 0.9})
         set_material({metalness: 1})",
    );
    assert_eq!(output.material.roughness, Some(0.25));
    assert_eq!(output.material.metalness, Some(1.0));
    assert_eq!(output.material.opacity, Some(0.9));
}

#[test]
fn scene_constants_are_injected() {
    let output = run_ok(
        "emit_triangle(
            [SCENE_MIN_X, SCENE_MIN_Y, SCENE_MIN_Z],
            [SCENE_MAX_X, SCENE_MAX_Y, SCENE_MAX_Z],
            [SCENE_CENTER_X, SCENE_CENTER_Y, SCENE_CENTER_Z],
            [1, 1, 1])",
    );
    let p = output.mesh.position(2).unwrap();
    assert_eq!((p.x, p.y, p.z), (0.0, 0.0, -3.0));
}

#[test]
fn math_builtins_work() {
    let output = run_ok(
        "let y = clamp(sin(PI / 2) + sqrt(4) - pow(2, 1), 0, 10)
         emit_triangle([0, y, 0], [1, y, 0], [0, y, 1], [1, 1, 1])",
    );
    // sin(pi/2) + 2 - 2 == 1
    assert!((output.mesh.position(0).unwrap().y - 1.0).abs() < 1e-5);
}

#[test]
fn random_stream_is_seeded() {
    let source = "let r = random()
        emit_triangle([r, 0, 0], [r + 1, 0, 0], [r, 1, 0], [1, 1, 1])";
    let a = run_ok(source);
    let b = run_ok(source);
    assert_eq!(a.mesh.positions(), b.mesh.positions());
}

#[test]
fn user_sdf_drives_the_mesher() {
    let output = run_ok(
        "sdf_mesh(
            fn (x, y, z) { return sdSphere(x, y, z - SCENE_CENTER_Z, 0.4) },
            [0.9, 0.2, 0.1],
            [-0.6, -0.6, -3.6], [0.6, 0.6, -2.4], 20)",
    );
    assert!(output.mesh.vertex_count() > 0);
    assert!(output.mesh.has_custom_normals());
}

#[test]
fn domain_op_arrays_feed_primitives() {
    let output = run_ok(
        "sdf_mesh(
            fn (x, y, z) { return sdTorus(twist(x, y, z, 2.0), 0.4, 0.1) },
            [1, 1, 1],
            [-0.7, -0.3, -0.7], [0.7, 0.3, 0.7], 24)",
    );
    assert!(output.mesh.vertex_count() > 0);
}

// ============================================================================
// Runtime errors
// ============================================================================

#[test]
fn unknown_identifier_reports_its_line() {
    let err = run("let a = 1\nlet b = mystery_value").unwrap_err();
    match err {
        LimnError::Runtime { line, .. } => assert_eq!(line, Some(2)),
        other => panic!("expected a runtime error, got {other}"),
    }
}

#[test]
fn runtime_error_carries_vertex_progress() {
    let err = run(
        "emit_triangle([0,0,0], [1,0,0], [0,1,0], [1,1,1])
         no_such_function()",
    )
    .unwrap_err();
    match err {
        LimnError::Runtime {
            vertices_so_far, ..
        } => assert_eq!(vertices_so_far, 3),
        other => panic!("expected a runtime error, got {other}"),
    }
}

#[test]
fn non_finite_wrapper_arguments_are_runtime_errors() {
    let err = run("sphere_mesh(0 / 0, 0, -3, 0.5, 1, 1, 1)").unwrap_err();
    match err {
        LimnError::Runtime { message, .. } => {
            assert!(message.contains("non-finite"), "message: {message}");
        }
        other => panic!("expected a runtime error, got {other}"),
    }
}

#[test]
fn deep_recursion_is_a_runtime_error() {
    let err = run("fn loop_forever(n) { return loop_forever(n + 1) }\nloop_forever(0)")
        .unwrap_err();
    assert!(matches!(err, LimnError::Runtime { .. }));
}

#[test]
fn out_of_bounds_index_is_a_runtime_error() {
    let err = run("let a = [1, 2, 3]\nlet b = a[5]").unwrap_err();
    match err {
        LimnError::Runtime { line, message, .. } => {
            assert_eq!(line, Some(2));
            assert!(message.contains("out of bounds"));
        }
        other => panic!("expected a runtime error, got {other}"),
    }
}

// ============================================================================
// Timeout and cancellation
// ============================================================================

#[test]
fn infinite_loop_times_out() {
    let tight = SandboxConfig {
        timeout: Duration::from_millis(200),
        fuel_check_interval: 64,
        initial_vertex_capacity: 1024,
    };
    let result = run_sandbox(
        "let i = 0\nwhile (true) { i += 1 }".to_string(),
        1,
        SceneBounds::default(),
        &tight,
        Arc::new(AtomicBool::new(false)),
    );
    assert!(matches!(result, Err(LimnError::Timeout { .. })));
}

#[test]
fn abort_flag_cancels_execution() {
    let abort = Arc::new(AtomicBool::new(false));
    let flag = abort.clone();
    let handle = std::thread::spawn(move || {
        std::thread::sleep(Duration::from_millis(100));
        flag.store(true, std::sync::atomic::Ordering::Relaxed);
    });
    let result = run_sandbox(
        "let i = 0\nwhile (true) { i += 1 }".to_string(),
        1,
        SceneBounds::default(),
        &config(),
        abort,
    );
    handle.join().unwrap();
    assert!(matches!(result, Err(LimnError::Cancelled)));
}
