//! Bindings injected into every sandbox.
//!
//! These are the free functions and constants a snippet sees: math, the
//! seeded noise/RNG surface, the SDF library, the emitters, the meshers,
//! and the scene-volume constants. Dispatch is by name against the flat
//! [`BUILTIN_NAMES`] list; user bindings shadow builtins, builtins never
//! shadow user bindings.
//!
//! Argument marshalling is deliberately forgiving about shape: anywhere a
//! point or color is expected, either a `[x, y, z]` array or three loose
//! numbers are accepted, matching how language models actually write these
//! calls.

use std::cell::RefCell;
use std::rc::Rc;

use glam::{Vec2, Vec3};

use crate::mesh::buffer::MaterialHints;
use crate::mesh::extrude::extrude_path;
use crate::mesh::grid::{try_grid, Heightfield};
use crate::mesh::lathe::lathe;
use crate::mesh::marching_cubes::{marching_cubes, try_marching_cubes, FieldSampler};
use crate::noise::{fbm2, fbm3, noise2, noise3, FbmParams};
use crate::sandbox::interp::{Interp, Interrupt, Value};
use crate::sdf;

/// Padding factor for the convenience mesh wrappers: bounds reach 30% past
/// the primitive's extent so the surface never clips the sampling box.
const WRAPPER_PADDING: f32 = 1.3;

/// Cells-per-axis ceiling for the meshers. `(R+1)³` samples are held in
/// memory, so this bounds a single call to a few tens of megabytes.
const MAX_RESOLUTION: u32 = 256;

/// Default resolution for the convenience wrappers.
const DEFAULT_WRAPPER_RESOLUTION: u32 = 48;

/// Ceiling on quads a single lathe or extrusion call may stitch. The fuel
/// meter cannot see inside these native loops, so oversized requests are
/// rejected up front instead of stalling past the deadline; anything this
/// size would fail the output vertex checks anyway.
const MAX_SWEEP_QUADS: u64 = 1_000_000;

/// Every callable binding, grouped as in the module docs.
pub const BUILTIN_NAMES: &[&str] = &[
    // Math
    "abs", "floor", "ceil", "round", "sqrt", "pow", "exp", "log", "sign", "min", "max", "clamp",
    "mix", "sin", "cos", "tan", "asin", "acos", "atan", "atan2",
    // Arrays
    "len", "push",
    // Noise / RNG
    "random", "noise2", "noise3", "fbm2", "fbm3",
    // SDF primitives
    "sdSphere", "sdBox", "sdCapsule", "sdTorus", "sdCone", "sdPlane", "sdCylinder", "sdEllipsoid",
    "sdOctahedron", "sdHexPrism", "sdTaperedCylinder",
    // SDF operators
    "opUnion", "opSubtract", "opIntersect", "opXor", "opSmoothUnion", "opSmoothSubtract",
    "opSmoothIntersect", "opChamferUnion", "opChamferIntersect", "opChamferSubtract",
    "opStairsUnion", "opStairsIntersect", "opStairsSubtract", "opRound", "opDisplace", "opShell",
    // Domain operators
    "mirror", "repeat", "twist", "bend", "rotateY",
    // Emitters and material
    "emit_triangle", "emit_quad", "emit_smooth_triangle", "set_material",
    // Meshers
    "sdf_mesh", "lathe", "extrude_path", "grid",
    // Convenience wrappers
    "sphere_mesh", "box_mesh", "cylinder_mesh", "torus_mesh",
];

#[must_use]
pub fn is_builtin(name: &str) -> bool {
    BUILTIN_NAMES.contains(&name)
}

/// Ambient constants: math and the scene volume of the current generation.
#[must_use]
pub fn constant(interp: &Interp, name: &str) -> Option<Value> {
    let scene = &interp.scene;
    let v = match name {
        "PI" => std::f64::consts::PI,
        "TAU" => std::f64::consts::TAU,
        "SCENE_MIN_X" => f64::from(scene.min.x),
        "SCENE_MIN_Y" => f64::from(scene.min.y),
        "SCENE_MIN_Z" => f64::from(scene.min.z),
        "SCENE_MAX_X" => f64::from(scene.max.x),
        "SCENE_MAX_Y" => f64::from(scene.max.y),
        "SCENE_MAX_Z" => f64::from(scene.max.z),
        "SCENE_CENTER_X" => f64::from(scene.center.x),
        "SCENE_CENTER_Y" => f64::from(scene.center.y),
        "SCENE_CENTER_Z" => f64::from(scene.center.z),
        _ => return None,
    };
    Some(Value::Num(v))
}

/// Dispatches one builtin call with already-evaluated arguments.
pub fn call(interp: &mut Interp, name: &str, args: &[Value], line: u32) -> Result<Value, Interrupt> {
    let mut a = Args::new(name, args, line);
    match name {
        // ====================================================================
        // Math
        // ====================================================================
        "abs" => Ok(Value::Num(a.num()?.abs())),
        "floor" => Ok(Value::Num(a.num()?.floor())),
        "ceil" => Ok(Value::Num(a.num()?.ceil())),
        "round" => Ok(Value::Num(a.num()?.round())),
        "sqrt" => Ok(Value::Num(a.num()?.sqrt())),
        "pow" => Ok(Value::Num(a.num()?.powf(a.num()?))),
        "exp" => Ok(Value::Num(a.num()?.exp())),
        "log" => Ok(Value::Num(a.num()?.ln())),
        "sign" => {
            let n = a.num()?;
            Ok(Value::Num(if n > 0.0 {
                1.0
            } else if n < 0.0 {
                -1.0
            } else {
                0.0
            }))
        }
        "min" => {
            let mut result = a.num()?;
            while !a.exhausted() {
                result = result.min(a.num()?);
            }
            Ok(Value::Num(result))
        }
        "max" => {
            let mut result = a.num()?;
            while !a.exhausted() {
                result = result.max(a.num()?);
            }
            Ok(Value::Num(result))
        }
        "clamp" => {
            let x = a.num()?;
            let lo = a.num()?;
            let hi = a.num()?;
            Ok(Value::Num(x.clamp(lo, hi.max(lo))))
        }
        "mix" => {
            let x = a.num()?;
            let y = a.num()?;
            let t = a.num()?;
            Ok(Value::Num(x + (y - x) * t))
        }
        "sin" => Ok(Value::Num(a.num()?.sin())),
        "cos" => Ok(Value::Num(a.num()?.cos())),
        "tan" => Ok(Value::Num(a.num()?.tan())),
        "asin" => Ok(Value::Num(a.num()?.asin())),
        "acos" => Ok(Value::Num(a.num()?.acos())),
        "atan" => Ok(Value::Num(a.num()?.atan())),
        "atan2" => Ok(Value::Num(a.num()?.atan2(a.num()?))),

        // ====================================================================
        // Arrays
        // ====================================================================
        "len" => match a.value()? {
            Value::Array(items) => Ok(Value::Num(items.borrow().len() as f64)),
            Value::Str(s) => Ok(Value::Num(s.chars().count() as f64)),
            other => Err(Interrupt::error(
                format!("len() expects an array or string, got {}", other.type_name()),
                line,
            )),
        },
        "push" => {
            let Value::Array(items) = a.value()? else {
                return Err(Interrupt::error("push() expects an array", line));
            };
            let items = items.clone();
            let value = a.value()?.clone();
            items.borrow_mut().push(value);
            let new_len = items.borrow().len();
            Ok(Value::Num(new_len as f64))
        }

        // ====================================================================
        // Noise / RNG
        // ====================================================================
        "random" => Ok(Value::Num(f64::from(interp.rng.next_f32()))),
        "noise2" => {
            let x = a.f32()?;
            let y = a.f32()?;
            Ok(Value::Num(f64::from(noise2(interp.seed, x, y))))
        }
        "noise3" => {
            let x = a.f32()?;
            let y = a.f32()?;
            let z = a.f32()?;
            Ok(Value::Num(f64::from(noise3(interp.seed, x, y, z))))
        }
        "fbm2" => {
            let x = a.f32()?;
            let y = a.f32()?;
            let params = a.fbm_params()?;
            Ok(Value::Num(f64::from(fbm2(interp.seed, x, y, params))))
        }
        "fbm3" => {
            let x = a.f32()?;
            let y = a.f32()?;
            let z = a.f32()?;
            let params = a.fbm_params()?;
            Ok(Value::Num(f64::from(fbm3(interp.seed, x, y, z, params))))
        }

        // ====================================================================
        // SDF primitives (point first, as array or three numbers)
        // ====================================================================
        "sdSphere" => {
            let p = a.point()?;
            Ok(num(sdf::sd_sphere(p, a.f32()?)))
        }
        "sdBox" => {
            let p = a.point()?;
            Ok(num(sdf::sd_box(p, a.f32()?, a.f32()?, a.f32()?)))
        }
        "sdCapsule" => {
            let p = a.point()?;
            let seg_a = a.point()?;
            let seg_b = a.point()?;
            Ok(num(sdf::sd_capsule(p, seg_a, seg_b, a.f32()?)))
        }
        "sdTorus" => {
            let p = a.point()?;
            Ok(num(sdf::sd_torus(p, a.f32()?, a.f32()?)))
        }
        "sdCone" => {
            let p = a.point()?;
            Ok(num(sdf::sd_cone(p, a.f32()?, a.f32()?)))
        }
        "sdPlane" => {
            let p = a.point()?;
            let n = a.point()?;
            Ok(num(sdf::sd_plane(p, n, a.f32()?)))
        }
        "sdCylinder" => {
            let p = a.point()?;
            Ok(num(sdf::sd_cylinder(p, a.f32()?, a.f32()?)))
        }
        "sdEllipsoid" => {
            let p = a.point()?;
            Ok(num(sdf::sd_ellipsoid(p, a.f32()?, a.f32()?, a.f32()?)))
        }
        "sdOctahedron" => {
            let p = a.point()?;
            Ok(num(sdf::sd_octahedron(p, a.f32()?)))
        }
        "sdHexPrism" => {
            let p = a.point()?;
            Ok(num(sdf::sd_hex_prism(p, a.f32()?, a.f32()?)))
        }
        "sdTaperedCylinder" => {
            let p = a.point()?;
            Ok(num(sdf::sd_tapered_cylinder(p, a.f32()?, a.f32()?, a.f32()?)))
        }

        // ====================================================================
        // SDF operators
        // ====================================================================
        "opUnion" => Ok(num(sdf::op_union(a.f32()?, a.f32()?))),
        "opSubtract" => Ok(num(sdf::op_subtract(a.f32()?, a.f32()?))),
        "opIntersect" => Ok(num(sdf::op_intersect(a.f32()?, a.f32()?))),
        "opXor" => Ok(num(sdf::op_xor(a.f32()?, a.f32()?))),
        "opSmoothUnion" => Ok(num(sdf::op_smooth_union(a.f32()?, a.f32()?, a.f32()?))),
        "opSmoothSubtract" => Ok(num(sdf::op_smooth_subtract(a.f32()?, a.f32()?, a.f32()?))),
        "opSmoothIntersect" => Ok(num(sdf::op_smooth_intersect(a.f32()?, a.f32()?, a.f32()?))),
        "opChamferUnion" => Ok(num(sdf::op_chamfer_union(a.f32()?, a.f32()?, a.f32()?))),
        "opChamferIntersect" => Ok(num(sdf::op_chamfer_intersect(a.f32()?, a.f32()?, a.f32()?))),
        "opChamferSubtract" => Ok(num(sdf::op_chamfer_subtract(a.f32()?, a.f32()?, a.f32()?))),
        "opStairsUnion" => Ok(num(sdf::op_stairs_union(
            a.f32()?,
            a.f32()?,
            a.f32()?,
            a.f32()?,
        ))),
        "opStairsIntersect" => Ok(num(sdf::op_stairs_intersect(
            a.f32()?,
            a.f32()?,
            a.f32()?,
            a.f32()?,
        ))),
        "opStairsSubtract" => Ok(num(sdf::op_stairs_subtract(
            a.f32()?,
            a.f32()?,
            a.f32()?,
            a.f32()?,
        ))),
        "opRound" => Ok(num(sdf::op_round(a.f32()?, a.f32()?))),
        "opDisplace" => Ok(num(sdf::op_displace(a.f32()?, a.f32()?))),
        "opShell" => Ok(num(sdf::op_shell(a.f32()?, a.f32()?))),

        // ====================================================================
        // Domain operators
        // ====================================================================
        "mirror" => Ok(num(sdf::dom_mirror(a.f32()?))),
        "repeat" => Ok(num(sdf::dom_repeat(a.f32()?, a.f32()?))),
        "twist" => {
            let p = a.point()?;
            let (x, y, z) = sdf::dom_twist(p.x, p.y, p.z, a.f32()?);
            Ok(array(&[x, y, z]))
        }
        "bend" => {
            let x = a.f32()?;
            let y = a.f32()?;
            let (bx, by) = sdf::dom_bend(x, y, a.f32()?);
            Ok(array(&[bx, by]))
        }
        "rotateY" => {
            let x = a.f32()?;
            let z = a.f32()?;
            let (rx, rz) = sdf::dom_rotate_y(x, z, a.f32()?);
            Ok(array(&[rx, rz]))
        }

        // ====================================================================
        // Emitters and material
        // ====================================================================
        "emit_triangle" => {
            let p1 = a.point()?;
            let p2 = a.point()?;
            let p3 = a.point()?;
            let color = a.color()?;
            interp.mesh.emit_triangle(p1, p2, p3, color);
            Ok(Value::Null)
        }
        "emit_quad" => {
            let p1 = a.point()?;
            let p2 = a.point()?;
            let p3 = a.point()?;
            let p4 = a.point()?;
            let color = a.color()?;
            interp.mesh.emit_quad(p1, p2, p3, p4, color);
            Ok(Value::Null)
        }
        "emit_smooth_triangle" => {
            let p1 = a.point()?;
            let n1 = a.point()?;
            let p2 = a.point()?;
            let n2 = a.point()?;
            let p3 = a.point()?;
            let n3 = a.point()?;
            let color = a.color()?;
            interp
                .mesh
                .emit_smooth_triangle(p1, n1, p2, n2, p3, n3, color);
            Ok(Value::Null)
        }
        "set_material" => {
            let hints = a.material_hints()?;
            interp.material.merge(hints);
            Ok(Value::Null)
        }

        // ====================================================================
        // Meshers
        // ====================================================================
        "sdf_mesh" => {
            let sdf_fn = a.func()?;
            let color = a.color_source()?;
            let b_min = a.finite_point()?;
            let b_max = a.finite_point()?;
            let resolution = a.resolution()?;
            run_snippet_field(interp, sdf_fn, color, b_min, b_max, resolution, line)
        }
        "lathe" => {
            let center = a.finite_point()?;
            let profile = a.vec2_list("lathe profile")?;
            let segments = a.finite()? as u32;
            let color = a.color()?;
            let angle_offset = a.opt_finite(0.0)? as f32;
            let quads = profile.len().saturating_sub(1) as u64 * u64::from(segments);
            if quads > MAX_SWEEP_QUADS {
                return Err(Interrupt::error(
                    format!("lathe: {quads} quads exceeds the per-call limit"),
                    line,
                ));
            }
            lathe(&mut interp.mesh, center, &profile, segments, angle_offset, color);
            Ok(Value::Null)
        }
        "extrude_path" => {
            let profile = a.vec2_list("extrusion profile")?;
            let path = a.vec3_list("extrusion path")?;
            let closed = a.bool()?;
            let color = a.color()?;
            let quads = profile.len() as u64 * path.len().saturating_sub(1) as u64;
            if quads > MAX_SWEEP_QUADS {
                return Err(Interrupt::error(
                    format!("extrude_path: {quads} quads exceeds the per-call limit"),
                    line,
                ));
            }
            extrude_path(&mut interp.mesh, &profile, &path, closed, color);
            Ok(Value::Null)
        }
        "grid" => {
            let x0 = a.finite()? as f32;
            let z0 = a.finite()? as f32;
            let x1 = a.finite()? as f32;
            let z1 = a.finite()? as f32;
            let res_x = a.resolution()?;
            let res_z = a.resolution()?;
            let height = a.height_source()?;
            let color = a.color_source()?;
            run_snippet_grid(interp, x0, z0, x1, z1, res_x, res_z, height, color, line)
        }

        // ====================================================================
        // Convenience wrappers: padded bounds, then sdf_mesh
        // ====================================================================
        "sphere_mesh" => {
            let center = a.finite_point()?;
            let radius = a.finite()? as f32;
            let color = a.color()?;
            let resolution = a.opt_resolution()?;
            let extent = Vec3::splat(radius.abs() * WRAPPER_PADDING);
            marching_cubes(
                &mut interp.mesh,
                center - extent,
                center + extent,
                resolution,
                |p| sdf::sd_sphere(p - center, radius),
                |_| color,
            );
            Ok(Value::Null)
        }
        "box_mesh" => {
            let center = a.finite_point()?;
            let half = a.finite_point()?;
            let color = a.color()?;
            let resolution = a.opt_resolution()?;
            let extent = half.abs() * WRAPPER_PADDING;
            marching_cubes(
                &mut interp.mesh,
                center - extent,
                center + extent,
                resolution,
                |p| sdf::sd_box(p - center, half.x, half.y, half.z),
                |_| color,
            );
            Ok(Value::Null)
        }
        "cylinder_mesh" => {
            let center = a.finite_point()?;
            let radius = a.finite()? as f32;
            let half_h = a.finite()? as f32;
            let color = a.color()?;
            let resolution = a.opt_resolution()?;
            let extent = Vec3::new(
                radius.abs() * WRAPPER_PADDING,
                half_h.abs() * WRAPPER_PADDING,
                radius.abs() * WRAPPER_PADDING,
            );
            marching_cubes(
                &mut interp.mesh,
                center - extent,
                center + extent,
                resolution,
                |p| sdf::sd_cylinder(p - center, radius, half_h),
                |_| color,
            );
            Ok(Value::Null)
        }
        "torus_mesh" => {
            let center = a.finite_point()?;
            let big_r = a.finite()? as f32;
            let small_r = a.finite()? as f32;
            let color = a.color()?;
            let resolution = a.opt_resolution()?;
            let ring = (big_r.abs() + small_r.abs()) * WRAPPER_PADDING;
            let extent = Vec3::new(ring, small_r.abs() * WRAPPER_PADDING, ring);
            marching_cubes(
                &mut interp.mesh,
                center - extent,
                center + extent,
                resolution,
                |p| sdf::sd_torus(p - center, big_r, small_r),
                |_| color,
            );
            Ok(Value::Null)
        }

        other => Err(Interrupt::error(format!("unknown builtin '{other}'"), line)),
    }
}

fn num(v: f32) -> Value {
    Value::Num(f64::from(v))
}

fn array(values: &[f32]) -> Value {
    Value::Array(Rc::new(RefCell::new(
        values.iter().map(|v| Value::Num(f64::from(*v))).collect(),
    )))
}

// ============================================================================
// User-function-driven meshing
// ============================================================================

/// Color input of a mesher: either a user function of position or a fixed
/// color.
enum ColorSource {
    Func(Value),
    Const(Vec3),
}

/// Height input of the grid mesher.
enum HeightSource {
    Func(Value),
    Const(f32),
}

struct SnippetField<'a> {
    interp: &'a mut Interp,
    sdf: Value,
    color: ColorSource,
    line: u32,
}

impl FieldSampler for SnippetField<'_> {
    type Error = Interrupt;

    fn distance(&mut self, p: Vec3) -> Result<f32, Interrupt> {
        let result = self.interp.call_value(
            &self.sdf,
            &[
                Value::Num(f64::from(p.x)),
                Value::Num(f64::from(p.y)),
                Value::Num(f64::from(p.z)),
            ],
            self.line,
        )?;
        match result {
            Value::Num(d) => Ok(d as f32),
            other => Err(Interrupt::error(
                format!(
                    "sdf function must return a number, got {}",
                    other.type_name()
                ),
                self.line,
            )),
        }
    }

    fn color(&mut self, p: Vec3) -> Result<Vec3, Interrupt> {
        match &self.color {
            ColorSource::Const(c) => Ok(*c),
            ColorSource::Func(f) => {
                let f = f.clone();
                let result = self.interp.call_value(
                    &f,
                    &[
                        Value::Num(f64::from(p.x)),
                        Value::Num(f64::from(p.y)),
                        Value::Num(f64::from(p.z)),
                    ],
                    self.line,
                )?;
                color_from_value(&result, self.line)
            }
        }
    }
}

fn run_snippet_field(
    interp: &mut Interp,
    sdf_fn: Value,
    color: ColorSource,
    b_min: Vec3,
    b_max: Vec3,
    resolution: u32,
    line: u32,
) -> Result<Value, Interrupt> {
    // Detach the buffer so user callbacks can borrow the interpreter; any
    // vertices those callbacks emit directly land in a fresh buffer and are
    // merged back afterwards.
    let mut mesh = std::mem::take(&mut interp.mesh);
    let mut field = SnippetField {
        interp: &mut *interp,
        sdf: sdf_fn,
        color,
        line,
    };
    let result = try_marching_cubes(&mut mesh, b_min, b_max, resolution, &mut field);
    drop(field);
    let stray = std::mem::replace(&mut interp.mesh, mesh);
    interp.mesh.append(&stray);
    result?;
    Ok(Value::Null)
}

struct SnippetGrid<'a> {
    interp: &'a mut Interp,
    height: HeightSource,
    color: ColorSource,
    line: u32,
}

impl Heightfield for SnippetGrid<'_> {
    type Error = Interrupt;

    fn height(&mut self, x: f32, z: f32) -> Result<f32, Interrupt> {
        match &self.height {
            HeightSource::Const(h) => Ok(*h),
            HeightSource::Func(f) => {
                let f = f.clone();
                let result = self.interp.call_value(
                    &f,
                    &[Value::Num(f64::from(x)), Value::Num(f64::from(z))],
                    self.line,
                )?;
                match result {
                    Value::Num(h) => Ok(h as f32),
                    other => Err(Interrupt::error(
                        format!(
                            "height function must return a number, got {}",
                            other.type_name()
                        ),
                        self.line,
                    )),
                }
            }
        }
    }

    fn color(&mut self, x: f32, z: f32) -> Result<Vec3, Interrupt> {
        match &self.color {
            ColorSource::Const(c) => Ok(*c),
            ColorSource::Func(f) => {
                let f = f.clone();
                let result = self.interp.call_value(
                    &f,
                    &[Value::Num(f64::from(x)), Value::Num(f64::from(z))],
                    self.line,
                )?;
                color_from_value(&result, self.line)
            }
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn run_snippet_grid(
    interp: &mut Interp,
    x0: f32,
    z0: f32,
    x1: f32,
    z1: f32,
    res_x: u32,
    res_z: u32,
    height: HeightSource,
    color: ColorSource,
    line: u32,
) -> Result<Value, Interrupt> {
    let mut mesh = std::mem::take(&mut interp.mesh);
    let mut field = SnippetGrid {
        interp: &mut *interp,
        height,
        color,
        line,
    };
    let result = try_grid(&mut mesh, x0, z0, x1, z1, res_x, res_z, &mut field);
    drop(field);
    let stray = std::mem::replace(&mut interp.mesh, mesh);
    interp.mesh.append(&stray);
    result?;
    Ok(Value::Null)
}

fn color_from_value(value: &Value, line: u32) -> Result<Vec3, Interrupt> {
    let Value::Array(items) = value else {
        return Err(Interrupt::error(
            format!(
                "color function must return an [r, g, b] array, got {}",
                value.type_name()
            ),
            line,
        ));
    };
    let items = items.borrow();
    if items.len() < 3 {
        return Err(Interrupt::error(
            "color array needs three components",
            line,
        ));
    }
    let mut rgb = [0.0_f32; 3];
    for (slot, item) in rgb.iter_mut().zip(items.iter()) {
        let Value::Num(n) = item else {
            return Err(Interrupt::error("color components must be numbers", line));
        };
        *slot = *n as f32;
    }
    Ok(Vec3::from_array(rgb))
}

// ============================================================================
// Argument marshalling
// ============================================================================

struct Args<'a> {
    name: &'a str,
    values: &'a [Value],
    pos: usize,
    line: u32,
}

impl<'a> Args<'a> {
    fn new(name: &'a str, values: &'a [Value], line: u32) -> Self {
        Self {
            name,
            values,
            pos: 0,
            line,
        }
    }

    fn exhausted(&self) -> bool {
        self.pos >= self.values.len()
    }

    fn missing(&self, what: &str) -> Interrupt {
        Interrupt::error(
            format!("{}: missing argument, expected {what}", self.name),
            self.line,
        )
    }

    fn value(&mut self) -> Result<&'a Value, Interrupt> {
        let value = self.values.get(self.pos).ok_or_else(|| self.missing("a value"))?;
        self.pos += 1;
        Ok(value)
    }

    fn num(&mut self) -> Result<f64, Interrupt> {
        match self.value()? {
            Value::Num(n) => Ok(*n),
            other => Err(Interrupt::error(
                format!("{}: expected a number, got {}", self.name, other.type_name()),
                self.line,
            )),
        }
    }

    fn f32(&mut self) -> Result<f32, Interrupt> {
        Ok(self.num()? as f32)
    }

    /// A number that must be finite (shape parameters, bounds, counts).
    fn finite(&mut self) -> Result<f64, Interrupt> {
        let n = self.num()?;
        if n.is_finite() {
            Ok(n)
        } else {
            Err(Interrupt::error(
                format!("{}: non-finite argument", self.name),
                self.line,
            ))
        }
    }

    fn opt_finite(&mut self, default: f64) -> Result<f64, Interrupt> {
        if self.exhausted() {
            Ok(default)
        } else {
            self.finite()
        }
    }

    fn bool(&mut self) -> Result<bool, Interrupt> {
        Ok(self.value()?.truthy())
    }

    fn func(&mut self) -> Result<Value, Interrupt> {
        match self.value()? {
            f @ Value::Func(_) => Ok(f.clone()),
            other => Err(Interrupt::error(
                format!(
                    "{}: expected a function, got {}",
                    self.name,
                    other.type_name()
                ),
                self.line,
            )),
        }
    }

    /// A point: one `[x, y, z]` array or three loose numbers.
    fn point(&mut self) -> Result<Vec3, Interrupt> {
        if let Some(Value::Array(items)) = self.values.get(self.pos) {
            let items = items.borrow();
            if items.len() < 3 {
                return Err(Interrupt::error(
                    format!("{}: point array needs three components", self.name),
                    self.line,
                ));
            }
            let mut xyz = [0.0_f32; 3];
            for (slot, item) in xyz.iter_mut().zip(items.iter()) {
                let Value::Num(n) = item else {
                    return Err(Interrupt::error(
                        format!("{}: point components must be numbers", self.name),
                        self.line,
                    ));
                };
                *slot = *n as f32;
            }
            self.pos += 1;
            return Ok(Vec3::from_array(xyz));
        }
        Ok(Vec3::new(self.f32()?, self.f32()?, self.f32()?))
    }

    /// A point whose components must all be finite.
    fn finite_point(&mut self) -> Result<Vec3, Interrupt> {
        let p = self.point()?;
        if p.is_finite() {
            Ok(p)
        } else {
            Err(Interrupt::error(
                format!("{}: non-finite argument", self.name),
                self.line,
            ))
        }
    }

    /// A color: same shapes as a point.
    fn color(&mut self) -> Result<Vec3, Interrupt> {
        self.point()
    }

    /// A color that may also be a function of position.
    fn color_source(&mut self) -> Result<ColorSource, Interrupt> {
        if matches!(self.values.get(self.pos), Some(Value::Func(_))) {
            return Ok(ColorSource::Func(self.func()?));
        }
        Ok(ColorSource::Const(self.color()?))
    }

    /// A height: a function of `(x, z)` or a constant number.
    fn height_source(&mut self) -> Result<HeightSource, Interrupt> {
        if matches!(self.values.get(self.pos), Some(Value::Func(_))) {
            return Ok(HeightSource::Func(self.func()?));
        }
        Ok(HeightSource::Const(self.finite()? as f32))
    }

    fn resolution(&mut self) -> Result<u32, Interrupt> {
        let n = self.finite()?;
        let r = n as i64;
        if r < 1 {
            return Err(Interrupt::error(
                format!("{}: resolution must be at least 1", self.name),
                self.line,
            ));
        }
        if r > i64::from(MAX_RESOLUTION) {
            return Err(Interrupt::error(
                format!(
                    "{}: resolution {r} exceeds the maximum of {MAX_RESOLUTION}",
                    self.name
                ),
                self.line,
            ));
        }
        Ok(r as u32)
    }

    fn opt_resolution(&mut self) -> Result<u32, Interrupt> {
        if self.exhausted() {
            Ok(DEFAULT_WRAPPER_RESOLUTION)
        } else {
            self.resolution()
        }
    }

    fn fbm_params(&mut self) -> Result<FbmParams, Interrupt> {
        let defaults = FbmParams::default();
        let octaves = self.opt_finite(f64::from(defaults.octaves))? as u32;
        let gain = self.opt_finite(f64::from(defaults.gain))? as f32;
        let lacunarity = self.opt_finite(f64::from(defaults.lacunarity))? as f32;
        Ok(FbmParams {
            octaves: octaves.clamp(1, 12),
            gain,
            lacunarity,
        })
    }

    /// A list of `[a, b]` pairs (lathe profiles, extrusion cross-sections).
    fn vec2_list(&mut self, what: &str) -> Result<Vec<Vec2>, Interrupt> {
        let Value::Array(items) = self.value()? else {
            return Err(Interrupt::error(
                format!("{}: {what} must be an array of [a, b] pairs", self.name),
                self.line,
            ));
        };
        let items = items.borrow();
        let mut out = Vec::with_capacity(items.len());
        for item in items.iter() {
            let Value::Array(pair) = item else {
                return Err(Interrupt::error(
                    format!("{}: {what} entries must be [a, b] arrays", self.name),
                    self.line,
                ));
            };
            let pair = pair.borrow();
            let (Some(Value::Num(x)), Some(Value::Num(y))) = (pair.first(), pair.get(1)) else {
                return Err(Interrupt::error(
                    format!("{}: {what} entries must hold two numbers", self.name),
                    self.line,
                ));
            };
            out.push(Vec2::new(*x as f32, *y as f32));
        }
        Ok(out)
    }

    /// A list of `[x, y, z]` points (extrusion paths).
    fn vec3_list(&mut self, what: &str) -> Result<Vec<Vec3>, Interrupt> {
        let Value::Array(items) = self.value()? else {
            return Err(Interrupt::error(
                format!("{}: {what} must be an array of [x, y, z] points", self.name),
                self.line,
            ));
        };
        let items = items.borrow();
        let mut out = Vec::with_capacity(items.len());
        for item in items.iter() {
            let Value::Array(triple) = item else {
                return Err(Interrupt::error(
                    format!("{}: {what} entries must be [x, y, z] arrays", self.name),
                    self.line,
                ));
            };
            let triple = triple.borrow();
            let (Some(Value::Num(x)), Some(Value::Num(y)), Some(Value::Num(z))) =
                (triple.first(), triple.get(1), triple.get(2))
            else {
                return Err(Interrupt::error(
                    format!("{}: {what} entries must hold three numbers", self.name),
                    self.line,
                ));
            };
            out.push(Vec3::new(*x as f32, *y as f32, *z as f32));
        }
        Ok(out)
    }

    /// Material hints from an object literal or loose positional numbers.
    fn material_hints(&mut self) -> Result<MaterialHints, Interrupt> {
        if let Some(Value::Object(map)) = self.values.get(self.pos) {
            let map = map.borrow();
            let field = |key: &str| -> Result<Option<f32>, Interrupt> {
                match map.get(key) {
                    None | Some(Value::Null) => Ok(None),
                    Some(Value::Num(n)) => Ok(Some(*n as f32)),
                    Some(other) => Err(Interrupt::error(
                        format!(
                            "set_material: '{key}' must be a number, got {}",
                            other.type_name()
                        ),
                        self.line,
                    )),
                }
            };
            let hints = MaterialHints {
                roughness: field("roughness")?,
                metalness: field("metalness")?,
                opacity: field("opacity")?,
            };
            self.pos += 1;
            return Ok(hints);
        }

        let mut hints = MaterialHints::default();
        if !self.exhausted() {
            hints.roughness = Some(self.finite()? as f32);
        }
        if !self.exhausted() {
            hints.metalness = Some(self.finite()? as f32);
        }
        if !self.exhausted() {
            hints.opacity = Some(self.finite()? as f32);
        }
        Ok(hints)
    }
}
