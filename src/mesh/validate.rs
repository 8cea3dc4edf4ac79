//! Output validation of a drained mesh buffer.
//!
//! Findings are split into errors (the layer is discarded) and warnings
//! (the layer is kept and the host decides what to surface). The checks run
//! once, after the sandbox finishes and before the layer is committed.

use crate::mesh::buffer::MeshBuffer;

/// Thresholds for [`validate_mesh`]. The defaults match the engine's
/// settings; hosts normally never construct this directly.
#[derive(Debug, Clone, Copy)]
pub struct ValidationLimits {
    /// At or above this vertex count the mesh is rejected outright.
    pub hard_vertex_limit: u32,
    /// At or above this vertex count a warning is attached.
    pub warn_vertex_limit: u32,
    /// Positions farther than this from the origin are flagged off-scene.
    pub max_position_magnitude: f32,
    /// Upper bound on the number of triangles sampled for degeneracy.
    pub degenerate_sample_cap: u32,
}

impl Default for ValidationLimits {
    fn default() -> Self {
        Self {
            hard_vertex_limit: 500_000,
            warn_vertex_limit: 100_000,
            max_position_magnitude: 1000.0,
            degenerate_sample_cap: 1000,
        }
    }
}

/// Classified findings from one validation pass.
#[derive(Debug, Default)]
pub struct MeshReport {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl MeshReport {
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    /// Joins all hard errors into one display string.
    #[must_use]
    pub fn combined_errors(&self) -> String {
        self.errors.join("; ")
    }
}

/// Runs every output check against `mesh`.
#[must_use]
pub fn validate_mesh(mesh: &MeshBuffer, limits: &ValidationLimits) -> MeshReport {
    let mut report = MeshReport::default();
    let count = mesh.vertex_count();

    if count >= limits.hard_vertex_limit {
        report.errors.push(format!(
            "vertex count {count} exceeds the hard limit of {}",
            limits.hard_vertex_limit
        ));
    } else if count >= limits.warn_vertex_limit {
        report.warnings.push(format!(
            "vertex count {count} is above {}; consider lower resolution",
            limits.warn_vertex_limit
        ));
    }

    if count == 0 {
        report
            .warnings
            .push("no geometry was produced (zero vertices)".to_string());
        return report;
    }

    check_positions(mesh, limits, &mut report);
    check_channel(mesh.colors(), "colors", &mut report);
    if mesh.has_custom_normals() {
        check_channel(mesh.normals(), "normals", &mut report);
    }
    check_degenerate_triangles(mesh, limits, &mut report);

    report
}

fn check_positions(mesh: &MeshBuffer, limits: &ValidationLimits, report: &mut MeshReport) {
    let mut non_finite = 0_u32;
    let mut off_scene = 0_u32;
    let max_sq = limits.max_position_magnitude * limits.max_position_magnitude;

    for chunk in mesh.positions().chunks_exact(3) {
        if !(chunk[0].is_finite() && chunk[1].is_finite() && chunk[2].is_finite()) {
            non_finite += 1;
        } else if chunk[0] * chunk[0] + chunk[1] * chunk[1] + chunk[2] * chunk[2] > max_sq {
            off_scene += 1;
        }
    }

    if non_finite > 0 {
        report
            .errors
            .push(format!("{non_finite} positions are NaN or infinite"));
    }
    if off_scene > 0 {
        report.warnings.push(format!(
            "{off_scene} positions are more than {} units from the origin",
            limits.max_position_magnitude
        ));
    }
}

fn check_channel(data: &[f32], name: &str, report: &mut MeshReport) {
    let non_finite = data.iter().filter(|v| !v.is_finite()).count();
    if non_finite > 0 {
        report
            .warnings
            .push(format!("{non_finite} non-finite values in {name}"));
    }
}

/// Samples up to the configured cap of triangles, strided so the sample
/// spans the whole mesh, and reports near-zero-area ones.
fn check_degenerate_triangles(
    mesh: &MeshBuffer,
    limits: &ValidationLimits,
    report: &mut MeshReport,
) {
    let tri_count = mesh.triangle_count();
    if tri_count == 0 || limits.degenerate_sample_cap == 0 {
        return;
    }
    let stride = tri_count.div_ceil(limits.degenerate_sample_cap).max(1);

    let mut sampled = 0_u32;
    let mut degenerate = 0_u32;
    let mut tri = 0_u32;
    while tri < tri_count {
        let (Some(a), Some(b), Some(c)) = (
            mesh.position(tri * 3),
            mesh.position(tri * 3 + 1),
            mesh.position(tri * 3 + 2),
        ) else {
            break;
        };
        sampled += 1;
        let cross = (b - a).cross(c - a);
        if cross.length_squared() < 1e-20 {
            degenerate += 1;
        }
        tri += stride;
    }

    if degenerate > 0 {
        let estimated = degenerate * stride;
        report.warnings.push(format!(
            "{degenerate} of {sampled} sampled triangles are degenerate (~{estimated} estimated in total)"
        ));
    }
}
