//! Engine Facade
//!
//! This module contains [`Engine`], the coordinator of the whole pipeline:
//! static validation → sandboxed execution → output validation → layer
//! packaging. It is a pure engine instance without any transport or UI
//! logic, allowing it to be driven by different frontends (a chat host, a
//! CLI, tests).
//!
//! # Architecture
//!
//! One generation flows through four stages:
//!
//! - **Validation**: the snippet is parsed and statically checked before
//!   any sandbox exists
//! - **Sandbox**: an isolated worker thread executes the snippet under a
//!   wall-clock budget
//! - **Output checks**: the drained mesh is classified into hard errors
//!   and warnings
//! - **Packaging**: bounds, spatial analysis against prior layers, and a
//!   fresh id turn the mesh into a [`Layer`]
//!
//! Generations are serialized per engine (`generate` takes `&mut self`);
//! results are therefore delivered in call order, and a layer becomes
//! visible to [`list_meta`](Engine::list_meta) only after its `generate`
//! returns. Errors never mutate the scene.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::errors::{LimnError, Result};
use crate::mesh::validate::{validate_mesh, ValidationLimits};
use crate::sandbox::{self, SandboxConfig};
use crate::scene::{
    analyze, Aabb, Layer, LayerMeta, LayerStore, SceneBounds, SpatialRelation,
};

/// Engine configuration.
///
/// The defaults are production values; tests shrink the timeout and the
/// fuel interval to keep failure cases fast.
#[derive(Debug, Clone)]
pub struct EngineSettings {
    /// Wall-clock budget per generation. The recommended window is
    /// 60–300 s; the default sits in the middle of it.
    pub timeout: Duration,
    /// Evaluation steps between abort-flag/deadline polls.
    pub fuel_check_interval: u32,
    /// First mesh buffer allocation, in vertex slots.
    pub initial_vertex_capacity: usize,
    /// Output validation thresholds.
    pub limits: ValidationLimits,
    /// Maximum AST nesting depth accepted by the static validator.
    pub max_ast_depth: u32,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(120),
            fuel_check_interval: 4096,
            initial_vertex_capacity: crate::mesh::INITIAL_VERTEX_CAPACITY,
            limits: ValidationLimits::default(),
            max_ast_depth: 64,
        }
    }
}

/// Clonable handle that cancels the in-flight generation of its engine.
///
/// Safe to use from any thread; cancelling when nothing is running is a
/// no-op (the flag is rearmed when the next generation starts).
#[derive(Debug, Clone)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

/// The generation payload as it arrives from the LLM via the host.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// Statements in the sandbox's snippet language; not wrapped in a
    /// function, the sandbox handles that.
    pub code: String,
    /// Opaque label stored with the layer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// The host-facing result of a successful generation, shaped for the
/// renderer and the next LLM turn.
#[derive(Debug, Clone, Serialize)]
pub struct GenerationSummary {
    pub layer_id: String,
    pub vertex_count: u32,
    pub triangles: u32,
    pub bounds: Aabb,
    pub top_center: [f32; 3],
    pub bottom_center: [f32; 3],
    pub size: [f32; 3],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spatial_relationships: Option<Vec<SpatialRelation>>,
    /// Id of the nearest prior layer, when any exist.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nearest: Option<String>,
    pub warnings: Vec<String>,
}

/// The procedural scene engine.
///
/// Owns the layer store; sandboxes never touch it. One generation per
/// engine is in flight at a time, enforced by `&mut self`.
pub struct Engine {
    store: LayerStore,
    scene_bounds: SceneBounds,
    settings: EngineSettings,
    abort: Arc<AtomicBool>,
}

impl Engine {
    #[must_use]
    pub fn new(scene_bounds: SceneBounds) -> Self {
        Self::with_settings(scene_bounds, EngineSettings::default())
    }

    #[must_use]
    pub fn with_settings(scene_bounds: SceneBounds, settings: EngineSettings) -> Self {
        Self {
            store: LayerStore::new(),
            scene_bounds,
            settings,
            abort: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Runs one generation end to end and commits the resulting layer.
    ///
    /// # Errors
    ///
    /// - [`LimnError::Validation`] when parsing or static analysis rejects
    ///   the source (no sandbox is spawned)
    /// - [`LimnError::Timeout`] when the wall-clock budget elapses
    /// - [`LimnError::Runtime`] when user code fails, with the source line
    ///   and the vertex count reached
    /// - [`LimnError::Cancelled`] when the host cancelled
    /// - [`LimnError::MeshValidation`] when output checks reject the mesh
    ///
    /// Every error path leaves the scene exactly as it was.
    pub fn generate(
        &mut self,
        code: &str,
        description: &str,
        seed: u32,
    ) -> Result<GenerationSummary> {
        let program =
            sandbox::parse(code).map_err(|err| LimnError::Validation(err.to_string()))?;
        sandbox::validate(&program, self.settings.max_ast_depth)
            .map_err(|err| LimnError::Validation(err.to_string()))?;
        drop(program);

        log::debug!(
            "generation start: seed={seed}, {} prior layer(s)",
            self.store.len()
        );

        // Rearm the cancel line for this generation
        self.abort.store(false, Ordering::Relaxed);
        let config = SandboxConfig {
            timeout: self.settings.timeout,
            fuel_check_interval: self.settings.fuel_check_interval,
            initial_vertex_capacity: self.settings.initial_vertex_capacity,
        };
        let output = sandbox::run_sandbox(
            code.to_string(),
            seed,
            self.scene_bounds,
            &config,
            self.abort.clone(),
        )?;

        let report = validate_mesh(&output.mesh, &self.settings.limits);
        if !report.is_ok() {
            return Err(LimnError::MeshValidation(report.combined_errors()));
        }
        for warning in &report.warnings {
            log::warn!("generation warning: {warning}");
        }

        let id = self.store.next_layer_id();
        let layer = Layer::new(
            id,
            description.to_string(),
            output.mesh,
            output.material,
        );
        let analysis = analyze(&layer.bounds, &self.store.meta());

        let bounds = layer.bounds;
        let summary = GenerationSummary {
            layer_id: layer.id.clone(),
            vertex_count: layer.vertex_count,
            triangles: layer.vertex_count / 3,
            bounds,
            top_center: [bounds.center.x, bounds.max.y, bounds.center.z],
            bottom_center: [bounds.center.x, bounds.min.y, bounds.center.z],
            size: bounds.size().to_array(),
            spatial_relationships: analysis.as_ref().map(|a| a.relations.clone()),
            nearest: analysis.map(|a| a.nearest),
            warnings: report.warnings,
        };

        log::debug!(
            "generation done: {} with {} vertices",
            summary.layer_id,
            summary.vertex_count
        );
        self.store.insert(layer);
        Ok(summary)
    }

    /// [`generate`](Self::generate) over a deserialized host payload.
    pub fn generate_request(
        &mut self,
        request: &GenerationRequest,
        seed: u32,
    ) -> Result<GenerationSummary> {
        self.generate(
            &request.code,
            request.description.as_deref().unwrap_or_default(),
            seed,
        )
    }

    /// Handle for cancelling the in-flight generation from another thread.
    #[must_use]
    pub fn cancel_token(&self) -> CancelToken {
        CancelToken {
            flag: self.abort.clone(),
        }
    }

    // ========================================================================
    // Scene bookkeeping
    // ========================================================================

    /// Removes a layer by id.
    pub fn remove(&mut self, id: &str) -> Result<()> {
        match self.store.remove(id) {
            Some(_) => Ok(()),
            None => Err(LimnError::UnknownLayer(id.to_string())),
        }
    }

    /// Drops every layer. Ids are not reused afterwards.
    pub fn clear(&mut self) {
        self.store.clear();
    }

    /// Layer summaries in insertion order, for the next LLM turn.
    #[must_use]
    pub fn list_meta(&self) -> Vec<LayerMeta> {
        self.store.meta()
    }

    #[must_use]
    pub fn layer(&self, id: &str) -> Option<&Layer> {
        self.store.get(id)
    }

    #[must_use]
    pub fn layer_count(&self) -> usize {
        self.store.len()
    }

    #[must_use]
    pub fn scene_bounds(&self) -> SceneBounds {
        self.scene_bounds
    }

    #[must_use]
    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(SceneBounds::default())
    }
}
