#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::too_many_arguments)]

pub mod engine;
pub mod errors;
pub mod mesh;
pub mod noise;
pub mod sandbox;
pub mod scene;
pub mod sdf;

pub use engine::{CancelToken, Engine, EngineSettings, GenerationRequest, GenerationSummary};
pub use errors::{LimnError, Result};
pub use mesh::{
    grid, lathe, marching_cubes, validate_mesh, MaterialHints, MeshBuffer, MeshReport,
    ValidationLimits,
};
pub use mesh::extrude_path;
pub use noise::{fbm2, fbm3, noise2, noise3, FbmParams, Mulberry32};
pub use scene::{Aabb, Axis, Layer, LayerMeta, SceneBounds, SpatialAnalysis, SpatialRelation};
