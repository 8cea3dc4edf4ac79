//! Layer and scene model: bounds, metadata, spatial analysis, storage.

pub mod bounds;
pub mod layer;
pub mod spatial;
pub mod store;

pub use bounds::{Aabb, Axis};
pub use layer::{Layer, LayerMeta, SceneBounds};
pub use spatial::{analyze, AxisSeparation, SpatialAnalysis, SpatialRelation};
pub use store::{LayerKey, LayerStore};
