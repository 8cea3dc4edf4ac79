//! Mesh construction: buffers, emitters, and the procedural meshers.

pub mod buffer;
pub mod extrude;
pub mod grid;
pub mod lathe;
pub mod marching_cubes;
pub mod tables;
pub mod validate;

pub use buffer::{MaterialHints, MeshBuffer, INITIAL_VERTEX_CAPACITY};
pub use extrude::extrude_path;
pub use grid::{grid, try_grid, ClosureHeightfield, Heightfield};
pub use lathe::lathe;
pub use marching_cubes::{marching_cubes, try_marching_cubes, ClosureField, FieldSampler};
pub use validate::{validate_mesh, MeshReport, ValidationLimits};
