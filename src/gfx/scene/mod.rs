//! # Scene Management Module
//!
//! Objects built from tagged node trees, the vertex formats they upload and
//! the [`Scene`] that owns them together with the camera.
//!
//! - [`Scene`]: object slots addressed by [`ObjectId`], plus the camera
//! - [`Object`]: a node tree with materials, a transform and visibility
//! - [`SceneNode`] / [`NodeKind`]: `Mesh`, `Group` or `Other`
//! - [`Vertex3D`]: position, normal and texture coordinate

pub mod object;
pub mod scene;
pub mod vertex;

// Re-export main types
pub use object::{DrawObject, Mesh, NodeKind, Object, SceneNode, Shading};
pub use scene::{ObjectId, Scene, SceneStatistics};
pub use vertex::{LineVertex, Vertex3D};
