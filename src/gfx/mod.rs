//! # Graphics Module
//!
//! Everything that touches the GPU or the geometry behind it.
//!
//! - **Camera** ([`camera`]) - Orbit camera with drag, pan and zoom
//! - **Geometry** ([`geometry`]) - Procedural meshes (the floor sphere)
//! - **Picking** ([`picking`]) - Rays, bounding boxes and triangle tests
//! - **Rendering** ([`rendering`]) - Shadow, environment, lit and decal pipelines
//! - **Resources** ([`resources`]) - Textures, materials and global bindings
//! - **Scene** ([`scene`]) - Objects built from tagged node trees
//!
//! ```no_run
//! use decal_stage::gfx::{scene::Scene, RenderEngine};
//!
//! // The render engine is created by the app once the window exists:
//! // let engine = RenderEngine::new(window, width, height, light, decal).await?;
//! ```

pub mod camera;
pub mod geometry;
pub mod picking;
pub mod rendering;
pub mod resources;
pub mod scene;

// Re-export commonly used types
pub use camera::orbit_camera::OrbitCamera;
pub use rendering::render_engine::RenderEngine;
