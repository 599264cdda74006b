//! Core rendering functionality
//!
//! Render pipelines, the light helper and frame rendering.

pub mod light_helper;
pub mod pipeline_manager;
pub mod render_engine;

// Re-export main types
pub use light_helper::LightHelper;
pub use pipeline_manager::{DepthConfig, PipelineConfig, PipelineManager, VertexInput};
pub use render_engine::RenderEngine;
