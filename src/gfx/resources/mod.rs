//! GPU resource management
//!
//! Textures, materials and the global bind group shared by every pipeline.

pub mod decal_material;
pub mod global_bindings;
pub mod material;
pub mod texture_resource;

// Re-export main types
pub use decal_material::DecalMaterial;
pub use global_bindings::{update_global_ubo, GlobalBindings, GlobalUBO};
pub use material::{Material, MaterialBindings};
pub use texture_resource::{TextureResource, Wrapping};
