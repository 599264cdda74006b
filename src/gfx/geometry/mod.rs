//! # Procedural Geometry Generation
//!
//! Primitive shapes generated on the CPU, ready to be wrapped in a
//! [`Mesh`](crate::gfx::scene::object::Mesh). The stage floor is a flattened
//! UV sphere; planes are handy wherever a flat, fully UV-mapped surface is
//! needed.
//!
//! ## Usage
//!
//! ```rust
//! use decal_stage::gfx::geometry::{generate_plane, generate_sphere};
//!
//! let sphere_data = generate_sphere(32, 16);
//! let plane_data = generate_plane(10.0, 10.0, 4, 4);
//! assert_eq!(plane_data.vertex_count(), 25);
//! assert!(sphere_data.triangle_count() > 0);
//! ```

pub mod primitives;

pub use primitives::*;

use crate::gfx::scene::vertex::Vertex3D;

/// Represents generated geometry data ready for GPU upload
#[derive(Debug, Clone, Default)]
pub struct GeometryData {
    /// Vertex positions (x, y, z)
    pub vertices: Vec<[f32; 3]>,
    /// Texture coordinates (u, v)
    pub tex_coords: Vec<[f32; 2]>,
    /// Normal vectors (x, y, z)
    pub normals: Vec<[f32; 3]>,
    /// Triangle indices (counter-clockwise winding)
    pub indices: Vec<u32>,
}

impl GeometryData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Interleaves positions, normals and UVs into the renderer's vertex format
    pub fn to_vertices(&self) -> Vec<Vertex3D> {
        self.vertices
            .iter()
            .enumerate()
            .map(|(i, position)| Vertex3D {
                position: *position,
                normal: self.normals.get(i).copied().unwrap_or([0.0, 1.0, 0.0]),
                tex_coords: self.tex_coords.get(i).copied().unwrap_or([0.0, 0.0]),
            })
            .collect()
    }
}
