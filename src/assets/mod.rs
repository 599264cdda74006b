//! Asset loading
//!
//! Models (glTF or OBJ) and images are decoded on worker threads; the
//! results travel back to the event loop as [`AssetEvent`]s and are applied
//! there.

pub mod gltf_scene;
pub mod loader;
pub mod obj;

use std::path::{Path, PathBuf};

use cgmath::{Matrix4, One, Quaternion, Vector3, Zero};
use thiserror::Error;

use crate::config::ModelPlacement;
use crate::gfx::{resources::Material, scene::SceneNode};
use crate::interaction::Character;

pub use gltf_scene::load_gltf;
pub use loader::{AssetLoader, AssetSink};
pub use obj::{decode_image, load_obj, parse_obj};

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to load OBJ: {0}")]
    Obj(#[from] tobj::LoadError),

    #[error("failed to load glTF: {0}")]
    Gltf(#[from] gltf::Error),

    #[error("failed to decode image: {0}")]
    Image(#[from] image::ImageError),

    #[error("{path}: no node named '{node}'")]
    NodeNotFound { path: PathBuf, node: String },

    #[error("{path}: model has no triangle meshes")]
    EmptyModel { path: PathBuf },
}

/// A parsed model, still CPU-side
pub struct LoadedModel {
    pub name: String,
    /// Meshes with every transform below the root baked into their vertices
    pub root: SceneNode,
    pub materials: Vec<Material>,
    /// Local translation of the kept root node
    pub translation: Vector3<f32>,
    /// Local rotation of the kept root node
    pub rotation: Quaternion<f32>,
}

impl LoadedModel {
    pub fn new(name: impl Into<String>, root: SceneNode, materials: Vec<Material>) -> Self {
        Self {
            name: name.into(),
            root,
            materials,
            translation: Vector3::zero(),
            rotation: Quaternion::one(),
        }
    }

    /// Object transform for `placement`.
    ///
    /// The root keeps its own position and rotation. The placement offset
    /// moves it and the placement scale replaces the root's scale.
    pub fn placed(&self, placement: &ModelPlacement) -> Matrix4<f32> {
        Matrix4::from_translation(self.translation + placement.offset)
            * Matrix4::from(self.rotation)
            * Matrix4::from_scale(placement.scale)
    }
}

/// Loads a model by extension: `.gltf`/`.glb` through glTF, anything else as
/// OBJ. With `node` set only that sub-node is kept.
pub fn load_model(path: &Path, node: Option<&str>) -> Result<LoadedModel, AssetError> {
    std::fs::metadata(path).map_err(|source| AssetError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let model = match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("gltf") || ext.eq_ignore_ascii_case("glb") => {
            load_gltf(path, node)?
        }
        _ => load_obj(path, node)?,
    };
    if model.root.mesh_count() == 0 {
        return Err(AssetError::EmptyModel {
            path: path.to_path_buf(),
        });
    }

    log::info!(
        "loaded {}: {} meshes, {} materials",
        path.display(),
        model.root.mesh_count(),
        model.materials.len()
    );
    Ok(model)
}

/// Display name of a model: its directory, else its file stem
fn model_name(path: &Path) -> String {
    path.parent()
        .and_then(|dir| dir.file_name())
        .or_else(|| path.file_stem())
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "model".to_string())
}

/// Texture slots filled after start-up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureSlot {
    /// Equirectangular background, also used for ambient light
    Environment,
    /// Tiling base texture of the floor
    Floor,
}

/// A finished load, successful or not
pub enum AssetEvent {
    Model {
        character: Character,
        path: PathBuf,
        result: Result<LoadedModel, AssetError>,
    },
    Texture {
        slot: TextureSlot,
        path: PathBuf,
        result: Result<image::RgbaImage, AssetError>,
    },
}
