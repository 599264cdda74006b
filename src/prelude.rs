//! # Prelude
//!
//! The types needed to drive the stage, headless or windowed:
//!
//! ```rust
//! use decal_stage::prelude::*;
//! ```

pub use crate::app::StageApp;
pub use crate::config::{LightSettings, StageConfig};
pub use crate::error::StageError;

pub use crate::gfx::camera::{CameraController, CameraManager, OrbitCamera};
pub use crate::gfx::geometry::{generate_plane, generate_sphere, GeometryData};
pub use crate::gfx::scene::{Mesh, Object, ObjectId, Scene, SceneNode, Shading, Vertex3D};

pub use crate::interaction::{
    Character, CharacterState, CursorHint, DecalUniform, InteractionSession, PickError,
    PickResult, PickingService, PointerState, Viewport,
};

pub use cgmath::{Deg, Vector3};
