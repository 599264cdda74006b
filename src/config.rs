//! Stage configuration
//!
//! Every constant of the scene lives here: asset locations, camera and light
//! defaults, character placement and the decal radius. `StageConfig::default()`
//! reproduces the stock scene; `from_env` applies environment overrides.

use std::path::{Path, PathBuf};

use cgmath::Vector3;

/// Environment variable overriding [`StageConfig::asset_root`]
pub const ASSET_ROOT_ENV: &str = "DECAL_STAGE_ASSETS";

/// Placement of a loaded character model
#[derive(Debug, Clone)]
pub struct ModelPlacement {
    /// Path of the glTF or OBJ file relative to the asset root
    pub path: PathBuf,
    /// Name of the sub-node to keep, resolved once at load time.
    /// `None` keeps the whole model.
    pub node: Option<String>,
    pub scale: f32,
    pub offset: Vector3<f32>,
}

/// Directional light defaults, editable live from the debug panel
#[derive(Debug, Clone, Copy)]
pub struct LightSettings {
    pub position: [f32; 3],
    pub color: [f32; 3],
    pub intensity: f32,
    /// Half extent of the orthographic shadow camera
    pub shadow_extent: f32,
    pub shadow_near: f32,
    pub shadow_far: f32,
    pub shadow_map_size: u32,
}

impl Default for LightSettings {
    fn default() -> Self {
        Self {
            position: [-5.0, 5.0, 4.0],
            color: [1.0, 1.0, 1.0],
            intensity: 10.0,
            shadow_extent: 5.0,
            shadow_near: 0.5,
            shadow_far: 20.0,
            shadow_map_size: 200,
        }
    }
}

/// Perspective camera defaults
#[derive(Debug, Clone, Copy)]
pub struct CameraSettings {
    pub distance: f32,
    pub fovy_degrees: f32,
    pub znear: f32,
    pub zfar: f32,
    /// Radians per pixel of drag
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    /// Shift-drag speed, scaled by the orbit distance
    pub pan_speed: f32,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            distance: 5.0,
            fovy_degrees: 70.0,
            znear: 0.1,
            zfar: 100.0,
            rotate_speed: 0.005,
            zoom_speed: 0.1,
            pan_speed: 0.01,
        }
    }
}

/// Floor mesh placement: a flattened unit sphere
#[derive(Debug, Clone, Copy)]
pub struct FloorSettings {
    pub scale: Vector3<f32>,
    pub rotation_x_degrees: f32,
    pub offset_y: f32,
    pub longitude_segments: u32,
    pub latitude_segments: u32,
}

impl Default for FloorSettings {
    fn default() -> Self {
        Self {
            scale: Vector3::new(5.0, 5.0, 0.5),
            rotation_x_degrees: -90.0,
            offset_y: -2.5,
            longitude_segments: 32,
            latitude_segments: 16,
        }
    }
}

#[derive(Debug, Clone)]
pub struct StageConfig {
    pub title: String,
    pub window_size: (u32, u32),
    pub asset_root: PathBuf,
    pub sarah: ModelPlacement,
    pub spiderman: ModelPlacement,
    pub environment_map: PathBuf,
    pub floor_texture: PathBuf,
    pub floor: FloorSettings,
    pub camera: CameraSettings,
    pub light: LightSettings,
    /// Radius of the decal cutout in UV space
    pub decal_radius: f32,
    /// Initial value of the toggle-armed flag
    pub toggle_armed: bool,
}

impl Default for StageConfig {
    fn default() -> Self {
        Self {
            title: "decal-stage".to_string(),
            window_size: (1200, 800),
            asset_root: PathBuf::from("assets"),
            sarah: ModelPlacement {
                path: PathBuf::from("models/sarah/scene.gltf"),
                node: None,
                scale: 2.5,
                offset: Vector3::new(0.0, -2.0, 0.0),
            },
            spiderman: ModelPlacement {
                path: PathBuf::from("models/spiderverse_miles/scene.gltf"),
                node: Some("Miles".to_string()),
                scale: 0.028,
                offset: Vector3::new(-4.9, -2.05, 0.0),
            },
            environment_map: PathBuf::from("envmaps/qin-zhi-jian-g-anime-2.jpg"),
            floor_texture: PathBuf::from("floor/bark/Bark_007_BaseColor.jpg"),
            floor: FloorSettings::default(),
            camera: CameraSettings::default(),
            light: LightSettings::default(),
            decal_radius: 0.05,
            toggle_armed: true,
        }
    }
}

impl StageConfig {
    /// Default configuration with `DECAL_STAGE_ASSETS` applied
    pub fn from_env() -> Self {
        let config = Self::default();
        match std::env::var_os(ASSET_ROOT_ENV) {
            Some(root) if !root.is_empty() => config.with_asset_root(root),
            _ => config,
        }
    }

    pub fn with_asset_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.asset_root = root.into();
        self
    }

    pub fn with_window_size(mut self, width: u32, height: u32) -> Self {
        self.window_size = (width.max(1), height.max(1));
        self
    }

    /// Resolves a path relative to the asset root
    pub fn asset_path(&self, relative: &Path) -> PathBuf {
        self.asset_root.join(relative)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_matches_stock_scene() {
        let config = StageConfig::default();
        assert_eq!(config.decal_radius, 0.05);
        assert!(config.toggle_armed);
        assert_eq!(config.light.position, [-5.0, 5.0, 4.0]);
        assert_eq!(config.camera.fovy_degrees, 70.0);
        assert_eq!(config.spiderman.node.as_deref(), Some("Miles"));
    }

    #[test]
    fn asset_paths_are_joined_to_root() {
        let config = StageConfig::default().with_asset_root("/srv/stage");
        assert_eq!(
            config.asset_path(&config.floor_texture),
            PathBuf::from("/srv/stage/floor/bark/Bark_007_BaseColor.jpg")
        );
    }

    #[test]
    fn window_size_never_zero() {
        let config = StageConfig::default().with_window_size(0, 0);
        assert_eq!(config.window_size, (1, 1));
    }
}
