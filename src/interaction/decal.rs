//! Hover decal: the nearest floor hit moves a black disc in UV space

use super::picking::PickResult;

/// Floor material parameters read by the decal fragment shader.
/// MUST match `DecalUniform` in `floor.wgsl`.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct DecalUniform {
    pub center: [f32; 2],
    pub radius: f32,
    /// 1 while the disc is drawn, 0 otherwise
    pub active: u32,
}

impl DecalUniform {
    /// Outside [0, 1]², so even a shader ignoring `active` draws nothing
    pub const HIDDEN_CENTER: [f32; 2] = [-1.0, -1.0];

    pub fn hidden(radius: f32) -> Self {
        Self {
            center: Self::HIDDEN_CENTER,
            radius,
            active: 0,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active != 0
    }

    /// Whether the shader paints `uv` black
    pub fn covers(&self, uv: [f32; 2]) -> bool {
        let dx = uv[0] - self.center[0];
        let dy = uv[1] - self.center[1];
        self.is_active() && dx * dx + dy * dy < self.radius * self.radius
    }
}

/// Cursor shape matching what the pointer is over
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorHint {
    Default,
    Pointer,
}

/// Sole writer of the floor's [`DecalUniform`]
#[derive(Debug, Clone)]
pub struct DecalUpdater {
    uniform: DecalUniform,
    dirty: bool,
}

impl DecalUpdater {
    pub fn new(radius: f32) -> Self {
        Self {
            uniform: DecalUniform::hidden(radius),
            dirty: true,
        }
    }

    /// Applies a floor-only pick result.
    ///
    /// A nearest hit with a UV centres the decal there. A miss, or a hit
    /// without UV, hides it. The cursor shows a pointer over any hit.
    pub fn apply(&mut self, result: &PickResult) -> CursorHint {
        let next = match result.nearest() {
            Some(hit) => match hit.uv {
                Some(center) => DecalUniform {
                    center,
                    radius: self.uniform.radius,
                    active: 1,
                },
                None => DecalUniform::hidden(self.uniform.radius),
            },
            None => DecalUniform::hidden(self.uniform.radius),
        };

        if next != self.uniform {
            log::trace!("decal {:?} -> {:?}", self.uniform, next);
            self.uniform = next;
            self.dirty = true;
        }

        if result.is_empty() {
            CursorHint::Default
        } else {
            CursorHint::Pointer
        }
    }

    pub fn uniform(&self) -> &DecalUniform {
        &self.uniform
    }

    /// Returns the uniform if it changed since the last call
    pub fn take_changed(&mut self) -> Option<DecalUniform> {
        std::mem::take(&mut self.dirty).then_some(self.uniform)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::scene::ObjectId;
    use crate::interaction::picking::PickHit;
    use cgmath::Vector3;

    fn floor_hit(uv: Option<[f32; 2]>) -> PickResult {
        let object = floor_id();
        PickResult::from_hits(vec![PickHit {
            distance: 3.0,
            object,
            uv,
            point: Vector3::new(0.0, -2.0, 0.0),
        }])
    }

    fn floor_id() -> ObjectId {
        use crate::config::CameraSettings;
        use crate::gfx::camera::{CameraController, CameraManager, OrbitCamera};
        use crate::gfx::scene::{Object, Scene, SceneNode};

        let camera = OrbitCamera::from_settings(&CameraSettings::default(), 1.0);
        let mut scene = Scene::new(CameraManager::new(camera, CameraController::new(0.0, 0.0)));
        scene.add_object(Object::new("floor", SceneNode::other("floor")))
    }

    #[test]
    fn starts_hidden() {
        let mut updater = DecalUpdater::new(0.05);
        assert!(!updater.uniform().is_active());
        assert_eq!(updater.take_changed(), Some(DecalUniform::hidden(0.05)));
        assert_eq!(updater.take_changed(), None);
    }

    #[test]
    fn hit_with_uv_moves_the_decal() {
        let mut updater = DecalUpdater::new(0.05);
        let cursor = updater.apply(&floor_hit(Some([0.3, 0.7])));

        assert_eq!(cursor, CursorHint::Pointer);
        assert_eq!(updater.uniform().center, [0.3, 0.7]);
        assert!(updater.uniform().covers([0.32, 0.7]));
        assert!(!updater.uniform().covers([0.4, 0.7]));
    }

    #[test]
    fn miss_hides_the_decal() {
        let mut updater = DecalUpdater::new(0.05);
        updater.apply(&floor_hit(Some([0.0, 0.0])));
        assert!(updater.uniform().covers([0.0, 0.0]));

        let cursor = updater.apply(&PickResult::empty());
        assert_eq!(cursor, CursorHint::Default);
        assert!(!updater.uniform().is_active());
        // UV (0, 0) is a real surface point and must not keep a disc
        assert!(!updater.uniform().covers([0.0, 0.0]));
    }

    #[test]
    fn hit_without_uv_hides_the_decal_but_points() {
        let mut updater = DecalUpdater::new(0.05);
        updater.apply(&floor_hit(Some([0.5, 0.5])));
        let cursor = updater.apply(&floor_hit(None));
        assert_eq!(cursor, CursorHint::Pointer);
        assert!(!updater.uniform().is_active());
    }

    #[test]
    fn unchanged_results_do_not_dirty() {
        let mut updater = DecalUpdater::new(0.05);
        updater.take_changed();
        updater.apply(&PickResult::empty());
        assert_eq!(updater.take_changed(), None);
        updater.apply(&floor_hit(Some([0.5, 0.5])));
        assert!(updater.take_changed().is_some());
    }
}
