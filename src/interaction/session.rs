//! One scene session: pointer, picking, decal and toggle wired together.
//!
//! The session owns no scene data; the app passes the [`Scene`] into every
//! handler, keeping all mutation on the thread that owns it.

use super::{
    decal::{CursorHint, DecalUniform, DecalUpdater},
    picking::{CandidateSet, PickError, PickingService},
    pointer::{PointerState, Viewport},
    toggle::{Character, CharacterState, CharacterToggle},
};
use crate::config::StageConfig;
use crate::gfx::{camera::OrbitCamera, scene::{ObjectId, Scene}};

/// Which scene objects play which part
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StageRoles {
    pub floor: Option<ObjectId>,
    pub sarah: Option<ObjectId>,
    pub spiderman: Option<ObjectId>,
}

impl StageRoles {
    pub fn character(&self, character: Character) -> Option<ObjectId> {
        match character {
            Character::Sarah => self.sarah,
            Character::Spiderman => self.spiderman,
        }
    }

    /// Hover queries only look at the floor
    pub fn hover_candidates(&self, scene: &Scene) -> CandidateSet {
        CandidateSet::visible(scene, &[self.floor])
    }

    /// Click queries look at both characters, then the floor
    pub fn click_candidates(&self, scene: &Scene) -> CandidateSet {
        CandidateSet::visible(scene, &[self.sarah, self.spiderman, self.floor])
    }
}

pub struct InteractionSession {
    pointer: PointerState,
    viewport: Viewport,
    picking: PickingService,
    decal: DecalUpdater,
    toggle: CharacterToggle,
    roles: StageRoles,
}

impl InteractionSession {
    pub fn new(config: &StageConfig, camera: &OrbitCamera, viewport: Viewport) -> Self {
        Self::with_picking(config, PickingService::with_mesh_raycaster(camera), viewport)
    }

    /// Session around an explicitly configured picking service
    pub fn with_picking(config: &StageConfig, picking: PickingService, viewport: Viewport) -> Self {
        Self {
            pointer: PointerState::default(),
            viewport,
            picking,
            decal: DecalUpdater::new(config.decal_radius),
            toggle: CharacterToggle::new(config.toggle_armed),
            roles: StageRoles::default(),
        }
    }

    pub fn pointer(&self) -> PointerState {
        self.pointer
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn roles(&self) -> &StageRoles {
        &self.roles
    }

    pub fn toggle(&self) -> &CharacterToggle {
        &self.toggle
    }

    pub fn decal(&self) -> &DecalUniform {
        self.decal.uniform()
    }

    /// The decal uniform if it changed since the last call
    pub fn take_decal_change(&mut self) -> Option<DecalUniform> {
        self.decal.take_changed()
    }

    pub fn is_armed(&self) -> bool {
        self.toggle.is_armed()
    }

    pub fn set_armed(&mut self, armed: bool) {
        self.toggle.set_armed(armed);
    }

    pub fn attach_floor(&mut self, id: ObjectId) {
        self.roles.floor = Some(id);
    }

    /// Registers a loaded character and applies the resulting visibility
    pub fn attach_character(&mut self, character: Character, id: ObjectId, scene: &mut Scene) {
        match character {
            Character::Sarah => self.roles.sarah = Some(id),
            Character::Spiderman => self.roles.spiderman = Some(id),
        }
        self.toggle.attach(character);
        self.sync_visibility(scene);
    }

    /// Re-captures the camera after it moved
    pub fn camera_moved(&mut self, camera: &OrbitCamera) {
        self.picking.set_camera(camera);
    }

    /// New drawable size: the camera aspect follows, and so does picking
    pub fn on_resize(&mut self, viewport: Viewport, camera: &mut OrbitCamera) {
        self.viewport = viewport;
        camera.resize_projection(viewport.width, viewport.height);
        self.picking.set_camera(camera);
    }

    /// Pointer moved to `(x, y)` physical pixels: re-aim the floor decal
    pub fn on_pointer_move(
        &mut self,
        x: f64,
        y: f64,
        scene: &Scene,
    ) -> Result<CursorHint, PickError> {
        self.pointer.update(x, y, self.viewport);
        let candidates = self.roles.hover_candidates(scene);
        let result = self.picking.pick(&self.pointer, scene, &candidates)?;
        Ok(self.decal.apply(&result))
    }

    /// Click at the last pointer position: maybe swap the characters
    pub fn on_click(&mut self, scene: &mut Scene) -> Result<Option<CharacterState>, PickError> {
        let candidates = self.roles.click_candidates(scene);
        let result = self.picking.pick(&self.pointer, scene, &candidates)?;
        log::debug!("click hit {} objects", result.len());

        let swapped = self.toggle.on_click(!result.is_empty());
        if swapped.is_some() {
            self.sync_visibility(scene);
        }
        Ok(swapped)
    }

    fn sync_visibility(&self, scene: &mut Scene) {
        for character in [Character::Sarah, Character::Spiderman] {
            if let Some(id) = self.roles.character(character) {
                scene.set_visible(id, self.toggle.is_visible(character));
            }
        }
    }
}
