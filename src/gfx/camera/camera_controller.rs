use winit::{
    dpi::PhysicalPosition,
    event::{DeviceEvent, ElementState, KeyEvent, MouseScrollDelta},
    keyboard::{KeyCode, PhysicalKey},
};

use super::orbit_camera::OrbitCamera;
use crate::config::CameraSettings;

/// Raw button id of the left mouse button in [`DeviceEvent::Button`]
const LEFT_BUTTON: u32 = 0;

/// What moving the mouse does right now
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DragMode {
    #[default]
    Idle,
    /// Left drag: rotate around the target
    Orbit,
    /// Shift + left drag: move the target with the eye
    Pan,
}

/// Turns raw mouse and keyboard input into orbit camera moves.
///
/// Works on device events so a drag keeps going when the cursor leaves the
/// window. Every handler reports whether the camera moved.
#[derive(Debug, Clone)]
pub struct CameraController {
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub pan_speed: f32,
    button_held: bool,
    shift_held: bool,
}

impl CameraController {
    pub fn new(rotate_speed: f32, zoom_speed: f32) -> Self {
        Self {
            rotate_speed,
            zoom_speed,
            pan_speed: CameraSettings::default().pan_speed,
            button_held: false,
            shift_held: false,
        }
    }

    pub fn from_settings(settings: &CameraSettings) -> Self {
        Self {
            pan_speed: settings.pan_speed,
            ..Self::new(settings.rotate_speed, settings.zoom_speed)
        }
    }

    pub fn drag_mode(&self) -> DragMode {
        match (self.button_held, self.shift_held) {
            (false, _) => DragMode::Idle,
            (true, false) => DragMode::Orbit,
            (true, true) => DragMode::Pan,
        }
    }

    /// Drops any drag in progress, e.g. when the UI captures the mouse
    pub fn release(&mut self) {
        self.button_held = false;
    }

    pub fn handle_device_event(&mut self, event: &DeviceEvent, camera: &mut OrbitCamera) -> bool {
        match event {
            DeviceEvent::Button {
                button: LEFT_BUTTON,
                state,
            } => {
                self.button_held = *state == ElementState::Pressed;
                false
            }
            DeviceEvent::MouseWheel { delta } => self.zoom(delta, camera),
            DeviceEvent::MouseMotion { delta } => self.drag(*delta, camera),
            _ => false,
        }
    }

    pub fn handle_key(&mut self, event: &KeyEvent, camera: &mut OrbitCamera) -> bool {
        match event.physical_key {
            PhysicalKey::Code(code) => {
                self.handle_key_code(code, event.state == ElementState::Pressed, camera)
            }
            PhysicalKey::Unidentified(_) => false,
        }
    }

    /// Shift switches dragging to panning; Shift+C flies back home
    pub fn handle_key_code(&mut self, code: KeyCode, pressed: bool, camera: &mut OrbitCamera) -> bool {
        match code {
            KeyCode::ShiftLeft | KeyCode::ShiftRight => {
                if self.shift_held != pressed {
                    log::trace!("shift held: {}", pressed);
                }
                self.shift_held = pressed;
                false
            }
            KeyCode::KeyC if pressed && self.shift_held => {
                log::debug!("resetting camera to its home position");
                camera.reset_to_default();
                true
            }
            _ => false,
        }
    }

    fn drag(&self, delta: (f64, f64), camera: &mut OrbitCamera) -> bool {
        let (dx, dy) = (delta.0 as f32, delta.1 as f32);
        match self.drag_mode() {
            DragMode::Idle => return false,
            DragMode::Orbit => {
                camera.add_yaw(-dx * self.rotate_speed);
                camera.add_pitch(dy * self.rotate_speed);
            }
            DragMode::Pan => camera.pan((-dx * self.pan_speed, dy * self.pan_speed)),
        }
        true
    }

    fn zoom(&self, delta: &MouseScrollDelta, camera: &mut OrbitCamera) -> bool {
        // Wheel up moves closer
        let scroll = -match delta {
            MouseScrollDelta::LineDelta(_, lines) => *lines,
            MouseScrollDelta::PixelDelta(PhysicalPosition { y, .. }) => *y as f32,
        };
        if scroll == 0.0 {
            return false;
        }
        camera.add_distance(scroll * self.zoom_speed);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::{InnerSpace, Vector3};

    fn setup() -> (CameraController, OrbitCamera) {
        let settings = CameraSettings::default();
        (
            CameraController::from_settings(&settings),
            OrbitCamera::from_settings(&settings, 1.0),
        )
    }

    fn press(controller: &mut CameraController, camera: &mut OrbitCamera) {
        let event = DeviceEvent::Button {
            button: LEFT_BUTTON,
            state: ElementState::Pressed,
        };
        assert!(!controller.handle_device_event(&event, camera));
    }

    #[test]
    fn motion_without_button_does_nothing() {
        let (mut controller, mut camera) = setup();
        let moved = controller
            .handle_device_event(&DeviceEvent::MouseMotion { delta: (40.0, 0.0) }, &mut camera);
        assert!(!moved);
        assert_eq!(camera.yaw, 0.0);
    }

    #[test]
    fn left_drag_orbits() {
        let (mut controller, mut camera) = setup();
        press(&mut controller, &mut camera);
        assert_eq!(controller.drag_mode(), DragMode::Orbit);

        let moved = controller
            .handle_device_event(&DeviceEvent::MouseMotion { delta: (100.0, 0.0) }, &mut camera);
        assert!(moved);
        assert!((camera.yaw + 0.5).abs() < 1e-6);
        assert!((camera.eye.magnitude() - 5.0).abs() < 1e-4);
    }

    #[test]
    fn shift_drag_pans_the_target() {
        let (mut controller, mut camera) = setup();
        controller.handle_key_code(KeyCode::ShiftLeft, true, &mut camera);
        press(&mut controller, &mut camera);
        assert_eq!(controller.drag_mode(), DragMode::Pan);

        controller.handle_device_event(&DeviceEvent::MouseMotion { delta: (20.0, 0.0) }, &mut camera);
        assert!(camera.target.x < 0.0);
        assert_eq!(camera.yaw, 0.0);

        controller.handle_key_code(KeyCode::ShiftLeft, false, &mut camera);
        assert_eq!(controller.drag_mode(), DragMode::Orbit);
    }

    #[test]
    fn wheel_zooms_in_and_out() {
        let (mut controller, mut camera) = setup();
        let wheel = |lines| DeviceEvent::MouseWheel {
            delta: MouseScrollDelta::LineDelta(0.0, lines),
        };

        assert!(controller.handle_device_event(&wheel(1.0), &mut camera));
        assert!(camera.distance < 5.0);
        assert!(controller.handle_device_event(&wheel(-2.0), &mut camera));
        assert!(camera.distance > 5.0);
        assert!(!controller.handle_device_event(&wheel(0.0), &mut camera));
    }

    #[test]
    fn shift_c_resets_the_camera() {
        let (mut controller, mut camera) = setup();
        camera.add_yaw(1.0);

        assert!(!controller.handle_key_code(KeyCode::KeyC, true, &mut camera));
        controller.handle_key_code(KeyCode::ShiftRight, true, &mut camera);
        assert!(controller.handle_key_code(KeyCode::KeyC, true, &mut camera));
        assert!((camera.eye - Vector3::new(0.0, 0.0, 5.0)).magnitude() < 1e-5);
    }

    #[test]
    fn release_ends_any_drag() {
        let (mut controller, mut camera) = setup();
        press(&mut controller, &mut camera);
        controller.release();
        assert_eq!(controller.drag_mode(), DragMode::Idle);
    }
}
