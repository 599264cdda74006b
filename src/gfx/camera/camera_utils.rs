use cgmath::{Matrix4, SquareMatrix};
use winit::event::{DeviceEvent, KeyEvent};

use super::{camera_controller::CameraController, orbit_camera::OrbitCamera};

/// The stage camera together with the input that drives it
pub struct CameraManager {
    pub camera: OrbitCamera,
    pub controller: CameraController,
}

impl CameraManager {
    pub fn new(camera: OrbitCamera, controller: CameraController) -> Self {
        Self { camera, controller }
    }

    /// Returns whether the camera moved
    pub fn handle_device_event(&mut self, event: &DeviceEvent) -> bool {
        self.controller.handle_device_event(event, &mut self.camera)
    }

    /// Returns whether the camera moved
    pub fn handle_key(&mut self, event: &KeyEvent) -> bool {
        self.controller.handle_key(event, &mut self.camera)
    }
}

/// Camera block of the global uniform buffer
#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable, Debug)]
pub struct CameraUniform {
    /// Eye position; `w` pads the vector to 16 bytes
    pub view_position: [f32; 4],
    /// wgpu-convention view projection (clip z in [0, 1])
    pub view_proj: [[f32; 4]; 4],
}

impl CameraUniform {
    pub fn from_camera(camera: &OrbitCamera) -> Self {
        let eye = camera.eye;
        Self {
            view_position: [eye.x, eye.y, eye.z, 1.0],
            view_proj: camera.wgpu_view_proj().into(),
        }
    }
}

impl Default for CameraUniform {
    fn default() -> Self {
        Self {
            view_position: [0.0; 4],
            view_proj: Matrix4::identity().into(),
        }
    }
}
