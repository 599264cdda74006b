//! Global uniform bindings for camera, light and environment
//!
//! Group 0 of every pipeline: one uniform block with the camera and the
//! directional light, plus the equirectangular environment map used for the
//! background and the ambient term.

use cgmath::{Matrix4, Point3, SquareMatrix, Vector3};

use super::texture_resource::TextureResource;
use crate::{
    config::LightSettings,
    gfx::camera::{camera_utils::CameraUniform, orbit_camera::OPENGL_TO_WGPU_MATRIX},
    wgpu_utils::{
        binding_builder::{BindGroupBuilder, BindGroupLayoutBuilder, BindGroupLayoutWithDesc},
        binding_types,
        uniform_buffer::UniformBuffer,
    },
};

/// MUST match the `Globals` struct in the shaders exactly.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct GlobalUBOContent {
    view_position: [f32; 4],
    view_proj: [[f32; 4]; 4],
    /// Clip space back to world space, for the background
    inv_view_proj: [[f32; 4]; 4],
    light_view_proj: [[f32; 4]; 4],
    light_position: [f32; 3],
    light_intensity: f32,
    light_color: [f32; 3],
    _padding: f32,
}

/// Type alias for the global uniform buffer
pub type GlobalUBO = UniformBuffer<GlobalUBOContent>;

/// The shadow camera looks from the light towards the origin
fn light_view(light: &LightSettings) -> Matrix4<f32> {
    let [x, y, z] = light.position;
    let up = if x.abs() < 1e-4 && z.abs() < 1e-4 {
        Vector3::unit_z() // straight above or below the origin
    } else {
        Vector3::unit_y()
    };
    Matrix4::look_at_rh(Point3::new(x, y, z), Point3::new(0.0, 0.0, 0.0), up)
}

/// OpenGL-convention orthographic projection of the shadow camera
fn light_projection(light: &LightSettings) -> Matrix4<f32> {
    let e = light.shadow_extent;
    cgmath::ortho(-e, e, -e, e, light.shadow_near, light.shadow_far)
}

/// World to light clip space, wgpu depth convention
pub fn light_view_proj(light: &LightSettings) -> Matrix4<f32> {
    OPENGL_TO_WGPU_MATRIX * light_projection(light) * light_view(light)
}

/// World-space corners of the shadow camera's box: near plane first, then
/// far plane, each counter-clockwise from bottom-left
pub fn light_frustum_corners(light: &LightSettings) -> [Vector3<f32>; 8] {
    let inverse = (light_projection(light) * light_view(light))
        .invert()
        .unwrap_or_else(Matrix4::identity);
    let mut corners = [Vector3::new(0.0, 0.0, 0.0); 8];
    for (i, corner) in corners.iter_mut().enumerate() {
        let z = if i < 4 { -1.0 } else { 1.0 };
        let (x, y) = [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)][i % 4];
        let p = inverse * cgmath::Vector4::new(x, y, z, 1.0);
        *corner = Vector3::new(p.x / p.w, p.y / p.w, p.z / p.w);
    }
    corners
}

/// Writes camera and light data for the coming frame
pub fn update_global_ubo(
    ubo: &mut GlobalUBO,
    queue: &wgpu::Queue,
    camera: CameraUniform,
    light: &LightSettings,
) {
    let inv_view_proj = Matrix4::from(camera.view_proj)
        .invert()
        .unwrap_or_else(Matrix4::identity);

    let content = GlobalUBOContent {
        view_position: camera.view_position,
        view_proj: camera.view_proj,
        inv_view_proj: inv_view_proj.into(),
        light_view_proj: light_view_proj(light).into(),
        light_position: light.position,
        light_intensity: light.intensity,
        light_color: light.color,
        _padding: 0.0,
    };

    ubo.write(queue, content);
}

/// Layout and bind group of group 0
pub struct GlobalBindings {
    bind_group_layout: BindGroupLayoutWithDesc,
    bind_group: wgpu::BindGroup,
}

impl GlobalBindings {
    pub fn new(device: &wgpu::Device, ubo: &GlobalUBO, environment: &TextureResource) -> Self {
        let bind_group_layout = BindGroupLayoutBuilder::new()
            .next_binding_rendering(binding_types::uniform()) // camera + light
            .next_binding_fragment(binding_types::texture_2d()) // environment
            .next_binding_fragment(binding_types::sampler(wgpu::SamplerBindingType::Filtering))
            .create(device, "Globals Bind Group");
        let bind_group = Self::create_bind_group(device, &bind_group_layout, ubo, environment);

        GlobalBindings {
            bind_group_layout,
            bind_group,
        }
    }

    fn create_bind_group(
        device: &wgpu::Device,
        layout: &BindGroupLayoutWithDesc,
        ubo: &GlobalUBO,
        environment: &TextureResource,
    ) -> wgpu::BindGroup {
        BindGroupBuilder::new(layout)
            .resource(ubo.binding_resource())
            .texture(&environment.view)
            .sampler(&environment.sampler)
            .create(device, "Global Bind Group")
    }

    /// Rebinds after the environment map finished loading
    pub fn set_environment(
        &mut self,
        device: &wgpu::Device,
        ubo: &GlobalUBO,
        environment: &TextureResource,
    ) {
        self.bind_group =
            Self::create_bind_group(device, &self.bind_group_layout, ubo, environment);
    }

    pub fn bind_group_layouts(&self) -> &wgpu::BindGroupLayout {
        &self.bind_group_layout.layout
    }

    pub fn bind_groups(&self) -> &wgpu::BindGroup {
        &self.bind_group
    }
}
