//! Surface materials
//!
//! A [`Material`] is a base colour, a shininess and an optional diffuse
//! texture. Materials are built on the CPU (possibly on a loader thread) and
//! uploaded lazily on the render thread. Every material bind group uses the
//! layout from [`MaterialBindings::layout`]: uniform, texture, sampler.

use wgpu::Device;

use super::texture_resource::{TextureResource, Wrapping};
use crate::wgpu_utils::{
    binding_builder::{BindGroupBuilder, BindGroupLayoutBuilder, BindGroupLayoutWithDesc},
    binding_types,
    uniform_buffer::UniformBuffer,
};

/// GPU uniform data for materials. MUST match `MaterialUniform` in `scene.wgsl`.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MaterialUniform {
    pub base_color: [f32; 4],
    pub shininess: f32,
    pub has_texture: u32,
    _padding: [f32; 2],
}

type MaterialUBO = UniformBuffer<MaterialUniform>;

/// Layout shared by every material-like bind group (group 2)
pub struct MaterialBindings;

impl MaterialBindings {
    pub fn layout(device: &Device) -> BindGroupLayoutWithDesc {
        BindGroupLayoutBuilder::new()
            .next_binding_fragment(binding_types::uniform())
            .next_binding_fragment(binding_types::texture_2d())
            .next_binding_fragment(binding_types::sampler(wgpu::SamplerBindingType::Filtering))
            .create(device, "Material Bind Group")
    }
}

struct MaterialGpu {
    ubo: MaterialUBO,
    texture: Option<TextureResource>,
    bind_group: wgpu::BindGroup,
}

pub struct Material {
    pub name: String,
    pub base_color: [f32; 4],
    pub shininess: f32,
    /// Decoded diffuse texture waiting for upload
    pending_image: Option<image::RgbaImage>,
    gpu: Option<MaterialGpu>,
}

impl Default for Material {
    fn default() -> Self {
        Self::new("Default", [0.8, 0.8, 0.8, 1.0])
    }
}

impl Material {
    pub fn new(name: &str, base_color: [f32; 4]) -> Self {
        Self {
            name: name.to_string(),
            base_color,
            shininess: 32.0,
            pending_image: None,
            gpu: None,
        }
    }

    pub fn with_shininess(mut self, shininess: f32) -> Self {
        self.shininess = shininess.max(1.0);
        self
    }

    pub fn with_texture_image(mut self, image: image::RgbaImage) -> Self {
        self.pending_image = Some(image);
        self
    }

    pub fn has_texture(&self) -> bool {
        self.pending_image.is_some() || self.gpu.as_ref().is_some_and(|gpu| gpu.texture.is_some())
    }

    fn uniform(&self) -> MaterialUniform {
        MaterialUniform {
            base_color: self.base_color,
            shininess: self.shininess,
            has_texture: self.has_texture() as u32,
            _padding: [0.0; 2],
        }
    }

    /// Uploads pending data and syncs the uniform.
    ///
    /// `fallback` is bound in place of a missing diffuse texture.
    pub fn update_gpu_resources(
        &mut self,
        device: &Device,
        queue: &wgpu::Queue,
        layout: &BindGroupLayoutWithDesc,
        fallback: &TextureResource,
    ) {
        let uploaded = self.pending_image.take().map(|image| {
            TextureResource::from_image(
                device,
                queue,
                &image,
                &self.name,
                Wrapping::Tiled,
            )
        });

        let uniform = self.uniform();
        match &mut self.gpu {
            Some(gpu) => {
                if uploaded.is_some() {
                    gpu.texture = uploaded;
                    let texture = gpu.texture.as_ref().unwrap_or(fallback);
                    gpu.bind_group = Self::bind_group(device, layout, &gpu.ubo, texture, &self.name);
                }
                gpu.ubo.write(queue, uniform);
            }
            None => {
                let ubo = MaterialUBO::new(device, &self.name, uniform);
                let texture = uploaded.as_ref().unwrap_or(fallback);
                let bind_group = Self::bind_group(device, layout, &ubo, texture, &self.name);
                self.gpu = Some(MaterialGpu {
                    ubo,
                    texture: uploaded,
                    bind_group,
                });
            }
        }
    }

    fn bind_group(
        device: &Device,
        layout: &BindGroupLayoutWithDesc,
        ubo: &MaterialUBO,
        texture: &TextureResource,
        label: &str,
    ) -> wgpu::BindGroup {
        BindGroupBuilder::new(layout)
            .resource(ubo.binding_resource())
            .texture(&texture.view)
            .sampler(&texture.sampler)
            .create(device, label)
    }

    /// Gets the bind group for rendering, `None` before the first upload
    pub fn get_bind_group(&self) -> Option<&wgpu::BindGroup> {
        self.gpu.as_ref().map(|gpu| &gpu.bind_group)
    }
}
