//! Floor material: tiling base texture plus the hover decal parameters

use super::texture_resource::TextureResource;
use crate::interaction::DecalUniform;
use crate::wgpu_utils::{BindGroupBuilder, BindGroupLayoutWithDesc, UniformBuffer};

pub struct DecalMaterial {
    ubo: UniformBuffer<DecalUniform>,
    texture: TextureResource,
    bind_group: wgpu::BindGroup,
}

impl DecalMaterial {
    /// Starts with `texture` (usually the placeholder) and a hidden decal
    ///
    /// `layout` is the material layout from [`MaterialBindings::layout`](super::material::MaterialBindings::layout).
    pub fn new(
        device: &wgpu::Device,
        layout: &BindGroupLayoutWithDesc,
        texture: TextureResource,
        initial: DecalUniform,
    ) -> Self {
        let ubo = UniformBuffer::new(device, "Floor Decal Uniform", initial);
        let bind_group = Self::create_bind_group(device, layout, &ubo, &texture);
        Self {
            ubo,
            texture,
            bind_group,
        }
    }

    fn create_bind_group(
        device: &wgpu::Device,
        layout: &BindGroupLayoutWithDesc,
        ubo: &UniformBuffer<DecalUniform>,
        texture: &TextureResource,
    ) -> wgpu::BindGroup {
        BindGroupBuilder::new(layout)
            .resource(ubo.binding_resource())
            .texture(&texture.view)
            .sampler(&texture.sampler)
            .create(device, "Floor Decal Bind Group")
    }

    /// Swaps in the loaded floor texture
    pub fn set_texture(
        &mut self,
        device: &wgpu::Device,
        layout: &BindGroupLayoutWithDesc,
        texture: TextureResource,
    ) {
        self.texture = texture;
        self.bind_group = Self::create_bind_group(device, layout, &self.ubo, &self.texture);
    }

    pub fn update(&mut self, queue: &wgpu::Queue, uniform: DecalUniform) {
        if self.ubo.write(queue, uniform) {
            log::trace!("decal uniform uploaded: {:?}", uniform);
        }
    }

    pub fn bind_group(&self) -> &wgpu::BindGroup {
        &self.bind_group
    }
}
