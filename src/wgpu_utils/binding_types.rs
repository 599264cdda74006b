//! Binding types used by the stage's bind group layouts

pub fn uniform() -> wgpu::BindingType {
    wgpu::BindingType::Buffer {
        ty: wgpu::BufferBindingType::Uniform,
        has_dynamic_offset: false,
        min_binding_size: None,
    }
}

pub fn sampler(kind: wgpu::SamplerBindingType) -> wgpu::BindingType {
    wgpu::BindingType::Sampler(kind)
}

fn plain_2d(sample_type: wgpu::TextureSampleType) -> wgpu::BindingType {
    wgpu::BindingType::Texture {
        sample_type,
        view_dimension: wgpu::TextureViewDimension::D2,
        multisampled: false,
    }
}

/// Filterable colour texture: materials, the floor and the environment map
pub fn texture_2d() -> wgpu::BindingType {
    plain_2d(wgpu::TextureSampleType::Float { filterable: true })
}

/// The shadow map, read through a comparison sampler
pub fn depth_texture_2d() -> wgpu::BindingType {
    plain_2d(wgpu::TextureSampleType::Depth)
}
