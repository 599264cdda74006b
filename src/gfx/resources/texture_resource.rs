//! Textures with their view and sampler
//!
//! Three kinds live on the GPU: the depth buffer, the light's shadow map and
//! colour textures uploaded from decoded images.

/// How a colour texture repeats outside [0, 1]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wrapping {
    /// Repeats on both axes: the floor and model textures
    Tiled,
    /// Wraps around horizontally and clamps at the poles: equirectangular maps
    Panorama,
}

impl Wrapping {
    /// Address modes for u and v
    pub fn address_modes(self) -> (wgpu::AddressMode, wgpu::AddressMode) {
        match self {
            Wrapping::Tiled => (wgpu::AddressMode::Repeat, wgpu::AddressMode::Repeat),
            Wrapping::Panorama => (wgpu::AddressMode::Repeat, wgpu::AddressMode::ClampToEdge),
        }
    }
}

#[derive(Clone)]
pub struct TextureResource {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub sampler: wgpu::Sampler,
}

impl TextureResource {
    /// Format of the depth buffer and the shadow map
    pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

    /// Colour textures are decoded as sRGB
    pub const COLOR_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;

    fn depth_target(device: &wgpu::Device, label: &str, width: u32, height: u32) -> wgpu::Texture {
        device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width: width.max(1),
                height: height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: Self::DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        })
    }

    /// Depth buffer sized to the surface
    pub fn create_depth_texture(
        device: &wgpu::Device,
        config: &wgpu::SurfaceConfiguration,
        label: &str,
    ) -> Self {
        let texture = Self::depth_target(device, label, config.width, config.height);
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some(label),
            ..Default::default()
        });
        Self::with_sampler(texture, sampler)
    }

    /// Square depth map rendered from the light.
    ///
    /// Its sampler compares, so the shaders get hardware-filtered visibility
    /// instead of raw depth. Lookups outside the map clamp to the border.
    pub fn create_shadow_map(device: &wgpu::Device, size: u32) -> Self {
        let texture = Self::depth_target(device, "Shadow Map", size, size);
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Shadow Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            compare: Some(wgpu::CompareFunction::LessEqual),
            ..Default::default()
        });
        Self::with_sampler(texture, sampler)
    }

    /// Uploads tightly packed RGBA8 pixels
    pub fn create_from_rgba_data(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        data: &[u8],
        (width, height): (u32, u32),
        label: &str,
        wrapping: Wrapping,
    ) -> Self {
        let size = wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: Self::COLOR_FORMAT,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            data,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * width),
                rows_per_image: Some(height),
            },
            size,
        );

        let (address_u, address_v) = wrapping.address_modes();
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some(label),
            address_mode_u: address_u,
            address_mode_v: address_v,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });
        Self::with_sampler(texture, sampler)
    }

    pub fn from_image(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        image: &image::RgbaImage,
        label: &str,
        wrapping: Wrapping,
    ) -> Self {
        log::debug!("uploading '{}' ({}x{})", label, image.width(), image.height());
        Self::create_from_rgba_data(device, queue, image.as_raw(), image.dimensions(), label, wrapping)
    }

    /// 1x1 opaque white, bound wherever a texture has not arrived
    pub fn placeholder(device: &wgpu::Device, queue: &wgpu::Queue, label: &str) -> Self {
        Self::create_from_rgba_data(device, queue, &[255; 4], (1, 1), label, Wrapping::Tiled)
    }

    fn with_sampler(texture: wgpu::Texture, sampler: wgpu::Sampler) -> Self {
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self {
            texture,
            view,
            sampler,
        }
    }

    pub fn size(&self) -> (u32, u32) {
        (self.texture.width(), self.texture.height())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn panorama_clamps_only_vertically() {
        assert_eq!(
            Wrapping::Panorama.address_modes(),
            (wgpu::AddressMode::Repeat, wgpu::AddressMode::ClampToEdge)
        );
        assert_eq!(
            Wrapping::Tiled.address_modes(),
            (wgpu::AddressMode::Repeat, wgpu::AddressMode::Repeat)
        );
    }
}
