/// A uniform buffer holding exactly one `Content` value.
///
/// Keeps a CPU copy of what was last uploaded so that writing an unchanged
/// value costs nothing. The decal and light uniforms are rewritten every
/// pointer move and every frame but rarely change.
pub struct UniformBuffer<Content> {
    buffer: wgpu::Buffer,
    uploaded: Content,
}

impl<Content: bytemuck::Pod> UniformBuffer<Content> {
    pub fn new(device: &wgpu::Device, label: &str, initial: Content) -> Self {
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size: std::mem::size_of::<Content>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: true,
        });
        buffer
            .slice(..)
            .get_mapped_range_mut()
            .copy_from_slice(bytemuck::bytes_of(&initial));
        buffer.unmap();

        Self {
            buffer,
            uploaded: initial,
        }
    }

    /// Queues an upload of `content`; returns `false` when it matched the GPU copy
    pub fn write(&mut self, queue: &wgpu::Queue, content: Content) -> bool {
        if !needs_upload(&self.uploaded, &content) {
            return false;
        }
        queue.write_buffer(&self.buffer, 0, bytemuck::bytes_of(&content));
        self.uploaded = content;
        true
    }

    /// The value the GPU sees once queued writes land
    pub fn content(&self) -> &Content {
        &self.uploaded
    }

    pub fn binding_resource(&self) -> wgpu::BindingResource {
        self.buffer.as_entire_binding()
    }
}

/// Bytewise comparison: uniform blocks may hold floats that are not `Eq`
fn needs_upload<T: bytemuck::Pod>(uploaded: &T, next: &T) -> bool {
    bytemuck::bytes_of(uploaded) != bytemuck::bytes_of(next)
}
