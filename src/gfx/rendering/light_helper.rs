//! Wireframe of the shadow camera, toggled from the debug panel

use wgpu::util::DeviceExt;

use crate::{
    config::LightSettings,
    gfx::{resources::global_bindings::light_frustum_corners, scene::vertex::LineVertex},
};

/// Box edges as corner index pairs: near face, far face, connectors
const EDGES: [(usize, usize); 12] = [
    (0, 1),
    (1, 2),
    (2, 3),
    (3, 0),
    (4, 5),
    (5, 6),
    (6, 7),
    (7, 4),
    (0, 4),
    (1, 5),
    (2, 6),
    (3, 7),
];

/// Line list of the light's shadow box plus a line from the light to the origin
pub fn frustum_line_vertices(light: &LightSettings) -> Vec<LineVertex> {
    let corners = light_frustum_corners(light);
    let mut vertices: Vec<LineVertex> = EDGES
        .iter()
        .flat_map(|&(a, b)| [corners[a], corners[b]])
        .map(|p| LineVertex {
            position: p.into(),
        })
        .collect();
    vertices.push(LineVertex {
        position: light.position,
    });
    vertices.push(LineVertex {
        position: [0.0, 0.0, 0.0],
    });
    vertices
}

pub struct LightHelper {
    buffer: wgpu::Buffer,
    vertex_count: u32,
    pub visible: bool,
}

impl LightHelper {
    pub fn new(device: &wgpu::Device, light: &LightSettings) -> Self {
        let vertices = frustum_line_vertices(light);
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Light Helper Vertices"),
            contents: bytemuck::cast_slice(&vertices),
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        });
        Self {
            buffer,
            vertex_count: vertices.len() as u32,
            visible: false,
        }
    }

    /// Rewrites the lines in place; the vertex count never changes
    pub fn update(&self, queue: &wgpu::Queue, light: &LightSettings) {
        let vertices = frustum_line_vertices(light);
        queue.write_buffer(&self.buffer, 0, bytemuck::cast_slice(&vertices));
    }

    pub fn draw(&self, pass: &mut wgpu::RenderPass<'_>) {
        if !self.visible {
            return;
        }
        pass.set_vertex_buffer(0, self.buffer.slice(..));
        pass.draw(0..self.vertex_count, 0..1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn twelve_edges_and_the_direction_line() {
        let light = LightSettings::default();
        let vertices = frustum_line_vertices(&light);
        assert_eq!(vertices.len(), 26);
        assert_eq!(vertices[24].position, light.position);
        assert_eq!(vertices[25].position, [0.0, 0.0, 0.0]);
    }

    #[test]
    fn vertex_count_is_independent_of_the_light() {
        let moved = LightSettings {
            position: [3.0, 9.0, -2.0],
            ..Default::default()
        };
        assert_eq!(
            frustum_line_vertices(&moved).len(),
            frustum_line_vertices(&LightSettings::default()).len()
        );
    }
}
