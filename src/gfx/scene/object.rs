//! Objects, meshes and the tagged node tree they are built from
//!
//! A loaded model is a tree of [`SceneNode`]s. Every node is explicitly
//! tagged as a mesh, a group of children or something else (cameras, empty
//! transforms). Traversals match on the tag instead of probing node
//! capabilities at runtime.

use cgmath::{Deg, Matrix, Matrix4, SquareMatrix, Vector3};
use wgpu::util::DeviceExt;

use super::vertex::Vertex3D;
use crate::gfx::picking::AABB;
use crate::gfx::resources::material::Material;
use crate::wgpu_utils::{BindGroupBuilder, BindGroupLayoutWithDesc};

/// Triangle mesh with lazily uploaded GPU buffers
pub struct Mesh {
    vertices: Vec<Vertex3D>,
    indices: Vec<u32>,
    bounds: AABB,
    has_tex_coords: bool,
    /// Index into the owning object's material list
    pub material: Option<usize>,
    vertex_buffer: Option<wgpu::Buffer>,
    index_buffer: Option<wgpu::Buffer>,
    index_count: u32,
}

impl Mesh {
    pub fn new(vertices: Vec<Vertex3D>, indices: Vec<u32>) -> Self {
        let positions: Vec<[f32; 3]> = vertices.iter().map(|v| v.position).collect();
        let bounds = AABB::from_vertices(&positions);
        let index_count = indices.len() as u32;

        Self {
            vertices,
            indices,
            bounds,
            has_tex_coords: true,
            material: None,
            vertex_buffer: None,
            index_buffer: None,
            index_count,
        }
    }

    pub fn with_material(mut self, material: Option<usize>) -> Self {
        self.material = material;
        self
    }

    /// Marks the UVs as filler; picks on this mesh report no UV
    pub fn without_tex_coords(mut self) -> Self {
        self.has_tex_coords = false;
        self
    }

    pub fn has_tex_coords(&self) -> bool {
        self.has_tex_coords
    }

    pub fn vertices(&self) -> &[Vertex3D] {
        &self.vertices
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// Object-space bounding box
    pub fn bounds(&self) -> AABB {
        self.bounds
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn is_uploaded(&self) -> bool {
        self.vertex_buffer.is_some() && self.index_buffer.is_some()
    }

    pub fn upload(&mut self, device: &wgpu::Device) {
        if self.is_uploaded() {
            return;
        }

        self.vertex_buffer = Some(device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Vertex Buffer"),
            contents: bytemuck::cast_slice(&self.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        }));
        self.index_buffer = Some(device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Index Buffer"),
            contents: bytemuck::cast_slice(&self.indices),
            usage: wgpu::BufferUsages::INDEX,
        }));
    }

    /// Smooth per-vertex normals averaged from the faces sharing each vertex.
    ///
    /// Used when a model ships without normals.
    pub fn calculate_smooth_normals(positions: &[[f32; 3]], indices: &[u32]) -> Vec<[f32; 3]> {
        let mut normals = vec![Vector3::new(0.0f32, 0.0, 0.0); positions.len()];

        for triangle in indices.chunks_exact(3) {
            let [i0, i1, i2] = [triangle[0], triangle[1], triangle[2]].map(|i| i as usize);
            if i0 >= positions.len() || i1 >= positions.len() || i2 >= positions.len() {
                continue;
            }
            let v0 = Vector3::from(positions[i0]);
            let edge1 = Vector3::from(positions[i1]) - v0;
            let edge2 = Vector3::from(positions[i2]) - v0;
            // Area weighted: the cross product is left unnormalised
            let face_normal = edge1.cross(edge2);
            for index in [i0, i1, i2] {
                normals[index] += face_normal;
            }
        }

        normals
            .into_iter()
            .map(|n| {
                let length = (n.x * n.x + n.y * n.y + n.z * n.z).sqrt();
                if length > 0.0 {
                    (n / length).into()
                } else {
                    [0.0, 1.0, 0.0]
                }
            })
            .collect()
    }
}

/// What a node in a loaded model holds
pub enum NodeKind {
    Mesh(Mesh),
    Group(Vec<SceneNode>),
    /// Anything that is neither drawable nor a container
    Other,
}

pub struct SceneNode {
    pub name: String,
    pub kind: NodeKind,
    pub cast_shadow: bool,
    pub receive_shadow: bool,
}

impl SceneNode {
    fn with_kind(name: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            name: name.into(),
            kind,
            cast_shadow: false,
            receive_shadow: false,
        }
    }

    pub fn mesh(name: impl Into<String>, mesh: Mesh) -> Self {
        Self::with_kind(name, NodeKind::Mesh(mesh))
    }

    pub fn group(name: impl Into<String>, children: Vec<SceneNode>) -> Self {
        Self::with_kind(name, NodeKind::Group(children))
    }

    pub fn other(name: impl Into<String>) -> Self {
        Self::with_kind(name, NodeKind::Other)
    }

    pub fn as_mesh(&self) -> Option<&Mesh> {
        match &self.kind {
            NodeKind::Mesh(mesh) => Some(mesh),
            _ => None,
        }
    }

    /// Depth-first search for the first node called `name`, self included
    pub fn find(&self, name: &str) -> Option<&SceneNode> {
        if self.name == name {
            return Some(self);
        }
        match &self.kind {
            NodeKind::Group(children) => children.iter().find_map(|child| child.find(name)),
            _ => None,
        }
    }

    /// Consumes the tree and returns the subtree rooted at `name`
    pub fn into_named(self, name: &str) -> Option<SceneNode> {
        if self.name == name {
            return Some(self);
        }
        match self.kind {
            NodeKind::Group(children) => children
                .into_iter()
                .find_map(|child| child.into_named(name)),
            _ => None,
        }
    }

    /// Enables or disables shadow casting on every mesh node of the tree.
    ///
    /// Groups and other nodes are left untouched. Returns the number of mesh
    /// nodes updated.
    pub fn set_cast_shadow(&mut self, cast: bool) -> usize {
        match &mut self.kind {
            NodeKind::Mesh(_) => {
                self.cast_shadow = cast;
                1
            }
            NodeKind::Group(children) => children
                .iter_mut()
                .map(|child| child.set_cast_shadow(cast))
                .sum(),
            NodeKind::Other => 0,
        }
    }

    /// Same traversal as [`Self::set_cast_shadow`] for the receiving side
    pub fn set_receive_shadow(&mut self, receive: bool) -> usize {
        match &mut self.kind {
            NodeKind::Mesh(_) => {
                self.receive_shadow = receive;
                1
            }
            NodeKind::Group(children) => children
                .iter_mut()
                .map(|child| child.set_receive_shadow(receive))
                .sum(),
            NodeKind::Other => 0,
        }
    }

    /// All mesh nodes of the tree in depth-first order
    pub fn mesh_nodes(&self) -> Vec<&SceneNode> {
        let mut out = Vec::new();
        self.collect_mesh_nodes(&mut out);
        out
    }

    fn collect_mesh_nodes<'a>(&'a self, out: &mut Vec<&'a SceneNode>) {
        match &self.kind {
            NodeKind::Mesh(_) => out.push(self),
            NodeKind::Group(children) => {
                for child in children {
                    child.collect_mesh_nodes(out);
                }
            }
            NodeKind::Other => {}
        }
    }

    pub fn meshes(&self) -> impl Iterator<Item = &Mesh> {
        self.mesh_nodes().into_iter().filter_map(SceneNode::as_mesh)
    }

    pub fn for_each_mesh_mut(&mut self, f: &mut impl FnMut(&mut Mesh)) {
        match &mut self.kind {
            NodeKind::Mesh(mesh) => f(mesh),
            NodeKind::Group(children) => {
                for child in children {
                    child.for_each_mesh_mut(f);
                }
            }
            NodeKind::Other => {}
        }
    }

    pub fn mesh_count(&self) -> usize {
        self.mesh_nodes().len()
    }
}

/// Which pipeline draws an object
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shading {
    /// Textured, lit by the directional light and the environment
    Lit,
    /// The floor: base texture with the cursor decal cut into it
    Decal,
}

/// Per-object transform block, group 1 of every mesh pipeline
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ObjectUniform {
    pub model: [[f32; 4]; 4],
    pub normal: [[f32; 4]; 4],
}

impl ObjectUniform {
    pub fn from_transform(transform: &Matrix4<f32>) -> Self {
        let normal = transform
            .invert()
            .map(|inverse| inverse.transpose())
            .unwrap_or_else(Matrix4::identity);
        Self {
            model: (*transform).into(),
            normal: normal.into(),
        }
    }
}

pub struct ObjectGpuResources {
    pub transform_buffer: wgpu::Buffer,
    pub transform_bind_group: wgpu::BindGroup,
}

pub struct Object {
    pub name: String,
    pub root: SceneNode,
    pub materials: Vec<Material>,
    pub transform: Matrix4<f32>,
    pub visible: bool,
    pub shading: Shading,
    pub gpu_resources: Option<ObjectGpuResources>, // None until init_gpu_resources called
}

impl Object {
    /// Create a new visible, lit object with identity transformation
    pub fn new(name: impl Into<String>, root: SceneNode) -> Self {
        Self {
            name: name.into(),
            root,
            materials: Vec::new(),
            transform: Matrix4::identity(),
            visible: true,
            shading: Shading::Lit,
            gpu_resources: None,
        }
    }

    pub fn with_materials(mut self, materials: Vec<Material>) -> Self {
        self.materials = materials;
        self
    }

    pub fn with_shading(mut self, shading: Shading) -> Self {
        self.shading = shading;
        self
    }

    /// Translation, then rotation about X, then non-uniform scale: T * R * S
    pub fn set_transform_trs(
        &mut self,
        translation: Vector3<f32>,
        rotation_x: Deg<f32>,
        scale: Vector3<f32>,
    ) {
        let t = Matrix4::from_translation(translation);
        let r = Matrix4::from_angle_x(rotation_x);
        let s = Matrix4::from_nonuniform_scale(scale.x, scale.y, scale.z);
        self.transform = t * r * s;
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    /// Object-space bounds of all meshes, `None` for an object without geometry
    pub fn local_bounds(&self) -> Option<AABB> {
        self.root
            .meshes()
            .map(|mesh| mesh.bounds())
            .reduce(|a, b| a.union(&b))
    }

    pub fn is_uploaded(&self) -> bool {
        self.gpu_resources.is_some()
    }

    pub fn get_transform_bind_group(&self) -> Option<&wgpu::BindGroup> {
        self.gpu_resources
            .as_ref()
            .map(|res| &res.transform_bind_group)
    }

    /// Uploads mesh buffers and creates the transform bind group
    pub fn init_gpu_resources(
        &mut self,
        device: &wgpu::Device,
        transform_layout: &BindGroupLayoutWithDesc,
    ) {
        self.root.for_each_mesh_mut(&mut |mesh| mesh.upload(device));

        let uniform = ObjectUniform::from_transform(&self.transform);
        let transform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Transform Uniform Buffer"),
            contents: bytemuck::bytes_of(&uniform),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let transform_bind_group = BindGroupBuilder::new(transform_layout)
            .resource(transform_buffer.as_entire_binding())
            .create(device, "Transform Bind Group");

        log::debug!(
            "uploaded '{}': {} meshes, {} materials",
            self.name,
            self.root.mesh_count(),
            self.materials.len()
        );

        self.gpu_resources = Some(ObjectGpuResources {
            transform_buffer,
            transform_bind_group,
        });
    }
}

pub trait DrawObject<'a> {
    fn draw_mesh(&mut self, mesh: &'a Mesh);
    /// Draws the meshes of `object` selected by `filter`. When
    /// `fallback_material` is set each mesh binds its own material at group 2,
    /// falling back to the given bind group.
    fn draw_object_filtered(
        &mut self,
        object: &'a Object,
        fallback_material: Option<&'a wgpu::BindGroup>,
        filter: impl Fn(&SceneNode) -> bool,
    );
}

impl<'a, 'b> DrawObject<'b> for wgpu::RenderPass<'a>
where
    'b: 'a,
{
    fn draw_mesh(&mut self, mesh: &'b Mesh) {
        let (Some(vertex_buffer), Some(index_buffer)) = (&mesh.vertex_buffer, &mesh.index_buffer)
        else {
            return; // Skip drawing if not uploaded
        };

        self.set_vertex_buffer(0, vertex_buffer.slice(..));
        self.set_index_buffer(index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        self.draw_indexed(0..mesh.index_count, 0, 0..1);
    }

    fn draw_object_filtered(
        &mut self,
        object: &'b Object,
        fallback_material: Option<&'b wgpu::BindGroup>,
        filter: impl Fn(&SceneNode) -> bool,
    ) {
        let Some(transform) = object.get_transform_bind_group() else {
            return;
        };
        self.set_bind_group(1, transform, &[]);

        for node in object.root.mesh_nodes() {
            if !filter(node) {
                continue;
            }
            let Some(mesh) = node.as_mesh() else {
                continue;
            };
            if let Some(fallback) = fallback_material {
                let material = mesh
                    .material
                    .and_then(|index| object.materials.get(index))
                    .and_then(Material::get_bind_group)
                    .unwrap_or(fallback);
                self.set_bind_group(2, material, &[]);
            }
            self.draw_mesh(mesh);
        }
    }
}
