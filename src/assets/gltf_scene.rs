//! glTF scenes
//!
//! The node hierarchy of the default scene becomes a [`SceneNode`] tree with
//! the same names. Node transforms below the kept root are baked into the
//! vertices, so every mesh is expressed in the root's space. The kept root's
//! own translation and rotation travel with the model; its scale is left to
//! the placement.

use std::path::Path;

use cgmath::{InnerSpace, Matrix, Matrix4, One, Quaternion, SquareMatrix, Vector3, Vector4};
use image::RgbaImage;

use super::{model_name, obj::fit_texture, AssetError, LoadedModel};
use crate::gfx::{
    rendering::render_engine::MAX_TEXTURE_SIZE,
    resources::Material,
    scene::{vertex::Vertex3D, Mesh, SceneNode},
};

/// Reads a `.gltf`/`.glb` file with its buffers and images.
///
/// With `node` set, the first node of that name (depth-first) becomes the
/// root; otherwise the scene roots are grouped under the model name.
pub fn load_gltf(path: &Path, node: Option<&str>) -> Result<LoadedModel, AssetError> {
    let (document, buffers, images) = gltf::import(path)?;
    let name = model_name(path);

    let materials: Vec<Material> = document
        .materials()
        .enumerate()
        .map(|(i, material)| convert_material(i, &material, &images))
        .collect();

    let Some(scene) = document.default_scene().or_else(|| document.scenes().next()) else {
        return Err(AssetError::EmptyModel {
            path: path.to_path_buf(),
        });
    };

    let builder = TreeBuilder {
        buffers: &buffers,
        material_count: materials.len(),
    };

    let model = match node {
        Some(wanted) => {
            let kept = scene
                .nodes()
                .find_map(|root| find_node(root, wanted))
                .ok_or_else(|| AssetError::NodeNotFound {
                    path: path.to_path_buf(),
                    node: wanted.to_string(),
                })?;
            let (translation, rotation, _) = kept.transform().decomposed();
            let mut model = LoadedModel::new(
                name,
                builder.node(&kept, Matrix4::identity()),
                materials,
            );
            model.translation = translation.into();
            model.rotation = quaternion(rotation);
            model
        }
        None => {
            let roots = scene
                .nodes()
                .map(|root| builder.node(&root, local_matrix(&root)))
                .collect();
            LoadedModel::new(name.clone(), SceneNode::group(name, roots), materials)
        }
    };
    Ok(model)
}

fn find_node<'a>(node: gltf::Node<'a>, name: &str) -> Option<gltf::Node<'a>> {
    if node.name() == Some(name) {
        return Some(node);
    }
    node.children().find_map(|child| find_node(child, name))
}

fn local_matrix(node: &gltf::Node) -> Matrix4<f32> {
    Matrix4::from(node.transform().matrix())
}

/// glTF stores quaternions as `[x, y, z, w]`
fn quaternion([x, y, z, w]: [f32; 4]) -> Quaternion<f32> {
    let q = Quaternion::new(w, x, y, z);
    if q.magnitude2() > 0.0 {
        q.normalize()
    } else {
        Quaternion::one()
    }
}

fn node_name(node: &gltf::Node) -> String {
    node.name()
        .map(str::to_string)
        .unwrap_or_else(|| format!("node_{}", node.index()))
}

struct TreeBuilder<'a> {
    buffers: &'a [gltf::buffer::Data],
    material_count: usize,
}

impl TreeBuilder<'_> {
    /// `to_root` maps this node's space into the kept root's space
    fn node(&self, node: &gltf::Node, to_root: Matrix4<f32>) -> SceneNode {
        let name = node_name(node);

        let mut parts: Vec<SceneNode> = node
            .mesh()
            .map(|mesh| {
                mesh.primitives()
                    .enumerate()
                    .filter_map(|(i, primitive)| {
                        let mesh = self.primitive(&name, &primitive, &to_root)?;
                        let part_name = if i == 0 {
                            name.clone()
                        } else {
                            format!("{}.{}", name, i)
                        };
                        Some(SceneNode::mesh(part_name, mesh))
                    })
                    .collect()
            })
            .unwrap_or_default();

        parts.extend(
            node.children()
                .map(|child| self.node(&child, to_root * local_matrix(&child))),
        );

        match parts.len() {
            0 => SceneNode::other(name),
            1 if node.children().len() == 0 => {
                let mut only = parts.remove(0);
                only.name = name;
                only
            }
            _ => SceneNode::group(name, parts),
        }
    }

    /// `None` for non-triangle or position-less primitives
    fn primitive(
        &self,
        node: &str,
        primitive: &gltf::Primitive,
        to_root: &Matrix4<f32>,
    ) -> Option<Mesh> {
        if primitive.mode() != gltf::mesh::Mode::Triangles {
            log::debug!("{}: skipping {:?} primitive", node, primitive.mode());
            return None;
        }
        let reader = primitive.reader(|buffer| self.buffers.get(buffer.index()).map(|data| &data.0[..]));

        let positions: Vec<[f32; 3]> = reader
            .read_positions()?
            .map(|p| transform_point(to_root, p))
            .collect();
        if positions.is_empty() {
            return None;
        }
        let indices: Vec<u32> = match reader.read_indices() {
            Some(indices) => indices.into_u32().collect(),
            None => (0..positions.len() as u32).collect(),
        };

        let normal_matrix = to_root
            .invert()
            .map(|inverse| inverse.transpose())
            .unwrap_or_else(Matrix4::identity);
        let normals: Vec<[f32; 3]> = match reader.read_normals() {
            Some(normals) => normals.map(|n| transform_normal(&normal_matrix, n)).collect(),
            None => Vec::new(),
        };
        let normals = if normals.len() == positions.len() {
            normals
        } else {
            Mesh::calculate_smooth_normals(&positions, &indices)
        };

        // glTF puts v = 0 at the top of the image; the shaders expect OBJ's
        // bottom-up convention
        let tex_coords: Vec<[f32; 2]> = reader
            .read_tex_coords(0)
            .map(|uvs| uvs.into_f32().map(|[u, v]| [u, 1.0 - v]).collect())
            .unwrap_or_default();
        let has_tex_coords = tex_coords.len() == positions.len();

        let vertices = positions
            .iter()
            .zip(normals)
            .enumerate()
            .map(|(i, (position, normal))| Vertex3D {
                position: *position,
                normal,
                tex_coords: if has_tex_coords { tex_coords[i] } else { [0.0, 0.0] },
            })
            .collect();

        let material = primitive
            .material()
            .index()
            .filter(|&id| id < self.material_count);
        let mesh = Mesh::new(vertices, indices).with_material(material);
        Some(if has_tex_coords {
            mesh
        } else {
            mesh.without_tex_coords()
        })
    }
}

fn transform_point(matrix: &Matrix4<f32>, [x, y, z]: [f32; 3]) -> [f32; 3] {
    let p = matrix * Vector4::new(x, y, z, 1.0);
    [p.x, p.y, p.z]
}

fn transform_normal(normal_matrix: &Matrix4<f32>, [x, y, z]: [f32; 3]) -> [f32; 3] {
    let n = (normal_matrix * Vector4::new(x, y, z, 0.0)).truncate();
    if n.magnitude2() > 0.0 {
        n.normalize().into()
    } else {
        Vector3::unit_y().into()
    }
}

fn convert_material(index: usize, material: &gltf::Material, images: &[gltf::image::Data]) -> Material {
    let name = material
        .name()
        .map(str::to_string)
        .unwrap_or_else(|| format!("material_{}", index));
    let pbr = material.pbr_metallic_roughness();
    let mut converted = Material::new(&name, pbr.base_color_factor());

    if let Some(info) = pbr.base_color_texture() {
        let source = info.texture().source().index();
        match images.get(source).and_then(to_rgba) {
            Some(image) => {
                converted = converted.with_texture_image(fit_texture(image, MAX_TEXTURE_SIZE, &name))
            }
            None => log::warn!("material '{}': base colour image {} unusable", name, source),
        }
    }
    converted
}

/// 8-bit RGB(A) images only; other formats are left untextured
fn to_rgba(data: &gltf::image::Data) -> Option<RgbaImage> {
    use gltf::image::Format;

    let pixels = match data.format {
        Format::R8G8B8A8 => data.pixels.clone(),
        Format::R8G8B8 => data
            .pixels
            .chunks_exact(3)
            .flat_map(|rgb| [rgb[0], rgb[1], rgb[2], 255])
            .collect(),
        other => {
            log::debug!("unsupported glTF image format {:?}", other);
            return None;
        }
    };
    RgbaImage::from_raw(data.width, data.height, pixels)
}
