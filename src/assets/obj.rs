//! OBJ models and image decoding
//!
//! A model becomes one group node named after the file. Every OBJ object is a
//! child: a mesh node, or a group of mesh nodes when the object was split by
//! material changes. Objects without faces become `Other` nodes.

use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::Path,
};

use image::{imageops::FilterType, RgbaImage};

use super::{model_name, AssetError, LoadedModel};
use crate::gfx::{
    rendering::render_engine::MAX_TEXTURE_SIZE,
    resources::Material,
    scene::{vertex::Vertex3D, Mesh, SceneNode},
};

/// Reads an OBJ file (with its MTL and diffuse textures) and optionally keeps
/// only the sub-node named `node`
pub fn load_obj(path: &Path, node: Option<&str>) -> Result<LoadedModel, AssetError> {
    let file = File::open(path).map_err(|source| AssetError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut reader = BufReader::new(file);
    let base_dir = path.parent().unwrap_or_else(|| Path::new("."));

    let mut model = parse_obj(&mut reader, &model_name(path), base_dir)?;

    if let Some(node) = node {
        model.root = model
            .root
            .into_named(node)
            .ok_or_else(|| AssetError::NodeNotFound {
                path: path.to_path_buf(),
                node: node.to_string(),
            })?;
    }
    Ok(model)
}

/// Parses OBJ text; MTL files and textures resolve against `base_dir`
pub fn parse_obj(
    reader: &mut impl BufRead,
    name: &str,
    base_dir: &Path,
) -> Result<LoadedModel, AssetError> {
    let (models, materials) = tobj::load_obj_buf(
        reader,
        &tobj::LoadOptions {
            triangulate: true,
            single_index: true,
            ..Default::default()
        },
        |mtl_path| tobj::load_mtl(base_dir.join(mtl_path)),
    )?;

    let materials = materials.unwrap_or_else(|e| {
        log::warn!("{}: no usable MTL ({}), using default materials", name, e);
        Vec::new()
    });
    let materials: Vec<Material> = materials
        .iter()
        .enumerate()
        .map(|(i, mtl)| convert_material(i, mtl, base_dir))
        .collect();

    let root = build_tree(name, &models, materials.len());
    Ok(LoadedModel::new(name, root, materials))
}

fn convert_material(index: usize, mtl: &tobj::Material, base_dir: &Path) -> Material {
    let name = if mtl.name.is_empty() {
        format!("material_{}", index)
    } else {
        mtl.name.clone()
    };
    let [r, g, b] = mtl.diffuse.unwrap_or([0.8, 0.8, 0.8]);
    let mut material = Material::new(&name, [r, g, b, mtl.dissolve.unwrap_or(1.0)])
        .with_shininess(mtl.shininess.unwrap_or(32.0));

    if let Some(texture) = mtl.diffuse_texture.as_deref() {
        let path = base_dir.join(texture);
        match decode_image(&path) {
            Ok(image) => material = material.with_texture_image(image),
            Err(e) => log::error!("texture {} of '{}': {}", path.display(), name, e),
        }
    }
    material
}

/// Groups OBJ objects by name, keeping file order
fn build_tree(name: &str, models: &[tobj::Model], material_count: usize) -> SceneNode {
    let mut objects: Vec<(String, Vec<SceneNode>)> = Vec::new();

    for (i, model) in models.iter().enumerate() {
        let object_name = if model.name.is_empty() {
            format!("object_{}", i)
        } else {
            model.name.clone()
        };
        let node = match convert_mesh(&model.mesh, material_count) {
            Some(mesh) => SceneNode::mesh(object_name.clone(), mesh),
            None => SceneNode::other(object_name.clone()),
        };
        match objects.iter_mut().find(|(n, _)| *n == object_name) {
            Some((_, parts)) => parts.push(node),
            None => objects.push((object_name, vec![node])),
        }
    }

    let children = objects
        .into_iter()
        .map(|(object_name, mut parts)| {
            if parts.len() == 1 {
                parts.remove(0)
            } else {
                SceneNode::group(object_name, parts)
            }
        })
        .collect();
    SceneNode::group(name, children)
}

/// `None` for an object without faces
fn convert_mesh(mesh: &tobj::Mesh, material_count: usize) -> Option<Mesh> {
    if mesh.indices.is_empty() {
        return None;
    }
    let vertex_count = mesh.positions.len() / 3;
    let positions: Vec<[f32; 3]> = mesh
        .positions
        .chunks_exact(3)
        .map(|p| [p[0], p[1], p[2]])
        .collect();

    let normals = if mesh.normals.len() == mesh.positions.len() {
        mesh.normals
            .chunks_exact(3)
            .map(|n| [n[0], n[1], n[2]])
            .collect()
    } else {
        Mesh::calculate_smooth_normals(&positions, &mesh.indices)
    };

    let has_tex_coords = mesh.texcoords.len() == vertex_count * 2;
    let vertices = positions
        .iter()
        .zip(normals)
        .enumerate()
        .map(|(i, (position, normal))| Vertex3D {
            position: *position,
            normal,
            tex_coords: if has_tex_coords {
                [mesh.texcoords[2 * i], mesh.texcoords[2 * i + 1]]
            } else {
                [0.0, 0.0]
            },
        })
        .collect();

    let material = mesh.material_id.filter(|&id| id < material_count);
    let converted = Mesh::new(vertices, mesh.indices.clone()).with_material(material);
    Some(if has_tex_coords {
        converted
    } else {
        converted.without_tex_coords()
    })
}

/// Decodes an image to RGBA8, shrinking it to the device's texture limit
pub fn decode_image(path: &Path) -> Result<RgbaImage, AssetError> {
    let image = image::open(path)?;
    Ok(fit_texture(
        image.to_rgba8(),
        MAX_TEXTURE_SIZE,
        &path.display().to_string(),
    ))
}

/// Downscales `image` when either side exceeds `max_size`
pub(crate) fn fit_texture(image: RgbaImage, max_size: u32, label: &str) -> RgbaImage {
    let (width, height) = image.dimensions();
    if width <= max_size && height <= max_size {
        return image;
    }
    log::debug!(
        "{}: {}x{} exceeds {}, downscaling",
        label,
        width,
        height,
        max_size
    );
    let scale = max_size as f32 / width.max(height) as f32;
    let new_width = ((width as f32 * scale) as u32).max(1);
    let new_height = ((height as f32 * scale) as u32).max(1);
    image::imageops::resize(&image, new_width, new_height, FilterType::Triangle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::scene::NodeKind;
    use std::io::Cursor;

    const QUAD: &str = "\
o Floor
v 0 0 0
v 1 0 0
v 1 1 0
v 0 1 0
vt 0 0
vt 1 0
vt 1 1
vt 0 1
f 1/1 2/2 3/3 4/4
";

    const TWO_OBJECTS: &str = "\
o Miles
v 0 0 0
v 1 0 0
v 0 1 0
f 1 2 3
o Backdrop
v 0 0 1
v 1 0 1
v 0 1 1
f 4 5 6
";

    fn parse(source: &str) -> LoadedModel {
        parse_obj(&mut Cursor::new(source), "test", Path::new(".")).unwrap()
    }

    #[test]
    fn quad_is_triangulated_with_uvs() {
        let model = parse(QUAD);
        let floor = model.root.find("Floor").unwrap().as_mesh().unwrap();
        assert_eq!(floor.triangle_count(), 2);
        assert!(floor.has_tex_coords());
        assert!(model.materials.is_empty());
    }

    #[test]
    fn missing_normals_and_uvs_are_handled() {
        let model = parse(TWO_OBJECTS);
        let miles = model.root.find("Miles").unwrap().as_mesh().unwrap();
        assert!(!miles.has_tex_coords());
        for vertex in miles.vertices() {
            assert!((vertex.normal[2] - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn named_sub_node_is_kept_alone() {
        let model = parse(TWO_OBJECTS);
        assert_eq!(model.root.mesh_count(), 2);
        let miles = model.root.into_named("Miles").unwrap();
        assert_eq!(miles.mesh_count(), 1);
    }

    #[test]
    fn faceless_objects_become_other_nodes() {
        let mut triangle = tobj::Mesh::default();
        triangle.positions = vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0];
        triangle.indices = vec![0, 1, 2];
        let models = vec![
            tobj::Model::new(triangle, "body".to_string()),
            tobj::Model::new(tobj::Mesh::default(), "camera".to_string()),
        ];

        let root = build_tree("scene", &models, 0);
        assert!(matches!(root.find("body").unwrap().kind, NodeKind::Mesh(_)));
        assert!(matches!(root.find("camera").unwrap().kind, NodeKind::Other));
    }

    #[test]
    fn objects_split_by_material_share_a_group() {
        let part = || {
            let mut mesh = tobj::Mesh::default();
            mesh.positions = vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0];
            mesh.indices = vec![0, 1, 2];
            mesh.material_id = Some(7);
            mesh
        };
        let models = vec![
            tobj::Model::new(part(), "Miles".to_string()),
            tobj::Model::new(part(), "Miles".to_string()),
        ];

        let root = build_tree("scene", &models, 1);
        let miles = root.find("Miles").unwrap();
        assert!(matches!(miles.kind, NodeKind::Group(_)));
        assert_eq!(miles.mesh_count(), 2);
        // material index out of range is dropped
        assert!(miles.meshes().all(|mesh| mesh.material.is_none()));
    }

    #[test]
    fn missing_file_keeps_the_io_error() {
        let result = load_obj(Path::new("/nonexistent/scene.obj"), None);
        assert!(matches!(
            result,
            Err(AssetError::Io { ref source, .. }) if source.kind() == std::io::ErrorKind::NotFound
        ));
    }

    #[test]
    fn oversized_textures_keep_their_aspect() {
        let fitted = fit_texture(RgbaImage::new(32, 16), 8, "wide");
        assert_eq!(fitted.dimensions(), (8, 4));

        let small = fit_texture(RgbaImage::new(4, 2), 8, "small");
        assert_eq!(small.dimensions(), (4, 2));
    }

    #[test]
    fn unknown_node_is_reported() {
        let dir = std::env::temp_dir().join("decal-stage-obj-test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("scene.obj");
        std::fs::write(&path, TWO_OBJECTS).unwrap();

        let result = load_obj(&path, Some("Gwen"));
        assert!(matches!(
            result,
            Err(AssetError::NodeNotFound { ref node, .. }) if node == "Gwen"
        ));
        assert!(load_obj(&path, Some("Miles")).is_ok());
    }
}
