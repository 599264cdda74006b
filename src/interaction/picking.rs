//! Picking service: camera ray through the pointer, tested against an
//! explicit, ordered set of candidate objects.

use cgmath::{InnerSpace, Matrix4, SquareMatrix, Vector3};
use thiserror::Error;

use super::pointer::PointerState;
use crate::gfx::{
    camera::OrbitCamera,
    picking::{intersect_triangle, Ray},
    scene::{Mesh, Object, ObjectId, Scene},
};

/// A pick ran without one of its collaborators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PickError {
    #[error("no camera has been set on the picking service")]
    CameraUnset,
    #[error("no ray caster has been set on the picking service")]
    RaycasterUnset,
}

/// One ray/object intersection
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PickHit {
    /// World-space distance from the ray origin
    pub distance: f32,
    pub object: ObjectId,
    /// Interpolated surface UV, `None` for meshes without texture coordinates
    pub uv: Option<[f32; 2]>,
    pub point: Vector3<f32>,
}

/// Intersections of one query, nearest first
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PickResult {
    hits: Vec<PickHit>,
}

impl PickResult {
    /// Sorts `hits` by ascending distance; equal distances keep their order
    pub fn from_hits(mut hits: Vec<PickHit>) -> Self {
        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        Self { hits }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn nearest(&self) -> Option<&PickHit> {
        self.hits.first()
    }

    pub fn hits(&self) -> &[PickHit] {
        &self.hits
    }

    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }

    pub fn len(&self) -> usize {
        self.hits.len()
    }
}

/// Objects a query may hit, in caller order.
///
/// Built from optional slots: objects that are not loaded yet (`None`),
/// missing from the scene or hidden are left out.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CandidateSet {
    ids: Vec<ObjectId>,
}

impl CandidateSet {
    pub fn visible(scene: &Scene, slots: &[Option<ObjectId>]) -> Self {
        let ids = slots
            .iter()
            .flatten()
            .copied()
            .filter(|id| scene.is_visible(*id))
            .collect();
        Self { ids }
    }

    pub fn ids(&self) -> &[ObjectId] {
        &self.ids
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// Ray/scene intersection facility
pub trait RayCast {
    /// All intersections of `ray` with the candidates, in any order
    fn intersect(&self, ray: &Ray, scene: &Scene, candidates: &CandidateSet) -> Vec<PickHit>;
}

/// Exact triangle ray caster.
///
/// The world ray is moved into object space with the inverse object
/// transform, tested against each mesh's bounding box and then against its
/// triangles. Each mesh contributes at most its nearest hit.
#[derive(Debug, Default, Clone, Copy)]
pub struct MeshRaycaster;

impl MeshRaycaster {
    pub fn new() -> Self {
        Self
    }

    fn intersect_object(&self, ray: &Ray, id: ObjectId, object: &Object, out: &mut Vec<PickHit>) {
        let Some(inverse) = object.transform.invert() else {
            return; // collapsed transform, nothing to hit
        };
        let Some(local_ray) = ray.transformed(&inverse) else {
            return;
        };

        for mesh in object.root.meshes() {
            if mesh.bounds().intersect_ray(&local_ray).is_none() {
                continue;
            }
            if let Some((local_point, uv)) = nearest_triangle_hit(&local_ray, mesh) {
                let point = (object.transform * local_point.extend(1.0)).truncate();
                out.push(PickHit {
                    distance: (point - ray.origin).magnitude(),
                    object: id,
                    uv,
                    point,
                });
            }
        }
    }
}

fn nearest_triangle_hit(ray: &Ray, mesh: &Mesh) -> Option<(Vector3<f32>, Option<[f32; 2]>)> {
    let vertices = mesh.vertices();
    let mut nearest: Option<(f32, Vector3<f32>, Option<[f32; 2]>)> = None;

    for triangle in mesh.indices().chunks_exact(3) {
        let (Some(a), Some(b), Some(c)) = (
            vertices.get(triangle[0] as usize),
            vertices.get(triangle[1] as usize),
            vertices.get(triangle[2] as usize),
        ) else {
            continue;
        };
        let Some(hit) = intersect_triangle(
            ray,
            a.position.into(),
            b.position.into(),
            c.position.into(),
        ) else {
            continue;
        };
        if nearest.is_some_and(|(best, _, _)| best <= hit.t) {
            continue;
        }
        let uv = mesh
            .has_tex_coords()
            .then(|| hit.interpolate(a.tex_coords, b.tex_coords, c.tex_coords));
        nearest = Some((hit.t, ray.point_at(hit.t), uv));
    }

    nearest.map(|(_, point, uv)| (point, uv))
}

impl RayCast for MeshRaycaster {
    fn intersect(&self, ray: &Ray, scene: &Scene, candidates: &CandidateSet) -> Vec<PickHit> {
        let mut hits = Vec::new();
        for &id in candidates.ids() {
            if let Some(object) = scene.object(id) {
                self.intersect_object(ray, id, object, &mut hits);
            }
        }
        hits
    }
}

/// Snapshot of the camera taken by [`PickingService::set_camera`]
#[derive(Debug, Clone, Copy)]
struct PickCamera {
    eye: Vector3<f32>,
    inverse_view_proj: Matrix4<f32>,
}

/// Camera and ray caster for pointer queries.
///
/// Both start unset; a query before they are provided is a programming
/// error reported as [`PickError`], never an empty result.
#[derive(Default)]
pub struct PickingService {
    camera: Option<PickCamera>,
    raycaster: Option<Box<dyn RayCast>>,
}

impl PickingService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Service with the camera and the exact mesh ray caster already set
    pub fn with_mesh_raycaster(camera: &OrbitCamera) -> Self {
        let mut service = Self::new();
        service.set_camera(camera);
        service.set_raycaster(Box::new(MeshRaycaster::new()));
        service
    }

    /// Captures the camera's current view and projection.
    ///
    /// Must be called again whenever the camera moves or its aspect changes.
    pub fn set_camera(&mut self, camera: &OrbitCamera) {
        let view_proj = camera.projection_matrix() * camera.view_matrix();
        match view_proj.invert() {
            Some(inverse_view_proj) => {
                self.camera = Some(PickCamera {
                    eye: camera.eye,
                    inverse_view_proj,
                })
            }
            None => log::warn!("camera matrix is not invertible; keeping the previous one"),
        }
    }

    pub fn set_raycaster(&mut self, raycaster: Box<dyn RayCast>) {
        self.raycaster = Some(raycaster);
    }

    /// Intersections of the pointer ray with `candidates`, nearest first.
    ///
    /// An off-screen pointer, an empty candidate set or a degenerate ray all
    /// yield an empty result.
    pub fn pick(
        &self,
        pointer: &PointerState,
        scene: &Scene,
        candidates: &CandidateSet,
    ) -> Result<PickResult, PickError> {
        let camera = self.camera.ok_or(PickError::CameraUnset)?;
        let raycaster = self.raycaster.as_deref().ok_or(PickError::RaycasterUnset)?;

        if pointer.is_off_screen() || candidates.is_empty() {
            return Ok(PickResult::empty());
        }
        let Some(ray) = Ray::from_eye(camera.eye, &camera.inverse_view_proj, pointer.ndc()) else {
            log::trace!("degenerate pick ray at {:?}", pointer);
            return Ok(PickResult::empty());
        };

        Ok(PickResult::from_hits(raycaster.intersect(&ray, scene, candidates)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CameraSettings;
    use crate::gfx::camera::{CameraController, CameraManager};
    use crate::gfx::geometry::generate_plane;
    use crate::gfx::scene::SceneNode;
    use cgmath::Deg;

    const CENTRE: PointerState = PointerState { x: 0.0, y: 0.0 };

    fn camera() -> OrbitCamera {
        OrbitCamera::from_settings(&CameraSettings::default(), 1.0)
    }

    fn scene() -> Scene {
        Scene::new(CameraManager::new(camera(), CameraController::new(0.005, 0.1)))
    }

    /// 4x4 plane facing the camera, two triangles sharing the diagonal
    /// from (2, -2) to (-2, 2)
    fn wall_mesh() -> Mesh {
        let plane = generate_plane(4.0, 4.0, 1, 1);
        Mesh::new(plane.to_vertices(), plane.indices.clone())
    }

    fn wall(name: &str, mesh: Mesh, z: f32, scale: f32) -> Object {
        let mut object = Object::new(name, SceneNode::mesh(name, mesh));
        object.set_transform_trs(
            Vector3::new(0.3 * scale, 0.2 * scale, z),
            Deg(0.0),
            Vector3::new(scale, scale, scale),
        );
        object
    }

    fn pick_one(scene: &Scene, id: ObjectId) -> PickResult {
        PickingService::with_mesh_raycaster(&camera())
            .pick(&CENTRE, scene, &CandidateSet::visible(scene, &[Some(id)]))
            .unwrap()
    }

    #[test]
    fn unset_collaborators_fail_fast() {
        let scene = scene();
        let candidates = CandidateSet::default();

        let service = PickingService::new();
        assert_eq!(
            service.pick(&CENTRE, &scene, &candidates),
            Err(PickError::CameraUnset)
        );

        let mut service = PickingService::new();
        service.set_camera(&camera());
        assert_eq!(
            service.pick(&CENTRE, &scene, &candidates),
            Err(PickError::RaycasterUnset)
        );
    }

    #[test]
    fn hits_are_sorted_nearest_first() {
        let mut scene = scene();
        let far = scene.add_object(wall("far", wall_mesh(), -1.0, 1.0));
        let near = scene.add_object(wall("near", wall_mesh(), 1.0, 1.0));
        let service = PickingService::with_mesh_raycaster(&camera());

        let candidates = CandidateSet::visible(&scene, &[Some(far), Some(near)]);
        let result = service.pick(&CENTRE, &scene, &candidates).unwrap();

        let order: Vec<ObjectId> = result.hits().iter().map(|hit| hit.object).collect();
        assert_eq!(order, vec![near, far]);
        assert!((result.hits()[0].distance - 4.0).abs() < 1e-3);
        assert!((result.hits()[1].distance - 6.0).abs() < 1e-3);
    }

    #[test]
    fn hit_reports_interpolated_uv() {
        let mut scene = scene();
        let id = scene.add_object(wall("wall", wall_mesh(), 0.0, 1.0));

        let result = pick_one(&scene, id);
        let hit = result.nearest().unwrap();
        let uv = hit.uv.unwrap();
        // Local hit point is (-0.3, -0.2) on a plane spanning [-2, 2]
        assert!((uv[0] - 0.425).abs() < 1e-4);
        assert!((uv[1] - 0.45).abs() < 1e-4);
        assert!(hit.point.magnitude() < 1e-4);
    }

    #[test]
    fn hidden_and_unloaded_objects_are_not_candidates() {
        let mut scene = scene();
        let shown = scene.add_object(wall("shown", wall_mesh(), -1.0, 1.0));
        let hidden = scene.add_object(wall("hidden", wall_mesh(), 1.0, 1.0));
        scene.set_visible(hidden, false);

        let candidates = CandidateSet::visible(&scene, &[Some(hidden), None, Some(shown)]);
        assert_eq!(candidates.ids(), &[shown]);

        let service = PickingService::with_mesh_raycaster(&camera());
        let result = service.pick(&CENTRE, &scene, &candidates).unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result.nearest().unwrap().object, shown);
    }

    #[test]
    fn degenerate_queries_are_empty() {
        let mut scene = scene();
        let id = scene.add_object(wall("wall", wall_mesh(), 0.0, 1.0));
        let service = PickingService::with_mesh_raycaster(&camera());
        let candidates = CandidateSet::visible(&scene, &[Some(id)]);

        let off = service.pick(&PointerState::OFF_SCREEN, &scene, &candidates).unwrap();
        assert!(off.is_empty());

        let none = service.pick(&CENTRE, &scene, &CandidateSet::default()).unwrap();
        assert!(none.is_empty());

        let corner = PointerState { x: 0.99, y: 0.99 };
        assert!(service.pick(&corner, &scene, &candidates).unwrap().is_empty());
    }

    #[test]
    fn scaled_objects_report_world_distances() {
        let mut scene = scene();
        let id = scene.add_object(wall("wall", wall_mesh(), 0.0, 0.1));

        let result = pick_one(&scene, id);
        assert!((result.nearest().unwrap().distance - 5.0).abs() < 1e-3);
    }

    #[test]
    fn view_axis_on_the_shared_diagonal_hits() {
        let mut scene = scene();
        let mut centred = Object::new("centred", SceneNode::mesh("centred", wall_mesh()));
        centred.set_transform_trs(Vector3::new(0.0, 0.0, 0.0), Deg(0.0), Vector3::new(1.0, 1.0, 1.0));
        let id = scene.add_object(centred);

        let result = pick_one(&scene, id);
        let hit = result.nearest().expect("the diagonal belongs to the wall");
        assert!((hit.distance - 5.0).abs() < 1e-4);
        let uv = hit.uv.unwrap();
        assert!((uv[0] - 0.5).abs() < 1e-4 && (uv[1] - 0.5).abs() < 1e-4);

        // Along the diagonal, off the centre
        let service = PickingService::with_mesh_raycaster(&camera());
        let candidates = CandidateSet::visible(&scene, &[Some(id)]);
        let along = PointerState { x: 0.2, y: -0.2 };
        assert_eq!(service.pick(&along, &scene, &candidates).unwrap().len(), 1);
    }

    #[test]
    fn meshes_without_uvs_hit_without_uv() {
        let mut scene = scene();
        let id = scene.add_object(wall("bare", wall_mesh().without_tex_coords(), 0.0, 1.0));

        let result = pick_one(&scene, id);
        assert_eq!(result.len(), 1);
        assert_eq!(result.nearest().unwrap().uv, None);
    }
}
