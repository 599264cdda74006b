use crate::gfx::camera::camera_utils::CameraManager;

use super::object::Object;

/// Stable handle of an object slot in a [`Scene`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjectId(usize);

impl ObjectId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Main scene containing objects and the camera
pub struct Scene {
    pub camera_manager: CameraManager,
    objects: Vec<Object>,
}

impl Scene {
    pub fn new(camera_manager: CameraManager) -> Self {
        Self {
            camera_manager,
            objects: Vec::new(),
        }
    }

    /// Updates the scene (camera matrices, etc.)
    pub fn update(&mut self) {
        self.camera_manager.camera.update_view_proj();
    }

    /// Attaches an object; the returned id stays valid for the scene's lifetime
    pub fn add_object(&mut self, object: Object) -> ObjectId {
        let id = ObjectId(self.objects.len());
        log::info!("attached '{}' as object {}", object.name, id.0);
        self.objects.push(object);
        id
    }

    pub fn object(&self, id: ObjectId) -> Option<&Object> {
        self.objects.get(id.0)
    }

    pub fn object_mut(&mut self, id: ObjectId) -> Option<&mut Object> {
        self.objects.get_mut(id.0)
    }

    pub fn objects(&self) -> impl Iterator<Item = (ObjectId, &Object)> {
        self.objects
            .iter()
            .enumerate()
            .map(|(index, object)| (ObjectId(index), object))
    }

    pub fn is_visible(&self, id: ObjectId) -> bool {
        self.object(id).is_some_and(|object| object.visible)
    }

    pub fn set_visible(&mut self, id: ObjectId, visible: bool) {
        if let Some(object) = self.object_mut(id) {
            object.set_visible(visible);
        }
    }

    pub fn get_statistics(&self) -> SceneStatistics {
        let mut statistics = SceneStatistics {
            object_count: self.objects.len(),
            ..Default::default()
        };
        for object in &self.objects {
            if object.visible {
                statistics.visible_count += 1;
            }
            for mesh in object.root.meshes() {
                statistics.total_triangles += mesh.triangle_count();
                statistics.total_vertices += mesh.vertices().len();
            }
        }
        statistics
    }
}

/// Scene statistics for debugging and UI display
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SceneStatistics {
    pub object_count: usize,
    pub visible_count: usize,
    pub total_triangles: usize,
    pub total_vertices: usize,
}
