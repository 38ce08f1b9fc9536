use wgpu::Device;

use crate::gfx::{
    camera::camera_utils::CameraManager,
    geometry::GeometryData,
    resources::material::{Material, MaterialManager},
};

use super::object::{Mesh, Object, ObjectLayer};

/// Main scene containing objects, materials, and camera
pub struct Scene {
    pub camera_manager: CameraManager,
    pub objects: Vec<Object>,
    pub material_manager: MaterialManager,
}

impl Scene {
    pub fn new(camera_manager: CameraManager) -> Self {
        Self {
            camera_manager,
            objects: Vec::new(),
            material_manager: MaterialManager::new(),
        }
    }

    /// Updates the scene (camera matrices, etc.)
    pub fn update(&mut self) {
        self.camera_manager.camera.update_view_proj();
    }

    /// Adds an object built from in-memory geometry and returns its
    /// final (deduplicated) name.
    pub fn add_object_from_geometry(
        &mut self,
        desired_name: &str,
        layer: ObjectLayer,
        geometries: &[GeometryData],
    ) -> String {
        let name = self.ensure_unique_name(desired_name);
        let meshes: Vec<Mesh> = geometries.iter().map(Mesh::from_geometry).collect();
        self.objects.push(Object::new(name.clone(), layer, meshes));
        name
    }

    /// Removes every object on the given layer, returning how many were
    /// removed.
    pub fn remove_layer(&mut self, layer: ObjectLayer) -> usize {
        let before = self.objects.len();
        self.objects.retain(|obj| obj.layer != layer);
        before - self.objects.len()
    }

    /// Removes the object with the given name. Returns false if no
    /// object carries that name.
    pub fn remove_named(&mut self, name: &str) -> bool {
        let before = self.objects.len();
        self.objects.retain(|obj| obj.name != name);
        self.objects.len() < before
    }

    pub fn find_object(&self, name: &str) -> Option<&Object> {
        self.objects.iter().find(|obj| obj.name == name)
    }

    pub fn find_object_mut(&mut self, name: &str) -> Option<&mut Object> {
        self.objects.iter_mut().find(|obj| obj.name == name)
    }

    /// Creates a new material and adds it to the material manager
    pub fn add_material(
        &mut self,
        name: &str,
        base_color: [f32; 4],
        metallic: f32,
        roughness: f32,
    ) {
        let material = Material::new(name, base_color, metallic, roughness);
        self.material_manager.add_material(material);
    }

    /// Convenience method for creating materials with RGB colors
    pub fn add_material_rgb(
        &mut self,
        name: &str,
        r: f32,
        g: f32,
        b: f32,
        metallic: f32,
        roughness: f32,
    ) {
        self.add_material(name, [r, g, b, 1.0], metallic, roughness);
    }

    /// Initializes GPU resources for objects and materials that do not
    /// have them yet. Safe to call every frame; already-initialized
    /// objects are skipped.
    pub fn init_gpu_resources(
        &mut self,
        device: &Device,
        queue: &wgpu::Queue,
        object_layout: &wgpu::BindGroupLayout,
    ) {
        for object in self.objects.iter_mut() {
            if object.gpu_resources.is_none() {
                object.init_gpu_resources(device, object_layout);
            }
        }

        self.material_manager.update_all_gpu_resources(device, queue);
    }

    /// Updates all object transforms and syncs to GPU
    pub fn update_all_transforms(&mut self, queue: &wgpu::Queue) {
        for object in &mut self.objects {
            if object.gpu_resources.is_some() {
                object.update_transform(queue);
            }
        }
    }

    /// Returns the material assigned to the object, or the default
    /// material if none is assigned.
    pub fn get_material_for_object(&self, object: &Object) -> &Material {
        self.material_manager
            .get_material_for_object(object.get_material_id())
    }

    pub fn ensure_unique_name(&self, desired_name: &str) -> String {
        let mut counter = 0;
        let mut test_name = desired_name.to_string();

        while self.objects.iter().any(|obj| obj.name == test_name) {
            counter += 1;
            test_name = format!("{} ({})", desired_name, counter);
        }

        test_name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::camera::{CameraController, OrbitCamera};
    use crate::gfx::geometry::primitives::generate_cube;
    use cgmath::{Vector3, Zero};

    fn test_scene() -> Scene {
        let camera = OrbitCamera::new(14.14, 0.785, 0.0, Vector3::zero(), 1.5);
        let controller = CameraController::new(0.005, 0.8);
        Scene::new(CameraManager::new(camera, controller))
    }

    #[test]
    fn test_unique_names_on_duplicate_insert() {
        let mut scene = test_scene();
        let cube = generate_cube();
        let a = scene.add_object_from_geometry("sofa", ObjectLayer::Furniture, &[cube.clone()]);
        let b = scene.add_object_from_geometry("sofa", ObjectLayer::Furniture, &[cube]);
        assert_eq!(a, "sofa");
        assert_eq!(b, "sofa (1)");
        assert!(scene.find_object(&b).is_some());
    }

    #[test]
    fn test_remove_layer_leaves_other_layers() {
        let mut scene = test_scene();
        let cube = generate_cube();
        scene.add_object_from_geometry("ground", ObjectLayer::Ground, &[cube.clone()]);
        scene.add_object_from_geometry("wall_0", ObjectLayer::Wall, &[cube.clone()]);
        scene.add_object_from_geometry("wall_1", ObjectLayer::Wall, &[cube]);

        let removed = scene.remove_layer(ObjectLayer::Wall);
        assert_eq!(removed, 2);
        assert_eq!(scene.objects.len(), 1);
        assert!(scene.find_object("ground").is_some());
    }

    #[test]
    fn test_remove_named() {
        let mut scene = test_scene();
        let cube = generate_cube();
        scene.add_object_from_geometry("bed", ObjectLayer::Furniture, &[cube]);
        assert!(scene.remove_named("bed"));
        assert!(!scene.remove_named("bed"));
    }
}
