//! Furniture placement, selection, and transform editing
//!
//! All placement happens by casting rays at the ground plane. A piece
//! of furniture is selected by pressing the pointer over it and stays
//! selected only until the pointer is released, so rotate and scale
//! shortcuts act on the object currently under the hand.

use cgmath::{Rad, Vector3};

use crate::catalog::AssetCatalog;
use crate::gfx::picking::Ray;
use crate::gfx::scene::{ObjectLayer, Scene};

pub const MIN_SCALE: f32 = 0.1;
pub const MAX_SCALE: f32 = 5.0;
pub const SCALE_STEP: f32 = 0.1;
const ROTATE_STEP: f32 = std::f32::consts::FRAC_PI_2;

/// One placed piece of furniture. `name` is the unique scene object
/// name linking this instance to its renderable.
#[derive(Debug, Clone)]
pub struct FurnitureInstance {
    pub type_key: String,
    pub name: String,
    pub position: Vector3<f32>,
    pub rotation_y: Rad<f32>,
    pub scale: f32,
}

/// Active grab: which instance and where on it the pointer landed.
#[derive(Debug, Clone, Copy)]
pub struct Selection {
    pub furniture_index: usize,
    /// Offset from the ground hit to the instance origin, y zeroed, so
    /// the object does not jump to the cursor on grab.
    pub drag_offset: Vector3<f32>,
}

#[derive(Default)]
pub struct PlacementController {
    instances: Vec<FurnitureInstance>,
    selection: Option<Selection>,
}

impl PlacementController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn instances(&self) -> &[FurnitureInstance] {
        &self.instances
    }

    pub fn selection(&self) -> Option<&Selection> {
        self.selection.as_ref()
    }

    pub fn is_dragging(&self) -> bool {
        self.selection.is_some()
    }

    /// Places a new instance of `type_key` where `ray` meets the
    /// ground. Returns false (with a log) when the key is unknown or
    /// the ray misses the floor.
    pub fn add_instance(
        &mut self,
        scene: &mut Scene,
        catalog: &AssetCatalog,
        type_key: &str,
        ray: &Ray,
    ) -> bool {
        let template = match catalog.get(type_key) {
            Some(template) => template,
            None => {
                log::error!("unknown furniture type '{}'", type_key);
                return false;
            }
        };

        let position = match ray.ground_intersection() {
            Some(hit) => Vector3::new(hit.x, 0.0, hit.z),
            None => {
                log::warn!("drop ray missed the ground plane");
                return false;
            }
        };

        let scale = template.default_scale;
        let name = scene.add_object_from_geometry(type_key, ObjectLayer::Furniture, &template.meshes);
        if let Some(object) = scene.find_object_mut(&name) {
            object.set_transform_trs(position, Rad(0.0), scale);
        }

        log::info!("placed '{}' at ({:.2}, {:.2})", name, position.x, position.z);

        self.instances.push(FurnitureInstance {
            type_key: type_key.to_string(),
            name,
            position,
            rotation_y: Rad(0.0),
            scale,
        });

        true
    }

    /// Picks the closest furniture instance under `ray` and begins a
    /// drag. Non-furniture objects (ground, walls) are never selected.
    pub fn select_at(&mut self, scene: &Scene, ray: &Ray) -> bool {
        let mut closest: Option<(usize, f32)> = None;

        for (index, instance) in self.instances.iter().enumerate() {
            let object = match scene.find_object(&instance.name) {
                Some(object) => object,
                None => continue,
            };
            if let Some(distance) = object.world_aabb().intersect_ray(ray) {
                if closest.map_or(true, |(_, best)| distance < best) {
                    closest = Some((index, distance));
                }
            }
        }

        match closest {
            Some((index, _)) => {
                let drag_offset = match ray.ground_intersection() {
                    Some(hit) => {
                        let p = self.instances[index].position;
                        Vector3::new(p.x - hit.x, 0.0, p.z - hit.z)
                    }
                    None => Vector3::new(0.0, 0.0, 0.0),
                };
                self.selection = Some(Selection {
                    furniture_index: index,
                    drag_offset,
                });
                true
            }
            None => {
                self.selection = None;
                false
            }
        }
    }

    /// Moves the grabbed instance so it follows the pointer across the
    /// floor. Silently keeps the last position while the ray misses
    /// the ground.
    pub fn drag_to(&mut self, scene: &mut Scene, ray: &Ray) {
        let selection = match self.selection {
            Some(selection) => selection,
            None => return,
        };
        let hit = match ray.ground_intersection() {
            Some(hit) => hit,
            None => return,
        };

        let instance = &mut self.instances[selection.furniture_index];
        instance.position = Vector3::new(
            hit.x + selection.drag_offset.x,
            instance.position.y,
            hit.z + selection.drag_offset.z,
        );
        sync_object(scene, instance);
    }

    /// Ends the drag. Selection does not outlive the pointer press.
    pub fn release_selection(&mut self) {
        self.selection = None;
    }

    pub fn rotate_selected(&mut self, scene: &mut Scene, clockwise: bool) {
        if let Some(selection) = self.selection {
            self.rotate_index(scene, selection.furniture_index, clockwise);
        }
    }

    pub fn rotate_index(&mut self, scene: &mut Scene, index: usize, clockwise: bool) {
        let instance = match self.instances.get_mut(index) {
            Some(instance) => instance,
            None => return,
        };
        let step = if clockwise { -ROTATE_STEP } else { ROTATE_STEP };
        instance.rotation_y = Rad((instance.rotation_y.0 + step) % (2.0 * std::f32::consts::PI));
        sync_object(scene, instance);
    }

    /// Scales the grabbed instance by +/- 10% of its current size,
    /// rejecting steps that would leave the [0.1, 5.0] range.
    pub fn scale_selected(&mut self, scene: &mut Scene, grow: bool) {
        if let Some(selection) = self.selection {
            self.scale_index(scene, selection.furniture_index, grow);
        }
    }

    pub fn scale_index(&mut self, scene: &mut Scene, index: usize, grow: bool) {
        let instance = match self.instances.get_mut(index) {
            Some(instance) => instance,
            None => return,
        };
        let factor = if grow { 1.0 + SCALE_STEP } else { 1.0 - SCALE_STEP };
        let next = instance.scale * factor;
        if !(MIN_SCALE..=MAX_SCALE).contains(&next) {
            return;
        }
        instance.scale = next;
        sync_object(scene, instance);
    }

    pub fn reset_scale_selected(&mut self, scene: &mut Scene, catalog: &AssetCatalog) {
        if let Some(selection) = self.selection {
            self.reset_scale_index(scene, catalog, selection.furniture_index);
        }
    }

    pub fn reset_scale_index(&mut self, scene: &mut Scene, catalog: &AssetCatalog, index: usize) {
        let instance = match self.instances.get_mut(index) {
            Some(instance) => instance,
            None => return,
        };
        instance.scale = catalog.default_scale(&instance.type_key);
        sync_object(scene, instance);
    }

    /// Removes every placed instance from the scene. Walls and the
    /// ground are untouched.
    pub fn clear_all(&mut self, scene: &mut Scene) -> usize {
        let mut removed = 0;
        for instance in &self.instances {
            if scene.remove_named(&instance.name) {
                removed += 1;
            }
        }
        self.instances.clear();
        self.selection = None;
        removed
    }
}

fn sync_object(scene: &mut Scene, instance: &FurnitureInstance) {
    if let Some(object) = scene.find_object_mut(&instance.name) {
        object.set_transform_trs(instance.position, instance.rotation_y, instance.scale);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::FurnitureTemplate;
    use crate::gfx::camera::{CameraController, CameraManager, OrbitCamera};
    use crate::gfx::geometry::primitives::generate_cube;
    use cgmath::Zero;

    fn test_scene() -> Scene {
        let camera = OrbitCamera::new(14.14, 0.785, 0.0, Vector3::zero(), 1.5);
        let controller = CameraController::new(0.005, 0.8);
        Scene::new(CameraManager::new(camera, controller))
    }

    fn test_catalog() -> AssetCatalog {
        AssetCatalog::from_templates(vec![FurnitureTemplate {
            key: "sofa".to_string(),
            meshes: vec![generate_cube()],
            default_scale: 1.0,
        }])
    }

    fn ray_down_at(x: f32, z: f32) -> Ray {
        Ray::new(Vector3::new(x, 10.0, z), Vector3::new(0.0, -1.0, 0.0))
    }

    #[test]
    fn test_add_instance_at_ground_hit() {
        let mut scene = test_scene();
        let catalog = test_catalog();
        let mut placement = PlacementController::new();

        assert!(placement.add_instance(&mut scene, &catalog, "sofa", &ray_down_at(3.0, -2.0)));
        let instance = &placement.instances()[0];
        assert!((instance.position.x - 3.0).abs() < 1e-5);
        assert!((instance.position.z - -2.0).abs() < 1e-5);
        assert_eq!(instance.position.y, 0.0);
        assert!(scene.find_object(&instance.name).is_some());
    }

    #[test]
    fn test_add_instance_unknown_key() {
        let mut scene = test_scene();
        let catalog = test_catalog();
        let mut placement = PlacementController::new();

        assert!(!placement.add_instance(&mut scene, &catalog, "throne", &ray_down_at(0.0, 0.0)));
        assert!(placement.instances().is_empty());
        assert!(scene.objects.is_empty());
    }

    #[test]
    fn test_add_instance_ray_misses_ground() {
        let mut scene = test_scene();
        let catalog = test_catalog();
        let mut placement = PlacementController::new();

        let up = Ray::new(Vector3::new(0.0, 5.0, 0.0), Vector3::new(0.0, 1.0, 0.0));
        assert!(!placement.add_instance(&mut scene, &catalog, "sofa", &up));
        assert!(placement.instances().is_empty());
    }

    #[test]
    fn test_select_and_drag_preserves_grab_offset() {
        let mut scene = test_scene();
        let catalog = test_catalog();
        let mut placement = PlacementController::new();
        placement.add_instance(&mut scene, &catalog, "sofa", &ray_down_at(0.0, 0.0));

        // Grab the cube off-center, near its +x edge
        assert!(placement.select_at(&scene, &ray_down_at(0.4, 0.0)));
        let offset = placement.selection().unwrap().drag_offset;
        assert!((offset.x - -0.4).abs() < 1e-5);

        placement.drag_to(&mut scene, &ray_down_at(5.0, 5.0));
        let instance = &placement.instances()[0];
        // The grab point follows the cursor, not the object origin
        assert!((instance.position.x - 4.6).abs() < 1e-4);
        assert!((instance.position.z - 5.0).abs() < 1e-4);
        assert_eq!(instance.position.y, 0.0);
    }

    #[test]
    fn test_selection_cleared_on_release() {
        let mut scene = test_scene();
        let catalog = test_catalog();
        let mut placement = PlacementController::new();
        placement.add_instance(&mut scene, &catalog, "sofa", &ray_down_at(0.0, 0.0));

        placement.select_at(&scene, &ray_down_at(0.0, 0.0));
        assert!(placement.is_dragging());
        placement.release_selection();
        assert!(!placement.is_dragging());
        assert!(placement.selection().is_none());
    }

    #[test]
    fn test_select_misses_empty_floor() {
        let mut scene = test_scene();
        let catalog = test_catalog();
        let mut placement = PlacementController::new();
        placement.add_instance(&mut scene, &catalog, "sofa", &ray_down_at(0.0, 0.0));

        assert!(!placement.select_at(&scene, &ray_down_at(8.0, 8.0)));
        assert!(placement.selection().is_none());
    }

    #[test]
    fn test_scale_clamped_to_bounds() {
        let mut scene = test_scene();
        let catalog = test_catalog();
        let mut placement = PlacementController::new();
        placement.add_instance(&mut scene, &catalog, "sofa", &ray_down_at(0.0, 0.0));

        for _ in 0..100 {
            placement.scale_index(&mut scene, 0, true);
        }
        let scale = placement.instances()[0].scale;
        assert!(scale <= MAX_SCALE);

        for _ in 0..100 {
            placement.scale_index(&mut scene, 0, false);
        }
        let scale = placement.instances()[0].scale;
        assert!(scale >= MIN_SCALE);
    }

    #[test]
    fn test_reset_scale_restores_default() {
        let mut scene = test_scene();
        let catalog = test_catalog();
        let mut placement = PlacementController::new();
        placement.add_instance(&mut scene, &catalog, "sofa", &ray_down_at(0.0, 0.0));

        placement.scale_index(&mut scene, 0, true);
        placement.scale_index(&mut scene, 0, true);
        placement.reset_scale_index(&mut scene, &catalog, 0);
        assert_eq!(placement.instances()[0].scale, 1.0);

        // Idempotent
        placement.reset_scale_index(&mut scene, &catalog, 0);
        assert_eq!(placement.instances()[0].scale, 1.0);
    }

    #[test]
    fn test_rotation_wraps() {
        let mut scene = test_scene();
        let catalog = test_catalog();
        let mut placement = PlacementController::new();
        placement.add_instance(&mut scene, &catalog, "sofa", &ray_down_at(0.0, 0.0));

        // Four quarter turns come back around to zero mod 2 pi
        for _ in 0..4 {
            placement.rotate_index(&mut scene, 0, false);
        }
        let angle = placement.instances()[0].rotation_y.0;
        let wrapped = angle.rem_euclid(2.0 * std::f32::consts::PI);
        assert!(wrapped < 1e-4 || (2.0 * std::f32::consts::PI - wrapped) < 1e-4);
    }

    #[test]
    fn test_clear_all_removes_only_furniture() {
        let mut scene = test_scene();
        let catalog = test_catalog();
        let mut placement = PlacementController::new();

        scene.add_object_from_geometry("ground", ObjectLayer::Ground, &[generate_cube()]);
        placement.add_instance(&mut scene, &catalog, "sofa", &ray_down_at(0.0, 0.0));
        placement.add_instance(&mut scene, &catalog, "sofa", &ray_down_at(2.0, 2.0));

        let removed = placement.clear_all(&mut scene);
        assert_eq!(removed, 2);
        assert!(placement.instances().is_empty());
        assert_eq!(scene.objects.len(), 1);
        assert!(scene.find_object("ground").is_some());
    }
}
