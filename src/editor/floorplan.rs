//! 2D floor plan to 3D walls
//!
//! A floor plan image is rasterized into wall cells: every pixel whose
//! mean RGB brightness falls below the threshold becomes one cell. The
//! image is fitted into a fixed 20x20 world-unit span regardless of
//! its pixel resolution, image rows mapping to the Z axis.

use std::path::Path;

use cgmath::Vector3;
use image::RgbaImage;
use thiserror::Error;

use crate::gfx::geometry::primitives::generate_cube;
use crate::gfx::scene::{ObjectLayer, Scene};

/// World-unit span the longer image axis is scaled to.
pub const FLOOR_SPAN: f32 = 20.0;
/// Pixels darker than this (mean of RGB) become walls.
pub const WALL_BRIGHTNESS_THRESHOLD: f32 = 170.0;
pub const WALL_HEIGHT: f32 = 2.0;

pub const WALL_MATERIAL: &str = "wall";

#[derive(Debug, Error)]
pub enum FloorPlanError {
    #[error("failed to open floor plan image: {0}")]
    Image(#[from] image::ImageError),
}

/// One wall cell: the world-space center of its footprint and the
/// footprint edge length.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WallCell {
    pub x: f32,
    pub z: f32,
    pub footprint: f32,
}

pub fn load_image(path: &Path) -> Result<RgbaImage, FloorPlanError> {
    let image = image::open(path)?;
    Ok(image.to_rgba8())
}

/// Converts dark pixels to wall cells. Pixel (0,0) maps to the room's
/// -X/-Z corner.
pub fn rasterize(plan: &RgbaImage) -> Vec<WallCell> {
    let (width, height) = plan.dimensions();
    let max_size = width.max(height) as f32;
    let scale = FLOOR_SPAN / max_size;

    let mut cells = Vec::new();
    for (x, y, pixel) in plan.enumerate_pixels() {
        let [r, g, b, _] = pixel.0;
        let brightness = (r as f32 + g as f32 + b as f32) / 3.0;
        if brightness < WALL_BRIGHTNESS_THRESHOLD {
            cells.push(WallCell {
                x: (x as f32 - width as f32 / 2.0) * scale,
                z: (y as f32 - height as f32 / 2.0) * scale,
                footprint: scale,
            });
        }
    }

    log::info!(
        "floor plan {}x{} produced {} wall cells",
        width,
        height,
        cells.len()
    );

    cells
}

/// Replaces the scene's wall layer with the given cells. Each cell is
/// a cube stretched to room height, its base on the floor. Returns the
/// number of cells added.
pub fn apply_to_scene(scene: &mut Scene, cells: &[WallCell]) -> usize {
    let removed = scene.remove_layer(ObjectLayer::Wall);
    if removed > 0 {
        log::debug!("removed {} previous wall cells", removed);
    }

    if scene.material_manager.get_material(WALL_MATERIAL).is_none() {
        // Cream walls, matte
        scene.add_material(WALL_MATERIAL, [1.0, 0.992, 0.816, 1.0], 0.1, 0.9);
    }

    let cube = generate_cube();
    for (i, cell) in cells.iter().enumerate() {
        let name = scene.add_object_from_geometry(
            &format!("wall_{}", i),
            ObjectLayer::Wall,
            std::slice::from_ref(&cube),
        );
        if let Some(object) = scene.find_object_mut(&name) {
            object.set_material(WALL_MATERIAL);
            object.set_transform_translation_scale_xyz(
                Vector3::new(cell.x, WALL_HEIGHT / 2.0, cell.z),
                Vector3::new(cell.footprint, WALL_HEIGHT, cell.footprint),
            );
        }
    }

    cells.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::camera::{CameraController, CameraManager, OrbitCamera};
    use cgmath::Zero;
    use image::Rgba;

    fn test_scene() -> Scene {
        let camera = OrbitCamera::new(14.14, 0.785, 0.0, Vector3::zero(), 1.5);
        let controller = CameraController::new(0.005, 0.8);
        Scene::new(CameraManager::new(camera, controller))
    }

    fn solid_image(width: u32, height: u32, value: u8) -> RgbaImage {
        RgbaImage::from_pixel(width, height, Rgba([value, value, value, 255]))
    }

    #[test]
    fn test_all_black_image_fills_grid() {
        let cells = rasterize(&solid_image(10, 10, 0));
        assert_eq!(cells.len(), 100);
        // 10 pixels over a 20 unit span
        assert_eq!(cells[0].footprint, 2.0);
        // First pixel centers at the -X/-Z corner
        assert_eq!(cells[0].x, -10.0);
        assert_eq!(cells[0].z, -10.0);
    }

    #[test]
    fn test_all_white_image_has_no_walls() {
        let cells = rasterize(&solid_image(10, 10, 255));
        assert!(cells.is_empty());
    }

    #[test]
    fn test_threshold_boundary() {
        // Exactly 170 is not a wall, 169 is
        assert!(rasterize(&solid_image(1, 1, 170)).is_empty());
        assert_eq!(rasterize(&solid_image(1, 1, 169)).len(), 1);
    }

    #[test]
    fn test_landscape_image_scaled_by_longer_axis() {
        let mut plan = solid_image(20, 10, 255);
        plan.put_pixel(0, 0, Rgba([0, 0, 0, 255]));
        let cells = rasterize(&plan);
        assert_eq!(cells.len(), 1);
        // 20 pixels across the longer axis gives 1 unit per pixel
        assert_eq!(cells[0].footprint, 1.0);
        assert_eq!(cells[0].x, -10.0);
        assert_eq!(cells[0].z, -5.0);
    }

    #[test]
    fn test_apply_replaces_previous_walls() {
        let mut scene = test_scene();
        let cells = rasterize(&solid_image(4, 4, 0));

        assert_eq!(apply_to_scene(&mut scene, &cells), 16);
        assert_eq!(scene.objects.len(), 16);

        // Re-importing replaces rather than stacks
        assert_eq!(apply_to_scene(&mut scene, &cells), 16);
        assert_eq!(scene.objects.len(), 16);
    }

    #[test]
    fn test_wall_base_sits_on_floor() {
        let mut scene = test_scene();
        let cells = vec![WallCell {
            x: 3.0,
            z: -1.0,
            footprint: 2.0,
        }];
        apply_to_scene(&mut scene, &cells);

        let wall = &scene.objects[0];
        let world = wall.world_aabb();
        assert!((world.min.y - 0.0).abs() < 1e-5);
        assert!((world.max.y - WALL_HEIGHT).abs() < 1e-5);
        assert!((world.min.x - 2.0).abs() < 1e-5);
        assert!((world.max.x - 4.0).abs() < 1e-5);
    }
}
