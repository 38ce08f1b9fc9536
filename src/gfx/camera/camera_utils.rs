use cgmath::{Matrix4, SquareMatrix};
use winit::window::Window;

use super::{camera_controller::CameraController, orbit_camera::OrbitCamera};

/// The editor's orbit camera paired with its mouse controller.
///
/// The walk-through camera lives outside this pairing; it reads raw
/// device events directly and produces the same [`CameraUniform`].
pub struct CameraManager {
    pub camera: OrbitCamera,
    pub controller: CameraController,
}

impl CameraManager {
    pub fn new(camera: OrbitCamera, controller: CameraController) -> Self {
        Self { camera, controller }
    }

    pub fn process_event(&mut self, event: &winit::event::DeviceEvent, window: &Window) {
        self.controller
            .process_events(event, window, &mut self.camera);
    }
}

/// Per-camera GPU data, identical for the orbit and walk cameras so
/// the render engine never cares which view mode produced it.
#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable, Debug)]
pub struct CameraUniform {
    /// Eye position, padded to vec4 for uniform buffer alignment.
    pub view_position: [f32; 4],
    pub view_proj: [[f32; 4]; 4],
}

impl Default for CameraUniform {
    fn default() -> Self {
        Self {
            view_position: [0.0; 4],
            view_proj: convert_matrix4_to_array(Matrix4::identity()),
        }
    }
}

/// cgmath matrices are column-major; the array keeps that layout,
/// which is what the WGSL side expects.
pub fn convert_matrix4_to_array(matrix4: Matrix4<f32>) -> [[f32; 4]; 4] {
    let mut result = [[0.0; 4]; 4];

    for i in 0..4 {
        for j in 0..4 {
            result[i][j] = matrix4[i][j];
        }
    }

    result
}
