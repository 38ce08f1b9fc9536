//! Global uniform bindings for camera and scene data
//!
//! Per-frame state shared by every draw call: camera matrices and the
//! single directional-ish light the room is lit with, including its
//! view-projection for shadow mapping. Bound at group 0 in all
//! pipelines.

use crate::{
    gfx::camera::camera_utils::CameraUniform,
    wgpu_utils::{
        binding_builder::{BindGroupBuilder, BindGroupLayoutBuilder, BindGroupLayoutWithDesc},
        binding_types,
        uniform_buffer::UniformBuffer,
    },
};

/// Global uniform buffer content.
///
/// MUST match the GlobalUniform struct in the shaders exactly.
#[repr(C)]
#[derive(Copy, Clone, Debug)]
pub struct GlobalUBOContent {
    view_position: [f32; 4],
    view_proj: [[f32; 4]; 4],

    light_position: [f32; 3],
    _padding1: f32,
    light_color: [f32; 3],
    light_intensity: f32,
    light_view_proj: [[f32; 4]; 4],
}

unsafe impl bytemuck::Pod for GlobalUBOContent {}
unsafe impl bytemuck::Zeroable for GlobalUBOContent {}

/// Light configuration for shadow mapping
#[derive(Copy, Clone, Debug)]
pub struct LightConfig {
    pub position: [f32; 3],
    pub color: [f32; 3],
    pub intensity: f32,
}

impl Default for LightConfig {
    fn default() -> Self {
        // High and off to one side so furniture casts visible shadows
        // onto the floor without the walls shadowing the whole room.
        Self {
            position: [20.0, 30.0, 10.0],
            color: [1.0, 1.0, 1.0],
            intensity: 1.0,
        }
    }
}

/// Type alias for the global uniform buffer
pub type GlobalUBO = UniformBuffer<GlobalUBOContent>;

/// Updates the global uniform buffer with camera and light data.
///
/// Call each frame with the active camera's uniform, whichever view
/// mode produced it.
pub fn update_global_ubo(
    ubo: &mut GlobalUBO,
    queue: &wgpu::Queue,
    camera: CameraUniform,
    light: LightConfig,
) {
    let light_pos = cgmath::Point3::new(light.position[0], light.position[1], light.position[2]);
    let light_view = cgmath::Matrix4::look_at_rh(
        light_pos,
        cgmath::Point3::new(0.0, 0.0, 0.0),
        cgmath::Vector3::unit_y(),
    );

    // Ortho bounds sized to cover the 20x20 floor plan span with margin
    let light_proj = cgmath::ortho(-25.0, 25.0, -25.0, 25.0, 5.0, 80.0);
    let light_view_proj = light_proj * light_view;

    let content = GlobalUBOContent {
        view_position: camera.view_position,
        view_proj: camera.view_proj,

        light_position: light.position,
        _padding1: 0.0,
        light_color: light.color,
        light_intensity: light.intensity,
        light_view_proj: light_view_proj.into(),
    };

    ubo.update_content(queue, content);
}

/// Manages bind group layouts and bind groups for global uniforms
pub struct GlobalBindings {
    bind_group_layout: BindGroupLayoutWithDesc,
    bind_group: Option<wgpu::BindGroup>,
}

impl GlobalBindings {
    pub fn new(device: &wgpu::Device) -> Self {
        let bind_group_layout = BindGroupLayoutBuilder::new()
            .next_binding_rendering(binding_types::uniform())
            .create(device, "Globals Bind Group");

        GlobalBindings {
            bind_group_layout,
            bind_group: None,
        }
    }

    /// Must be called after the uniform buffer exists and before any
    /// rendering that reads global uniforms.
    pub fn create_bind_group(&mut self, device: &wgpu::Device, ubo: &GlobalUBO) {
        self.bind_group = Some(
            BindGroupBuilder::new(&self.bind_group_layout)
                .resource(ubo.binding_resource())
                .create(device, "Global Bind Group"),
        );
    }

    pub fn bind_group_layout(&self) -> &wgpu::BindGroupLayout {
        &self.bind_group_layout.layout
    }

    /// # Panics
    /// Panics if `create_bind_group()` hasn't been called yet
    pub fn bind_group(&self) -> &wgpu::BindGroup {
        self.bind_group
            .as_ref()
            .expect("Bind group has not been created yet!")
    }
}
