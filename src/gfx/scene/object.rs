use std::ops::Range;

use cgmath::{Matrix4, Rad, SquareMatrix, Vector3};
use wgpu::Device;

use crate::gfx::geometry::GeometryData;
use crate::gfx::picking::AABB;

use super::vertex::Vertex3D;

/// Which editor group an object belongs to.
///
/// The ground plane is never pickable or removable, walls are replaced
/// wholesale when a new floor plan is imported, and furniture is the
/// only layer the placement controller touches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectLayer {
    Ground,
    Wall,
    Furniture,
}

pub struct Mesh {
    vertices: Vec<Vertex3D>,
    indices: Vec<u32>,
    vertex_buffer: Option<wgpu::Buffer>,
    index_buffer: Option<wgpu::Buffer>,
    index_count: u32,
}

impl Mesh {
    pub fn from_geometry(geometry: &GeometryData) -> Self {
        let vertices = geometry
            .vertices
            .iter()
            .zip(geometry.normals.iter())
            .map(|(position, normal)| Vertex3D {
                position: *position,
                normal: *normal,
            })
            .collect();

        Self {
            vertices,
            indices: geometry.indices.clone(),
            vertex_buffer: None,
            index_buffer: None,
            index_count: geometry.indices.len() as u32,
        }
    }

    /// CPU-side vertices, kept resident for bounding box computation.
    pub fn vertices(&self) -> &[Vertex3D] {
        &self.vertices
    }

    pub fn index_count(&self) -> u32 {
        self.index_count
    }
}

/// Per-object shader data: model matrix plus flags.
///
/// `flags[0]` is 1.0 when the object receives shadows, the remaining
/// lanes pad the struct to a 16 byte boundary.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ObjectUniform {
    pub model: [[f32; 4]; 4],
    pub flags: [f32; 4],
}

pub struct ObjectGpuResources {
    pub uniform_buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
}

pub struct Object {
    pub name: String,
    pub layer: ObjectLayer,
    pub meshes: Vec<Mesh>,
    pub transform: Matrix4<f32>,
    pub material_id: Option<String>,
    pub visible: bool,
    pub casts_shadow: bool,
    pub receives_shadow: bool,
    /// Bounds of the untransformed meshes, in object space.
    pub local_aabb: AABB,
    pub gpu_resources: Option<ObjectGpuResources>,
}

impl Object {
    pub fn new(name: impl Into<String>, layer: ObjectLayer, meshes: Vec<Mesh>) -> Self {
        let mut positions = Vec::new();
        for mesh in &meshes {
            positions.extend(mesh.vertices().iter().map(|v| v.position));
        }
        Self {
            name: name.into(),
            layer,
            meshes,
            transform: Matrix4::identity(),
            material_id: None,
            visible: true,
            casts_shadow: true,
            receives_shadow: true,
            local_aabb: AABB::from_vertices(&positions),
            gpu_resources: None,
        }
    }

    pub fn set_material(&mut self, material_id: &str) {
        self.material_id = Some(material_id.to_string());
    }

    pub fn get_material_id(&self) -> Option<&str> {
        self.material_id.as_deref()
    }

    /// Translation * rotation about Y * uniform scale, in that order.
    pub fn set_transform_trs(
        &mut self,
        translation: Vector3<f32>,
        rotation_y: Rad<f32>,
        scale: f32,
    ) {
        let t = Matrix4::from_translation(translation);
        let r = Matrix4::from_angle_y(rotation_y);
        let s = Matrix4::from_scale(scale);
        self.transform = t * r * s;
    }

    /// Translation with a per-axis scale, used for wall cells which are
    /// thin in X/Z but full room height in Y.
    pub fn set_transform_translation_scale_xyz(
        &mut self,
        translation: Vector3<f32>,
        scale: Vector3<f32>,
    ) {
        let t = Matrix4::from_translation(translation);
        let s = Matrix4::from_nonuniform_scale(scale.x, scale.y, scale.z);
        self.transform = t * s;
    }

    /// Bounds of the object in world space under its current transform.
    pub fn world_aabb(&self) -> AABB {
        self.local_aabb.transform(&self.transform)
    }

    fn uniform(&self) -> ObjectUniform {
        let model: &[f32; 16] = self.transform.as_ref();
        let mut matrix = [[0.0f32; 4]; 4];
        for (col, chunk) in matrix.iter_mut().zip(model.chunks(4)) {
            col.copy_from_slice(chunk);
        }
        ObjectUniform {
            model: matrix,
            flags: [if self.receives_shadow { 1.0 } else { 0.0 }, 0.0, 0.0, 0.0],
        }
    }

    /// Sync the current transform and flags to the GPU buffer.
    pub fn update_transform(&mut self, queue: &wgpu::Queue) {
        if let Some(gpu_resources) = &self.gpu_resources {
            let uniform = self.uniform();
            queue.write_buffer(
                &gpu_resources.uniform_buffer,
                0,
                bytemuck::bytes_of(&uniform),
            );
        }
    }

    pub fn init_gpu_resources(&mut self, device: &Device, layout: &wgpu::BindGroupLayout) {
        for mesh in self.meshes.iter_mut() {
            let vertex_buffer = wgpu::util::DeviceExt::create_buffer_init(
                device,
                &wgpu::util::BufferInitDescriptor {
                    label: Some("Vertex Buffer"),
                    contents: bytemuck::cast_slice(&mesh.vertices),
                    usage: wgpu::BufferUsages::VERTEX,
                },
            );

            let index_buffer = wgpu::util::DeviceExt::create_buffer_init(
                device,
                &wgpu::util::BufferInitDescriptor {
                    label: Some("Index Buffer"),
                    contents: bytemuck::cast_slice(&mesh.indices),
                    usage: wgpu::BufferUsages::INDEX,
                },
            );

            mesh.vertex_buffer = Some(vertex_buffer);
            mesh.index_buffer = Some(index_buffer);
        }

        let uniform = self.uniform();
        let uniform_buffer = wgpu::util::DeviceExt::create_buffer_init(
            device,
            &wgpu::util::BufferInitDescriptor {
                label: Some("Object Uniform Buffer"),
                contents: bytemuck::bytes_of(&uniform),
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            },
        );

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Object Bind Group"),
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        self.gpu_resources = Some(ObjectGpuResources {
            uniform_buffer,
            bind_group,
        });
    }
}

pub trait DrawObject<'a> {
    fn draw_mesh(&mut self, mesh: &'a Mesh);
    fn draw_mesh_instanced(&mut self, mesh: &'a Mesh, instances: Range<u32>);
    fn draw_object(&mut self, object: &'a Object);
}

impl<'a, 'b> DrawObject<'b> for wgpu::RenderPass<'a>
where
    'b: 'a,
{
    fn draw_mesh(&mut self, mesh: &'b Mesh) {
        self.draw_mesh_instanced(mesh, 0..1);
    }

    fn draw_mesh_instanced(&mut self, mesh: &'b Mesh, instances: Range<u32>) {
        let vertex_buffer = match &mesh.vertex_buffer {
            Some(buffer) => buffer,
            None => return, // Skip drawing if not uploaded
        };
        let index_buffer = match &mesh.index_buffer {
            Some(buffer) => buffer,
            None => return,
        };

        self.set_vertex_buffer(0, vertex_buffer.slice(..));
        self.set_index_buffer(index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        self.draw_indexed(0..mesh.index_count, 0, instances);
    }

    fn draw_object(&mut self, object: &'b Object) {
        for mesh in &object.meshes {
            self.draw_mesh_instanced(mesh, 0..1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::geometry::primitives::generate_cube;

    #[test]
    fn test_object_local_aabb_covers_unit_cube() {
        let mesh = Mesh::from_geometry(&generate_cube());
        let object = Object::new("cube", ObjectLayer::Furniture, vec![mesh]);
        assert!((object.local_aabb.min.x - -0.5).abs() < 1e-6);
        assert!((object.local_aabb.max.y - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_world_aabb_follows_translation() {
        let mesh = Mesh::from_geometry(&generate_cube());
        let mut object = Object::new("cube", ObjectLayer::Furniture, vec![mesh]);
        object.set_transform_trs(Vector3::new(3.0, 0.0, -2.0), Rad(0.0), 1.0);
        let world = object.world_aabb();
        assert!((world.min.x - 2.5).abs() < 1e-5);
        assert!((world.max.z - -1.5).abs() < 1e-5);
    }

    #[test]
    fn test_nonuniform_scale_stretches_bounds() {
        let mesh = Mesh::from_geometry(&generate_cube());
        let mut object = Object::new("wall", ObjectLayer::Wall, vec![mesh]);
        object.set_transform_translation_scale_xyz(
            Vector3::new(0.0, 1.0, 0.0),
            Vector3::new(2.0, 2.0, 2.0),
        );
        let world = object.world_aabb();
        assert!((world.min.y - 0.0).abs() < 1e-5);
        assert!((world.max.y - 2.0).abs() < 1e-5);
    }
}
