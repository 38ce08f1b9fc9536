//! Procedural geometry and mesh data
//!
//! CPU-side mesh data used for furniture templates, wall cells, and the
//! ground plane. All geometry here uses a Y-up coordinate system.

pub mod primitives;

pub use primitives::{generate_cube, generate_plane};

/// Raw mesh data: positions, per-vertex normals, and triangle indices
#[derive(Debug, Clone, Default)]
pub struct GeometryData {
    pub vertices: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub indices: Vec<u32>,
}

impl GeometryData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds geometry from the flat position/normal/index arrays that
    /// OBJ loaders produce.
    pub fn from_flat(positions: &[f32], normals: &[f32], indices: Vec<u32>) -> Self {
        let vertices: Vec<[f32; 3]> = positions
            .chunks_exact(3)
            .map(|p| [p[0], p[1], p[2]])
            .collect();
        let normals: Vec<[f32; 3]> = normals
            .chunks_exact(3)
            .map(|n| [n[0], n[1], n[2]])
            .collect();
        Self {
            vertices,
            normals,
            indices,
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

/// Calculates smooth per-vertex normals from face normals
///
/// Used when a loaded model carries no normals of its own. Each vertex
/// normal is the normalized average of the face normals of every triangle
/// touching it.
pub fn vertex_normals(positions: &[[f32; 3]], indices: &[u32]) -> Vec<[f32; 3]> {
    let mut normals = vec![[0.0f32; 3]; positions.len()];

    for triangle in indices.chunks_exact(3) {
        let i0 = triangle[0] as usize;
        let i1 = triangle[1] as usize;
        let i2 = triangle[2] as usize;

        let v0 = positions[i0];
        let v1 = positions[i1];
        let v2 = positions[i2];

        let edge1 = [v1[0] - v0[0], v1[1] - v0[1], v1[2] - v0[2]];
        let edge2 = [v2[0] - v0[0], v2[1] - v0[1], v2[2] - v0[2]];

        let face_normal = [
            edge1[1] * edge2[2] - edge1[2] * edge2[1],
            edge1[2] * edge2[0] - edge1[0] * edge2[2],
            edge1[0] * edge2[1] - edge1[1] * edge2[0],
        ];

        for &vertex_idx in &[i0, i1, i2] {
            normals[vertex_idx][0] += face_normal[0];
            normals[vertex_idx][1] += face_normal[1];
            normals[vertex_idx][2] += face_normal[2];
        }
    }

    for n in &mut normals {
        let length = (n[0] * n[0] + n[1] * n[1] + n[2] * n[2]).sqrt();
        if length > 0.0 {
            n[0] /= length;
            n[1] /= length;
            n[2] /= length;
        }
    }

    normals
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_flat_groups_triplets() {
        let data = GeometryData::from_flat(
            &[0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0],
            &[0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0],
            vec![0, 1, 2],
        );
        assert_eq!(data.vertex_count(), 3);
        assert_eq!(data.triangle_count(), 1);
        assert_eq!(data.vertices[1], [1.0, 0.0, 0.0]);
    }

    #[test]
    fn test_vertex_normals_flat_triangle() {
        // Triangle in the XZ plane, counter-clockwise seen from +Y
        let positions = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, -1.0]];
        let normals = vertex_normals(&positions, &[0, 1, 2]);
        for n in &normals {
            assert!((n[1] - 1.0).abs() < 1e-6, "expected +Y normal, got {:?}", n);
        }
    }
}
