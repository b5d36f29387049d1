//! Generic triangle mesh container.

use glam::{Vec2, Vec3, Vec4};
use serde::{Deserialize, Serialize};

/// A triangle mesh vertex with the full attribute set.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TriMeshPoint {
    pub position: Vec3,
    pub normal: Vec3,
    pub color: Vec4,
    pub tex_coord: Vec2,
}

impl TriMeshPoint {
    pub fn new(position: Vec3, normal: Vec3, color: Vec4, tex_coord: Vec2) -> Self {
        Self {
            position,
            normal,
            color,
            tex_coord,
        }
    }
}

impl Default for TriMeshPoint {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            normal: Vec3::ZERO,
            color: Vec4::ONE,
            tex_coord: Vec2::ZERO,
        }
    }
}

/// Triangle mesh with one index triple per triangle.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TriMesh {
    pub vertices: Vec<TriMeshPoint>,
    pub indices: Vec<[u32; 3]>,
}

impl TriMesh {
    pub fn new(vertices: Vec<TriMeshPoint>, indices: Vec<[u32; 3]>) -> Self {
        Self { vertices, indices }
    }

    /// Returns the number of triangles.
    pub fn triangle_count(&self) -> usize {
        self.indices.len()
    }

    /// Returns true if the mesh has no vertices.
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Axis-aligned unit quad in the XY plane made of two triangles.
    pub fn quad(color: Vec4) -> Self {
        let corners = [
            (Vec3::new(-0.5, -0.5, 0.0), Vec2::new(0.0, 1.0)),
            (Vec3::new(0.5, -0.5, 0.0), Vec2::new(1.0, 1.0)),
            (Vec3::new(0.5, 0.5, 0.0), Vec2::new(1.0, 0.0)),
            (Vec3::new(-0.5, 0.5, 0.0), Vec2::new(0.0, 0.0)),
        ];
        let vertices = corners
            .iter()
            .map(|&(p, uv)| TriMeshPoint::new(p, Vec3::Z, color, uv))
            .collect();
        Self::new(vertices, vec![[0, 1, 2], [0, 2, 3]])
    }
}
