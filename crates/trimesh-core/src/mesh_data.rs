//! Generic polygon mesh container.

use glam::{Vec2, Vec3, Vec4};
use serde::{Deserialize, Serialize};

use crate::error::MeshError;

/// CPU mesh data with optional per-vertex attributes.
///
/// Attribute arrays are either empty or hold exactly one entry per vertex.
/// Faces are index lists of arbitrary arity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MeshData {
    /// Vertex positions.
    pub vertices: Vec<Vec3>,
    /// Per-vertex colors (RGBA).
    #[serde(default)]
    pub colors: Vec<Vec4>,
    /// Per-vertex normals.
    #[serde(default)]
    pub normals: Vec<Vec3>,
    /// Per-vertex texture coordinates.
    #[serde(default)]
    pub texture_coords: Vec<Vec2>,
    /// Vertex indices of each face.
    pub face_indices: Vec<Vec<u32>>,
}

impl MeshData {
    /// Creates an empty mesh.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a mesh from positions and triangle faces.
    pub fn from_triangles(vertices: Vec<Vec3>, triangles: &[[u32; 3]]) -> Self {
        Self {
            vertices,
            face_indices: triangles.iter().map(|t| t.to_vec()).collect(),
            ..Default::default()
        }
    }

    /// Sets per-vertex colors.
    pub fn with_colors(mut self, colors: Vec<Vec4>) -> Self {
        self.colors = colors;
        self
    }

    /// Sets per-vertex normals.
    pub fn with_normals(mut self, normals: Vec<Vec3>) -> Self {
        self.normals = normals;
        self
    }

    /// Sets per-vertex texture coordinates.
    pub fn with_texture_coords(mut self, texture_coords: Vec<Vec2>) -> Self {
        self.texture_coords = texture_coords;
        self
    }

    pub fn has_per_vertex_colors(&self) -> bool {
        !self.colors.is_empty() && self.colors.len() == self.vertices.len()
    }

    pub fn has_per_vertex_normals(&self) -> bool {
        !self.normals.is_empty() && self.normals.len() == self.vertices.len()
    }

    pub fn has_per_vertex_texture_coords(&self) -> bool {
        !self.texture_coords.is_empty() && self.texture_coords.len() == self.vertices.len()
    }

    /// Returns the number of faces.
    pub fn face_count(&self) -> usize {
        self.face_indices.len()
    }

    /// Returns true if the mesh has no vertices.
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Removes all vertices, attributes and faces.
    pub fn clear(&mut self) {
        self.vertices.clear();
        self.colors.clear();
        self.normals.clear();
        self.texture_coords.clear();
        self.face_indices.clear();
    }

    /// Checks that attribute arrays match the vertex count and that every
    /// face index references a vertex.
    pub fn validate(&self) -> Result<(), MeshError> {
        let vertex_count = self.vertices.len();

        let attributes = [
            ("colors", self.colors.len()),
            ("normals", self.normals.len()),
            ("texture_coords", self.texture_coords.len()),
        ];
        for (attribute, actual) in attributes {
            if actual != 0 && actual != vertex_count {
                return Err(MeshError::AttributeCountMismatch {
                    attribute,
                    expected: vertex_count,
                    actual,
                });
            }
        }

        for &index in self.face_indices.iter().flatten() {
            if index as usize >= vertex_count {
                return Err(MeshError::IndexOutOfRange {
                    index,
                    vertex_count,
                });
            }
        }

        Ok(())
    }
}
