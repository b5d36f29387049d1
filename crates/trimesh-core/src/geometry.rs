//! Conversion between generic mesh containers and the GPU buffer layout.
//!
//! [`TriMeshGeometry`] is the CPU-side mirror of a GPU triangle mesh: an
//! interleaved vertex sequence and a flat index sequence holding three
//! indices per triangle.

use glam::{Vec3, Vec4};

use crate::error::MeshError;
use crate::mesh_data::MeshData;
use crate::tri_mesh::TriMesh;
use crate::vertex::TriMeshVertex;

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min: Vec3,
    pub max: Vec3,
}

impl BoundingBox {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }
}

/// Summary of a [`MeshData`] conversion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConversionReport {
    /// Faces dropped because they did not have exactly three indices.
    pub skipped_faces: usize,
}

/// Vertex and index sequences in GPU buffer layout.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TriMeshGeometry {
    pub vertices: Vec<TriMeshVertex>,
    pub indices: Vec<u32>,
}

impl TriMeshGeometry {
    pub fn new(vertices: Vec<TriMeshVertex>, indices: Vec<u32>) -> Self {
        Self { vertices, indices }
    }

    /// Converts a triangle mesh. Color goes to attribute A, the texture
    /// coordinate to attribute B `.xy`.
    pub fn from_tri_mesh(mesh: &TriMesh) -> Self {
        let vertices = mesh
            .vertices
            .iter()
            .map(|v| {
                TriMeshVertex::new(
                    v.position,
                    v.normal,
                    v.color,
                    Vec4::new(v.tex_coord.x, v.tex_coord.y, 0.0, 0.0),
                )
            })
            .collect();

        let indices = mesh.indices.iter().flatten().copied().collect();

        Self { vertices, indices }
    }

    /// Converts generic mesh data, dropping non-triangle faces.
    pub fn from_mesh_data(mesh: &MeshData) -> Self {
        Self::from_mesh_data_with_report(mesh).0
    }

    /// Converts generic mesh data and reports how many faces were dropped.
    pub fn from_mesh_data_with_report(mesh: &MeshData) -> (Self, ConversionReport) {
        let has_colors = mesh.has_per_vertex_colors();
        let has_normals = mesh.has_per_vertex_normals();
        let has_tex_coords = mesh.has_per_vertex_texture_coords();

        let vertices = mesh
            .vertices
            .iter()
            .enumerate()
            .map(|(i, &position)| {
                let mut vertex = TriMeshVertex::from_position(position);
                if has_colors {
                    vertex.attribute_a = mesh.colors[i].to_array();
                }
                if has_normals {
                    vertex.normal = mesh.normals[i].to_array();
                }
                if has_tex_coords {
                    let uv = mesh.texture_coords[i];
                    vertex.attribute_b = [uv.x, uv.y, 0.0, 0.0];
                }
                vertex
            })
            .collect();

        let mut report = ConversionReport::default();
        let mut indices = Vec::with_capacity(mesh.face_indices.len() * 3);
        for face in &mesh.face_indices {
            if face.len() == 3 {
                indices.extend_from_slice(face);
            } else {
                tracing::warn!("non triangle face found - ignoring it");
                report.skipped_faces += 1;
            }
        }

        (Self { vertices, indices }, report)
    }

    /// Converts back to generic mesh data with positions, colors from
    /// attribute A and one face per triangle. Normals and texture
    /// coordinates are not exported.
    pub fn to_mesh_data(&self) -> MeshData {
        MeshData {
            vertices: self.vertices.iter().map(TriMeshVertex::position).collect(),
            colors: self
                .vertices
                .iter()
                .map(TriMeshVertex::attribute_a)
                .collect(),
            normals: Vec::new(),
            texture_coords: Vec::new(),
            face_indices: self.triangles().map(|t| t.to_vec()).collect(),
        }
    }

    /// Replaces attribute A of every vertex.
    pub fn update_attribute_a(&mut self, values: &[Vec4]) -> Result<(), MeshError> {
        if values.len() != self.vertices.len() {
            return Err(MeshError::AttributeCountMismatch {
                attribute: "attribute_a",
                expected: self.vertices.len(),
                actual: values.len(),
            });
        }

        for (vertex, value) in self.vertices.iter_mut().zip(values) {
            vertex.attribute_a = value.to_array();
        }
        Ok(())
    }

    /// Checks that indices form whole triangles over existing vertices and
    /// that the index count fits a 32-bit draw range.
    pub fn validate(&self) -> Result<(), MeshError> {
        if self.indices.len() % 3 != 0 {
            return Err(MeshError::IncompleteTriangle {
                count: self.indices.len(),
            });
        }
        self.checked_index_count()?;

        let vertex_count = self.vertices.len();
        match self.indices.iter().find(|&&i| i as usize >= vertex_count) {
            Some(&index) => Err(MeshError::IndexOutOfRange {
                index,
                vertex_count,
            }),
            None => Ok(()),
        }
    }

    /// Returns the index count as the `u32` used by indexed draws.
    pub fn checked_index_count(&self) -> Result<u32, MeshError> {
        index_count_to_u32(self.indices.len())
    }

    /// Iterates over index triples.
    pub fn triangles(&self) -> impl Iterator<Item = [u32; 3]> + '_ {
        self.indices.chunks_exact(3).map(|c| [c[0], c[1], c[2]])
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn index_count(&self) -> usize {
        self.indices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Returns true if there is nothing to draw.
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty() || self.indices.is_empty()
    }

    /// Computes the bounding box of all vertex positions.
    pub fn bounds(&self) -> Option<BoundingBox> {
        if self.vertices.is_empty() {
            return None;
        }

        let mut min = Vec3::splat(f32::INFINITY);
        let mut max = Vec3::splat(f32::NEG_INFINITY);
        for v in &self.vertices {
            let pos = v.position();
            min = min.min(pos);
            max = max.max(pos);
        }

        Some(BoundingBox::new(min, max))
    }
}

fn index_count_to_u32(count: usize) -> Result<u32, MeshError> {
    u32::try_from(count).map_err(|_| MeshError::TooManyIndices { count })
}
