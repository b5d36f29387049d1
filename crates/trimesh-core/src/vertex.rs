//! Interleaved vertex record uploaded to the GPU vertex buffer.

use bytemuck::{Pod, Zeroable};
use glam::{Vec3, Vec4};

/// Vertex with position, normal and two generic attributes.
///
/// Attribute A typically holds an RGBA color, attribute B a texture
/// coordinate in `.xy`. The layout is 56 bytes with fields at offsets
/// 0, 12, 24 and 40.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct TriMeshVertex {
    /// Object-space position
    pub position: [f32; 3],
    /// Vertex normal
    pub normal: [f32; 3],
    /// Typically color
    pub attribute_a: [f32; 4],
    /// Typically texture coordinate
    pub attribute_b: [f32; 4],
}

impl TriMeshVertex {
    /// Byte offset of the normal field.
    pub const NORMAL_OFFSET: u64 = 12;
    /// Byte offset of attribute A.
    pub const ATTRIBUTE_A_OFFSET: u64 = 24;
    /// Byte offset of attribute B.
    pub const ATTRIBUTE_B_OFFSET: u64 = 40;

    /// Create a vertex from all four attributes
    pub fn new(position: Vec3, normal: Vec3, attribute_a: Vec4, attribute_b: Vec4) -> Self {
        Self {
            position: position.to_array(),
            normal: normal.to_array(),
            attribute_a: attribute_a.to_array(),
            attribute_b: attribute_b.to_array(),
        }
    }

    /// Create a vertex at `position` with every other attribute zeroed
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position: position.to_array(),
            ..Default::default()
        }
    }

    pub fn position(&self) -> Vec3 {
        Vec3::from(self.position)
    }

    pub fn normal(&self) -> Vec3 {
        Vec3::from(self.normal)
    }

    pub fn attribute_a(&self) -> Vec4 {
        Vec4::from(self.attribute_a)
    }

    pub fn attribute_b(&self) -> Vec4 {
        Vec4::from(self.attribute_b)
    }
}
