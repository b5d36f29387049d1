//! Triangle Mesh Core Data Structures
//!
//! This crate contains the CPU-side data for GPU triangle mesh assets:
//! - MeshData: generic polygon mesh container (conversion source/target)
//! - TriMesh: generic triangle mesh container
//! - TriMeshVertex: the interleaved GPU vertex record
//! - TriMeshGeometry: vertex/index sequences mirrored by the GPU buffers
//! - io: STL and OBJ loading into MeshData

pub mod error;
pub mod geometry;
pub mod io;
pub mod mesh_data;
pub mod tri_mesh;
pub mod vertex;

pub use error::MeshError;
pub use geometry::{BoundingBox, ConversionReport, TriMeshGeometry};
pub use io::{MeshFormat, load_mesh, load_obj, load_stl, save_stl};
pub use mesh_data::MeshData;
pub use tri_mesh::{TriMesh, TriMeshPoint};
pub use vertex::TriMeshVertex;
