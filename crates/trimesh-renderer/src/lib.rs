//! Triangle Mesh Renderer
//!
//! WGPU-based upload and drawing of triangle mesh assets.
//!
//! # Architecture
//!
//! - [`context::RenderContext`] - GPU device/queue handle shared by assets
//! - [`gpu_mesh::GpuTriMesh`] - Vertex/index buffers mirroring CPU geometry
//! - [`pipeline::TriMeshPipeline`] - Reference pipeline consuming the vertex layout
//! - [`config::RendererConfig`] - RON-serializable renderer settings
//!
//! # Example
//!
//! ```ignore
//! use trimesh_renderer::{GpuTriMesh, RenderContext, RendererConfig};
//!
//! let ctx = pollster::block_on(RenderContext::headless(&RendererConfig::default()))?;
//! let mesh = GpuTriMesh::from_mesh_data(&ctx, &mesh_data)?;
//!
//! // Inside a render pass
//! pipeline.draw(&mut pass, [&mesh]);
//! ```

pub mod config;
pub mod context;
pub mod error;
pub mod gpu_mesh;
pub mod pipeline;

pub use config::{BackendPreference, RendererConfig};
pub use context::RenderContext;
pub use error::RenderError;
pub use gpu_mesh::{GpuTriMesh, LAYOUT_ELEMENT_COUNT, vertex_layout};
pub use pipeline::{PipelineConfig, TriMeshPipeline, TriMeshUniform};

pub use trimesh_core::{MeshData, TriMesh, TriMeshGeometry, TriMeshVertex};
