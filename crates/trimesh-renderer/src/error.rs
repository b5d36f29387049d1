//! Renderer error types

use trimesh_core::MeshError;

/// Renderer errors
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error(transparent)]
    Geometry(#[from] MeshError),
    #[error("No compatible GPU adapter found")]
    NoAdapter,
    #[error("Failed to request device: {0}")]
    RequestDevice(#[from] wgpu::RequestDeviceError),
    #[error("IO error: {0}")]
    Io(String),
    #[error("Configuration error: {0}")]
    Config(String),
}
