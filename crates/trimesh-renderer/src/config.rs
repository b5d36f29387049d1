//! Renderer configuration

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::RenderError;

/// Graphics backends to request an adapter from
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum BackendPreference {
    #[default]
    All,
    Primary,
    Vulkan,
    Metal,
    Dx12,
    Gl,
}

impl BackendPreference {
    pub fn to_backends(self) -> wgpu::Backends {
        match self {
            BackendPreference::All => wgpu::Backends::all(),
            BackendPreference::Primary => wgpu::Backends::PRIMARY,
            BackendPreference::Vulkan => wgpu::Backends::VULKAN,
            BackendPreference::Metal => wgpu::Backends::METAL,
            BackendPreference::Dx12 => wgpu::Backends::DX12,
            BackendPreference::Gl => wgpu::Backends::GL,
        }
    }
}

/// Renderer settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RendererConfig {
    /// Prefix for GPU buffer labels
    pub label: String,
    /// Write attribute updates into the existing vertex buffer instead of
    /// recreating it
    pub update_in_place: bool,
    /// Backends used by headless contexts
    pub backend: BackendPreference,
    /// Prefer a high-performance adapter for headless contexts
    pub high_performance: bool,
    /// Allow a software fallback adapter for headless contexts
    pub force_fallback_adapter: bool,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            label: "TriMesh".to_string(),
            update_in_place: true,
            backend: BackendPreference::All,
            high_performance: false,
            force_fallback_adapter: false,
        }
    }
}

impl RendererConfig {
    /// Parse a configuration from RON text
    pub fn from_ron_str(content: &str) -> Result<Self, RenderError> {
        ron::from_str(content).map_err(|e| RenderError::Config(e.to_string()))
    }

    /// Serialize the configuration as pretty RON text
    pub fn to_ron_string(&self) -> Result<String, RenderError> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| RenderError::Config(e.to_string()))
    }

    /// Load a configuration file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, RenderError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| RenderError::Io(e.to_string()))?;
        let config = Self::from_ron_str(&content)?;
        tracing::info!("Loaded renderer config from {:?}", path);
        Ok(config)
    }

    pub(crate) fn power_preference(&self) -> wgpu::PowerPreference {
        if self.high_performance {
            wgpu::PowerPreference::HighPerformance
        } else {
            wgpu::PowerPreference::LowPower
        }
    }
}
