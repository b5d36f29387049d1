//! GPU triangle mesh asset.
//!
//! A [`GpuTriMesh`] owns a CPU copy of its geometry and the two GPU buffers
//! mirroring it. The buffers are recreated whenever the geometry is replaced
//! and dropped together with the asset.

use glam::Vec4;
use trimesh_core::{ConversionReport, MeshData, TriMesh, TriMeshGeometry, TriMeshVertex};

use crate::context::RenderContext;
use crate::error::RenderError;

/// Number of vertex attributes in [`vertex_layout`].
pub const LAYOUT_ELEMENT_COUNT: usize = 4;

/// Vertex attributes: position, normal, attribute A, attribute B.
pub const VERTEX_ATTRIBUTES: [wgpu::VertexAttribute; LAYOUT_ELEMENT_COUNT] = [
    wgpu::VertexAttribute {
        offset: 0,
        shader_location: 0,
        format: wgpu::VertexFormat::Float32x3,
    },
    wgpu::VertexAttribute {
        offset: TriMeshVertex::NORMAL_OFFSET,
        shader_location: 1,
        format: wgpu::VertexFormat::Float32x3,
    },
    wgpu::VertexAttribute {
        offset: TriMeshVertex::ATTRIBUTE_A_OFFSET,
        shader_location: 2,
        format: wgpu::VertexFormat::Float32x4,
    },
    wgpu::VertexAttribute {
        offset: TriMeshVertex::ATTRIBUTE_B_OFFSET,
        shader_location: 3,
        format: wgpu::VertexFormat::Float32x4,
    },
];

/// Index format of every mesh index buffer.
pub const INDEX_FORMAT: wgpu::IndexFormat = wgpu::IndexFormat::Uint32;

/// Get the vertex buffer layout for triangle mesh vertices
pub fn vertex_layout() -> wgpu::VertexBufferLayout<'static> {
    wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<TriMeshVertex>() as u64,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &VERTEX_ATTRIBUTES,
    }
}

/// Vertex and index buffers created from one geometry upload.
struct MeshBuffers {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
}

/// Triangle mesh uploaded to GPU vertex/index buffers.
///
/// Cloning uploads the geometry into fresh buffers on the same device.
#[derive(Default)]
pub struct GpuTriMesh {
    context: Option<RenderContext>,
    geometry: TriMeshGeometry,
    buffers: Option<MeshBuffers>,
}

impl GpuTriMesh {
    /// Creates an empty mesh with no device and no buffers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a mesh from generic mesh data. Non-triangle faces are dropped.
    pub fn from_mesh_data(ctx: &RenderContext, data: &MeshData) -> Result<Self, RenderError> {
        let mut mesh = Self::new();
        mesh.load_mesh_data(ctx, data)?;
        Ok(mesh)
    }

    /// Creates a mesh from a triangle mesh.
    pub fn from_tri_mesh(ctx: &RenderContext, tri_mesh: &TriMesh) -> Result<Self, RenderError> {
        let mut mesh = Self::new();
        mesh.load_tri_mesh(ctx, tri_mesh)?;
        Ok(mesh)
    }

    /// Creates a mesh from geometry already in buffer layout.
    pub fn from_geometry(
        ctx: &RenderContext,
        geometry: TriMeshGeometry,
    ) -> Result<Self, RenderError> {
        let mut mesh = Self::new();
        mesh.load_geometry(ctx, geometry)?;
        Ok(mesh)
    }

    /// Replaces the geometry with converted mesh data and re-uploads it.
    pub fn load_mesh_data(
        &mut self,
        ctx: &RenderContext,
        data: &MeshData,
    ) -> Result<ConversionReport, RenderError> {
        let (geometry, report) = TriMeshGeometry::from_mesh_data_with_report(data);
        if report.skipped_faces > 0 {
            tracing::debug!("Dropped {} non-triangle faces", report.skipped_faces);
        }
        self.load_geometry(ctx, geometry)?;
        Ok(report)
    }

    /// Replaces the geometry with a converted triangle mesh and re-uploads it.
    pub fn load_tri_mesh(
        &mut self,
        ctx: &RenderContext,
        tri_mesh: &TriMesh,
    ) -> Result<(), RenderError> {
        self.load_geometry(ctx, TriMeshGeometry::from_tri_mesh(tri_mesh))
    }

    /// Copies the geometry of another mesh and uploads it through `ctx`.
    pub fn load_from(&mut self, ctx: &RenderContext, other: &GpuTriMesh) -> Result<(), RenderError> {
        self.load_geometry(ctx, other.geometry.clone())
    }

    /// Replaces the geometry and re-uploads it.
    ///
    /// Geometry with incomplete triangles or dangling indices is rejected
    /// and the current buffers are left untouched.
    pub fn load_geometry(
        &mut self,
        ctx: &RenderContext,
        geometry: TriMeshGeometry,
    ) -> Result<(), RenderError> {
        geometry.validate()?;

        self.geometry = geometry;
        self.reset(ctx);
        Ok(())
    }

    /// Drops both GPU buffers. The CPU geometry is kept.
    pub fn release(&mut self) {
        if self.buffers.take().is_some() {
            tracing::debug!("Released mesh buffers ({} vertices)", self.geometry.vertex_count());
        }
    }

    /// Recreates both GPU buffers from the CPU geometry.
    ///
    /// Empty geometry leaves the mesh without buffers.
    pub fn reset(&mut self, ctx: &RenderContext) {
        self.release();
        self.context = Some(ctx.clone());

        if self.geometry.is_empty() {
            return;
        }

        // Loaded geometry is validated, so this only fails on a broken invariant
        let index_count = match self.geometry.checked_index_count() {
            Ok(count) => count,
            Err(e) => {
                tracing::warn!("Skipping mesh upload: {}", e);
                return;
            }
        };

        let label = &ctx.config().label;
        let vertex_buffer = ctx.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label} Vertex Buffer")),
            contents: bytemuck::cast_slice(&self.geometry.vertices),
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        });

        let index_buffer = ctx.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label} Index Buffer")),
            contents: bytemuck::cast_slice(&self.geometry.indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        tracing::debug!(
            "Uploaded mesh: {} vertices, {} triangles",
            self.geometry.vertex_count(),
            self.geometry.triangle_count()
        );

        self.buffers = Some(MeshBuffers {
            vertex_buffer,
            index_buffer,
            index_count,
        });
    }

    /// Binds the buffers and issues one indexed draw. Does nothing if the
    /// mesh has no buffers.
    pub fn render<'a>(&'a self, render_pass: &mut wgpu::RenderPass<'a>) {
        let Some(buffers) = &self.buffers else {
            return;
        };

        render_pass.set_vertex_buffer(0, buffers.vertex_buffer.slice(..));
        render_pass.set_index_buffer(buffers.index_buffer.slice(..), INDEX_FORMAT);
        render_pass.draw_indexed(0..buffers.index_count, 0, 0..1);
    }

    /// Updates the first attribute, which is typically color.
    ///
    /// `values` must hold one entry per vertex.
    pub fn update_attribute_a(&mut self, values: &[Vec4]) -> Result<(), RenderError> {
        self.geometry.update_attribute_a(values)?;

        let Some(ctx) = self.context.clone() else {
            return Ok(());
        };

        if let (true, Some(buffers)) = (ctx.config().update_in_place, &self.buffers) {
            ctx.write_buffer(
                &buffers.vertex_buffer,
                0,
                bytemuck::cast_slice(&self.geometry.vertices),
            );
            return Ok(());
        }

        self.reset(&ctx);
        Ok(())
    }

    /// Returns the CPU copy of the vertices.
    pub fn vertices(&self) -> &[TriMeshVertex] {
        &self.geometry.vertices
    }

    /// Returns the CPU copy of the flattened triangle indices.
    pub fn indices(&self) -> &[u32] {
        &self.geometry.indices
    }

    /// Returns the CPU geometry.
    pub fn geometry(&self) -> &TriMeshGeometry {
        &self.geometry
    }

    /// Converts the geometry back to generic mesh data.
    pub fn to_mesh_data(&self) -> MeshData {
        self.geometry.to_mesh_data()
    }

    /// Returns the context the mesh was last uploaded through.
    pub fn context(&self) -> Option<&RenderContext> {
        self.context.as_ref()
    }

    /// Returns true if the GPU buffers exist.
    pub fn is_uploaded(&self) -> bool {
        self.buffers.is_some()
    }

    /// Number of indices drawn by [`GpuTriMesh::render`].
    pub fn index_count(&self) -> u32 {
        self.buffers.as_ref().map_or(0, |b| b.index_count)
    }

    pub fn vertex_buffer(&self) -> Option<&wgpu::Buffer> {
        self.buffers.as_ref().map(|b| &b.vertex_buffer)
    }

    pub fn index_buffer(&self) -> Option<&wgpu::Buffer> {
        self.buffers.as_ref().map(|b| &b.index_buffer)
    }
}

impl Clone for GpuTriMesh {
    fn clone(&self) -> Self {
        let mut mesh = Self {
            context: self.context.clone(),
            geometry: self.geometry.clone(),
            buffers: None,
        };
        if let Some(ctx) = &self.context {
            mesh.reset(ctx);
        }
        mesh
    }
}

impl std::fmt::Debug for GpuTriMesh {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GpuTriMesh")
            .field("vertices", &self.geometry.vertex_count())
            .field("triangles", &self.geometry.triangle_count())
            .field("uploaded", &self.is_uploaded())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RendererConfig;
    use glam::Vec3;
    use trimesh_core::MeshError;

    fn test_context(config: RendererConfig) -> Option<RenderContext> {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();

        match pollster::block_on(RenderContext::headless(&config)) {
            Ok(ctx) => Some(ctx),
            Err(e) => {
                eprintln!("Skipping GPU test: {e}");
                None
            }
        }
    }

    fn colored_mesh_data() -> MeshData {
        MeshData::from_triangles(
            vec![Vec3::ZERO, Vec3::X, Vec3::Y, Vec3::new(1.0, 1.0, 0.0)],
            &[[0, 1, 2], [1, 3, 2]],
        )
        .with_colors(vec![Vec4::new(1.0, 0.0, 0.0, 1.0); 4])
    }

    #[test]
    fn test_vertex_layout() {
        let layout = vertex_layout();
        assert_eq!(layout.array_stride, 56);
        assert_eq!(layout.attributes.len(), LAYOUT_ELEMENT_COUNT);
        let locations: Vec<u32> = layout.attributes.iter().map(|a| a.shader_location).collect();
        assert_eq!(locations, vec![0, 1, 2, 3]);
        assert_eq!(layout.attributes[2].format, wgpu::VertexFormat::Float32x4);
        assert_eq!(layout.attributes[3].offset, 40);
    }

    #[test]
    fn test_new_mesh_is_empty() {
        let mut mesh = GpuTriMesh::new();
        assert!(!mesh.is_uploaded());
        assert!(mesh.context().is_none());
        assert_eq!(mesh.index_count(), 0);

        // Nothing to release yet
        mesh.release();
        assert!(!mesh.is_uploaded());
    }

    #[test]
    fn test_update_attribute_a_without_device() {
        let mut mesh = GpuTriMesh::new();
        assert!(mesh.update_attribute_a(&[]).is_ok());
        assert!(matches!(
            mesh.update_attribute_a(&[Vec4::ONE]),
            Err(RenderError::Geometry(MeshError::AttributeCountMismatch { .. }))
        ));
    }

    #[test]
    fn test_upload_mesh_data() {
        let Some(ctx) = test_context(RendererConfig::default()) else {
            return;
        };

        let mesh = GpuTriMesh::from_mesh_data(&ctx, &colored_mesh_data()).unwrap();
        assert!(mesh.is_uploaded());
        assert_eq!(mesh.index_count(), 6);
        assert_eq!(mesh.indices(), &[0, 1, 2, 1, 3, 2]);
        assert_eq!(mesh.vertex_buffer().unwrap().size(), 4 * 56);
        assert_eq!(mesh.index_buffer().unwrap().size(), 6 * 4);
        assert!(
            mesh.vertex_buffer()
                .unwrap()
                .usage()
                .contains(wgpu::BufferUsages::COPY_DST)
        );
    }

    #[test]
    fn test_load_rejects_dangling_indices() {
        let Some(ctx) = test_context(RendererConfig::default()) else {
            return;
        };

        let mut mesh = GpuTriMesh::from_mesh_data(&ctx, &colored_mesh_data()).unwrap();
        let broken = TriMeshGeometry::new(vec![TriMeshVertex::default(); 2], vec![0, 1, 2]);

        let err = mesh.load_geometry(&ctx, broken).unwrap_err();
        assert!(matches!(
            err,
            RenderError::Geometry(MeshError::IndexOutOfRange { index: 2, .. })
        ));
        // Previous upload is kept
        assert!(mesh.is_uploaded());
        assert_eq!(mesh.vertices().len(), 4);
    }

    #[test]
    fn test_load_rejects_incomplete_triangles() {
        let Some(ctx) = test_context(RendererConfig::default()) else {
            return;
        };

        let broken = TriMeshGeometry::new(vec![TriMeshVertex::default(); 2], vec![0, 1, 5, 7]);
        let err = GpuTriMesh::from_geometry(&ctx, broken).unwrap_err();
        assert!(matches!(
            err,
            RenderError::Geometry(MeshError::IncompleteTriangle { count: 4 })
        ));
    }

    #[test]
    fn test_config_cannot_disable_index_checks() {
        // Settings files written before validation became mandatory still parse
        let config = RendererConfig::from_ron_str("(validate_on_load: false)").unwrap();
        let Some(ctx) = test_context(config) else {
            return;
        };

        let broken = TriMeshGeometry::new(vec![TriMeshVertex::default(); 2], vec![0, 1, 5]);
        let mut mesh = GpuTriMesh::new();
        assert!(mesh.load_geometry(&ctx, broken).is_err());
        assert!(!mesh.is_uploaded());
        assert!(mesh.context().is_none());
    }

    #[test]
    fn test_release_and_reset() {
        let Some(ctx) = test_context(RendererConfig::default()) else {
            return;
        };

        let mut mesh = GpuTriMesh::from_tri_mesh(&ctx, &TriMesh::quad(Vec4::ONE)).unwrap();
        mesh.release();
        assert!(!mesh.is_uploaded());
        assert_eq!(mesh.vertices().len(), 4);
        mesh.release();

        mesh.reset(&ctx);
        assert!(mesh.is_uploaded());
        assert_eq!(mesh.index_count(), 6);
    }

    #[test]
    fn test_empty_geometry_has_no_buffers() {
        let Some(ctx) = test_context(RendererConfig::default()) else {
            return;
        };

        let mesh = GpuTriMesh::from_mesh_data(&ctx, &MeshData::new()).unwrap();
        assert!(!mesh.is_uploaded());
        assert!(mesh.context().is_some());
    }

    #[test]
    fn test_update_attribute_a_recreates_when_not_in_place() {
        let config = RendererConfig {
            update_in_place: false,
            ..Default::default()
        };
        let Some(ctx) = test_context(config) else {
            return;
        };

        let mut mesh = GpuTriMesh::from_mesh_data(&ctx, &colored_mesh_data()).unwrap();
        mesh.update_attribute_a(&[Vec4::ONE; 4]).unwrap();
        assert!(mesh.is_uploaded());
        assert!(mesh.vertices().iter().all(|v| v.attribute_a == [1.0; 4]));
    }

    #[test]
    fn test_clone_uploads_new_buffers() {
        let Some(ctx) = test_context(RendererConfig::default()) else {
            return;
        };

        let mesh = GpuTriMesh::from_mesh_data(&ctx, &colored_mesh_data()).unwrap();
        let copy = mesh.clone();
        assert!(copy.is_uploaded());
        assert_eq!(copy.geometry(), mesh.geometry());
        assert!(copy.context().unwrap().same_device(&ctx));

        let mut loaded = GpuTriMesh::new();
        loaded.load_from(&ctx, &mesh).unwrap();
        assert_eq!(loaded.to_mesh_data(), mesh.to_mesh_data());
    }
}
