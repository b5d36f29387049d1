//! Render pipeline for triangle mesh assets.

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};

use crate::context::RenderContext;
use crate::gpu_mesh::{GpuTriMesh, vertex_layout};

/// Uniform data shared by every mesh drawn with [`TriMeshPipeline`].
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct TriMeshUniform {
    pub view_proj: [[f32; 4]; 4],
    pub model: [[f32; 4]; 4],
    /// Direction the light travels in (w unused)
    pub light_dir: [f32; 4],
}

impl TriMeshUniform {
    pub fn new(view_proj: Mat4, model: Mat4, light_dir: Vec3) -> Self {
        Self {
            view_proj: view_proj.to_cols_array_2d(),
            model: model.to_cols_array_2d(),
            light_dir: light_dir.normalize_or_zero().extend(0.0).to_array(),
        }
    }
}

impl Default for TriMeshUniform {
    fn default() -> Self {
        Self::new(Mat4::IDENTITY, Mat4::IDENTITY, Vec3::NEG_Z)
    }
}

/// Builder for render pipelines.
pub struct PipelineConfig<'a> {
    label: &'a str,
    shader_source: &'a str,
    color_format: wgpu::TextureFormat,
    depth_format: Option<wgpu::TextureFormat>,
    bind_group_layouts: &'a [&'a wgpu::BindGroupLayout],
    vertex_layouts: Vec<wgpu::VertexBufferLayout<'static>>,
    topology: wgpu::PrimitiveTopology,
    cull_mode: Option<wgpu::Face>,
    blend: wgpu::BlendState,
}

impl<'a> PipelineConfig<'a> {
    pub fn new(
        label: &'a str,
        shader_source: &'a str,
        color_format: wgpu::TextureFormat,
        depth_format: Option<wgpu::TextureFormat>,
        bind_group_layouts: &'a [&'a wgpu::BindGroupLayout],
    ) -> Self {
        Self {
            label,
            shader_source,
            color_format,
            depth_format,
            bind_group_layouts,
            vertex_layouts: Vec::new(),
            topology: wgpu::PrimitiveTopology::TriangleList,
            cull_mode: None,
            blend: wgpu::BlendState::REPLACE,
        }
    }

    pub fn with_vertex_layouts(mut self, layouts: Vec<wgpu::VertexBufferLayout<'static>>) -> Self {
        self.vertex_layouts = layouts;
        self
    }

    pub fn with_topology(mut self, topology: wgpu::PrimitiveTopology) -> Self {
        self.topology = topology;
        self
    }

    pub fn with_cull_mode(mut self, cull_mode: Option<wgpu::Face>) -> Self {
        self.cull_mode = cull_mode;
        self
    }

    pub fn with_blend(mut self, blend: wgpu::BlendState) -> Self {
        self.blend = blend;
        self
    }

    pub fn build(self, ctx: &RenderContext) -> wgpu::RenderPipeline {
        let shader = ctx.create_shader(self.shader_source, &format!("{} Shader", self.label));

        let layout = ctx
            .device()
            .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some(&format!("{} Pipeline Layout", self.label)),
                bind_group_layouts: self.bind_group_layouts,
                push_constant_ranges: &[],
            });

        ctx.device()
            .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(&format!("{} Pipeline", self.label)),
                layout: Some(&layout),
                vertex: wgpu::VertexState {
                    module: &shader,
                    entry_point: Some("vs_main"),
                    compilation_options: Default::default(),
                    buffers: &self.vertex_layouts,
                },
                fragment: Some(wgpu::FragmentState {
                    module: &shader,
                    entry_point: Some("fs_main"),
                    compilation_options: Default::default(),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: self.color_format,
                        blend: Some(self.blend),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                }),
                primitive: wgpu::PrimitiveState {
                    topology: self.topology,
                    front_face: wgpu::FrontFace::Ccw,
                    cull_mode: self.cull_mode,
                    ..Default::default()
                },
                depth_stencil: self.depth_format.map(|format| wgpu::DepthStencilState {
                    format,
                    depth_write_enabled: true,
                    depth_compare: wgpu::CompareFunction::Less,
                    stencil: wgpu::StencilState::default(),
                    bias: wgpu::DepthBiasState::default(),
                }),
                multisample: wgpu::MultisampleState::default(),
                multiview: None,
                cache: None,
            })
    }
}

/// Pipeline drawing [`GpuTriMesh`] assets with a shared uniform.
pub struct TriMeshPipeline {
    pipeline: wgpu::RenderPipeline,
    uniform_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

impl TriMeshPipeline {
    pub fn new(ctx: &RenderContext) -> Self {
        let bind_group_layout =
            ctx.device()
                .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                    label: Some("TriMesh Bind Group Layout"),
                    entries: &[wgpu::BindGroupLayoutEntry {
                        binding: 0,
                        visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                        ty: wgpu::BindingType::Buffer {
                            ty: wgpu::BufferBindingType::Uniform,
                            has_dynamic_offset: false,
                            min_binding_size: None,
                        },
                        count: None,
                    }],
                });

        let pipeline = PipelineConfig::new(
            "TriMesh",
            include_str!("shaders/trimesh.wgsl"),
            ctx.surface_format(),
            ctx.depth_format(),
            &[&bind_group_layout],
        )
        .with_vertex_layouts(vec![vertex_layout()])
        .build(ctx);

        let uniform_buffer = ctx.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("TriMesh Uniform Buffer"),
            contents: bytemuck::bytes_of(&TriMeshUniform::default()),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let bind_group = ctx.device().create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("TriMesh Bind Group"),
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        Self {
            pipeline,
            uniform_buffer,
            bind_group,
        }
    }

    /// Updates the uniform buffer.
    pub fn update_uniform(&self, ctx: &RenderContext, uniform: &TriMeshUniform) {
        ctx.write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(uniform));
    }

    /// Draws every mesh that has been uploaded.
    pub fn draw<'a>(
        &'a self,
        render_pass: &mut wgpu::RenderPass<'a>,
        meshes: impl IntoIterator<Item = &'a GpuTriMesh>,
    ) {
        render_pass.set_pipeline(&self.pipeline);
        render_pass.set_bind_group(0, &self.bind_group, &[]);
        for mesh in meshes {
            mesh.render(render_pass);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RendererConfig;
    use glam::Vec4;
    use trimesh_core::TriMesh;

    const SIZE: u32 = 4;
    // Rows are padded to COPY_BYTES_PER_ROW_ALIGNMENT
    const BYTES_PER_ROW: u32 = 256;

    #[test]
    fn test_uniform_size() {
        assert_eq!(std::mem::size_of::<TriMeshUniform>(), 144);
        let uniform = TriMeshUniform::new(Mat4::IDENTITY, Mat4::IDENTITY, Vec3::new(0.0, 0.0, -2.0));
        assert_eq!(uniform.light_dir, [0.0, 0.0, -1.0, 0.0]);
    }

    fn render_to_pixels(ctx: &RenderContext, mesh: &GpuTriMesh) -> Vec<u8> {
        let device = ctx.device();
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Test Target"),
            size: wgpu::Extent3d {
                width: SIZE,
                height: SIZE,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: ctx.surface_format(),
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let readback = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Test Readback"),
            size: (BYTES_PER_ROW * SIZE) as u64,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });

        let pipeline = TriMeshPipeline::new(ctx);
        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Test Encoder"),
        });
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Test Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            pipeline.draw(&mut pass, [mesh]);
        }
        encoder.copy_texture_to_buffer(
            wgpu::ImageCopyTexture {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::ImageCopyBuffer {
                buffer: &readback,
                layout: wgpu::ImageDataLayout {
                    offset: 0,
                    bytes_per_row: Some(BYTES_PER_ROW),
                    rows_per_image: Some(SIZE),
                },
            },
            wgpu::Extent3d {
                width: SIZE,
                height: SIZE,
                depth_or_array_layers: 1,
            },
        );
        ctx.queue().submit(Some(encoder.finish()));

        let slice = readback.slice(..);
        slice.map_async(wgpu::MapMode::Read, |_| {});
        let _ = device.poll(wgpu::Maintain::Wait);
        let pixels = slice.get_mapped_range().to_vec();
        readback.unmap();
        pixels
    }

    fn pixel(pixels: &[u8], x: u32, y: u32) -> [u8; 4] {
        let start = (y * BYTES_PER_ROW + x * 4) as usize;
        [
            pixels[start],
            pixels[start + 1],
            pixels[start + 2],
            pixels[start + 3],
        ]
    }

    fn headless_context() -> Option<RenderContext> {
        match pollster::block_on(RenderContext::headless(&RendererConfig::default())) {
            Ok(ctx) => Some(ctx),
            Err(e) => {
                eprintln!("Skipping GPU test: {e}");
                None
            }
        }
    }

    #[test]
    fn test_draw_after_in_place_color_update() {
        let Some(ctx) = headless_context() else {
            return;
        };
        assert!(ctx.config().update_in_place);

        let mut mesh =
            GpuTriMesh::from_tri_mesh(&ctx, &TriMesh::quad(Vec4::new(1.0, 0.0, 0.0, 1.0))).unwrap();
        let first = render_to_pixels(&ctx, &mesh);
        assert_eq!(pixel(&first, 2, 2), [255, 0, 0, 255]);

        mesh.update_attribute_a(&[Vec4::new(0.0, 1.0, 0.0, 1.0); 4])
            .unwrap();
        let second = render_to_pixels(&ctx, &mesh);
        assert_eq!(pixel(&second, 2, 2), [0, 255, 0, 255]);
        assert_eq!(pixel(&second, 0, 0), [0, 0, 0, 255]);
    }

    #[test]
    fn test_draw_quad() {
        let Some(ctx) = headless_context() else {
            return;
        };

        let red = Vec4::new(1.0, 0.0, 0.0, 1.0);
        let mesh = GpuTriMesh::from_tri_mesh(&ctx, &TriMesh::quad(red)).unwrap();
        let pixels = render_to_pixels(&ctx, &mesh);

        // The quad covers the central pixels, the corners stay clear
        let center = pixel(&pixels, 2, 2);
        assert!(center[0] > 200, "center pixel {center:?}");
        assert_eq!(center[1], 0);
        assert_eq!(center[2], 0);
        assert_eq!(pixel(&pixels, 0, 0), [0, 0, 0, 255]);
    }
}
