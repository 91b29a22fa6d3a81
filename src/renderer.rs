//! The model render pass.
//!
//! [`ModelPass`] draws every mesh of a model with the same MVP matrix and a
//! depth test. The pass uses two bind groups:
//!
//! - **Group 0**: per-mesh uniforms (`transform`, `color`, `has_texture`)
//! - **Group 1**: the mesh's diffuse texture and sampler, or a 1x1 white
//!   texture for meshes drawn with their material colour

use glam::Mat4;

use crate::gpu::GpuContext;
use crate::mesh::{GpuMesh, Vertex};
use crate::model::Model;
use crate::texture::GpuTexture;

pub struct ModelPass {
    pipeline: wgpu::RenderPipeline,
    uniform_bind_group_layout: wgpu::BindGroupLayout,
    texture_bind_group_layout: wgpu::BindGroupLayout,
    default_texture_bind_group: wgpu::BindGroup,
    /// One bind group per uploaded texture, indexed by texture id minus one.
    texture_bind_groups: Vec<wgpu::BindGroup>,
    textures: Vec<GpuTexture>,
    depth_view: wgpu::TextureView,
    depth_size: (u32, u32),
}

impl ModelPass {
    pub fn new(gpu: &GpuContext) -> Self {
        let device = &gpu.device;

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Model Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/model.wgsl").into()),
        });

        let uniform_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Mesh Uniform Bind Group Layout"),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                }],
            });

        let texture_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Texture Bind Group Layout"),
                entries: &[
                    wgpu::BindGroupLayoutEntry {
                        binding: 0,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Texture {
                            sample_type: wgpu::TextureSampleType::Float { filterable: true },
                            view_dimension: wgpu::TextureViewDimension::D2,
                            multisampled: false,
                        },
                        count: None,
                    },
                    wgpu::BindGroupLayoutEntry {
                        binding: 1,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                        count: None,
                    },
                ],
            });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Model Pipeline Layout"),
            bind_group_layouts: &[&uniform_bind_group_layout, &texture_bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Model Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs"),
                buffers: &[Vertex::LAYOUT],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: gpu.config.format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            // Model files mix winding orders, so nothing is culled.
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: None,
                front_face: wgpu::FrontFace::Ccw,
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: wgpu::TextureFormat::Depth32Float,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        let white = GpuTexture::white(gpu);
        let default_texture_bind_group =
            create_texture_bind_group(gpu, &texture_bind_group_layout, &white);

        Self {
            pipeline,
            uniform_bind_group_layout,
            texture_bind_group_layout,
            default_texture_bind_group,
            texture_bind_groups: Vec::new(),
            textures: vec![white],
            depth_view: create_depth_view(gpu),
            depth_size: (gpu.width(), gpu.height()),
        }
    }

    /// Upload a model's meshes and take ownership of its textures.
    ///
    /// `textures` are the ones uploaded while loading the model, in id order.
    /// Meshes whose texture failed to load are drawn with their colour.
    pub fn prepare(
        &mut self,
        gpu: &GpuContext,
        model: &Model,
        textures: Vec<GpuTexture>,
    ) -> Vec<GpuMesh> {
        self.texture_bind_groups = textures
            .iter()
            .map(|texture| create_texture_bind_group(gpu, &self.texture_bind_group_layout, texture))
            .collect();
        self.textures.extend(textures);

        model
            .meshes
            .iter()
            .map(|mesh| {
                let slot = mesh
                    .texture
                    .as_ref()
                    .filter(|t| !t.id.is_null())
                    .map(|t| t.id.0 as usize - 1)
                    .filter(|&slot| slot < self.texture_bind_groups.len());
                GpuMesh::new(gpu, mesh, &self.uniform_bind_group_layout, slot)
            })
            .collect()
    }

    /// Recreate the depth buffer if the surface size changed.
    pub fn ensure_depth_size(&mut self, gpu: &GpuContext) {
        if self.depth_size != (gpu.width(), gpu.height()) {
            self.depth_view = create_depth_view(gpu);
            self.depth_size = (gpu.width(), gpu.height());
        }
    }

    /// Clear `target` and draw every mesh with the same transform.
    pub fn render(
        &self,
        gpu: &GpuContext,
        encoder: &mut wgpu::CommandEncoder,
        target: &wgpu::TextureView,
        meshes: &[GpuMesh],
        mvp: Mat4,
        clear_color: wgpu::Color,
    ) {
        for mesh in meshes {
            mesh.write_uniforms(&gpu.queue, mvp);
        }

        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Model Render Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(clear_color),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &self.depth_view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        render_pass.set_pipeline(&self.pipeline);
        for mesh in meshes {
            let texture_bind_group = mesh
                .texture_slot
                .and_then(|slot| self.texture_bind_groups.get(slot))
                .unwrap_or(&self.default_texture_bind_group);

            render_pass.set_bind_group(0, &mesh.uniform_bind_group, &[]);
            render_pass.set_bind_group(1, texture_bind_group, &[]);
            render_pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
            render_pass.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
            render_pass.draw_indexed(0..mesh.index_count, 0, 0..1);
        }
    }

    /// Number of textures owned by the pass, including the white default.
    pub fn texture_count(&self) -> usize {
        self.textures.len()
    }
}

fn create_texture_bind_group(
    gpu: &GpuContext,
    layout: &wgpu::BindGroupLayout,
    texture: &GpuTexture,
) -> wgpu::BindGroup {
    gpu.device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("Mesh Texture Bind Group"),
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(&texture.view),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::Sampler(&texture.sampler),
            },
        ],
    })
}

fn create_depth_view(gpu: &GpuContext) -> wgpu::TextureView {
    let texture = gpu.device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Depth Texture"),
        size: wgpu::Extent3d {
            width: gpu.width(),
            height: gpu.height(),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Depth32Float,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    texture.create_view(&wgpu::TextureViewDescriptor::default())
}
