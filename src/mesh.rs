//! Mesh data: the vertex format, 2D bounds, CPU meshes and their GPU buffers.
//!
//! # Vertex Layout
//!
//! [`Vertex`] is 32 bytes:
//!
//! | Attribute | Format    | Offset | Shader Location |
//! |-----------|-----------|--------|-----------------|
//! | position  | Float32x3 | 0      | 0               |
//! | normal    | Float32x3 | 12     | 1               |
//! | tex_coord | Float32x2 | 24     | 2               |

use glam::{Mat4, Vec4};

use crate::gpu::GpuContext;
use crate::model::Texture;

/// A vertex with position, normal and texture coordinates.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub tex_coord: [f32; 2],
}

impl Vertex {
    /// Vertex buffer layout matching the attribute table above.
    pub const LAYOUT: wgpu::VertexBufferLayout<'static> = wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<Vertex>() as u64,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &[
            // position
            wgpu::VertexAttribute {
                offset: 0,
                shader_location: 0,
                format: wgpu::VertexFormat::Float32x3,
            },
            // normal
            wgpu::VertexAttribute {
                offset: 12,
                shader_location: 1,
                format: wgpu::VertexFormat::Float32x3,
            },
            // tex_coord
            wgpu::VertexAttribute {
                offset: 24,
                shader_location: 2,
                format: wgpu::VertexFormat::Float32x2,
            },
        ],
    };

    pub fn new(position: [f32; 3], normal: [f32; 3], tex_coord: [f32; 2]) -> Self {
        Self {
            position,
            normal,
            tex_coord,
        }
    }
}

/// Axis-aligned bounds in the XY plane.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds2 {
    pub min_x: f32,
    pub max_x: f32,
    pub min_y: f32,
    pub max_y: f32,
}

impl Default for Bounds2 {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl Bounds2 {
    /// Contains nothing; the identity for [`Bounds2::union`].
    pub const EMPTY: Self = Self {
        min_x: f32::INFINITY,
        max_x: f32::NEG_INFINITY,
        min_y: f32::INFINITY,
        max_y: f32::NEG_INFINITY,
    };

    /// Bounds of a set of vertices.
    pub fn from_vertices(vertices: &[Vertex]) -> Self {
        vertices.iter().fold(Self::EMPTY, |bounds, v| {
            bounds.include(v.position[0], v.position[1])
        })
    }

    pub fn is_empty(&self) -> bool {
        self.min_x > self.max_x || self.min_y > self.max_y
    }

    /// Grow to contain the point `(x, y)`.
    pub fn include(self, x: f32, y: f32) -> Self {
        Self {
            min_x: self.min_x.min(x),
            max_x: self.max_x.max(x),
            min_y: self.min_y.min(y),
            max_y: self.max_y.max(y),
        }
    }

    pub fn union(self, other: Self) -> Self {
        Self {
            min_x: self.min_x.min(other.min_x),
            max_x: self.max_x.max(other.max_x),
            min_y: self.min_y.min(other.min_y),
            max_y: self.max_y.max(other.max_y),
        }
    }
}

/// A loaded mesh with its material colour and optional texture.
///
/// Vertices and bounds are fixed after construction.
#[derive(Clone, Debug)]
pub struct Mesh {
    pub name: String,
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
    pub color: Vec4,
    pub texture: Option<Texture>,
    pub bounds: Bounds2,
}

impl Mesh {
    pub fn new(
        name: impl Into<String>,
        vertices: Vec<Vertex>,
        indices: Vec<u32>,
        color: Vec4,
        texture: Option<Texture>,
    ) -> Self {
        let bounds = Bounds2::from_vertices(&vertices);
        Self {
            name: name.into(),
            vertices,
            indices,
            color,
            texture,
            bounds,
        }
    }

    /// True when the mesh has a texture that decoded successfully.
    pub fn has_texture(&self) -> bool {
        self.texture.as_ref().is_some_and(|t| !t.id.is_null())
    }
}

/// Per-draw shader uniforms.
///
/// Matches the WGSL `Uniforms` struct: `transform` is column-major and
/// uploaded as is.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MeshUniforms {
    pub transform: [[f32; 4]; 4],
    pub color: [f32; 4],
    pub has_texture: i32,
    pub _padding: [i32; 3],
}

impl MeshUniforms {
    pub fn new(transform: Mat4, color: Vec4, has_texture: bool) -> Self {
        Self {
            transform: transform.to_cols_array_2d(),
            color: color.to_array(),
            has_texture: has_texture as i32,
            _padding: [0; 3],
        }
    }
}

/// GPU buffers for one [`Mesh`].
///
/// Each mesh owns its uniform buffer so that every draw in a pass sees its own
/// colour and texture flag.
#[derive(Debug)]
pub struct GpuMesh {
    pub(crate) vertex_buffer: wgpu::Buffer,
    pub(crate) index_buffer: wgpu::Buffer,
    pub(crate) index_count: u32,
    pub(crate) uniform_buffer: wgpu::Buffer,
    pub(crate) uniform_bind_group: wgpu::BindGroup,
    /// Index into the pass's texture bind groups, if the mesh is textured.
    pub(crate) texture_slot: Option<usize>,
    pub(crate) color: Vec4,
}

impl GpuMesh {
    pub fn new(
        gpu: &GpuContext,
        mesh: &Mesh,
        uniform_layout: &wgpu::BindGroupLayout,
        texture_slot: Option<usize>,
    ) -> Self {
        use wgpu::util::DeviceExt;

        let vertex_buffer = gpu
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&format!("{} Vertex Buffer", mesh.name)),
                contents: bytemuck::cast_slice(&mesh.vertices),
                usage: wgpu::BufferUsages::VERTEX,
            });

        let index_buffer = gpu
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&format!("{} Index Buffer", mesh.name)),
                contents: bytemuck::cast_slice(&mesh.indices),
                usage: wgpu::BufferUsages::INDEX,
            });

        let uniforms = MeshUniforms::new(Mat4::IDENTITY, mesh.color, texture_slot.is_some());
        let uniform_buffer = gpu
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&format!("{} Uniform Buffer", mesh.name)),
                contents: bytemuck::bytes_of(&uniforms),
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            });

        let uniform_bind_group = gpu.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(&format!("{} Uniform Bind Group", mesh.name)),
            layout: uniform_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        Self {
            vertex_buffer,
            index_buffer,
            index_count: mesh.indices.len() as u32,
            uniform_buffer,
            uniform_bind_group,
            texture_slot,
            color: mesh.color,
        }
    }

    /// Write this frame's transform into the mesh's uniform buffer.
    pub fn write_uniforms(&self, queue: &wgpu::Queue, transform: Mat4) {
        let uniforms = MeshUniforms::new(transform, self.color, self.texture_slot.is_some());
        queue.write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(&uniforms));
    }
}
