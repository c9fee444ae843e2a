//! Mesh geometry and unlit materials.
//!
//! Geometry is kept on the CPU (for ray casting against object bounds) next
//! to the GPU buffers it was uploaded to. Materials are colour-map plus
//! colour-factor pairs; swapping the map invalidates the cached bind group so
//! the next frame rebuilds it against the new texture.

use wgpu::util::DeviceExt;

use crate::{data_structures::instance::Instance, picking::Aabb};

pub trait Vertex {
    fn desc() -> wgpu::VertexBufferLayout<'static>;
}

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ModelVertex {
    pub position: [f32; 3],
    pub tex_coords: [f32; 2],
}

impl Vertex for ModelVertex {
    fn desc() -> wgpu::VertexBufferLayout<'static> {
        use std::mem;
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<ModelVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x2,
                },
            ],
        }
    }
}

/// Triangle mesh data as loaded from the model file.
///
/// Positions are in the object's local space. The bounding box is computed
/// over the positions once at load time and reused for every pick query.
#[derive(Clone, Debug)]
pub struct Geometry {
    pub positions: Vec<[f32; 3]>,
    pub tex_coords: Vec<[f32; 2]>,
    pub indices: Vec<u32>,
    pub aabb: Aabb,
}

impl Geometry {
    pub fn new(positions: Vec<[f32; 3]>, tex_coords: Vec<[f32; 2]>, indices: Vec<u32>) -> Self {
        let aabb = Aabb::from_points(&positions);
        Self {
            positions,
            tex_coords,
            indices,
            aabb,
        }
    }

    /// Interleave positions and texture coordinates for the vertex buffer.
    ///
    /// Meshes without texture coordinates get (0, 0) for every vertex, which
    /// samples the single texel of a solid-colour map.
    pub fn vertices(&self) -> Vec<ModelVertex> {
        self.positions
            .iter()
            .enumerate()
            .map(|(i, position)| ModelVertex {
                position: *position,
                tex_coords: self.tex_coords.get(i).copied().unwrap_or([0.0, 0.0]),
            })
            .collect()
    }
}

/// GPU-side buffers for one object's mesh.
pub struct MeshBuffers {
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub instance_buffer: wgpu::Buffer,
    pub num_indices: u32,
}

impl MeshBuffers {
    pub fn upload(device: &wgpu::Device, geometry: &Geometry, instance: &Instance) -> Self {
        let vertices = geometry.vertices();
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Vertex Buffer"),
            contents: bytemuck::cast_slice(&vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Index Buffer"),
            contents: bytemuck::cast_slice(&geometry.indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        let instance_data = [instance.to_raw()];
        let instance_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Instance Buffer"),
            contents: bytemuck::cast_slice(&instance_data),
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        });
        Self {
            vertex_buffer,
            index_buffer,
            instance_buffer,
            num_indices: geometry.indices.len() as u32,
        }
    }
}

/// Unlit material: an optional colour map plus a colour factor.
///
/// `map` names a texture in the cache rather than owning it, so several
/// objects can share one loaded texture and a map swap is just a rename.
pub struct Material {
    pub colour: [f32; 4],
    pub map: Option<String>,
    /// Rebuilt lazily whenever `map` changes.
    pub bind_group: Option<wgpu::BindGroup>,
}

impl Material {
    pub fn with_map(name: impl Into<String>) -> Self {
        Self {
            colour: [1.0, 1.0, 1.0, 1.0],
            map: Some(name.into()),
            bind_group: None,
        }
    }

    pub fn with_colour(colour: [f32; 4]) -> Self {
        Self {
            colour,
            map: None,
            bind_group: None,
        }
    }

    /// Point the material at a different cached texture.
    ///
    /// The stale bind group is dropped so the renderer rebuilds it against
    /// the new map on the next frame.
    pub fn swap_map(&mut self, name: impl Into<String>) {
        self.map = Some(name.into());
        self.bind_group = None;
    }
}
