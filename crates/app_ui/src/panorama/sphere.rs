//! UV sphere geometry for the inside-out panorama

use bytemuck::{Pod, Zeroable};

/// Sphere vertex: position and equirectangular texture coordinate
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct SphereVertex {
    pub position: [f32; 3],
    pub uv: [f32; 2],
}

impl SphereVertex {
    const ATTRIBUTES: [wgpu::VertexAttribute; 2] = wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x2];

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<SphereVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

/// Indexed triangle mesh of a sphere centred on the origin
#[derive(Debug, Clone)]
pub struct SphereMesh {
    pub radius: f32,
    pub vertices: Vec<SphereVertex>,
    pub indices: Vec<u32>,
}

impl SphereMesh {
    /// Build a sphere with `width_segments` around and `height_segments` pole to pole.
    ///
    /// Rows run from the north pole (v = 0) to the south pole (v = 1), so the
    /// top row of an equirectangular image maps to the zenith. The pole rows
    /// emit a single triangle per segment.
    pub fn new(radius: f32, width_segments: u32, height_segments: u32) -> Self {
        let width_segments = width_segments.max(3);
        let height_segments = height_segments.max(2);

        let mut vertices = Vec::with_capacity(((width_segments + 1) * (height_segments + 1)) as usize);
        let mut grid = Vec::with_capacity((height_segments + 1) as usize);

        for iy in 0..=height_segments {
            let v = iy as f32 / height_segments as f32;
            let mut row = Vec::with_capacity((width_segments + 1) as usize);

            for ix in 0..=width_segments {
                let u = ix as f32 / width_segments as f32;
                let (sin_theta, cos_theta) = (v * std::f32::consts::PI).sin_cos();
                let (sin_phi, cos_phi) = (u * std::f32::consts::TAU).sin_cos();

                row.push(vertices.len() as u32);
                vertices.push(SphereVertex {
                    position: [-radius * cos_phi * sin_theta, radius * cos_theta, radius * sin_phi * sin_theta],
                    uv: [u, v],
                });
            }
            grid.push(row);
        }

        let mut indices = Vec::with_capacity((6 * width_segments * (height_segments - 1)) as usize);
        for iy in 0..height_segments as usize {
            for ix in 0..width_segments as usize {
                let a = grid[iy][ix + 1];
                let b = grid[iy][ix];
                let c = grid[iy + 1][ix];
                let d = grid[iy + 1][ix + 1];

                if iy != 0 {
                    indices.extend_from_slice(&[a, b, d]);
                }
                if iy != height_segments as usize - 1 {
                    indices.extend_from_slice(&[b, c, d]);
                }
            }
        }

        Self {
            radius,
            vertices,
            indices,
        }
    }

    pub fn index_count(&self) -> u32 {
        self.indices.len() as u32
    }
}
