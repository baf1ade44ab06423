//! GPU pipeline drawing the panorama sphere inside an egui paint callback

use super::sphere::{SphereMesh, SphereVertex};
use crate::renderer::GpuCaps;
use app_core::LoadedImage;
use bytemuck::{Pod, Zeroable};
use std::sync::Arc;
use wgpu::util::DeviceExt;

const SHADER: &str = r#"
struct Uniforms {
    view_proj: mat4x4<f32>,
};

@group(0) @binding(0) var<uniform> uniforms: Uniforms;
@group(0) @binding(1) var panorama: texture_2d<f32>;
@group(0) @binding(2) var panorama_sampler: sampler;

struct VsOut {
    @builtin(position) clip: vec4<f32>,
    @location(0) uv: vec2<f32>,
};

@vertex
fn vs_main(@location(0) position: vec3<f32>, @location(1) uv: vec2<f32>) -> VsOut {
    var out: VsOut;
    out.clip = uniforms.view_proj * vec4<f32>(position, 1.0);
    out.uv = uv;
    return out;
}

@fragment
fn fs_main(in: VsOut) -> @location(0) vec4<f32> {
    return textureSample(panorama, panorama_sampler, in.uv);
}
"#;

#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
struct PanoramaUniform {
    view_proj: [[f32; 4]; 4],
}

/// Texture currently bound for drawing
struct UploadedPanorama {
    key: (u64, u64),
    _texture: wgpu::Texture,
    bind_group: wgpu::BindGroup,
}

/// Long-lived GPU state, stored in egui-wgpu's callback resources
pub struct PanoramaResources {
    pipeline: wgpu::RenderPipeline,
    bind_group_layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    uniform_buffer: wgpu::Buffer,
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
    uploaded: Option<UploadedPanorama>,
}

impl PanoramaResources {
    pub fn new(device: &wgpu::Device, target_format: wgpu::TextureFormat, caps: GpuCaps, mesh: &SphereMesh) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("panorama_shader"),
            source: wgpu::ShaderSource::Wgsl(SHADER.into()),
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("panorama_bgl"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: std::num::NonZeroU64::new(std::mem::size_of::<PanoramaUniform>() as u64),
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("panorama_pl"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("panorama_pipeline"),
            layout: Some(&layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: "vs_main",
                buffers: &[SphereVertex::layout()],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: "fs_main",
                targets: &[Some(wgpu::ColorTargetState {
                    format: target_format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                front_face: wgpu::FrontFace::Ccw,
                // Seen from inside: draw the back faces only
                cull_mode: Some(wgpu::Face::Front),
                ..Default::default()
            },
            // egui's pass has no depth attachment; a culled convex mesh needs none
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        // Anisotropic filtering requires linear filtering on every axis
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("panorama_sampler"),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Linear,
            anisotropy_clamp: caps.max_anisotropy,
            ..Default::default()
        });
        tracing::info!(anisotropy = caps.max_anisotropy, "panorama sampler created");

        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("panorama_ubo"),
            size: std::mem::size_of::<PanoramaUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("panorama_vertices"),
            contents: bytemuck::cast_slice(&mesh.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("panorama_indices"),
            contents: bytemuck::cast_slice(&mesh.indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        Self {
            pipeline,
            bind_group_layout,
            sampler,
            uniform_buffer,
            vertex_buffer,
            index_buffer,
            index_count: mesh.index_count(),
            uploaded: None,
        }
    }

    /// Drop the uploaded texture, e.g. after the viewer unmounts
    pub fn release_texture(&mut self) {
        if self.uploaded.take().is_some() {
            tracing::debug!("panorama texture released");
        }
    }

    /// Copy the decoded levels to a new texture. The mip chain comes from the loader.
    fn upload(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, key: (u64, u64), image: &LoadedImage) {
        if image.data.len() != 4 * image.width as usize * image.height as usize {
            tracing::warn!("pixel buffer does not match {}x{}", image.width, image.height);
            return;
        }

        let size = wgpu::Extent3d {
            width: image.width,
            height: image.height,
            depth_or_array_layers: 1,
        };

        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("panorama_texture"),
            size,
            mip_level_count: image.level_count(),
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        let base = std::iter::once((image.width, image.height, image.data.as_slice()));
        let mips = image.mips.iter().map(|m| (m.width(), m.height(), m.as_raw().as_slice()));
        for (level, (width, height, pixels)) in base.chain(mips).enumerate() {
            queue.write_texture(
                wgpu::ImageCopyTexture {
                    texture: &texture,
                    mip_level: level as u32,
                    origin: wgpu::Origin3d::ZERO,
                    aspect: wgpu::TextureAspect::All,
                },
                pixels,
                wgpu::ImageDataLayout {
                    offset: 0,
                    bytes_per_row: Some(4 * width),
                    rows_per_image: Some(height),
                },
                wgpu::Extent3d {
                    width,
                    height,
                    depth_or_array_layers: 1,
                },
            );
        }

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("panorama_bind"),
            layout: &self.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: self.uniform_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
            ],
        });

        tracing::info!(
            "Uploaded panorama {} ({}x{}, {} mip levels)",
            image.path.display(),
            image.width,
            image.height,
            image.level_count()
        );

        self.uploaded = Some(UploadedPanorama {
            key,
            _texture: texture,
            bind_group,
        });
    }
}

/// One frame's draw request for a mounted spherical viewer
pub struct PanoramaCallback {
    /// Identifies the mounted viewer; a new mount re-uploads even the same file
    pub view_key: u64,
    pub image: Arc<LoadedImage>,
    pub view_proj: [[f32; 4]; 4],
}

impl egui_wgpu::CallbackTrait for PanoramaCallback {
    fn prepare(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        _screen_descriptor: &egui_wgpu::ScreenDescriptor,
        _egui_encoder: &mut wgpu::CommandEncoder,
        resources: &mut egui_wgpu::CallbackResources,
    ) -> Vec<wgpu::CommandBuffer> {
        let Some(panorama) = resources.get_mut::<PanoramaResources>() else {
            tracing::warn!("panorama resources not registered");
            return Vec::new();
        };

        let key = (self.view_key, self.image.hash);
        if panorama.uploaded.as_ref().map(|u| u.key) != Some(key) {
            panorama.upload(device, queue, key, &self.image);
        }

        let uniform = PanoramaUniform {
            view_proj: self.view_proj,
        };
        queue.write_buffer(&panorama.uniform_buffer, 0, bytemuck::bytes_of(&uniform));
        Vec::new()
    }

    fn paint(
        &self,
        _info: egui::PaintCallbackInfo,
        render_pass: &mut wgpu::RenderPass<'static>,
        resources: &egui_wgpu::CallbackResources,
    ) {
        let Some(panorama) = resources.get::<PanoramaResources>() else {
            return;
        };
        let Some(uploaded) = &panorama.uploaded else {
            return;
        };

        render_pass.set_pipeline(&panorama.pipeline);
        render_pass.set_bind_group(0, &uploaded.bind_group, &[]);
        render_pass.set_vertex_buffer(0, panorama.vertex_buffer.slice(..));
        render_pass.set_index_buffer(panorama.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        render_pass.draw_indexed(0..panorama.index_count, 0, 0..1);
    }
}
