//! GPU rendering with wgpu

use std::sync::Arc;
use wgpu::*;
use winit::window::Window;

/// Highest anisotropy level wgpu accepts
const MAX_ANISOTROPY: u16 = 16;

/// Adapter capabilities the viewers depend on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GpuCaps {
    /// Largest 2D texture side the device accepts
    pub max_texture_side: u32,
    /// Anisotropy clamp for texture samplers; 1 disables it
    pub max_anisotropy: u16,
}

impl GpuCaps {
    pub fn from_adapter(adapter: &Adapter, limits: &Limits) -> Self {
        let anisotropic = adapter
            .get_downlevel_capabilities()
            .flags
            .contains(DownlevelFlags::ANISOTROPIC_FILTERING);

        Self {
            max_texture_side: limits.max_texture_dimension_2d,
            max_anisotropy: if anisotropic { MAX_ANISOTROPY } else { 1 },
        }
    }

    /// Texture side to request from the loader given a configured cap
    pub fn texture_side(&self, configured: u32) -> u32 {
        configured.clamp(1, self.max_texture_side.max(1))
    }
}

/// Main renderer managing GPU resources
pub struct Renderer {
    pub surface: Surface<'static>,
    pub device: Device,
    pub queue: Queue,
    pub config: SurfaceConfiguration,
    pub size: (u32, u32),
    pub caps: GpuCaps,
}

impl Renderer {
    /// Create a new renderer for a window
    pub async fn new(window: Arc<Window>) -> anyhow::Result<Self> {
        let size = window.inner_size();
        let instance = Instance::new(InstanceDescriptor {
            backends: Backends::PRIMARY,
            ..Default::default()
        });

        let surface = instance.create_surface(window.clone())?;

        let adapter = instance
            .request_adapter(&RequestAdapterOptions {
                power_preference: PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or_else(|| anyhow::anyhow!("No suitable GPU adapter found"))?;

        tracing::info!("Using GPU: {:?}", adapter.get_info().name);

        // Ask for the adapter's own texture limit so large panoramas fit
        let required_limits = Limits {
            max_texture_dimension_2d: adapter.limits().max_texture_dimension_2d,
            ..Limits::downlevel_defaults()
        };

        let (device, queue) = adapter
            .request_device(
                &DeviceDescriptor {
                    label: Some("SiteSurveyViewer Device"),
                    required_features: Features::empty(),
                    required_limits,
                    memory_hints: MemoryHints::Performance,
                },
                None,
            )
            .await?;

        let caps = GpuCaps::from_adapter(&adapter, &device.limits());
        tracing::info!(
            max_texture_side = caps.max_texture_side,
            max_anisotropy = caps.max_anisotropy,
            "GPU capabilities"
        );

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .copied()
            .or_else(|| surface_caps.formats.first().copied())
            .ok_or_else(|| anyhow::anyhow!("Surface reports no formats"))?;

        let config = SurfaceConfiguration {
            usage: TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: PresentMode::AutoVsync,
            alpha_mode: surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };

        surface.configure(&device, &config);

        Ok(Self {
            surface,
            device,
            queue,
            config,
            size: (size.width, size.height),
            caps,
        })
    }

    /// Handle window resize
    pub fn resize(&mut self, new_size: (u32, u32)) {
        if new_size.0 > 0 && new_size.1 > 0 {
            self.size = new_size;
            self.config.width = new_size.0;
            self.config.height = new_size.1;
            self.surface.configure(&self.device, &self.config);
        }
    }

    /// Handle device lost - recreate everything
    pub fn handle_device_lost(&mut self) {
        tracing::warn!("GPU device lost, reconfiguring surface");
        self.surface.configure(&self.device, &self.config);
    }

    /// Get the current surface texture for rendering
    pub fn get_current_texture(&self) -> Result<SurfaceTexture, SurfaceError> {
        self.surface.get_current_texture()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_texture_side_respects_device_limit() {
        let caps = GpuCaps {
            max_texture_side: 4096,
            max_anisotropy: 16,
        };
        assert_eq!(caps.texture_side(8192), 4096);
        assert_eq!(caps.texture_side(2048), 2048);
        assert_eq!(caps.texture_side(0), 1);
    }
}
