use std::sync::Arc;

use anyhow::{Context as AnyhowContext, Result};
use winit::window::Window;

use crate::types::{GpuPowerPreference, GpuSettings, VsyncMode};

/// What the selected adapter can do, captured once at start-up.
#[derive(Clone, Debug)]
pub struct GpuCapabilities {
    pub adapter_name: String,
    pub backend: wgpu::Backend,
    pub device_type: wgpu::DeviceType,
    /// Compute shaders and storage textures are available.
    pub compute: bool,
    pub max_texture_dimension: u32,
}

impl GpuCapabilities {
    fn from_adapter(adapter: &wgpu::Adapter) -> Self {
        let info = adapter.get_info();
        let downlevel = adapter.get_downlevel_capabilities();
        Self {
            adapter_name: info.name,
            backend: info.backend,
            device_type: info.device_type,
            compute: downlevel
                .flags
                .contains(wgpu::DownlevelFlags::COMPUTE_SHADERS),
            max_texture_dimension: adapter.limits().max_texture_dimension_2d,
        }
    }
}

/// Device-level state that survives surface loss.
pub(crate) struct GpuContext {
    pub instance: wgpu::Instance,
    pub adapter: wgpu::Adapter,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub capabilities: GpuCapabilities,
    settings: GpuSettings,
}

impl GpuContext {
    /// Creates the instance, a first surface for `window` and a device that can
    /// present to it.
    pub(crate) fn new(
        window: Arc<Window>,
        settings: GpuSettings,
    ) -> Result<(Self, PresentationSurface)> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            flags: wgpu::InstanceFlags::default(),
            memory_budget_thresholds: wgpu::MemoryBudgetThresholds::default(),
            backend_options: wgpu::BackendOptions::default(),
        });

        let surface = instance
            .create_surface(window.clone())
            .context("failed to create rendering surface")?;

        let power_preference = match settings.power {
            GpuPowerPreference::Low => wgpu::PowerPreference::LowPower,
            GpuPowerPreference::High => wgpu::PowerPreference::HighPerformance,
        };
        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .context("failed to find a suitable GPU adapter")?;

        let capabilities = GpuCapabilities::from_adapter(&adapter);
        tracing::info!(
            name = %capabilities.adapter_name,
            backend = ?capabilities.backend,
            device_type = ?capabilities.device_type,
            compute = capabilities.compute,
            "selected GPU adapter"
        );
        if !capabilities.compute {
            tracing::warn!("adapter lacks compute shaders; compute variants fall back to fragment passes");
        }

        let limits = adapter.limits();
        let (device, queue) = pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
            label: Some("zu device"),
            required_features: wgpu::Features::empty(),
            required_limits: limits.clone(),
            memory_hints: wgpu::MemoryHints::Performance,
            trace: wgpu::Trace::default(),
        }))
        .context("failed to create GPU device")?;

        let context = Self {
            instance,
            adapter,
            device,
            queue,
            capabilities,
            settings,
        };
        let size = window.inner_size();
        let surface = context.configure_surface(surface, (size.width, size.height))?;
        Ok((context, surface))
    }

    /// Builds a surface for a window handed back by the platform after a suspend.
    pub(crate) fn attach(&self, window: Arc<Window>) -> Result<PresentationSurface> {
        let size = window.inner_size();
        let surface = self
            .instance
            .create_surface(window)
            .context("failed to re-create rendering surface")?;
        self.configure_surface(surface, (size.width, size.height))
    }

    fn configure_surface(
        &self,
        surface: wgpu::Surface<'static>,
        size: (u32, u32),
    ) -> Result<PresentationSurface> {
        let max_dimension = self.capabilities.max_texture_dimension;
        let width = size.0.max(1);
        let height = size.1.max(1);
        if width > max_dimension || height > max_dimension {
            anyhow::bail!(
                "GPU max texture dimension is {max_dimension}, requested surface is {width}x{height}"
            );
        }

        let caps = surface.get_capabilities(&self.adapter);
        let fallback = *caps
            .formats
            .first()
            .context("surface reports no supported formats")?;
        // Colours are authored linearly; an sRGB swapchain would brighten them.
        let format = caps
            .formats
            .iter()
            .copied()
            .find(|format| !format.is_srgb())
            .unwrap_or_else(|| {
                tracing::warn!(
                    ?fallback,
                    "no linear (non-sRGB) surface format available; falling back to {:?}",
                    fallback
                );
                fallback
            });

        let desired_maximum_frame_latency = self.settings.latency.clamp(1, 3);
        if desired_maximum_frame_latency != self.settings.latency {
            tracing::warn!(
                requested = self.settings.latency,
                clamped = desired_maximum_frame_latency,
                "GPU frame latency clamped to valid range (1-3)"
            );
        }

        let present_mode = choose_present_mode(&caps.present_modes, self.settings.vsync);
        tracing::debug!(?present_mode, vsync = ?self.settings.vsync, ?format, "configuring surface");

        let alpha_mode = caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width,
            height,
            present_mode,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency,
        };
        let mut presentation = PresentationSurface { surface, config };
        presentation.configure(&self.device);
        Ok(presentation)
    }
}

/// Fifo when vsync is on; otherwise Immediate, then Mailbox, then Fifo.
pub(crate) fn choose_present_mode(available: &[wgpu::PresentMode], vsync: VsyncMode) -> wgpu::PresentMode {
    let has = |mode: wgpu::PresentMode| available.contains(&mode);
    match vsync {
        VsyncMode::On => wgpu::PresentMode::Fifo,
        VsyncMode::Off if has(wgpu::PresentMode::Immediate) => wgpu::PresentMode::Immediate,
        VsyncMode::Off if has(wgpu::PresentMode::Mailbox) => wgpu::PresentMode::Mailbox,
        VsyncMode::Off => wgpu::PresentMode::Fifo,
    }
}

/// Swapchain for one native window; dropped when the platform takes the window away.
pub(crate) struct PresentationSurface {
    surface: wgpu::Surface<'static>,
    config: wgpu::SurfaceConfiguration,
}

impl PresentationSurface {
    pub(crate) fn configure(&mut self, device: &wgpu::Device) {
        self.surface.configure(device, &self.config);
    }

    pub(crate) fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.config.width = width;
        self.config.height = height;
        self.configure(device);
    }

    pub(crate) fn format(&self) -> wgpu::TextureFormat {
        self.config.format
    }

    pub(crate) fn size(&self) -> (u32, u32) {
        (self.config.width, self.config.height)
    }

    pub(crate) fn acquire(&self) -> Result<wgpu::SurfaceTexture, wgpu::SurfaceError> {
        self.surface.get_current_texture()
    }
}
