use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use glam::Vec2;
use tracing::{info, warn};
use winit::window::Window;

use crate::brush::Canvas;
use crate::camera::CameraUniform;
use crate::types::{GpuSettings, RenderOptions};

use super::context::{GpuCapabilities, GpuContext, PresentationSurface};
use super::graph::RenderGraph;

/// Acquiring a swapchain image slower than this is worth a warning.
const ACQUIRE_BUDGET: Duration = Duration::from_millis(50);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    Presented,
    /// No surface is attached (suspended or minimised); nothing was drawn.
    NoSurface,
}

/// Owns the device, the optional surface and the frame graph.
pub struct GpuState {
    context: GpuContext,
    surface: Option<PresentationSurface>,
    graph: RenderGraph,
}

impl GpuState {
    pub fn new(window: Arc<Window>, settings: GpuSettings, canvas: Option<Canvas>) -> Result<Self> {
        let (context, surface) = GpuContext::new(window, settings)?;
        let graph = RenderGraph::new(
            &context.device,
            &context.queue,
            context.capabilities.compute,
            surface.size(),
            surface.format(),
            canvas,
        );
        Ok(Self {
            context,
            surface: Some(surface),
            graph,
        })
    }

    pub fn capabilities(&self) -> &GpuCapabilities {
        &self.context.capabilities
    }

    /// Scene texture resolution.
    pub fn scene_size(&self) -> (u32, u32) {
        self.graph.size()
    }

    pub fn attach_surface(&mut self, window: Arc<Window>) -> Result<()> {
        let surface = self.context.attach(window)?;
        self.graph
            .ensure_surface_format(&self.context.device, surface.format());
        self.graph
            .resize(&self.context.device, &self.context.queue, surface.size());
        info!(width = surface.size().0, height = surface.size().1, "surface attached");
        self.surface = Some(surface);
        Ok(())
    }

    pub fn detach_surface(&mut self) {
        if self.surface.take().is_some() {
            info!("surface detached; GPU resources retained");
        }
    }

    /// Reconfigures the surface and resizes the render targets; zero sizes are
    /// ignored so a minimised window keeps its scene.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        if let Some(surface) = self.surface.as_mut() {
            surface.resize(&self.context.device, width, height);
        }
        self.graph
            .resize(&self.context.device, &self.context.queue, (width, height));
    }

    pub fn render(
        &mut self,
        camera: CameraUniform,
        options: &RenderOptions,
        frame: u32,
    ) -> Result<FrameOutcome, wgpu::SurfaceError> {
        let Some(surface) = self.surface.as_ref() else {
            return Ok(FrameOutcome::NoSurface);
        };

        let acquire_start = Instant::now();
        let output = surface.acquire()?;
        let acquire_duration = acquire_start.elapsed();
        if acquire_duration > ACQUIRE_BUDGET {
            warn!(
                "acquiring frame took {}ms, which is over the budget of {}ms",
                acquire_duration.as_millis(),
                ACQUIRE_BUDGET.as_millis(),
            );
        }

        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let options = options.effective(self.context.capabilities.compute);
        let mut encoder =
            self.context
                .device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("zu frame encoder"),
                });
        self.graph.encode(
            &self.context.device,
            &mut encoder,
            &view,
            surface.size(),
            &options,
            camera,
            frame,
        );
        self.context
            .queue
            .submit(std::iter::once(encoder.finish()));
        self.graph.recall_uploads();
        output.present();
        Ok(FrameOutcome::Presented)
    }

    pub fn paint_stroke(&mut self, points: &[Vec2], radius: u32, color: [f32; 4]) {
        self.graph
            .paint_stroke(&self.context.queue, points, radius, color);
    }

    pub fn clear_scene(&mut self) {
        self.graph.clear_scene(&self.context.queue);
    }
}
