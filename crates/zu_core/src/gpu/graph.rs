//! Frame graph: seed → jump flood → distance field → radiance → show.

use glam::Vec2;

use crate::brush::Canvas;
use crate::camera::CameraUniform;
use crate::types::{RenderOptions, ShowTarget};

use super::passes::{DistanceFieldPass, JfaPasses, RadiancePasses, SeedPass, ShowPass};
use super::pipeline::BindLayouts;
use super::quad::QuadMesh;
use super::textures::{TextureManager, TextureSlot};
use super::uniforms::UniformUploads;

pub(crate) struct RenderGraph {
    layouts: BindLayouts,
    quad: QuadMesh,
    textures: TextureManager,
    seed: SeedPass,
    jfa: JfaPasses,
    distance: DistanceFieldPass,
    radiance: RadiancePasses,
    show: ShowPass,
    uploads: UniformUploads,
}

impl RenderGraph {
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        compute: bool,
        size: (u32, u32),
        surface_format: wgpu::TextureFormat,
        canvas: Option<Canvas>,
    ) -> Self {
        let layouts = BindLayouts::new(device, compute);
        let quad = QuadMesh::new(device);
        let textures = TextureManager::new(device, queue, &layouts, size, canvas);
        let seed = SeedPass::new(device, &quad, &layouts);
        let jfa = JfaPasses::new(device, &quad, &layouts);
        let distance = DistanceFieldPass::new(device, &quad, &layouts);
        let radiance = RadiancePasses::new(device, &quad, &layouts);
        let show = ShowPass::new(device, &quad, &layouts, surface_format);
        Self {
            layouts,
            quad,
            textures,
            seed,
            jfa,
            distance,
            radiance,
            show,
            uploads: UniformUploads::new(),
        }
    }

    /// Scene resolution; matches the surface except while minimised.
    pub fn size(&self) -> (u32, u32) {
        self.textures.size()
    }

    pub fn resize(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, size: (u32, u32)) {
        self.textures.resize(device, queue, &self.layouts, size);
    }

    pub fn ensure_surface_format(&mut self, device: &wgpu::Device, format: wgpu::TextureFormat) {
        self.show.ensure_format(device, &self.quad, &self.layouts, format);
    }

    /// Records every pass of one frame, ending with the show pass into `output`.
    /// The encoder must be submitted before `recall_uploads` is called.
    #[allow(clippy::too_many_arguments)]
    pub fn encode(
        &mut self,
        device: &wgpu::Device,
        encoder: &mut wgpu::CommandEncoder,
        output: &wgpu::TextureView,
        screen: (u32, u32),
        options: &RenderOptions,
        camera: CameraUniform,
        frame: u32,
    ) {
        let mut uploads = self.uploads.frame(device);
        let seeds = self.jfa.encode(
            &mut uploads,
            encoder,
            &self.quad,
            &self.textures,
            &self.seed,
            &options.jfa,
        );
        self.distance
            .encode(encoder, &self.quad, &self.textures, seeds);
        self.radiance.encode(
            &mut uploads,
            encoder,
            &self.quad,
            &self.textures,
            &options.radiance,
            frame,
        );

        let source = match options.show {
            ShowTarget::Scene => TextureSlot::Scene,
            ShowTarget::Jfa => seeds,
            ShowTarget::DistanceField => TextureSlot::DistanceField,
            ShowTarget::Radiance => TextureSlot::Radiance,
        };
        self.show.encode(
            &mut uploads,
            encoder,
            &self.quad,
            &self.textures,
            source,
            options.show,
            camera,
            output,
            screen,
        );
        self.uploads.finish();
    }

    /// Reclaims staging memory used by frames already submitted.
    pub fn recall_uploads(&mut self) {
        self.uploads.recall();
    }

    /// Paints discs along `points` (texel space) and uploads the touched rows.
    pub fn paint_stroke(&mut self, queue: &wgpu::Queue, points: &[Vec2], radius: u32, color: [f32; 4]) {
        let scene = self.textures.scene_mut();
        let Some(rect) = scene.canvas_mut().paint_stroke(points, radius, color) else {
            return;
        };
        let patch = scene.canvas().extract(rect);
        scene.upload(queue, &patch);
    }

    pub fn clear_scene(&mut self, queue: &wgpu::Queue) {
        let scene = self.textures.scene_mut();
        scene.canvas_mut().clear();
        scene.upload_all(queue);
    }
}
