use crate::camera::CameraUniform;
use crate::gpu::pipeline::{begin_overwrite_pass, fullscreen_pipeline, BindLayouts};
use crate::gpu::quad::QuadMesh;
use crate::gpu::shaders;
use crate::gpu::textures::{TextureManager, TextureSlot};
use crate::gpu::uniforms::{FrameUploads, ShowUniforms, UniformSlot};
use crate::types::ShowTarget;

/// Presents one of the intermediate textures through the camera.
pub(crate) struct ShowPass {
    module: wgpu::ShaderModule,
    pipeline: wgpu::RenderPipeline,
    format: wgpu::TextureFormat,
    uniforms: UniformSlot<ShowUniforms>,
}

impl ShowPass {
    pub fn new(
        device: &wgpu::Device,
        quad: &QuadMesh,
        layouts: &BindLayouts,
        format: wgpu::TextureFormat,
    ) -> Self {
        let module = shaders::create_module(device, "show shader", &[shaders::SHOW]);
        let pipeline = Self::build_pipeline(device, quad, layouts, &module, format);
        Self {
            module,
            pipeline,
            format,
            uniforms: UniformSlot::new(device, &layouts.uniform, "show uniforms"),
        }
    }

    fn build_pipeline(
        device: &wgpu::Device,
        quad: &QuadMesh,
        layouts: &BindLayouts,
        module: &wgpu::ShaderModule,
        format: wgpu::TextureFormat,
    ) -> wgpu::RenderPipeline {
        fullscreen_pipeline(
            device,
            "show pipeline",
            quad,
            module,
            &[&layouts.sampled, &layouts.uniform],
            format,
        )
    }

    /// Rebuilds the pipeline when a re-created surface picked another format.
    pub fn ensure_format(
        &mut self,
        device: &wgpu::Device,
        quad: &QuadMesh,
        layouts: &BindLayouts,
        format: wgpu::TextureFormat,
    ) {
        if format != self.format {
            tracing::info!(old = ?self.format, new = ?format, "surface format changed; rebuilding show pipeline");
            self.pipeline = Self::build_pipeline(device, quad, layouts, &self.module, format);
            self.format = format;
        }
    }

    #[allow(clippy::too_many_arguments)]
    pub fn encode(
        &self,
        uploads: &mut FrameUploads<'_>,
        encoder: &mut wgpu::CommandEncoder,
        quad: &QuadMesh,
        textures: &TextureManager,
        source: TextureSlot,
        target: ShowTarget,
        camera: CameraUniform,
        output: &wgpu::TextureView,
        screen: (u32, u32),
    ) {
        self.uniforms
            .stage(uploads, encoder, &ShowUniforms::new(camera, screen, target));
        let mut pass = begin_overwrite_pass(encoder, "show pass", output);
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, &textures.get(source).sampled, &[]);
        pass.set_bind_group(1, &self.uniforms.bind_group, &[]);
        quad.draw(&mut pass);
    }
}
