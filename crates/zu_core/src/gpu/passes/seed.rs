use crate::gpu::pipeline::{begin_overwrite_pass, fullscreen_pipeline, BindLayouts, INTERMEDIATE_FORMAT};
use crate::gpu::quad::QuadMesh;
use crate::gpu::shaders;
use crate::gpu::textures::{TextureManager, TextureSlot};

/// Marks every occupied scene texel as a jump-flood seed.
pub(crate) struct SeedPass {
    pipeline: wgpu::RenderPipeline,
}

impl SeedPass {
    pub fn new(device: &wgpu::Device, quad: &QuadMesh, layouts: &BindLayouts) -> Self {
        let module = shaders::create_module(device, "seed shader", &[shaders::SEED]);
        let pipeline = fullscreen_pipeline(
            device,
            "seed pipeline",
            quad,
            &module,
            &[&layouts.sampled],
            INTERMEDIATE_FORMAT,
        );
        Self { pipeline }
    }

    pub fn encode(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        quad: &QuadMesh,
        textures: &TextureManager,
        target: TextureSlot,
    ) {
        let mut pass = begin_overwrite_pass(encoder, "seed pass", &textures.get(target).view);
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, &textures.get(TextureSlot::Scene).sampled, &[]);
        quad.draw(&mut pass);
    }
}
