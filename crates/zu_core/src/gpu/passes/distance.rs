use crate::gpu::pipeline::{begin_overwrite_pass, fullscreen_pipeline, BindLayouts, INTERMEDIATE_FORMAT};
use crate::gpu::quad::QuadMesh;
use crate::gpu::shaders;
use crate::gpu::textures::{TextureManager, TextureSlot};

/// Converts nearest-seed coordinates into per-pixel distances.
pub(crate) struct DistanceFieldPass {
    pipeline: wgpu::RenderPipeline,
}

impl DistanceFieldPass {
    pub fn new(device: &wgpu::Device, quad: &QuadMesh, layouts: &BindLayouts) -> Self {
        let module = shaders::create_module(device, "distance field shader", &[shaders::DISTANCE_FIELD]);
        let pipeline = fullscreen_pipeline(
            device,
            "distance field pipeline",
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
        seeds: TextureSlot,
    ) {
        let mut pass = begin_overwrite_pass(
            encoder,
            "distance field pass",
            &textures.get(TextureSlot::DistanceField).view,
        );
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, &textures.get(seeds).sampled, &[]);
        quad.draw(&mut pass);
    }
}
