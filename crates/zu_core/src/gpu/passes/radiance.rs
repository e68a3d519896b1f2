use crate::gpu::pipeline::{
    begin_compute_pass, begin_overwrite_pass, compute_pipeline, dispatch_size,
    fullscreen_pipeline, BindLayouts, INTERMEDIATE_FORMAT,
};
use crate::gpu::quad::QuadMesh;
use crate::gpu::shaders;
use crate::gpu::textures::{TextureManager, TextureSlot};
use crate::gpu::uniforms::{FrameUploads, RadianceUniforms, UniformSlot};
use crate::types::{RadianceMode, RadianceOptions};

/// Raymarches the distance field to gather light for every pixel.
pub(crate) struct RadiancePasses {
    fragment: wgpu::RenderPipeline,
    compute: Option<wgpu::ComputePipeline>,
    uniforms: UniformSlot<RadianceUniforms>,
}

impl RadiancePasses {
    pub fn new(device: &wgpu::Device, quad: &QuadMesh, layouts: &BindLayouts) -> Self {
        let fragment_module = shaders::create_module(
            device,
            "radiance fragment shader",
            &[shaders::RADIANCE_COMMON, shaders::RADIANCE_FRAGMENT],
        );
        let fragment = fullscreen_pipeline(
            device,
            "radiance fragment pipeline",
            quad,
            &fragment_module,
            &[&layouts.sampled, &layouts.sampled, &layouts.uniform],
            INTERMEDIATE_FORMAT,
        );

        let compute = layouts.storage.as_ref().map(|storage| {
            let module = shaders::create_module(
                device,
                "radiance compute shader",
                &[shaders::RADIANCE_COMMON, shaders::RADIANCE_COMPUTE],
            );
            compute_pipeline(
                device,
                "radiance compute pipeline",
                &module,
                &[&layouts.sampled, &layouts.sampled, &layouts.uniform, storage],
            )
        });

        Self {
            fragment,
            compute,
            uniforms: UniformSlot::new(device, &layouts.uniform, "radiance uniforms"),
        }
    }

    pub fn encode(
        &self,
        uploads: &mut FrameUploads<'_>,
        encoder: &mut wgpu::CommandEncoder,
        quad: &QuadMesh,
        textures: &TextureManager,
        options: &RadianceOptions,
        frame: u32,
    ) {
        let size = textures.size();
        self.uniforms
            .stage(uploads, encoder, &RadianceUniforms::new(size, options, frame));

        let scene = &textures.get(TextureSlot::Scene).sampled;
        let distance = &textures.get(TextureSlot::DistanceField).sampled;
        let radiance = textures.get(TextureSlot::Radiance);

        match (options.mode, self.compute.as_ref(), radiance.storage.as_ref()) {
            (RadianceMode::Compute, Some(pipeline), Some(storage)) => {
                let mut pass = begin_compute_pass(encoder, "radiance compute pass");
                pass.set_pipeline(pipeline);
                pass.set_bind_group(0, scene, &[]);
                pass.set_bind_group(1, distance, &[]);
                pass.set_bind_group(2, &self.uniforms.bind_group, &[]);
                pass.set_bind_group(3, storage, &[]);
                let (x, y) = dispatch_size(size.0, size.1);
                pass.dispatch_workgroups(x, y, 1);
            }
            _ => {
                let mut pass = begin_overwrite_pass(encoder, "radiance fragment pass", &radiance.view);
                pass.set_pipeline(&self.fragment);
                pass.set_bind_group(0, scene, &[]);
                pass.set_bind_group(1, distance, &[]);
                pass.set_bind_group(2, &self.uniforms.bind_group, &[]);
                quad.draw(&mut pass);
            }
        }
    }
}
