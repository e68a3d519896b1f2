//! Jump flood: propagates the nearest seed coordinate to every pixel.

use rand::Rng;
use tracing::debug;
use wgpu::util::DeviceExt;

use crate::config::MAX_JFA_PASSES;
use crate::gpu::pipeline::{
    begin_compute_pass, begin_overwrite_pass, compute_pipeline, dispatch_size,
    fullscreen_pipeline, BindLayouts, INTERMEDIATE_FORMAT,
};
use crate::gpu::quad::QuadMesh;
use crate::gpu::shaders;
use crate::gpu::textures::{TextureManager, TextureSlot};
use crate::gpu::uniforms::{FrameUploads, JfaUniforms, UniformSlot};
use crate::types::{JfaMode, JfaOptions};

use super::SeedPass;

/// Relative offset jitter of the star variant (+-25%).
const STAR_JITTER: f32 = 0.5;

/// `ceil(log2(max(width, height)))`, at least 1.
pub(crate) fn auto_passes(width: u32, height: u32) -> u32 {
    let max_dim = width.max(height).max(1);
    (u32::BITS - (max_dim - 1).leading_zeros()).max(1)
}

/// `ceil(log3(max(width, height)))`, at least 1.
pub(crate) fn auto_star_passes(width: u32, height: u32) -> u32 {
    let max_dim = width.max(height).max(1) as u64;
    let mut passes = 0;
    let mut reach = 1u64;
    while reach < max_dim {
        reach *= 3;
        passes += 1;
    }
    passes.max(1)
}

/// Step count for `mode`: explicit counts are clamped, zero derives one.
pub(crate) fn resolve_passes(options: &JfaOptions, width: u32, height: u32) -> u32 {
    match (options.passes, options.mode) {
        (0, JfaMode::ComputeStar) => auto_star_passes(width, height),
        (0, _) => auto_passes(width, height),
        (passes, _) => passes.min(MAX_JFA_PASSES),
    }
}

/// Halving offsets `2^(passes-1) .. 1`.
pub(crate) fn standard_offsets(passes: u32) -> Vec<f32> {
    (0..passes)
        .map(|step| (1u32 << (passes - 1 - step)) as f32)
        .collect()
}

/// Base-3 offsets `max(1, max_dim / 3^(i+1))`.
pub(crate) fn star_offsets(passes: u32, width: u32, height: u32) -> Vec<f32> {
    let max_dim = width.max(height).max(1) as f32;
    (0..passes)
        .map(|step| (max_dim / 3f32.powi(step as i32 + 1)).floor().max(1.0))
        .collect()
}

/// Source and destination of a ping-pong step; the seed pass writes Ping.
pub(crate) fn step_targets(step: usize) -> (TextureSlot, TextureSlot) {
    if step % 2 == 0 {
        (TextureSlot::JfaPing, TextureSlot::JfaPong)
    } else {
        (TextureSlot::JfaPong, TextureSlot::JfaPing)
    }
}

/// Texture holding the result after `steps` ping-pong steps.
pub(crate) fn result_slot(steps: usize) -> TextureSlot {
    if steps % 2 == 0 {
        TextureSlot::JfaPing
    } else {
        TextureSlot::JfaPong
    }
}

struct NoiseBuffer {
    bind_group: wgpu::BindGroup,
    size: (u32, u32),
}

impl NoiseBuffer {
    fn new(device: &wgpu::Device, layout: &wgpu::BindGroupLayout, size: (u32, u32)) -> Self {
        let mut rng = rand::thread_rng();
        let values: Vec<f32> = (0..size.0 as usize * size.1 as usize)
            .map(|_| rng.gen::<f32>())
            .collect();
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("jfa star noise"),
            contents: bytemuck::cast_slice(&values),
            usage: wgpu::BufferUsages::STORAGE,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("jfa star noise"),
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
        });
        Self { bind_group, size }
    }
}

struct ComputeVariants {
    standard: wgpu::ComputePipeline,
    star: wgpu::ComputePipeline,
    one_shot: wgpu::ComputePipeline,
    noise_layout: wgpu::BindGroupLayout,
    noise: Option<NoiseBuffer>,
}

/// All jump-flood variants plus the uniform slot they share.
pub(crate) struct JfaPasses {
    fragment: wgpu::RenderPipeline,
    compute: Option<ComputeVariants>,
    uniforms: UniformSlot<JfaUniforms>,
}

impl JfaPasses {
    pub fn new(device: &wgpu::Device, quad: &QuadMesh, layouts: &BindLayouts) -> Self {
        let fragment_module = shaders::create_module(
            device,
            "jfa fragment shader",
            &[shaders::JFA_COMMON, shaders::JFA_FRAGMENT],
        );
        let fragment = fullscreen_pipeline(
            device,
            "jfa fragment pipeline",
            quad,
            &fragment_module,
            &[&layouts.sampled, &layouts.uniform],
            INTERMEDIATE_FORMAT,
        );

        let compute = match (layouts.storage.as_ref(), layouts.noise.as_ref()) {
            (Some(storage), Some(noise)) => {
                let standard_module = shaders::create_module(
                    device,
                    "jfa compute shader",
                    &[shaders::JFA_COMMON, shaders::JFA_COMPUTE],
                );
                let star_module = shaders::create_module(
                    device,
                    "jfa star shader",
                    &[shaders::JFA_COMMON, shaders::JFA_STAR],
                );
                let one_shot_module = shaders::create_module(
                    device,
                    "jfa one-shot shader",
                    &[shaders::JFA_COMMON, shaders::JFA_ONE_SHOT],
                );
                let base = [&layouts.sampled, &layouts.uniform, storage];
                Some(ComputeVariants {
                    standard: compute_pipeline(device, "jfa compute pipeline", &standard_module, &base),
                    star: compute_pipeline(
                        device,
                        "jfa star pipeline",
                        &star_module,
                        &[&layouts.sampled, &layouts.uniform, storage, noise],
                    ),
                    one_shot: compute_pipeline(
                        device,
                        "jfa one-shot pipeline",
                        &one_shot_module,
                        &base,
                    ),
                    noise_layout: noise.clone(),
                    noise: None,
                })
            }
            _ => None,
        };

        Self {
            fragment,
            compute,
            uniforms: UniformSlot::new(device, &layouts.uniform, "jfa uniforms"),
        }
    }

    /// Records the flood for `options` and returns the slot holding the result.
    pub fn encode(
        &mut self,
        uploads: &mut FrameUploads<'_>,
        encoder: &mut wgpu::CommandEncoder,
        quad: &QuadMesh,
        textures: &TextureManager,
        seed: &SeedPass,
        options: &JfaOptions,
    ) -> TextureSlot {
        let (width, height) = textures.size();
        let passes = resolve_passes(options, width, height);

        let mode = if self.compute.is_some() {
            options.mode
        } else {
            JfaMode::Fragment
        };

        if mode == JfaMode::ComputeOneShot {
            self.encode_one_shot(uploads, encoder, textures, passes);
            return TextureSlot::JfaPing;
        }

        seed.encode(encoder, quad, textures, TextureSlot::JfaPing);
        let offsets = match mode {
            JfaMode::ComputeStar => star_offsets(passes, width, height),
            _ => standard_offsets(passes),
        };

        for (step, offset) in offsets.iter().enumerate() {
            let (source, destination) = step_targets(step);
            match mode {
                JfaMode::Fragment => {
                    self.uniforms
                        .stage(uploads, encoder, &JfaUniforms::new(*offset, 0.0));
                    let mut pass = begin_overwrite_pass(
                        encoder,
                        "jfa fragment pass",
                        &textures.get(destination).view,
                    );
                    pass.set_pipeline(&self.fragment);
                    pass.set_bind_group(0, &textures.get(source).sampled, &[]);
                    pass.set_bind_group(1, &self.uniforms.bind_group, &[]);
                    quad.draw(&mut pass);
                }
                _ => {
                    let star = mode == JfaMode::ComputeStar;
                    let jitter = if star { STAR_JITTER } else { 0.0 };
                    self.uniforms
                        .stage(uploads, encoder, &JfaUniforms::new(*offset, jitter));
                    self.encode_compute_step(
                        uploads.device,
                        encoder,
                        textures,
                        source,
                        destination,
                        star,
                    );
                }
            }
        }

        result_slot(offsets.len())
    }

    fn encode_compute_step(
        &mut self,
        device: &wgpu::Device,
        encoder: &mut wgpu::CommandEncoder,
        textures: &TextureManager,
        source: TextureSlot,
        destination: TextureSlot,
        star: bool,
    ) {
        let size = textures.size();
        let Some(compute) = self.compute.as_mut() else {
            return;
        };
        let Some(storage) = textures.get(destination).storage.as_ref() else {
            return;
        };

        if star && compute.noise.as_ref().map(|noise| noise.size) != Some(size) {
            debug!(width = size.0, height = size.1, "regenerating jfa star noise");
            compute.noise = Some(NoiseBuffer::new(device, &compute.noise_layout, size));
        }

        let mut pass = begin_compute_pass(
            encoder,
            if star { "jfa star pass" } else { "jfa compute pass" },
        );
        pass.set_bind_group(0, &textures.get(source).sampled, &[]);
        pass.set_bind_group(1, &self.uniforms.bind_group, &[]);
        pass.set_bind_group(2, storage, &[]);
        match (star, compute.noise.as_ref()) {
            (true, Some(noise)) => {
                pass.set_pipeline(&compute.star);
                pass.set_bind_group(3, &noise.bind_group, &[]);
            }
            _ => pass.set_pipeline(&compute.standard),
        }
        let (x, y) = dispatch_size(size.0, size.1);
        pass.dispatch_workgroups(x, y, 1);
    }

    fn encode_one_shot(
        &mut self,
        uploads: &mut FrameUploads<'_>,
        encoder: &mut wgpu::CommandEncoder,
        textures: &TextureManager,
        passes: u32,
    ) {
        let Some(compute) = self.compute.as_ref() else {
            return;
        };
        let Some(storage) = textures.get(TextureSlot::JfaPing).storage.as_ref() else {
            return;
        };
        let first_offset = standard_offsets(passes).first().copied().unwrap_or(1.0);
        self.uniforms
            .stage(uploads, encoder, &JfaUniforms::new(first_offset, 0.0));

        let mut pass = begin_compute_pass(encoder, "jfa one-shot pass");
        pass.set_pipeline(&compute.one_shot);
        pass.set_bind_group(0, &textures.get(TextureSlot::Scene).sampled, &[]);
        pass.set_bind_group(1, &self.uniforms.bind_group, &[]);
        pass.set_bind_group(2, storage, &[]);
        let (width, height) = textures.size();
        let (x, y) = dispatch_size(width, height);
        pass.dispatch_workgroups(x, y, 1);
    }
}
