use std::marker::PhantomData;

use bytemuck::{Pod, Zeroable};
use wgpu::util::StagingBelt;

use crate::camera::CameraUniform;
use crate::types::{RadianceOptions, ShowTarget};

/// Per-step jump-flood parameters.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub(crate) struct JfaUniforms {
    /// Sampling offset in pixels.
    pub offset: f32,
    /// Relative jitter applied by the star variant.
    pub jitter: f32,
    pub _padding: [f32; 2],
}

impl JfaUniforms {
    pub fn new(offset: f32, jitter: f32) -> Self {
        Self {
            offset,
            jitter,
            _padding: [0.0; 2],
        }
    }
}

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub(crate) struct RadianceUniforms {
    pub resolution: [f32; 2],
    pub ray_count: u32,
    pub max_steps: u32,
    pub accum_radiance: u32,
    pub enable_noise: u32,
    pub show_grain: u32,
    pub frame: u32,
}

impl RadianceUniforms {
    pub fn new(size: (u32, u32), options: &RadianceOptions, frame: u32) -> Self {
        Self {
            resolution: [size.0 as f32, size.1 as f32],
            ray_count: options.ray_count.max(1),
            max_steps: options.max_steps.max(1),
            accum_radiance: options.accum_radiance as u32,
            enable_noise: options.enable_noise as u32,
            show_grain: options.show_grain as u32,
            frame,
        }
    }
}

pub(crate) const SHOW_MODE_COLOR: u32 = 0;
pub(crate) const SHOW_MODE_SEEDS: u32 = 1;
pub(crate) const SHOW_MODE_DISTANCE: u32 = 2;

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub(crate) struct ShowUniforms {
    pub camera: CameraUniform,
    pub screen: [f32; 2],
    pub mode: u32,
    pub scale: f32,
}

impl ShowUniforms {
    pub fn new(camera: CameraUniform, screen: (u32, u32), target: ShowTarget) -> Self {
        let (mode, scale) = match target {
            ShowTarget::Scene | ShowTarget::Radiance => (SHOW_MODE_COLOR, 1.0),
            ShowTarget::Jfa => (SHOW_MODE_SEEDS, 1.0),
            // Fade to black over a quarter of the larger dimension.
            ShowTarget::DistanceField => (
                SHOW_MODE_DISTANCE,
                4.0 / screen.0.max(screen.1).max(1) as f32,
            ),
        };
        Self {
            camera,
            screen: [screen.0.max(1) as f32, screen.1.max(1) as f32],
            mode,
            scale,
        }
    }
}

/// Staging memory for one frame of uniform writes. Sized so a frame with the
/// maximum number of flood steps fits in a single chunk.
const STAGING_CHUNK_SIZE: wgpu::BufferAddress = 4 * 1024;

/// Reusable staging belt shared by every uniform slot.
///
/// Writes are recorded as buffer copies on the frame encoder so that several
/// passes recorded into one encoder each see their own values. Chunks are
/// recycled once the GPU has consumed the frame that used them.
pub(crate) struct UniformUploads {
    belt: StagingBelt,
}

impl UniformUploads {
    pub fn new() -> Self {
        Self {
            belt: StagingBelt::new(STAGING_CHUNK_SIZE),
        }
    }

    pub fn frame<'a>(&'a mut self, device: &'a wgpu::Device) -> FrameUploads<'a> {
        FrameUploads {
            device,
            belt: &mut self.belt,
        }
    }

    /// Closes the frame's staging chunks; call before submitting.
    pub fn finish(&mut self) {
        self.belt.finish();
    }

    /// Returns submitted chunks to the free list; call after submitting.
    pub fn recall(&mut self) {
        self.belt.recall();
    }
}

/// Device plus staging belt, borrowed while one frame is encoded.
pub(crate) struct FrameUploads<'a> {
    pub device: &'a wgpu::Device,
    belt: &'a mut StagingBelt,
}

/// Uniform buffer plus its bind group.
pub(crate) struct UniformSlot<T: Pod> {
    buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
    _marker: PhantomData<T>,
}

impl<T: Pod> UniformSlot<T> {
    pub fn new(device: &wgpu::Device, layout: &wgpu::BindGroupLayout, label: &str) -> Self {
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size: std::mem::size_of::<T>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(label),
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
        });
        Self {
            buffer,
            bind_group,
            _marker: PhantomData,
        }
    }

    /// Records a copy of `value` into the uniform buffer; must happen outside
    /// any open pass.
    pub fn stage(
        &self,
        uploads: &mut FrameUploads<'_>,
        encoder: &mut wgpu::CommandEncoder,
        value: &T,
    ) {
        let Some(size) = wgpu::BufferSize::new(std::mem::size_of::<T>() as u64) else {
            return;
        };
        uploads
            .belt
            .write_buffer(encoder, &self.buffer, 0, size, uploads.device)
            .copy_from_slice(bytemuck::bytes_of(value));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::Camera;

    /// Staging bytes one frame consumes for `jfa_steps` flood steps.
    fn frame_staging_bytes(jfa_steps: u32) -> wgpu::BufferAddress {
        let aligned = |size: usize| (size as u64).next_multiple_of(wgpu::MAP_ALIGNMENT);
        aligned(std::mem::size_of::<JfaUniforms>()) * u64::from(jfa_steps)
            + aligned(std::mem::size_of::<RadianceUniforms>())
            + aligned(std::mem::size_of::<ShowUniforms>())
    }

    #[test]
    fn uniform_sizes_match_wgsl_layouts() {
        assert_eq!(std::mem::size_of::<JfaUniforms>(), 16);
        assert_eq!(std::mem::size_of::<RadianceUniforms>(), 32);
        assert_eq!(std::mem::size_of::<ShowUniforms>(), 160);
    }

    #[test]
    fn one_staging_chunk_holds_a_full_frame() {
        assert!(frame_staging_bytes(crate::config::MAX_JFA_PASSES) <= STAGING_CHUNK_SIZE);
        assert!(frame_staging_bytes(1) > frame_staging_bytes(0));
    }

    #[test]
    fn radiance_uniforms_clamp_counts() {
        let options = RadianceOptions {
            ray_count: 0,
            max_steps: 0,
            accum_radiance: false,
            ..RadianceOptions::default()
        };
        let uniforms = RadianceUniforms::new((640, 480), &options, 7);
        assert_eq!(uniforms.ray_count, 1);
        assert_eq!(uniforms.max_steps, 1);
        assert_eq!(uniforms.accum_radiance, 0);
        assert_eq!(uniforms.enable_noise, 1);
        assert_eq!(uniforms.resolution, [640.0, 480.0]);
        assert_eq!(uniforms.frame, 7);
    }

    #[test]
    fn show_modes_follow_target() {
        let camera = Camera::default().get_camera_uniform();
        assert_eq!(
            ShowUniforms::new(camera, (100, 50), ShowTarget::Radiance).mode,
            SHOW_MODE_COLOR
        );
        assert_eq!(
            ShowUniforms::new(camera, (100, 50), ShowTarget::Jfa).mode,
            SHOW_MODE_SEEDS
        );
        let distance = ShowUniforms::new(camera, (100, 50), ShowTarget::DistanceField);
        assert_eq!(distance.mode, SHOW_MODE_DISTANCE);
        assert!((distance.scale - 0.04).abs() < 1e-6);
    }
}
