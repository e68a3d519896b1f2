use std::path::Path;

use anyhow::{Context, Result};
use image::imageops::FilterType;
use tracing::{debug, info};

use crate::brush::{Canvas, Patch, CHANNELS};

use super::pipeline::{BindLayouts, INTERMEDIATE_FORMAT};

/// Named render targets of the frame graph.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) enum TextureSlot {
    Scene,
    JfaPing,
    JfaPong,
    DistanceField,
    Radiance,
}

impl TextureSlot {
    pub fn label(self) -> &'static str {
        match self {
            TextureSlot::Scene => "scene texture",
            TextureSlot::JfaPing => "jfa ping texture",
            TextureSlot::JfaPong => "jfa pong texture",
            TextureSlot::DistanceField => "distance field texture",
            TextureSlot::Radiance => "radiance texture",
        }
    }
}

/// A full-resolution `Rgba32Float` texture and the bind groups that expose it.
pub(crate) struct EngineTexture {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub sampled: wgpu::BindGroup,
    pub storage: Option<wgpu::BindGroup>,
}

impl EngineTexture {
    pub fn new(device: &wgpu::Device, layouts: &BindLayouts, slot: TextureSlot, size: (u32, u32)) -> Self {
        let label = slot.label();
        let mut usage = wgpu::TextureUsages::TEXTURE_BINDING
            | wgpu::TextureUsages::RENDER_ATTACHMENT
            | wgpu::TextureUsages::COPY_DST;
        if layouts.storage.is_some() {
            usage |= wgpu::TextureUsages::STORAGE_BINDING;
        }

        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width: size.0.max(1),
                height: size.1.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: INTERMEDIATE_FORMAT,
            usage,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        let sampled = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(label),
            layout: &layouts.sampled,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(&view),
            }],
        });
        let storage = layouts.storage.as_ref().map(|layout| {
            device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some(label),
                layout,
                entries: &[wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&view),
                }],
            })
        });

        Self {
            texture,
            view,
            sampled,
            storage,
        }
    }
}

/// The painted scene: GPU texture plus the authoritative CPU canvas.
pub(crate) struct SceneTexture {
    pub gpu: EngineTexture,
    canvas: Canvas,
}

impl SceneTexture {
    fn new(device: &wgpu::Device, queue: &wgpu::Queue, layouts: &BindLayouts, canvas: Canvas) -> Self {
        let gpu = EngineTexture::new(
            device,
            layouts,
            TextureSlot::Scene,
            (canvas.width(), canvas.height()),
        );
        let scene = Self { gpu, canvas };
        scene.upload_all(queue);
        scene
    }

    pub fn canvas(&self) -> &Canvas {
        &self.canvas
    }

    pub fn canvas_mut(&mut self) -> &mut Canvas {
        &mut self.canvas
    }

    pub fn upload(&self, queue: &wgpu::Queue, patch: &Patch) {
        let rect = patch.rect;
        if rect.width == 0 || rect.height == 0 {
            return;
        }
        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &self.gpu.texture,
                mip_level: 0,
                origin: wgpu::Origin3d {
                    x: rect.x,
                    y: rect.y,
                    z: 0,
                },
                aspect: wgpu::TextureAspect::All,
            },
            bytemuck::cast_slice(&patch.texels),
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(rect.width * (CHANNELS * std::mem::size_of::<f32>()) as u32),
                rows_per_image: Some(rect.height),
            },
            wgpu::Extent3d {
                width: rect.width,
                height: rect.height,
                depth_or_array_layers: 1,
            },
        );
    }

    pub fn upload_all(&self, queue: &wgpu::Queue) {
        let patch = self.canvas.extract(self.canvas.full_rect());
        self.upload(queue, &patch);
    }
}

/// Owns every render target of the frame graph and rebuilds them on resize.
pub(crate) struct TextureManager {
    size: (u32, u32),
    scene: SceneTexture,
    jfa_ping: EngineTexture,
    jfa_pong: EngineTexture,
    distance: EngineTexture,
    radiance: EngineTexture,
}

impl TextureManager {
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        layouts: &BindLayouts,
        size: (u32, u32),
        canvas: Option<Canvas>,
    ) -> Self {
        let size = (size.0.max(1), size.1.max(1));
        let canvas = match canvas {
            Some(canvas) if (canvas.width(), canvas.height()) == size => canvas,
            Some(canvas) => canvas.resized(size.0, size.1),
            None => Canvas::new(size.0, size.1),
        };
        Self {
            size,
            scene: SceneTexture::new(device, queue, layouts, canvas),
            jfa_ping: EngineTexture::new(device, layouts, TextureSlot::JfaPing, size),
            jfa_pong: EngineTexture::new(device, layouts, TextureSlot::JfaPong, size),
            distance: EngineTexture::new(device, layouts, TextureSlot::DistanceField, size),
            radiance: EngineTexture::new(device, layouts, TextureSlot::Radiance, size),
        }
    }

    pub fn size(&self) -> (u32, u32) {
        self.size
    }

    pub fn get(&self, slot: TextureSlot) -> &EngineTexture {
        match slot {
            TextureSlot::Scene => &self.scene.gpu,
            TextureSlot::JfaPing => &self.jfa_ping,
            TextureSlot::JfaPong => &self.jfa_pong,
            TextureSlot::DistanceField => &self.distance,
            TextureSlot::Radiance => &self.radiance,
        }
    }

    pub fn scene_mut(&mut self) -> &mut SceneTexture {
        &mut self.scene
    }

    /// Recreates all targets at the new size; the scene keeps its overlap.
    pub fn resize(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        layouts: &BindLayouts,
        size: (u32, u32),
    ) {
        let size = (size.0.max(1), size.1.max(1));
        if size == self.size {
            return;
        }
        debug!(width = size.0, height = size.1, "recreating render targets");
        let canvas = self.scene.canvas.resized(size.0, size.1);
        *self = Self::new(device, queue, layouts, size, Some(canvas));
    }
}

/// Loads an image and converts it to a canvas of the given size.
pub(crate) fn load_scene_image(path: &Path, size: (u32, u32)) -> Result<Canvas> {
    let image = image::open(path)
        .with_context(|| format!("failed to open scene image {}", path.display()))?
        .to_rgba8();
    let (width, height) = (size.0.max(1), size.1.max(1));
    let resized = if image.dimensions() == (width, height) {
        image
    } else {
        image::imageops::resize(&image, width, height, FilterType::Nearest)
    };
    info!(path = %path.display(), width, height, "loaded scene image");
    Ok(Canvas::from_rgba8(width, height, resized.as_raw()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scene_image_is_resized_and_converted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scene.png");
        let mut image = image::RgbaImage::new(2, 2);
        image.put_pixel(0, 0, image::Rgba([255, 0, 0, 255]));
        image.save(&path).unwrap();

        let canvas = load_scene_image(&path, (4, 4)).unwrap();
        assert_eq!((canvas.width(), canvas.height()), (4, 4));
        assert_eq!(canvas.texel(0, 0), Some([1.0, 0.0, 0.0, 1.0]));
        assert_eq!(canvas.texel(1, 1), Some([1.0, 0.0, 0.0, 1.0]));
        assert_eq!(canvas.texel(3, 3), Some([0.0, 0.0, 0.0, 0.0]));
    }

    #[test]
    fn missing_scene_image_reports_path() {
        let err = load_scene_image(Path::new("/definitely/not/here.png"), (4, 4)).unwrap_err();
        assert!(format!("{err:#}").contains("/definitely/not/here.png"));
    }
}
