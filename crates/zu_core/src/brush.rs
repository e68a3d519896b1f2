//! CPU-side scene canvas and the brush that paints into it.
//!
//! The scene is an RGBA `f32` image. Alpha marks occupied texels: anything
//! with `a > 0` is a seed for the jump flood, coloured texels emit light and
//! opaque black texels act as walls. Painting only touches the CPU copy; the
//! GPU texture is refreshed from the returned [`Patch`]es.

use glam::Vec2;

/// Floats per texel.
pub const CHANNELS: usize = 4;

/// Transparent black, used for erasing.
pub const EMPTY: [f32; 4] = [0.0, 0.0, 0.0, 0.0];

/// Colours reachable from the number keys. The last entry is an occluder.
pub const PALETTE: [[f32; 4]; 9] = [
    [1.0, 1.0, 1.0, 1.0],
    [1.0, 0.15, 0.1, 1.0],
    [0.2, 1.0, 0.3, 1.0],
    [0.2, 0.35, 1.0, 1.0],
    [1.0, 0.9, 0.2, 1.0],
    [1.0, 0.5, 0.05, 1.0],
    [0.1, 0.9, 1.0, 1.0],
    [1.0, 0.2, 0.9, 1.0],
    [0.0, 0.0, 0.0, 1.0],
];

pub const MAX_BRUSH_RADIUS: u32 = 120;

/// Brush colour and size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BrushSettings {
    pub radius: u32,
    pub color: [f32; 4],
}

impl Default for BrushSettings {
    fn default() -> Self {
        Self {
            radius: 10,
            color: PALETTE[0],
        }
    }
}

impl BrushSettings {
    /// Grows or shrinks the radius, staying within `0..=MAX_BRUSH_RADIUS`.
    pub fn adjust_radius(&mut self, delta: i32) {
        let radius = self.radius as i64 + delta as i64;
        self.radius = radius.clamp(0, MAX_BRUSH_RADIUS as i64) as u32;
    }
}

/// Inclusive-exclusive texel rectangle touched by a paint operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirtyRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl DirtyRect {
    pub fn union(self, other: DirtyRect) -> DirtyRect {
        let x0 = self.x.min(other.x);
        let y0 = self.y.min(other.y);
        let x1 = (self.x + self.width).max(other.x + other.width);
        let y1 = (self.y + self.height).max(other.y + other.height);
        DirtyRect {
            x: x0,
            y: y0,
            width: x1 - x0,
            height: y1 - y0,
        }
    }
}

/// Texels copied out of the canvas, ready for `queue.write_texture`.
#[derive(Debug, Clone, PartialEq)]
pub struct Patch {
    pub rect: DirtyRect,
    pub texels: Vec<f32>,
}

/// Tightly packed RGBA f32 image.
#[derive(Debug, Clone, PartialEq)]
pub struct Canvas {
    width: u32,
    height: u32,
    texels: Vec<f32>,
}

impl Canvas {
    /// Creates an empty (fully transparent) canvas.
    pub fn new(width: u32, height: u32) -> Self {
        let width = width.max(1);
        let height = height.max(1);
        Self {
            width,
            height,
            texels: vec![0.0; width as usize * height as usize * CHANNELS],
        }
    }

    /// Converts 8-bit RGBA rows into a canvas. Fully transparent pixels stay empty.
    pub fn from_rgba8(width: u32, height: u32, bytes: &[u8]) -> Self {
        let mut canvas = Canvas::new(width, height);
        for (dst, src) in canvas
            .texels
            .chunks_exact_mut(CHANNELS)
            .zip(bytes.chunks_exact(CHANNELS))
        {
            if src[3] == 0 {
                continue;
            }
            for (channel, value) in dst.iter_mut().zip(src) {
                *channel = *value as f32 / 255.0;
            }
        }
        canvas
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn texels(&self) -> &[f32] {
        &self.texels
    }

    pub fn full_rect(&self) -> DirtyRect {
        DirtyRect {
            x: 0,
            y: 0,
            width: self.width,
            height: self.height,
        }
    }

    pub fn texel(&self, x: u32, y: u32) -> Option<[f32; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let offset = self.offset(x, y);
        let mut value = [0.0; 4];
        value.copy_from_slice(&self.texels[offset..offset + CHANNELS]);
        Some(value)
    }

    pub fn clear(&mut self) {
        self.texels.fill(0.0);
    }

    /// Returns a canvas of the new size that keeps the overlapping top-left region.
    pub fn resized(&self, width: u32, height: u32) -> Canvas {
        let mut resized = Canvas::new(width, height);
        let copy_width = self.width.min(resized.width) as usize * CHANNELS;
        for y in 0..self.height.min(resized.height) {
            let src = self.offset(0, y);
            let dst = resized.offset(0, y);
            resized.texels[dst..dst + copy_width]
                .copy_from_slice(&self.texels[src..src + copy_width]);
        }
        resized
    }

    /// Fills every texel within `radius` of `center`, clipped to the canvas.
    pub fn paint_disc(&mut self, center: Vec2, radius: u32, color: [f32; 4]) -> Option<DirtyRect> {
        let cx = center.x.floor() as i64;
        let cy = center.y.floor() as i64;
        let r = radius as i64;

        let x0 = (cx - r).max(0);
        let y0 = (cy - r).max(0);
        let x1 = (cx + r).min(self.width as i64 - 1);
        let y1 = (cy + r).min(self.height as i64 - 1);
        if x0 > x1 || y0 > y1 {
            return None;
        }

        let r2 = r * r;
        let mut touched = false;
        for y in y0..=y1 {
            let dy = y - cy;
            for x in x0..=x1 {
                let dx = x - cx;
                if dx * dx + dy * dy <= r2 {
                    let offset = self.offset(x as u32, y as u32);
                    self.texels[offset..offset + CHANNELS].copy_from_slice(&color);
                    touched = true;
                }
            }
        }

        touched.then(|| DirtyRect {
            x: x0 as u32,
            y: y0 as u32,
            width: (x1 - x0 + 1) as u32,
            height: (y1 - y0 + 1) as u32,
        })
    }

    /// Stamps a disc at every point and returns the union of the touched area.
    pub fn paint_stroke(
        &mut self,
        points: &[Vec2],
        radius: u32,
        color: [f32; 4],
    ) -> Option<DirtyRect> {
        points
            .iter()
            .filter_map(|point| self.paint_disc(*point, radius, color))
            .reduce(DirtyRect::union)
    }

    /// Copies the texels inside `rect` into a tightly packed patch.
    pub fn extract(&self, rect: DirtyRect) -> Patch {
        let row = rect.width as usize * CHANNELS;
        let mut texels = Vec::with_capacity(row * rect.height as usize);
        for y in rect.y..rect.y + rect.height {
            let start = self.offset(rect.x, y);
            texels.extend_from_slice(&self.texels[start..start + row]);
        }
        Patch { rect, texels }
    }

    fn offset(&self, x: u32, y: u32) -> usize {
        (y as usize * self.width as usize + x as usize) * CHANNELS
    }
}

/// Points along `from -> to` spaced closely enough that consecutive discs overlap.
pub fn stroke_points(from: Vec2, to: Vec2, radius: u32) -> Vec<Vec2> {
    let spacing = (radius as f32 * 0.5).max(1.0);
    let length = from.distance(to);
    let steps = (length / spacing).ceil() as usize;
    if steps == 0 {
        return vec![to];
    }
    (1..=steps)
        .map(|step| from.lerp(to, step as f32 / steps as f32))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: [f32; 4] = [1.0, 0.0, 0.0, 1.0];

    #[test]
    fn disc_fills_texels_within_radius() {
        let mut canvas = Canvas::new(16, 16);
        let rect = canvas.paint_disc(Vec2::new(8.5, 8.5), 2, RED).unwrap();
        assert_eq!(
            rect,
            DirtyRect {
                x: 6,
                y: 6,
                width: 5,
                height: 5
            }
        );
        assert_eq!(canvas.texel(8, 8), Some(RED));
        assert_eq!(canvas.texel(10, 8), Some(RED));
        assert_eq!(canvas.texel(10, 10), Some(EMPTY));
    }

    #[test]
    fn zero_radius_paints_single_texel() {
        let mut canvas = Canvas::new(4, 4);
        let rect = canvas.paint_disc(Vec2::new(1.2, 2.7), 0, RED).unwrap();
        assert_eq!((rect.x, rect.y, rect.width, rect.height), (1, 2, 1, 1));
        let painted = canvas
            .texels()
            .chunks_exact(CHANNELS)
            .filter(|texel| texel[3] > 0.0)
            .count();
        assert_eq!(painted, 1);
    }

    #[test]
    fn disc_is_clipped_at_the_edges() {
        let mut canvas = Canvas::new(8, 8);
        let rect = canvas.paint_disc(Vec2::new(0.0, 7.0), 3, RED).unwrap();
        assert_eq!(rect.x, 0);
        assert_eq!(rect.y, 4);
        assert_eq!(rect.x + rect.width, 4);
        assert_eq!(rect.y + rect.height, 8);
    }

    #[test]
    fn disc_outside_canvas_touches_nothing() {
        let mut canvas = Canvas::new(8, 8);
        assert!(canvas.paint_disc(Vec2::new(-20.0, 3.0), 4, RED).is_none());
        assert!(canvas.paint_disc(Vec2::new(3.0, 40.0), 4, RED).is_none());
        assert!(canvas.texels().iter().all(|value| *value == 0.0));
    }

    #[test]
    fn stroke_points_leave_no_gaps() {
        let points = stroke_points(Vec2::ZERO, Vec2::new(10.0, 0.0), 4);
        assert_eq!(points.len(), 5);
        assert_eq!(*points.last().unwrap(), Vec2::new(10.0, 0.0));
        for pair in points.windows(2) {
            assert!(pair[0].distance(pair[1]) <= 2.0 + f32::EPSILON);
        }
        assert_eq!(stroke_points(Vec2::ONE, Vec2::ONE, 3), vec![Vec2::ONE]);
    }

    #[test]
    fn stroke_unions_dirty_rects_and_extracts_patch() {
        let mut canvas = Canvas::new(32, 32);
        let points = [Vec2::new(4.0, 4.0), Vec2::new(20.0, 10.0)];
        let rect = canvas.paint_stroke(&points, 1, RED).unwrap();
        assert_eq!((rect.x, rect.y), (3, 3));
        assert_eq!((rect.width, rect.height), (19, 9));

        let patch = canvas.extract(rect);
        assert_eq!(
            patch.texels.len(),
            (rect.width * rect.height) as usize * CHANNELS
        );
        // top-left of the patch is texel (3, 3): outside the first disc's cross.
        assert_eq!(&patch.texels[..4], &EMPTY);
        // texel (4, 4) is the first disc centre.
        let row = rect.width as usize * CHANNELS;
        assert_eq!(&patch.texels[row + 4..row + 8], &RED);
    }

    #[test]
    fn resize_keeps_top_left_overlap() {
        let mut canvas = Canvas::new(4, 4);
        canvas.paint_disc(Vec2::new(1.0, 1.0), 0, RED);
        canvas.paint_disc(Vec2::new(3.0, 3.0), 0, RED);

        let smaller = canvas.resized(2, 2);
        assert_eq!(smaller.texel(1, 1), Some(RED));

        let larger = canvas.resized(6, 5);
        assert_eq!(larger.texel(3, 3), Some(RED));
        assert_eq!(larger.texel(5, 4), Some(EMPTY));
    }

    #[test]
    fn rgba8_conversion_skips_transparent_pixels() {
        let bytes = [255, 0, 0, 255, 10, 20, 30, 0];
        let canvas = Canvas::from_rgba8(2, 1, &bytes);
        assert_eq!(canvas.texel(0, 0), Some(RED));
        assert_eq!(canvas.texel(1, 0), Some(EMPTY));
    }

    #[test]
    fn brush_radius_is_clamped() {
        let mut brush = BrushSettings::default();
        brush.adjust_radius(-100);
        assert_eq!(brush.radius, 0);
        brush.adjust_radius(500);
        assert_eq!(brush.radius, MAX_BRUSH_RADIUS);
    }
}
