use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec2, Vec4};

const MIN_ZOOM: f32 = 0.1;
const ZOOM_STEP: f32 = 0.1;

/// Orthographic 2D camera looking at the scene texture.
///
/// World space spans `[-aspect, aspect] x [-1, 1]` at zoom 1, which maps the
/// scene texture exactly onto the screen.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub left: f32,
    pub right: f32,
    pub bottom: f32,
    pub top: f32,
    pub near: f32,
    pub far: f32,
    pub zoom_factor: f32,
    pub position: Vec2,
    pub aspect_ratio: f32,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct CameraUniform {
    pub view_proj: [[f32; 4]; 4],
    pub inverse_view_proj: [[f32; 4]; 4],
    pub position: [f32; 2],
    pub _padding: [f32; 2],
}

impl Default for Camera {
    fn default() -> Self {
        Self::from_screen_size(1.0, 1.0, -1.0, 1.0, 1.0, Vec2::ZERO)
    }
}

impl Camera {
    pub fn from_screen_size(
        width: f32,
        height: f32,
        near: f32,
        far: f32,
        zoom_factor: f32,
        position: Vec2,
    ) -> Self {
        let mut camera = Self {
            left: -1.0,
            right: 1.0,
            bottom: -1.0,
            top: 1.0,
            near,
            far,
            zoom_factor: zoom_factor.max(MIN_ZOOM),
            position,
            aspect_ratio: 1.0,
        };
        camera.update_from_screen_size(width, height);
        camera
    }

    pub fn update_from_screen_size(&mut self, width: f32, height: f32) {
        self.aspect_ratio = if height > 0.0 { width / height } else { 1.0 };
        self.left = -self.aspect_ratio;
        self.right = self.aspect_ratio;
        self.bottom = -1.0;
        self.top = 1.0;
    }

    pub fn create_matrix(&self) -> Mat4 {
        let zoom = self.zoom_factor;
        Mat4::orthographic_rh(
            self.left / zoom,
            self.right / zoom,
            self.bottom / zoom,
            self.top / zoom,
            self.near,
            self.far,
        ) * Mat4::from_translation((-self.position).extend(0.0))
    }

    pub fn get_camera_uniform(&self) -> CameraUniform {
        let view_proj = self.create_matrix();
        CameraUniform {
            view_proj: view_proj.to_cols_array_2d(),
            inverse_view_proj: view_proj.inverse().to_cols_array_2d(),
            position: self.position.to_array(),
            _padding: [0.0; 2],
        }
    }

    pub fn set_zoom(&mut self, zoom_factor: f32) {
        self.zoom_factor = zoom_factor.max(MIN_ZOOM);
    }

    /// Applies a scroll delta: scrolling up zooms in, down zooms out.
    pub fn event(&mut self, scroll: f32) {
        if scroll > 0.0 {
            self.set_zoom(self.zoom_factor + ZOOM_STEP);
        } else if scroll < 0.0 {
            self.set_zoom(self.zoom_factor - ZOOM_STEP);
        }
    }

    /// Moves the camera by a world-space delta scaled by the current zoom.
    pub fn pan(&mut self, delta: Vec2) {
        self.position += delta / self.zoom_factor;
    }

    pub fn reset(&mut self) {
        self.zoom_factor = 1.0;
        self.position = Vec2::ZERO;
    }

    /// Maps a screen pixel to the scene texel underneath it.
    ///
    /// Mirrors the lookup performed by the show shader; returns `None` when the
    /// pixel falls outside the texture.
    pub fn screen_to_texture(&self, pixel: Vec2, screen: Vec2, texture: Vec2) -> Option<Vec2> {
        if screen.x <= 0.0 || screen.y <= 0.0 {
            return None;
        }
        let ndc = Vec2::new(pixel.x / screen.x * 2.0 - 1.0, 1.0 - pixel.y / screen.y * 2.0);
        let world = self.create_matrix().inverse() * Vec4::new(ndc.x, ndc.y, 0.0, 1.0);
        let uv = Vec2::new(
            (world.x / self.aspect_ratio + 1.0) * 0.5,
            (1.0 - world.y) * 0.5,
        );
        if !(0.0..1.0).contains(&uv.x) || !(0.0..1.0).contains(&uv.y) {
            return None;
        }
        Some(uv * texture)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: Vec2, b: Vec2) -> bool {
        (a - b).abs().max_element() < 1e-3
    }

    #[test]
    fn screen_size_sets_aspect_bounds() {
        let camera = Camera::from_screen_size(1600.0, 800.0, -1.0, 1.0, 1.0, Vec2::ZERO);
        assert_eq!(camera.aspect_ratio, 2.0);
        assert_eq!((camera.left, camera.right), (-2.0, 2.0));
        assert_eq!((camera.bottom, camera.top), (-1.0, 1.0));
    }

    #[test]
    fn zoom_is_clamped() {
        let mut camera = Camera::default();
        camera.set_zoom(0.01);
        assert_eq!(camera.zoom_factor, MIN_ZOOM);
        for _ in 0..5 {
            camera.event(-1.0);
        }
        assert_eq!(camera.zoom_factor, MIN_ZOOM);
    }

    #[test]
    fn scroll_changes_zoom_by_step() {
        let mut camera = Camera::default();
        camera.event(3.0);
        assert!((camera.zoom_factor - 1.1).abs() < 1e-6);
        camera.event(0.0);
        assert!((camera.zoom_factor - 1.1).abs() < 1e-6);
        camera.event(-0.5);
        assert!((camera.zoom_factor - 1.0).abs() < 1e-6);
    }

    #[test]
    fn identity_camera_maps_pixels_to_same_texels() {
        let camera = Camera::from_screen_size(800.0, 600.0, -1.0, 1.0, 1.0, Vec2::ZERO);
        let screen = Vec2::new(800.0, 600.0);
        for pixel in [Vec2::new(0.5, 0.5), Vec2::new(400.0, 300.0), Vec2::new(799.0, 10.0)] {
            let texel = camera.screen_to_texture(pixel, screen, screen).unwrap();
            assert!(approx(texel, pixel), "{pixel:?} -> {texel:?}");
        }
    }

    #[test]
    fn zoomed_camera_magnifies_around_centre() {
        let mut camera = Camera::from_screen_size(800.0, 600.0, -1.0, 1.0, 1.0, Vec2::ZERO);
        camera.set_zoom(2.0);
        let screen = Vec2::new(800.0, 600.0);
        let centre = camera
            .screen_to_texture(Vec2::new(400.0, 300.0), screen, screen)
            .unwrap();
        assert!(approx(centre, Vec2::new(400.0, 300.0)));
        let corner = camera.screen_to_texture(Vec2::ZERO, screen, screen).unwrap();
        assert!(approx(corner, Vec2::new(200.0, 150.0)));
    }

    #[test]
    fn panned_camera_can_leave_the_texture() {
        let mut camera = Camera::from_screen_size(100.0, 100.0, -1.0, 1.0, 1.0, Vec2::ZERO);
        camera.pan(Vec2::new(1.5, 0.0));
        let screen = Vec2::splat(100.0);
        assert!(camera
            .screen_to_texture(Vec2::new(90.0, 50.0), screen, screen)
            .is_none());
        let shifted = camera
            .screen_to_texture(Vec2::new(10.0, 50.0), screen, screen)
            .unwrap();
        assert!(approx(shifted, Vec2::new(85.0, 50.0)));
    }

    #[test]
    fn uniform_is_sixteen_byte_aligned() {
        assert_eq!(std::mem::size_of::<CameraUniform>() % 16, 0);
        let uniform = Camera::default().get_camera_uniform();
        assert_eq!(uniform.view_proj[3][3], 1.0);
    }
}
