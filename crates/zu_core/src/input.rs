//! Pointer and keyboard handling.
//!
//! The pointer paints (primary button / touch) or erases (secondary button)
//! the scene; the keyboard switches render options at run time.

use glam::Vec2;
use winit::event::{ElementState, MouseButton, TouchPhase};
use winit::keyboard::{Key, NamedKey};

use crate::brush::{BrushSettings, PALETTE};
use crate::camera::Camera;
use crate::types::RenderOptions;

const PAN_STEP: f32 = 0.1;
/// Upper bound for rays cast per pixel.
pub const MAX_RAY_COUNT: u32 = 256;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputAction {
    CycleShowTarget,
    CycleJfaMode,
    CycleRadianceMode,
    ToggleNoise,
    ToggleGrain,
    ToggleAccumulation,
    GrowBrush,
    ShrinkBrush,
    MoreRays,
    FewerRays,
    /// Index into [`PALETTE`].
    SelectColor(usize),
    ClearScene,
    ResetCamera,
    Pan(Vec2),
    Exit,
}

/// Side effects an action needs from the driver beyond mutating [`Controls`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionEffect {
    ClearScene,
    Exit,
}

pub fn action_for_key(key: &Key) -> Option<InputAction> {
    match key {
        Key::Named(NamedKey::Tab) => Some(InputAction::CycleShowTarget),
        Key::Named(NamedKey::Escape) => Some(InputAction::Exit),
        Key::Named(NamedKey::ArrowLeft) => Some(InputAction::Pan(Vec2::new(-PAN_STEP, 0.0))),
        Key::Named(NamedKey::ArrowRight) => Some(InputAction::Pan(Vec2::new(PAN_STEP, 0.0))),
        Key::Named(NamedKey::ArrowUp) => Some(InputAction::Pan(Vec2::new(0.0, PAN_STEP))),
        Key::Named(NamedKey::ArrowDown) => Some(InputAction::Pan(Vec2::new(0.0, -PAN_STEP))),
        Key::Character(value) => {
            let mut chars = value.chars();
            let ch = chars.next()?;
            if chars.next().is_some() {
                return None;
            }
            match ch.to_ascii_lowercase() {
                'j' => Some(InputAction::CycleJfaMode),
                'r' => Some(InputAction::CycleRadianceMode),
                'n' => Some(InputAction::ToggleNoise),
                'g' => Some(InputAction::ToggleGrain),
                'a' => Some(InputAction::ToggleAccumulation),
                '+' | '=' => Some(InputAction::GrowBrush),
                '-' | '_' => Some(InputAction::ShrinkBrush),
                ']' => Some(InputAction::MoreRays),
                '[' => Some(InputAction::FewerRays),
                'c' => Some(InputAction::ClearScene),
                '0' => Some(InputAction::ResetCamera),
                digit @ '1'..='9' => Some(InputAction::SelectColor(digit as usize - '1' as usize)),
                _ => None,
            }
        }
        _ => None,
    }
}

/// Interactive state the keyboard can change.
#[derive(Debug, Clone, Copy)]
pub struct Controls {
    pub options: RenderOptions,
    pub brush: BrushSettings,
    pub camera: Camera,
}

impl Controls {
    pub fn apply(&mut self, action: InputAction) -> Option<ActionEffect> {
        let radiance = &mut self.options.radiance;
        match action {
            InputAction::CycleShowTarget => self.options.show = self.options.show.next(),
            InputAction::CycleJfaMode => self.options.jfa.mode = self.options.jfa.mode.next(),
            InputAction::CycleRadianceMode => radiance.mode = radiance.mode.next(),
            InputAction::ToggleNoise => radiance.enable_noise = !radiance.enable_noise,
            InputAction::ToggleGrain => radiance.show_grain = !radiance.show_grain,
            InputAction::ToggleAccumulation => radiance.accum_radiance = !radiance.accum_radiance,
            InputAction::GrowBrush => self.brush.adjust_radius(2),
            InputAction::ShrinkBrush => self.brush.adjust_radius(-2),
            InputAction::MoreRays => {
                radiance.ray_count = radiance
                    .ray_count
                    .saturating_mul(2)
                    .min(MAX_RAY_COUNT)
                    .max(radiance.ray_count);
            }
            InputAction::FewerRays => radiance.ray_count = (radiance.ray_count / 2).max(1),
            InputAction::SelectColor(index) => {
                if let Some(color) = PALETTE.get(index) {
                    self.brush.color = *color;
                }
            }
            InputAction::ResetCamera => self.camera.reset(),
            InputAction::Pan(delta) => self.camera.pan(delta),
            InputAction::ClearScene => return Some(ActionEffect::ClearScene),
            InputAction::Exit => return Some(ActionEffect::Exit),
        }
        None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrokeMode {
    Paint,
    Erase,
}

/// Segment the pointer travelled since the last painted position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stroke {
    pub from: Vec2,
    pub to: Vec2,
    pub mode: StrokeMode,
}

/// Tracks a single pointer, fed by mouse or touch events (physical pixels).
#[derive(Debug, Default, Clone)]
pub struct PointerState {
    position: Option<Vec2>,
    last_painted: Option<Vec2>,
    paint: bool,
    erase: bool,
    touch_id: Option<u64>,
}

impl PointerState {
    pub fn position(&self) -> Option<Vec2> {
        self.position
    }

    pub fn cursor_moved(&mut self, position: Vec2) {
        self.position = Some(position);
    }

    pub fn cursor_left(&mut self) {
        self.position = None;
        self.last_painted = None;
    }

    pub fn button(&mut self, button: MouseButton, state: ElementState) {
        let pressed = state == ElementState::Pressed;
        match button {
            MouseButton::Left => self.paint = pressed,
            MouseButton::Right => self.erase = pressed,
            _ => return,
        }
        if !self.paint && !self.erase {
            self.last_painted = None;
        }
    }

    /// Only the first finger paints; other touches are ignored.
    pub fn touch(&mut self, id: u64, phase: TouchPhase, position: Vec2) {
        match phase {
            TouchPhase::Started if self.touch_id.is_none() => {
                self.touch_id = Some(id);
                self.position = Some(position);
                self.paint = true;
            }
            TouchPhase::Moved if self.touch_id == Some(id) => {
                self.position = Some(position);
            }
            TouchPhase::Ended | TouchPhase::Cancelled if self.touch_id == Some(id) => {
                self.touch_id = None;
                self.paint = false;
                self.last_painted = None;
            }
            _ => {}
        }
    }

    /// Returns the pending stroke segment while a button is held.
    pub fn take_stroke(&mut self) -> Option<Stroke> {
        let mode = if self.erase {
            StrokeMode::Erase
        } else if self.paint {
            StrokeMode::Paint
        } else {
            return None;
        };
        let to = self.position?;
        if self.last_painted == Some(to) {
            return None;
        }
        let from = self.last_painted.replace(to).unwrap_or(to);
        Some(Stroke { from, to, mode })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{JfaMode, ShowTarget};
    use winit::keyboard::SmolStr;

    fn character(value: &str) -> Key {
        Key::Character(SmolStr::new(value))
    }

    #[test]
    fn keys_map_to_actions() {
        assert_eq!(
            action_for_key(&Key::Named(NamedKey::Tab)),
            Some(InputAction::CycleShowTarget)
        );
        assert_eq!(
            action_for_key(&character("J")),
            Some(InputAction::CycleJfaMode)
        );
        assert_eq!(
            action_for_key(&character("1")),
            Some(InputAction::SelectColor(0))
        );
        assert_eq!(
            action_for_key(&character("9")),
            Some(InputAction::SelectColor(8))
        );
        assert_eq!(action_for_key(&character("zz")), None);
        assert_eq!(action_for_key(&Key::Named(NamedKey::F1)), None);
    }

    #[test]
    fn controls_apply_option_changes() {
        let mut controls = Controls {
            options: RenderOptions::default(),
            brush: BrushSettings::default(),
            camera: Camera::default(),
        };
        assert_eq!(controls.apply(InputAction::CycleShowTarget), None);
        assert_eq!(controls.options.show, ShowTarget::Scene);
        controls.apply(InputAction::CycleJfaMode);
        assert_eq!(controls.options.jfa.mode, JfaMode::ComputeStar);

        controls.apply(InputAction::FewerRays);
        controls.apply(InputAction::FewerRays);
        controls.apply(InputAction::FewerRays);
        controls.apply(InputAction::FewerRays);
        assert_eq!(controls.options.radiance.ray_count, 1);
        controls.apply(InputAction::MoreRays);
        assert_eq!(controls.options.radiance.ray_count, 2);

        controls.apply(InputAction::SelectColor(8));
        assert_eq!(controls.brush.color, [0.0, 0.0, 0.0, 1.0]);
        controls.apply(InputAction::SelectColor(42));
        assert_eq!(controls.brush.color, [0.0, 0.0, 0.0, 1.0]);

        controls.apply(InputAction::Pan(Vec2::new(0.5, 0.0)));
        assert_eq!(controls.camera.position, Vec2::new(0.5, 0.0));
        controls.apply(InputAction::ResetCamera);
        assert_eq!(controls.camera.position, Vec2::ZERO);

        assert_eq!(
            controls.apply(InputAction::ClearScene),
            Some(ActionEffect::ClearScene)
        );
        assert_eq!(controls.apply(InputAction::Exit), Some(ActionEffect::Exit));
    }

    #[test]
    fn more_rays_never_shrinks_or_overflows() {
        let mut controls = Controls {
            options: RenderOptions::default(),
            brush: BrushSettings::default(),
            camera: Camera::default(),
        };
        controls.options.radiance.ray_count = MAX_RAY_COUNT;
        controls.apply(InputAction::MoreRays);
        assert_eq!(controls.options.radiance.ray_count, MAX_RAY_COUNT);

        controls.options.radiance.ray_count = 1000;
        controls.apply(InputAction::MoreRays);
        assert_eq!(controls.options.radiance.ray_count, 1000);

        controls.options.radiance.ray_count = 3_000_000_000;
        controls.apply(InputAction::MoreRays);
        assert_eq!(controls.options.radiance.ray_count, 3_000_000_000);
    }

    #[test]
    fn mouse_drag_produces_connected_strokes() {
        let mut pointer = PointerState::default();
        pointer.cursor_moved(Vec2::new(10.0, 10.0));
        assert_eq!(pointer.take_stroke(), None);

        pointer.button(MouseButton::Left, ElementState::Pressed);
        let first = pointer.take_stroke().unwrap();
        assert_eq!(first.from, first.to);
        assert_eq!(first.mode, StrokeMode::Paint);
        assert_eq!(pointer.take_stroke(), None);

        pointer.cursor_moved(Vec2::new(30.0, 10.0));
        let second = pointer.take_stroke().unwrap();
        assert_eq!(second.from, Vec2::new(10.0, 10.0));
        assert_eq!(second.to, Vec2::new(30.0, 10.0));

        pointer.button(MouseButton::Left, ElementState::Released);
        pointer.cursor_moved(Vec2::new(50.0, 10.0));
        assert_eq!(pointer.take_stroke(), None);
    }

    #[test]
    fn erase_takes_priority_over_paint() {
        let mut pointer = PointerState::default();
        pointer.cursor_moved(Vec2::ONE);
        pointer.button(MouseButton::Left, ElementState::Pressed);
        pointer.button(MouseButton::Right, ElementState::Pressed);
        assert_eq!(pointer.take_stroke().unwrap().mode, StrokeMode::Erase);
    }

    #[test]
    fn only_first_touch_paints() {
        let mut pointer = PointerState::default();
        pointer.touch(1, TouchPhase::Started, Vec2::new(5.0, 5.0));
        pointer.touch(2, TouchPhase::Started, Vec2::new(90.0, 90.0));
        let stroke = pointer.take_stroke().unwrap();
        assert_eq!(stroke.to, Vec2::new(5.0, 5.0));

        pointer.touch(2, TouchPhase::Ended, Vec2::new(90.0, 90.0));
        pointer.touch(1, TouchPhase::Moved, Vec2::new(8.0, 5.0));
        assert_eq!(pointer.take_stroke().unwrap().from, Vec2::new(5.0, 5.0));

        pointer.touch(1, TouchPhase::Ended, Vec2::new(8.0, 5.0));
        assert_eq!(pointer.take_stroke(), None);
    }
}
