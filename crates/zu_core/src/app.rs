//! Event-loop driver shared by the desktop binary and the Android shell.

use std::sync::Arc;
use std::time::Instant;

use anyhow::{anyhow, Result};
use glam::Vec2;
use tracing::{debug, error, info, warn};
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, Event, MouseScrollDelta, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop, EventLoopBuilder, EventLoopWindowTarget};
use winit::window::{Window, WindowBuilder};

use crate::brush::{stroke_points, EMPTY};
use crate::camera::Camera;
use crate::gpu::{load_scene_image, FrameOutcome, GpuState};
use crate::input::{action_for_key, ActionEffect, Controls, PointerState, StrokeMode};
use crate::lifecycle::{LifecycleAction, LifecycleEvent, SurfaceLifecycle};
use crate::runtime::{FrameScheduler, FrameStats};
use crate::types::EngineConfig;

/// Opens a desktop window and runs the engine until it is closed.
pub fn run(config: EngineConfig) -> Result<()> {
    let event_loop = EventLoopBuilder::new()
        .build()
        .map_err(|err| anyhow!("failed to create event loop: {err}"))?;
    run_event_loop(event_loop, config)
}

/// Runs the engine on an event loop built by the caller (the Android shell
/// attaches its activity before handing the loop over).
pub fn run_event_loop(event_loop: EventLoop<()>, config: EngineConfig) -> Result<()> {
    info!(
        width = config.window_size.0,
        height = config.window_size.1,
        show = %config.render.show,
        jfa = %config.render.jfa.mode,
        radiance = %config.render.radiance.mode,
        "starting zu"
    );
    let mut app = App::new(config);
    let mut fatal: Option<anyhow::Error> = None;

    let run_result = event_loop.run(|event, elwt| {
        if let Err(err) = app.handle_event(event, elwt) {
            error!("{err:#}");
            fatal = Some(err);
            elwt.exit();
        }
    });

    if let Some(err) = fatal {
        return Err(err);
    }
    run_result.map_err(|err| anyhow!("event loop error: {err}"))?;
    info!(frames = app.stats.total_frames(), "zu exited");
    Ok(())
}

struct App {
    config: EngineConfig,
    window: Option<Arc<Window>>,
    gpu: Option<GpuState>,
    lifecycle: SurfaceLifecycle,
    controls: Controls,
    pointer: PointerState,
    scheduler: FrameScheduler,
    stats: FrameStats,
    frame: u32,
}

impl App {
    fn new(config: EngineConfig) -> Self {
        let (width, height) = config.window_size;
        let controls = Controls {
            options: config.render,
            brush: config.brush,
            camera: Camera::from_screen_size(width as f32, height as f32, -1.0, 1.0, 1.0, Vec2::ZERO),
        };
        Self {
            lifecycle: SurfaceLifecycle::new(config.window_size),
            scheduler: FrameScheduler::new(config.target_fps),
            stats: FrameStats::new(config.stats_interval),
            controls,
            pointer: PointerState::default(),
            window: None,
            gpu: None,
            frame: 0,
            config,
        }
    }

    fn handle_event(&mut self, event: Event<()>, elwt: &EventLoopWindowTarget<()>) -> Result<()> {
        match event {
            Event::Resumed => {
                let action = self.lifecycle.handle(LifecycleEvent::Resumed);
                self.apply(action, elwt)?;
            }
            Event::Suspended => {
                let action = self.lifecycle.handle(LifecycleEvent::Suspended);
                self.apply(action, elwt)?;
            }
            Event::WindowEvent { window_id, event }
                if self.window.as_ref().is_some_and(|window| window.id() == window_id) =>
            {
                self.handle_window_event(event, elwt)?;
            }
            Event::AboutToWait => self.schedule(elwt),
            _ => {}
        }
        Ok(())
    }

    fn handle_window_event(
        &mut self,
        event: WindowEvent,
        elwt: &EventLoopWindowTarget<()>,
    ) -> Result<()> {
        match event {
            WindowEvent::CloseRequested | WindowEvent::Destroyed => {
                let action = self.lifecycle.handle(LifecycleEvent::CloseRequested);
                self.apply(action, elwt)?;
            }
            WindowEvent::Resized(size) => {
                let action = self.lifecycle.handle(LifecycleEvent::Resized {
                    width: size.width,
                    height: size.height,
                });
                self.apply(action, elwt)?;
            }
            WindowEvent::KeyboardInput { event, .. } => {
                if event.state == ElementState::Pressed && !event.repeat {
                    if let Some(action) = action_for_key(&event.logical_key) {
                        let before = self.controls.options;
                        let effect = self.controls.apply(action);
                        if self.controls.options != before {
                            self.log_options();
                        }
                        match effect {
                            Some(ActionEffect::ClearScene) => {
                                if let Some(gpu) = self.gpu.as_mut() {
                                    gpu.clear_scene();
                                }
                                info!("scene cleared");
                            }
                            Some(ActionEffect::Exit) => {
                                let action = self.lifecycle.handle(LifecycleEvent::CloseRequested);
                                self.apply(action, elwt)?;
                            }
                            None => {}
                        }
                    }
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.pointer
                    .cursor_moved(Vec2::new(position.x as f32, position.y as f32));
                self.paint_pending_stroke();
            }
            WindowEvent::CursorLeft { .. } => self.pointer.cursor_left(),
            WindowEvent::MouseInput { state, button, .. } => {
                self.pointer.button(button, state);
                self.paint_pending_stroke();
            }
            WindowEvent::Touch(touch) => {
                let location = Vec2::new(touch.location.x as f32, touch.location.y as f32);
                self.pointer.touch(touch.id, touch.phase, location);
                self.paint_pending_stroke();
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let scroll = match delta {
                    MouseScrollDelta::LineDelta(_, y) => y,
                    MouseScrollDelta::PixelDelta(position) => position.y as f32,
                };
                self.controls.camera.event(scroll);
            }
            WindowEvent::RedrawRequested => self.redraw(elwt)?,
            _ => {}
        }
        Ok(())
    }

    fn apply(&mut self, action: LifecycleAction, elwt: &EventLoopWindowTarget<()>) -> Result<()> {
        match action {
            LifecycleAction::CreateGpu => self.create_gpu(elwt)?,
            LifecycleAction::AttachSurface => {
                if let (Some(gpu), Some(window)) = (self.gpu.as_mut(), self.window.as_ref()) {
                    gpu.attach_surface(window.clone())?;
                    let size = window.inner_size();
                    self.controls
                        .camera
                        .update_from_screen_size(size.width as f32, size.height as f32);
                    window.request_redraw();
                }
                self.scheduler.reset();
            }
            LifecycleAction::DetachSurface => {
                if let Some(gpu) = self.gpu.as_mut() {
                    gpu.detach_surface();
                }
            }
            LifecycleAction::Reconfigure { width, height } => {
                if let Some(gpu) = self.gpu.as_mut() {
                    gpu.resize(width, height);
                }
                self.controls
                    .camera
                    .update_from_screen_size(width as f32, height as f32);
            }
            LifecycleAction::SkipFrame => debug!("surface timeout; retrying next frame"),
            LifecycleAction::Exit => elwt.exit(),
            LifecycleAction::Nothing => {}
        }
        Ok(())
    }

    fn create_gpu(&mut self, elwt: &EventLoopWindowTarget<()>) -> Result<()> {
        let (width, height) = self.config.window_size;
        let window = WindowBuilder::new()
            .with_title(self.config.title.clone())
            .with_inner_size(PhysicalSize::new(width, height))
            .build(elwt)
            .map_err(|err| anyhow!("failed to create window: {err}"))?;
        let window = Arc::new(window);
        let size = window.inner_size();

        let canvas = self.config.scene_image.as_deref().and_then(|path| {
            match load_scene_image(path, (size.width, size.height)) {
                Ok(canvas) => Some(canvas),
                Err(err) => {
                    warn!("{err:#}; starting with an empty scene");
                    None
                }
            }
        });

        let gpu = GpuState::new(window.clone(), self.config.gpu, canvas)?;
        let capabilities = gpu.capabilities();
        if !capabilities.compute && self.controls.options.effective(false) != self.controls.options {
            info!("compute variants requested; rendering with fragment passes instead");
        }

        self.gpu = Some(gpu);
        self.window = Some(window.clone());
        // The platform may hand back a different size than requested.
        let action = self.lifecycle.handle(LifecycleEvent::Resized {
            width: size.width,
            height: size.height,
        });
        self.apply(action, elwt)?;
        self.log_options();
        window.request_redraw();
        Ok(())
    }

    fn paint_pending_stroke(&mut self) {
        let Some(stroke) = self.pointer.take_stroke() else {
            return;
        };
        let (Some(gpu), Some(window)) = (self.gpu.as_mut(), self.window.as_ref()) else {
            return;
        };
        let screen = window.inner_size();
        let screen = Vec2::new(screen.width as f32, screen.height as f32);
        let (scene_width, scene_height) = gpu.scene_size();
        let texture = Vec2::new(scene_width as f32, scene_height as f32);

        let camera = &self.controls.camera;
        let Some(to) = camera.screen_to_texture(stroke.to, screen, texture) else {
            return;
        };
        let from = camera
            .screen_to_texture(stroke.from, screen, texture)
            .unwrap_or(to);

        let brush = self.controls.brush;
        let color = match stroke.mode {
            StrokeMode::Paint => brush.color,
            StrokeMode::Erase => EMPTY,
        };
        let points = stroke_points(from, to, brush.radius);
        gpu.paint_stroke(&points, brush.radius, color);
    }

    fn redraw(&mut self, elwt: &EventLoopWindowTarget<()>) -> Result<()> {
        if !self.lifecycle.can_render() {
            return Ok(());
        }
        let Some(gpu) = self.gpu.as_mut() else {
            return Ok(());
        };

        let camera = self.controls.camera.get_camera_uniform();
        match gpu.render(camera, &self.controls.options, self.frame) {
            Ok(FrameOutcome::Presented) => {
                let now = Instant::now();
                self.scheduler.mark_rendered(now);
                self.frame = self.frame.wrapping_add(1);
                if let Some(fps) = self.stats.record(now) {
                    debug!(
                        fps = fps.round(),
                        frame_count = self.stats.total_frames(),
                        show = %self.controls.options.show,
                        "render stats"
                    );
                }
            }
            Ok(FrameOutcome::NoSurface) => {}
            Err(err) => {
                let action = self
                    .lifecycle
                    .handle(LifecycleEvent::from_surface_error(&err));
                if action == LifecycleAction::Exit {
                    self.apply(action, elwt)?;
                    anyhow::bail!("GPU ran out of memory while acquiring a frame");
                }
                self.apply(action, elwt)?;
            }
        }
        Ok(())
    }

    fn schedule(&mut self, elwt: &EventLoopWindowTarget<()>) {
        let Some(window) = self.window.as_ref() else {
            elwt.set_control_flow(ControlFlow::Wait);
            return;
        };
        if !self.lifecycle.can_render() {
            tracing::trace!("scheduler: idle (no surface)");
            elwt.set_control_flow(ControlFlow::Wait);
            return;
        }

        let now = Instant::now();
        if self.scheduler.ready_for_frame(now) {
            tracing::trace!("scheduler: issuing redraw now");
            window.request_redraw();
            elwt.set_control_flow(ControlFlow::Wait);
        } else if let Some(deadline) = self.scheduler.next_deadline() {
            let ms = deadline.saturating_duration_since(now).as_millis();
            tracing::trace!(deadline_ms = ms, "scheduler: waiting until next frame");
            elwt.set_control_flow(ControlFlow::WaitUntil(deadline));
        } else {
            elwt.set_control_flow(ControlFlow::Wait);
        }
    }

    fn log_options(&self) {
        let options = self
            .controls
            .options
            .effective(self.gpu.as_ref().map_or(true, |gpu| gpu.capabilities().compute));
        info!(
            show = %options.show,
            jfa = %options.jfa.mode,
            jfa_passes = options.jfa.passes,
            radiance = %options.radiance.mode,
            rays = options.radiance.ray_count,
            max_steps = options.radiance.max_steps,
            noise = options.radiance.enable_noise,
            grain = options.radiance.show_grain,
            accumulate = options.radiance.accum_radiance,
            brush_radius = self.controls.brush.radius,
            "render options"
        );
    }
}
