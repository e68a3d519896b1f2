//! Presentation surface lifecycle.
//!
//! Android tears the native window down every time the activity is paused, so
//! the swapchain has to be dropped on `Suspended` and rebuilt on `Resumed`
//! while the device, pipelines and scene textures stay alive. Desktop
//! windows go through the same machine; minimising reports a zero-sized
//! surface which cannot be configured.
//!
//! ```text
//!   Uninitialized ──Resumed──▶ Active ◀──resize(w,h > 0)── Minimized
//!                                │  ▲                          ▲
//!                       Suspended│  │Resumed                   │resize(0)
//!                                ▼  │                          │
//!                             Suspended                     Active
//! ```

use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfacePhase {
    /// No window or device yet.
    Uninitialized,
    /// Surface configured; frames may be rendered.
    Active,
    /// Surface exists but has a zero dimension.
    Minimized,
    /// Surface destroyed by the platform; device retained.
    Suspended,
    Exiting,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleEvent {
    Resumed,
    Suspended,
    Resized { width: u32, height: u32 },
    SurfaceLost,
    SurfaceOutdated,
    SurfaceTimeout,
    OutOfMemory,
    CloseRequested,
}

impl LifecycleEvent {
    /// Event for a failed frame acquisition. Unknown errors are retried on
    /// the next frame.
    pub fn from_surface_error(err: &wgpu::SurfaceError) -> Self {
        match err {
            wgpu::SurfaceError::Lost => Self::SurfaceLost,
            wgpu::SurfaceError::Outdated => Self::SurfaceOutdated,
            wgpu::SurfaceError::OutOfMemory => Self::OutOfMemory,
            wgpu::SurfaceError::Timeout => Self::SurfaceTimeout,
            other => {
                warn!("surface error: {other:?}; retrying next frame");
                Self::SurfaceTimeout
            }
        }
    }
}

/// What the driver must do in response to an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleAction {
    /// Create the window, device and first surface.
    CreateGpu,
    /// Re-create the surface for the existing device.
    AttachSurface,
    /// Drop the surface, keep the device.
    DetachSurface,
    /// Configure the surface at the given size.
    Reconfigure { width: u32, height: u32 },
    SkipFrame,
    Exit,
    Nothing,
}

#[derive(Debug, Clone)]
pub struct SurfaceLifecycle {
    phase: SurfacePhase,
    size: (u32, u32),
}

impl SurfaceLifecycle {
    pub fn new(initial_size: (u32, u32)) -> Self {
        Self {
            phase: SurfacePhase::Uninitialized,
            size: initial_size,
        }
    }

    pub fn phase(&self) -> SurfacePhase {
        self.phase
    }

    /// Last size reported by the platform.
    pub fn size(&self) -> (u32, u32) {
        self.size
    }

    pub fn can_render(&self) -> bool {
        self.phase == SurfacePhase::Active
    }

    pub fn handle(&mut self, event: LifecycleEvent) -> LifecycleAction {
        let previous = self.phase;
        let action = self.transition(event);
        if previous != self.phase {
            debug!(?previous, phase = ?self.phase, ?event, "surface lifecycle transition");
        }
        action
    }

    fn transition(&mut self, event: LifecycleEvent) -> LifecycleAction {
        use LifecycleAction as Action;
        use SurfacePhase as Phase;

        if self.phase == Phase::Exiting {
            return Action::Nothing;
        }

        match event {
            LifecycleEvent::CloseRequested => {
                self.phase = Phase::Exiting;
                Action::Exit
            }
            LifecycleEvent::OutOfMemory => {
                warn!("surface out of memory; exiting");
                self.phase = Phase::Exiting;
                Action::Exit
            }
            LifecycleEvent::Resumed => match self.phase {
                Phase::Uninitialized => {
                    self.phase = self.visible_phase();
                    Action::CreateGpu
                }
                Phase::Suspended => {
                    self.phase = self.visible_phase();
                    Action::AttachSurface
                }
                _ => Action::Nothing,
            },
            LifecycleEvent::Suspended => match self.phase {
                Phase::Active | Phase::Minimized => {
                    self.phase = Phase::Suspended;
                    Action::DetachSurface
                }
                _ => Action::Nothing,
            },
            LifecycleEvent::Resized { width, height } => {
                self.size = (width, height);
                match self.phase {
                    Phase::Active | Phase::Minimized => {
                        self.phase = self.visible_phase();
                        if self.phase == Phase::Active {
                            Action::Reconfigure { width, height }
                        } else {
                            Action::Nothing
                        }
                    }
                    _ => Action::Nothing,
                }
            }
            LifecycleEvent::SurfaceLost | LifecycleEvent::SurfaceOutdated => {
                if self.phase == Phase::Active {
                    Action::Reconfigure {
                        width: self.size.0,
                        height: self.size.1,
                    }
                } else {
                    Action::Nothing
                }
            }
            LifecycleEvent::SurfaceTimeout => Action::SkipFrame,
        }
    }

    fn visible_phase(&self) -> SurfacePhase {
        if self.size.0 == 0 || self.size.1 == 0 {
            SurfacePhase::Minimized
        } else {
            SurfacePhase::Active
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn active() -> SurfaceLifecycle {
        let mut lifecycle = SurfaceLifecycle::new((640, 480));
        assert_eq!(
            lifecycle.handle(LifecycleEvent::Resumed),
            LifecycleAction::CreateGpu
        );
        lifecycle
    }

    #[test]
    fn first_resume_creates_gpu() {
        let lifecycle = active();
        assert_eq!(lifecycle.phase(), SurfacePhase::Active);
        assert!(lifecycle.can_render());
    }

    #[test]
    fn suspend_and_resume_recreate_only_the_surface() {
        let mut lifecycle = active();
        assert_eq!(
            lifecycle.handle(LifecycleEvent::Suspended),
            LifecycleAction::DetachSurface
        );
        assert!(!lifecycle.can_render());
        assert_eq!(
            lifecycle.handle(LifecycleEvent::Suspended),
            LifecycleAction::Nothing
        );
        assert_eq!(
            lifecycle.handle(LifecycleEvent::Resumed),
            LifecycleAction::AttachSurface
        );
        assert_eq!(lifecycle.phase(), SurfacePhase::Active);
        assert_eq!(
            lifecycle.handle(LifecycleEvent::Resumed),
            LifecycleAction::Nothing
        );
    }

    #[test]
    fn resize_while_suspended_is_remembered() {
        let mut lifecycle = active();
        lifecycle.handle(LifecycleEvent::Suspended);
        assert_eq!(
            lifecycle.handle(LifecycleEvent::Resized {
                width: 1080,
                height: 2400
            }),
            LifecycleAction::Nothing
        );
        lifecycle.handle(LifecycleEvent::Resumed);
        assert_eq!(lifecycle.size(), (1080, 2400));
        assert_eq!(
            lifecycle.handle(LifecycleEvent::SurfaceOutdated),
            LifecycleAction::Reconfigure {
                width: 1080,
                height: 2400
            }
        );
    }

    #[test]
    fn zero_size_minimises_until_restored() {
        let mut lifecycle = active();
        assert_eq!(
            lifecycle.handle(LifecycleEvent::Resized {
                width: 0,
                height: 480
            }),
            LifecycleAction::Nothing
        );
        assert_eq!(lifecycle.phase(), SurfacePhase::Minimized);
        assert!(!lifecycle.can_render());
        assert_eq!(
            lifecycle.handle(LifecycleEvent::SurfaceLost),
            LifecycleAction::Nothing
        );
        assert_eq!(
            lifecycle.handle(LifecycleEvent::Resized {
                width: 800,
                height: 600
            }),
            LifecycleAction::Reconfigure {
                width: 800,
                height: 600
            }
        );
        assert!(lifecycle.can_render());
    }

    #[test]
    fn resume_with_zero_size_stays_minimised() {
        let mut lifecycle = SurfaceLifecycle::new((0, 0));
        assert_eq!(
            lifecycle.handle(LifecycleEvent::Resumed),
            LifecycleAction::CreateGpu
        );
        assert_eq!(lifecycle.phase(), SurfacePhase::Minimized);
    }

    #[test]
    fn surface_errors_map_to_actions() {
        let mut lifecycle = active();
        assert_eq!(
            lifecycle.handle(LifecycleEvent::SurfaceLost),
            LifecycleAction::Reconfigure {
                width: 640,
                height: 480
            }
        );
        assert_eq!(
            lifecycle.handle(LifecycleEvent::SurfaceTimeout),
            LifecycleAction::SkipFrame
        );
        assert_eq!(
            lifecycle.handle(LifecycleEvent::OutOfMemory),
            LifecycleAction::Exit
        );
        assert_eq!(lifecycle.phase(), SurfacePhase::Exiting);
        assert_eq!(
            lifecycle.handle(LifecycleEvent::Resumed),
            LifecycleAction::Nothing
        );
    }

    #[test]
    fn acquire_errors_become_events() {
        let cases = [
            (wgpu::SurfaceError::Lost, LifecycleEvent::SurfaceLost),
            (wgpu::SurfaceError::Outdated, LifecycleEvent::SurfaceOutdated),
            (wgpu::SurfaceError::OutOfMemory, LifecycleEvent::OutOfMemory),
            (wgpu::SurfaceError::Timeout, LifecycleEvent::SurfaceTimeout),
            (wgpu::SurfaceError::Other, LifecycleEvent::SurfaceTimeout),
        ];
        for (err, event) in cases {
            assert_eq!(LifecycleEvent::from_surface_error(&err), event, "{err:?}");
        }

        let mut lifecycle = active();
        let event = LifecycleEvent::from_surface_error(&wgpu::SurfaceError::Other);
        assert_eq!(lifecycle.handle(event), LifecycleAction::SkipFrame);
        assert!(lifecycle.can_render());
    }

    #[test]
    fn resize_while_active_reconfigures() {
        let mut lifecycle = active();
        assert_eq!(
            lifecycle.handle(LifecycleEvent::Resized {
                width: 800,
                height: 600
            }),
            LifecycleAction::Reconfigure {
                width: 800,
                height: 600
            }
        );
        assert_eq!(lifecycle.phase(), SurfacePhase::Active);
        assert_eq!(lifecycle.size(), (800, 600));
    }

    #[test]
    fn resize_before_first_resume_only_records_size() {
        let mut lifecycle = SurfaceLifecycle::new((640, 480));
        assert_eq!(
            lifecycle.handle(LifecycleEvent::Resized {
                width: 1024,
                height: 768
            }),
            LifecycleAction::Nothing
        );
        assert_eq!(lifecycle.phase(), SurfacePhase::Uninitialized);
        assert_eq!(lifecycle.size(), (1024, 768));
        assert_eq!(
            lifecycle.handle(LifecycleEvent::Resumed),
            LifecycleAction::CreateGpu
        );
        assert_eq!(lifecycle.phase(), SurfacePhase::Active);
    }

    #[test]
    fn close_exits_from_any_phase() {
        let mut lifecycle = SurfaceLifecycle::new((10, 10));
        assert_eq!(
            lifecycle.handle(LifecycleEvent::CloseRequested),
            LifecycleAction::Exit
        );
        assert_eq!(
            lifecycle.handle(LifecycleEvent::CloseRequested),
            LifecycleAction::Nothing
        );
    }
}
