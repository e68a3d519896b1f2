//! Core of `zu`, a paintable 2D scene lit by raymarched global illumination.
//!
//! The user paints emissive and occluding shapes into a scene texture; every
//! frame the GPU turns that scene into a distance field and marches rays
//! through it to gather light:
//!
//! ```text
//!   EngineConfig (CLI / config.toml / Android defaults)
//!          │
//!          ▼
//!   app::run_event_loop ──▶ SurfaceLifecycle ──▶ GpuState
//!          │                                        │
//!          │ pointer / keys                         ▼
//!          └──▶ Canvas ──upload──▶ seed ─▶ jump flood ─▶ distance field
//!                                                       │
//!                                       show ◀── radiance ◀┘
//! ```
//!
//! `app` owns the winit loop and is shared by the desktop binary and the
//! Android shell; everything GPU-facing lives under `gpu`. The remaining
//! modules are plain data and state machines that can be tested without a
//! device.

mod app;
pub mod brush;
pub mod camera;
pub mod config;
mod gpu;
pub mod input;
pub mod lifecycle;
pub mod runtime;
pub mod types;

pub use app::{run, run_event_loop};
pub use config::{ConfigError, ConfigFile};
pub use gpu::{FrameOutcome, GpuCapabilities, GpuState};
pub use types::{
    EngineConfig, GpuPowerPreference, GpuSettings, JfaMode, JfaOptions, RadianceMode,
    RadianceOptions, RenderOptions, ShowTarget, VsyncMode,
};

/// Re-exported so the Android shell can build its event loop against the
/// same winit version.
pub use winit;
