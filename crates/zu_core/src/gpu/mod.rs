//! GPU side of the engine.
//!
//! - `context` owns the wgpu instance, adapter and device, and builds a
//!   `PresentationSurface` for each native window the platform hands over.
//! - `textures` holds the full-resolution render targets plus the CPU copy
//!   of the painted scene.
//! - `passes` implements each stage of the frame graph; `graph` wires them in
//!   order and picks which texture gets shown.
//! - `uniforms` stages per-pass parameters through a reusable staging belt
//!   and the command encoder so that every pass recorded into one frame sees
//!   its own values.
//! - `state` glues everything together behind the `GpuState` API used by
//!   `app`.

mod context;
mod graph;
mod passes;
mod pipeline;
mod quad;
mod shaders;
mod state;
mod textures;
mod uniforms;

pub use context::GpuCapabilities;
pub use state::{FrameOutcome, GpuState};
pub(crate) use textures::load_scene_image;
