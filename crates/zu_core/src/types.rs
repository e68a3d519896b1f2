use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::brush::BrushSettings;

/// Adapter power preference forwarded to `wgpu`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GpuPowerPreference {
    /// Prefer integrated / battery friendly adapters.
    Low,
    /// Prefer discrete adapters.
    #[default]
    High,
}

/// Presentation pacing requested from the swapchain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum VsyncMode {
    /// Tear-free `Fifo` presentation.
    #[default]
    On,
    /// Lowest latency: Immediate, then Mailbox, then Fifo as a last resort.
    Off,
}

/// Which intermediate texture the show pass puts on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ShowTarget {
    /// The painted emitters and occluders.
    Scene,
    /// Nearest-seed coordinates produced by the jump flood.
    Jfa,
    /// Distance to the nearest seed.
    DistanceField,
    /// Final lit image.
    #[default]
    Radiance,
}

/// Jump-flood variant used to build the nearest-seed texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum JfaMode {
    /// One render pass per step.
    Fragment,
    /// One compute dispatch per step.
    #[default]
    Compute,
    /// Base-3 schedule with per-pixel jittered offsets.
    ComputeStar,
    /// Single approximate dispatch straight from the scene.
    ComputeOneShot,
}

/// Radiance pass implementation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RadianceMode {
    Fragment,
    #[default]
    Compute,
}

macro_rules! kebab_enum {
    ($ty:ident { $($variant:ident => $name:literal),+ $(,)? }) => {
        impl $ty {
            /// Every variant in cycling order.
            pub const ALL: &'static [$ty] = &[$($ty::$variant),+];

            /// Stable kebab-case name used by config files and the CLI.
            pub fn as_str(self) -> &'static str {
                match self {
                    $($ty::$variant => $name),+
                }
            }

            /// Returns the variant after `self`, wrapping around.
            pub fn next(self) -> Self {
                let index = Self::ALL
                    .iter()
                    .position(|candidate| *candidate == self)
                    .unwrap_or(0);
                Self::ALL[(index + 1) % Self::ALL.len()]
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = String;

            fn from_str(value: &str) -> Result<Self, Self::Err> {
                let normalised = value.trim().to_ascii_lowercase().replace('_', "-");
                Self::ALL
                    .iter()
                    .copied()
                    .find(|candidate| candidate.as_str() == normalised)
                    .ok_or_else(|| {
                        let expected: Vec<&str> = Self::ALL.iter().map(|v| v.as_str()).collect();
                        format!(
                            "invalid value '{value}' (expected one of: {})",
                            expected.join(", ")
                        )
                    })
            }
        }
    };
}

kebab_enum!(GpuPowerPreference { Low => "low", High => "high" });
kebab_enum!(VsyncMode { On => "on", Off => "off" });
kebab_enum!(ShowTarget {
    Scene => "scene",
    Jfa => "jfa",
    DistanceField => "distance-field",
    Radiance => "radiance",
});
kebab_enum!(JfaMode {
    Fragment => "fragment",
    Compute => "compute",
    ComputeStar => "compute-star",
    ComputeOneShot => "compute-one-shot",
});
kebab_enum!(RadianceMode { Fragment => "fragment", Compute => "compute" });

impl JfaMode {
    pub fn uses_compute(self) -> bool {
        !matches!(self, JfaMode::Fragment)
    }
}

/// Jump-flood settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JfaOptions {
    pub mode: JfaMode,
    /// Number of flood steps; `0` derives the count from the texture size.
    pub passes: u32,
}

impl Default for JfaOptions {
    fn default() -> Self {
        Self {
            mode: JfaMode::default(),
            passes: 0,
        }
    }
}

/// Raymarching settings for the radiance pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RadianceOptions {
    pub mode: RadianceMode,
    /// Rays cast per pixel.
    pub ray_count: u32,
    /// Sphere-tracing steps per ray.
    pub max_steps: u32,
    /// Average all rays when true, keep the brightest otherwise.
    pub accum_radiance: bool,
    /// Jitter ray angles with per-pixel noise.
    pub enable_noise: bool,
    /// Keep the noise pattern fixed between frames.
    pub show_grain: bool,
}

impl Default for RadianceOptions {
    fn default() -> Self {
        Self {
            mode: RadianceMode::default(),
            ray_count: 8,
            max_steps: 128,
            accum_radiance: true,
            enable_noise: true,
            show_grain: true,
        }
    }
}

/// Everything the render graph needs to know per frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RenderOptions {
    pub show: ShowTarget,
    pub jfa: JfaOptions,
    pub radiance: RadianceOptions,
}

impl RenderOptions {
    /// Replaces compute variants with their fragment counterparts when the
    /// adapter cannot run compute shaders.
    pub fn effective(&self, compute_supported: bool) -> RenderOptions {
        let mut options = *self;
        if !compute_supported {
            if options.jfa.mode.uses_compute() {
                options.jfa.mode = JfaMode::Fragment;
            }
            if options.radiance.mode == RadianceMode::Compute {
                options.radiance.mode = RadianceMode::Fragment;
            }
        }
        options
    }
}

/// Swapchain and adapter knobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GpuSettings {
    pub power: GpuPowerPreference,
    pub vsync: VsyncMode,
    /// Desired maximum frame latency, clamped to 1..=3 by the surface.
    pub latency: u32,
}

impl Default for GpuSettings {
    fn default() -> Self {
        Self {
            power: GpuPowerPreference::default(),
            vsync: VsyncMode::default(),
            latency: 2,
        }
    }
}

/// Immutable configuration passed to the engine at start-up.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Initial window size in physical pixels (ignored on Android).
    pub window_size: (u32, u32),
    pub title: String,
    pub gpu: GpuSettings,
    pub render: RenderOptions,
    pub brush: BrushSettings,
    /// Optional image used to seed the scene canvas.
    pub scene_image: Option<PathBuf>,
    /// Optional FPS cap; None = redraw as fast as presentation allows.
    pub target_fps: Option<f32>,
    /// How often render statistics are logged.
    pub stats_interval: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            window_size: (1280, 720),
            title: "zu".to_string(),
            gpu: GpuSettings::default(),
            render: RenderOptions::default(),
            brush: BrushSettings::default(),
            scene_image: None,
            target_fps: None,
            stats_interval: Duration::from_secs(1),
        }
    }
}
