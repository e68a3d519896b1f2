//! TOML configuration file.
//!
//! Every section and key is optional; missing values fall back to
//! [`EngineConfig::default`]. Unknown keys are rejected so typos surface as
//! errors instead of silently doing nothing.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::de::{self, Deserializer};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};

use crate::brush::{BrushSettings, MAX_BRUSH_RADIUS};
use crate::input::MAX_RAY_COUNT;
use crate::types::{
    EngineConfig, GpuPowerPreference, GpuSettings, JfaMode, JfaOptions, RadianceMode,
    RadianceOptions, RenderOptions, ShowTarget, VsyncMode,
};

pub const MAX_JFA_PASSES: u32 = 16;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to serialise configuration: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigFile {
    pub window: WindowSection,
    pub gpu: GpuSection,
    pub render: RenderSection,
    pub brush: BrushSection,
    pub scene: SceneSection,
    pub runtime: RuntimeSection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WindowSection {
    pub width: u32,
    pub height: u32,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GpuSection {
    pub power: GpuPowerPreference,
    pub vsync: VsyncMode,
    pub latency: u32,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RenderSection {
    pub show: ShowTarget,
    pub jfa: JfaSection,
    pub radiance: RadianceSection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct JfaSection {
    pub mode: JfaMode,
    /// `0` derives the pass count from the surface size.
    pub passes: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RadianceSection {
    pub mode: RadianceMode,
    pub ray_count: u32,
    pub max_steps: u32,
    pub accum_radiance: bool,
    pub enable_noise: bool,
    pub show_grain: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BrushSection {
    pub radius: u32,
    pub color: [f32; 4],
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SceneSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RuntimeSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_fps: Option<f32>,
    #[serde(
        deserialize_with = "deserialize_duration",
        serialize_with = "serialize_duration"
    )]
    pub stats_interval: Duration,
}

impl Default for WindowSection {
    fn default() -> Self {
        let defaults = EngineConfig::default();
        Self {
            width: defaults.window_size.0,
            height: defaults.window_size.1,
            title: defaults.title,
        }
    }
}

impl Default for GpuSection {
    fn default() -> Self {
        let GpuSettings {
            power,
            vsync,
            latency,
        } = GpuSettings::default();
        Self {
            power,
            vsync,
            latency,
        }
    }
}

impl Default for JfaSection {
    fn default() -> Self {
        let JfaOptions { mode, passes } = JfaOptions::default();
        Self { mode, passes }
    }
}

impl Default for RadianceSection {
    fn default() -> Self {
        let defaults = RadianceOptions::default();
        Self {
            mode: defaults.mode,
            ray_count: defaults.ray_count,
            max_steps: defaults.max_steps,
            accum_radiance: defaults.accum_radiance,
            enable_noise: defaults.enable_noise,
            show_grain: defaults.show_grain,
        }
    }
}

impl Default for BrushSection {
    fn default() -> Self {
        let BrushSettings { radius, color } = BrushSettings::default();
        Self { radius, color }
    }
}

impl Default for RuntimeSection {
    fn default() -> Self {
        let defaults = EngineConfig::default();
        Self {
            target_fps: defaults.target_fps,
            stats_interval: defaults.stats_interval,
        }
    }
}

impl ConfigFile {
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let config: ConfigFile = toml::from_str(input)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and validates a config file. A relative scene image path is
    /// resolved against the file's directory.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::from_toml_str(&contents)?;
        if let (Some(image), Some(parent)) = (config.scene.image.as_ref(), path.parent()) {
            if image.is_relative() {
                config.scene.image = Some(parent.join(image));
            }
        }
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.window.width == 0 || self.window.height == 0 {
            return Err(ConfigError::Invalid(format!(
                "window size must be non-zero, got {}x{}",
                self.window.width, self.window.height
            )));
        }
        if !(1..=3).contains(&self.gpu.latency) {
            return Err(ConfigError::Invalid(format!(
                "gpu.latency must be between 1 and 3, got {}",
                self.gpu.latency
            )));
        }
        if self.render.jfa.passes > MAX_JFA_PASSES {
            return Err(ConfigError::Invalid(format!(
                "render.jfa.passes must be at most {MAX_JFA_PASSES}, got {}",
                self.render.jfa.passes
            )));
        }
        if !(1..=MAX_RAY_COUNT).contains(&self.render.radiance.ray_count) {
            return Err(ConfigError::Invalid(format!(
                "render.radiance.ray_count must be between 1 and {MAX_RAY_COUNT}, got {}",
                self.render.radiance.ray_count
            )));
        }
        if self.render.radiance.max_steps == 0 {
            return Err(ConfigError::Invalid(
                "render.radiance.max_steps must be at least 1".into(),
            ));
        }
        if self.brush.radius > MAX_BRUSH_RADIUS {
            return Err(ConfigError::Invalid(format!(
                "brush.radius must be at most {MAX_BRUSH_RADIUS}, got {}",
                self.brush.radius
            )));
        }
        if self
            .brush
            .color
            .iter()
            .any(|component| !(0.0..=1.0).contains(component))
        {
            return Err(ConfigError::Invalid(format!(
                "brush.color components must be within 0..=1, got {:?}",
                self.brush.color
            )));
        }
        if let Some(fps) = self.runtime.target_fps {
            if !fps.is_finite() || fps < 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "runtime.target_fps must be a non-negative number, got {fps}"
                )));
            }
        }
        Ok(())
    }

    pub fn into_engine_config(self) -> EngineConfig {
        let radiance = self.render.radiance;
        EngineConfig {
            window_size: (self.window.width, self.window.height),
            title: self.window.title,
            gpu: GpuSettings {
                power: self.gpu.power,
                vsync: self.gpu.vsync,
                latency: self.gpu.latency,
            },
            render: RenderOptions {
                show: self.render.show,
                jfa: JfaOptions {
                    mode: self.render.jfa.mode,
                    passes: self.render.jfa.passes,
                },
                radiance: RadianceOptions {
                    mode: radiance.mode,
                    ray_count: radiance.ray_count,
                    max_steps: radiance.max_steps,
                    accum_radiance: radiance.accum_radiance,
                    enable_noise: radiance.enable_noise,
                    show_grain: radiance.show_grain,
                },
            },
            brush: BrushSettings {
                radius: self.brush.radius,
                color: self.brush.color,
            },
            scene_image: self.scene.image,
            target_fps: self.runtime.target_fps.filter(|fps| *fps > 0.0),
            stats_interval: self.runtime.stats_interval,
        }
    }
}

fn serialize_duration<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&humantime::format_duration(*duration).to_string())
}

fn deserialize_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    struct Visitor;
    impl<'de> de::Visitor<'de> for Visitor {
        type Value = Duration;

        fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
            formatter.write_str("a duration as number of seconds or human-readable string")
        }

        fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            humantime::parse_duration(v)
                .map_err(|err| E::custom(format!("invalid duration '{v}': {err}")))
        }

        fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            u64::try_from(v)
                .map(Duration::from_secs)
                .map_err(|_| E::custom("duration must be non-negative"))
        }

        fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Duration::from_secs(v))
        }

        fn visit_f64<E>(self, v: f64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            if v.is_nan() || v.is_sign_negative() || v.is_infinite() {
                return Err(E::custom("duration must be non-negative"));
            }
            Ok(Duration::from_secs_f64(v))
        }
    }

    deserializer.deserialize_any(Visitor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_file_yields_engine_defaults() {
        let config = ConfigFile::from_toml_str("").unwrap();
        assert_eq!(config.into_engine_config(), EngineConfig::default());
    }

    #[test]
    fn parses_every_section() {
        let config = ConfigFile::from_toml_str(
            r#"
            [window]
            width = 800
            height = 600
            title = "sandbox"

            [gpu]
            power = "low"
            vsync = "off"
            latency = 1

            [render]
            show = "distance-field"

            [render.jfa]
            mode = "compute-star"
            passes = 11

            [render.radiance]
            mode = "fragment"
            ray_count = 32
            max_steps = 64
            show_grain = false

            [brush]
            radius = 4
            color = [0.0, 0.5, 1.0, 1.0]

            [scene]
            image = "/tmp/scene.png"

            [runtime]
            target_fps = 30
            stats_interval = "500ms"
            "#,
        )
        .unwrap()
        .into_engine_config();

        assert_eq!(config.window_size, (800, 600));
        assert_eq!(config.title, "sandbox");
        assert_eq!(config.gpu.power, GpuPowerPreference::Low);
        assert_eq!(config.gpu.vsync, VsyncMode::Off);
        assert_eq!(config.render.show, ShowTarget::DistanceField);
        assert_eq!(config.render.jfa.mode, JfaMode::ComputeStar);
        assert_eq!(config.render.jfa.passes, 11);
        assert_eq!(config.render.radiance.mode, RadianceMode::Fragment);
        assert_eq!(config.render.radiance.ray_count, 32);
        assert!(!config.render.radiance.show_grain);
        assert!(config.render.radiance.enable_noise);
        assert_eq!(config.brush.radius, 4);
        assert_eq!(config.scene_image, Some(PathBuf::from("/tmp/scene.png")));
        assert_eq!(config.target_fps, Some(30.0));
        assert_eq!(config.stats_interval, Duration::from_millis(500));
    }

    #[test]
    fn numeric_durations_are_seconds() {
        let config = ConfigFile::from_toml_str("[runtime]\nstats_interval = 3").unwrap();
        assert_eq!(config.runtime.stats_interval, Duration::from_secs(3));
        let config = ConfigFile::from_toml_str("[runtime]\nstats_interval = 0.25").unwrap();
        assert_eq!(config.runtime.stats_interval, Duration::from_millis(250));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = ConfigFile::from_toml_str("[render.radiance]\nrays = 4").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)), "{err}");
    }

    #[test]
    fn invalid_values_are_reported() {
        for input in [
            "[render.radiance]\nray_count = 0",
            "[render.radiance]\nray_count = 257",
            "[render.radiance]\nray_count = 3000000000",
            "[render.radiance]\nmax_steps = 0",
            "[render.jfa]\npasses = 17",
            "[gpu]\nlatency = 4",
            "[window]\nwidth = 0",
            "[brush]\nradius = 500",
            "[brush]\ncolor = [2.0, 0.0, 0.0, 1.0]",
            "[runtime]\ntarget_fps = -1.0",
        ] {
            let err = ConfigFile::from_toml_str(input).unwrap_err();
            assert!(matches!(err, ConfigError::Invalid(_)), "{input}: {err}");
        }
    }

    #[test]
    fn zero_fps_means_uncapped() {
        let config = ConfigFile::from_toml_str("[runtime]\ntarget_fps = 0.0")
            .unwrap()
            .into_engine_config();
        assert_eq!(config.target_fps, None);
    }

    #[test]
    fn default_file_round_trips() {
        let text = ConfigFile::default().to_toml_string().unwrap();
        assert!(text.contains("stats_interval = \"1s\""), "{text}");
        let parsed = ConfigFile::from_toml_str(&text).unwrap();
        assert_eq!(parsed, ConfigFile::default());
    }

    #[test]
    fn load_resolves_relative_scene_image() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let mut file = fs::File::create(&path).unwrap();
        writeln!(file, "[scene]\nimage = \"maps/room.png\"").unwrap();

        let config = ConfigFile::load(&path).unwrap();
        assert_eq!(config.scene.image, Some(dir.path().join("maps/room.png")));
    }

    #[test]
    fn load_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = ConfigFile::load(&dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
        assert!(err.to_string().contains("absent.toml"));
    }
}
