use std::path::PathBuf;

use clap::{Parser, Subcommand};
use zu_core::{GpuPowerPreference, JfaMode, RadianceMode, ShowTarget, VsyncMode};

#[derive(Parser, Debug)]
#[command(
    name = "zu",
    author,
    version,
    about = "Paint light and shadow; watch it bounce"
)]
pub struct Cli {
    #[command(flatten)]
    pub run: RunArgs,
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Parser, Debug, Default)]
pub struct RunArgs {
    /// Configuration file (defaults to `config.toml` in the config directory).
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Initial window size (e.g. `1280x720`).
    #[arg(long, value_name = "WIDTHxHEIGHT", value_parser = parse_size)]
    pub size: Option<SurfaceSize>,

    /// Frame rate cap (0 = uncapped).
    #[arg(long, value_name = "FPS")]
    pub fps: Option<f32>,

    /// Present mode: `on` waits for vblank, `off` presents immediately when possible.
    #[arg(long, value_name = "on|off")]
    pub vsync: Option<VsyncMode>,

    /// Adapter preference: `low` or `high`.
    #[arg(long, value_name = "low|high")]
    pub gpu_power: Option<GpuPowerPreference>,

    /// Texture presented on screen: scene, jfa, distance-field or radiance.
    #[arg(long, value_name = "TARGET")]
    pub show: Option<ShowTarget>,

    /// Jump-flood variant: fragment, compute, compute-star or compute-one-shot.
    #[arg(long, value_name = "MODE")]
    pub jfa_mode: Option<JfaMode>,

    /// Jump-flood step count (0 = derived from the window size).
    #[arg(long, value_name = "N")]
    pub jfa_passes: Option<u32>,

    /// Radiance variant: fragment or compute.
    #[arg(long, value_name = "MODE")]
    pub radiance_mode: Option<RadianceMode>,

    /// Rays cast per pixel.
    #[arg(long, value_name = "N")]
    pub rays: Option<u32>,

    /// Raymarching steps per ray.
    #[arg(long, value_name = "N")]
    pub max_steps: Option<u32>,

    /// Disable per-pixel ray jitter.
    #[arg(long)]
    pub no_noise: bool,

    /// Image painted into the scene at start-up.
    #[arg(long, value_name = "PATH")]
    pub scene: Option<PathBuf>,

    /// Brush radius in pixels.
    #[arg(long, value_name = "PIXELS")]
    pub brush_radius: Option<u32>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Inspect configuration locations and defaults.
    Config(ConfigCommand),
}

#[derive(Parser, Debug)]
pub struct ConfigCommand {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Print the config directory and the file that would be loaded.
    Where,
    /// Print the default configuration as TOML.
    Default,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SurfaceSize {
    pub width: u32,
    pub height: u32,
}

pub fn parse() -> Cli {
    Cli::parse()
}

pub fn parse_size(spec: &str) -> Result<SurfaceSize, String> {
    let trimmed = spec.trim();
    let (width, height) = trimmed
        .split_once(['x', 'X', '×'])
        .ok_or_else(|| "expected WxH format, e.g. 1280x720".to_string())?;

    let width: u32 = width
        .trim()
        .parse()
        .map_err(|_| format!("invalid width in size '{trimmed}'"))?;
    let height: u32 = height
        .trim()
        .parse()
        .map_err(|_| format!("invalid height in size '{trimmed}'"))?;

    if width == 0 || height == 0 {
        return Err("window dimensions must be greater than zero".to_string());
    }

    Ok(SurfaceSize { width, height })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_size_accepts_common_separators() {
        assert_eq!(
            parse_size("1280x720"),
            Ok(SurfaceSize {
                width: 1280,
                height: 720
            })
        );
        assert_eq!(
            parse_size(" 800 X 600 "),
            Ok(SurfaceSize {
                width: 800,
                height: 600
            })
        );
    }

    #[test]
    fn parse_size_rejects_bad_input() {
        assert!(parse_size("1280").is_err());
        assert!(parse_size("0x720").is_err());
        assert!(parse_size("wide x tall").is_err());
    }

    #[test]
    fn render_flags_parse_into_engine_enums() {
        let cli = Cli::try_parse_from([
            "zu",
            "--show",
            "distance-field",
            "--jfa-mode",
            "compute_star",
            "--vsync",
            "off",
            "--no-noise",
        ])
        .unwrap();
        assert_eq!(cli.run.show, Some(ShowTarget::DistanceField));
        assert_eq!(cli.run.jfa_mode, Some(JfaMode::ComputeStar));
        assert_eq!(cli.run.vsync, Some(VsyncMode::Off));
        assert!(cli.run.no_noise);
        assert!(cli.command.is_none());
    }

    #[test]
    fn unknown_mode_is_rejected() {
        assert!(Cli::try_parse_from(["zu", "--radiance-mode", "sideways"]).is_err());
    }
}
