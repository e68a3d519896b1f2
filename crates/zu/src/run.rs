use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;
use zu_core::{ConfigFile, EngineConfig};

use crate::cli::{Cli, Command, ConfigAction, RunArgs};
use crate::paths::AppPaths;

pub fn run(cli: Cli) -> Result<()> {
    if let Some(Command::Config(command)) = cli.command {
        return config_command(command.action, &AppPaths::discover()?);
    }

    initialise_tracing();
    let config = resolve_config(&cli.run, default_config_file)?;
    zu_core::run(config)
}

fn default_config_file() -> Result<PathBuf> {
    let paths = AppPaths::discover()?;
    tracing::debug!(config = %paths.config_dir().display(), "resolved zu paths");
    Ok(paths.config_file())
}

fn initialise_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn config_command(action: ConfigAction, paths: &AppPaths) -> Result<()> {
    match action {
        ConfigAction::Where => {
            let file = paths.config_file();
            println!("config dir:  {}", paths.config_dir().display());
            println!(
                "config file: {} ({})",
                file.display(),
                if file.exists() { "present" } else { "missing" }
            );
        }
        ConfigAction::Default => {
            print!("{}", ConfigFile::default().to_toml_string()?);
        }
    }
    Ok(())
}

/// Defaults, then the config file, then command-line flags.
///
/// `default_file` is only consulted when no `--config` was given.
fn resolve_config(
    args: &RunArgs,
    default_file: impl FnOnce() -> Result<PathBuf>,
) -> Result<EngineConfig> {
    let mut file = match args.config.as_ref() {
        Some(path) => ConfigFile::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => {
            let path = default_file()?;
            if path.exists() {
                tracing::info!(path = %path.display(), "loading config");
                ConfigFile::load(&path)
                    .with_context(|| format!("failed to load config {}", path.display()))?
            } else {
                ConfigFile::default()
            }
        }
    };

    apply_overrides(&mut file, args);
    file.validate().context("command-line overrides are invalid")?;
    Ok(file.into_engine_config())
}

fn apply_overrides(file: &mut ConfigFile, args: &RunArgs) {
    if let Some(size) = args.size {
        file.window.width = size.width;
        file.window.height = size.height;
    }
    if let Some(fps) = args.fps {
        file.runtime.target_fps = Some(fps);
    }
    if let Some(vsync) = args.vsync {
        file.gpu.vsync = vsync;
    }
    if let Some(power) = args.gpu_power {
        file.gpu.power = power;
    }
    if let Some(show) = args.show {
        file.render.show = show;
    }
    if let Some(mode) = args.jfa_mode {
        file.render.jfa.mode = mode;
    }
    if let Some(passes) = args.jfa_passes {
        file.render.jfa.passes = passes;
    }
    if let Some(mode) = args.radiance_mode {
        file.render.radiance.mode = mode;
    }
    if let Some(rays) = args.rays {
        file.render.radiance.ray_count = rays;
    }
    if let Some(steps) = args.max_steps {
        file.render.radiance.max_steps = steps;
    }
    if args.no_noise {
        file.render.radiance.enable_noise = false;
    }
    if let Some(scene) = args.scene.as_ref() {
        file.scene.image = Some(scene.clone());
    }
    if let Some(radius) = args.brush_radius {
        file.brush.radius = radius;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::SurfaceSize;
    use std::fs;
    use tempfile::TempDir;
    use zu_core::{JfaMode, ShowTarget};

    #[test]
    fn flags_override_file_values() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("custom.toml");
        fs::write(
            &path,
            "[render]\nshow = \"scene\"\n[render.radiance]\nray_count = 4\n",
        )
        .unwrap();

        let args = RunArgs {
            config: Some(path),
            size: Some(SurfaceSize {
                width: 640,
                height: 480,
            }),
            jfa_mode: Some(JfaMode::Fragment),
            rays: Some(16),
            no_noise: true,
            ..RunArgs::default()
        };
        let config = resolve_config(&args, || {
            anyhow::bail!("config directory must not be resolved with --config")
        })
        .unwrap();
        assert_eq!(config.window_size, (640, 480));
        assert_eq!(config.render.show, ShowTarget::Scene);
        assert_eq!(config.render.jfa.mode, JfaMode::Fragment);
        assert_eq!(config.render.radiance.ray_count, 16);
        assert!(!config.render.radiance.enable_noise);
    }

    #[test]
    fn default_file_is_used_without_explicit_config() {
        let dir = TempDir::new().unwrap();
        let paths = AppPaths::from_raw(dir.path().to_path_buf());
        fs::write(paths.config_file(), "[render.radiance]\nray_count = 8\n").unwrap();

        let config = resolve_config(&RunArgs::default(), || Ok(paths.config_file())).unwrap();
        assert_eq!(config.render.radiance.ray_count, 8);

        let missing = dir.path().join("missing.toml");
        let config = resolve_config(&RunArgs::default(), || Ok(missing)).unwrap();
        assert_eq!(config, ConfigFile::default().into_engine_config());
    }

    #[test]
    fn invalid_override_is_reported() {
        let mut file = ConfigFile::default();
        let args = RunArgs {
            jfa_passes: Some(99),
            ..RunArgs::default()
        };
        apply_overrides(&mut file, &args);
        let err = file.validate().unwrap_err();
        assert!(err.to_string().contains("render.jfa.passes"), "{err}");
    }

    #[test]
    fn zero_fps_flag_means_uncapped() {
        let mut file = ConfigFile::default();
        let args = RunArgs {
            fps: Some(0.0),
            ..RunArgs::default()
        };
        apply_overrides(&mut file, &args);
        assert_eq!(file.into_engine_config().target_fps, None);
    }
}
