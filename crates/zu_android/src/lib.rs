//! Android entry point.
//!
//! The GameActivity glue calls `android_main` on its own thread once the
//! activity starts. From there the shared event loop takes over; surface
//! loss on pause and re-creation on resume are handled by the engine's
//! lifecycle state machine.

use std::path::Path;

use zu_core::{ConfigFile, EngineConfig};

/// Phones redraw at display rate anyway; capping saves battery.
pub const ANDROID_TARGET_FPS: f32 = 60.0;
const CONFIG_FILE: &str = "config.toml";

/// Engine configuration for the device: Android defaults, then an optional
/// `config.toml` from the app's internal data directory.
pub fn android_config(data_dir: Option<&Path>) -> EngineConfig {
    let mut file = data_dir
        .map(|dir| dir.join(CONFIG_FILE))
        .filter(|path| path.exists())
        .and_then(|path| match ConfigFile::load(&path) {
            Ok(file) => {
                tracing::info!(path = %path.display(), "loaded config");
                Some(file)
            }
            Err(err) => {
                tracing::warn!(path = %path.display(), "ignoring config: {err}");
                None
            }
        })
        .unwrap_or_default();
    file.runtime.target_fps.get_or_insert(ANDROID_TARGET_FPS);
    file.into_engine_config()
}

#[cfg(target_os = "android")]
#[no_mangle]
fn android_main(app: winit::platform::android::activity::AndroidApp) {
    use winit::event_loop::EventLoopBuilder;
    use winit::platform::android::EventLoopBuilderExtAndroid;

    android_logger::init_once(
        android_logger::Config::default()
            .with_max_level(log::LevelFilter::Info)
            .with_tag("zu_engine"),
    );

    let config = android_config(app.internal_data_path().as_deref());
    let event_loop = match EventLoopBuilder::new().with_android_app(app).build() {
        Ok(event_loop) => event_loop,
        Err(err) => {
            tracing::error!("failed to create event loop: {err}");
            return;
        }
    };
    if let Err(err) = zu_core::run_event_loop(event_loop, config) {
        tracing::error!("zu exited with an error: {err:#}");
    }
}
