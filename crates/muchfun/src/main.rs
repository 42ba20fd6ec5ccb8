//! MuchFun - haptic intensity mixer
//!
//! Drives a Buttplug device from a manual slider, the microphone level and
//! generated patterns.

mod app;
mod logging_setup;
mod window_context;

use anyhow::{Context, Result};
use app::App;
use muchfun_core::Settings;
use tracing::{info, warn};
use winit::event_loop::EventLoop;

fn main() -> Result<()> {
    // Settings first: they carry the log configuration
    let settings_path = Settings::default_path();
    let (settings, load_error) = match settings_path.as_deref() {
        Some(path) if path.exists() => match Settings::load_from(path) {
            Ok(settings) => (settings, None),
            Err(e) => (Settings::default(), Some(e)),
        },
        _ => (Settings::default(), None),
    };

    let log_handle = logging_setup::init(&settings.log, settings.verbose_logging)?;

    info!("==========================================");
    info!("===      MuchFun Session Started       ===");
    info!("==========================================");

    match (&settings_path, load_error) {
        (Some(path), Some(e)) => warn!(
            "Failed to load settings from {}: {}. Using defaults.",
            path.display(),
            e
        ),
        (Some(path), None) => info!("Settings file: {}", path.display()),
        (None, _) => warn!("No config directory available, settings will not persist"),
    }

    let mut app = App::new(settings, settings_path, log_handle)?;

    let event_loop = EventLoop::new().context("Failed to create event loop")?;
    let result = event_loop.run_app(&mut app);

    // Covers exits that bypass the window close path
    app.shutdown();
    info!("MuchFun exited");

    result.context("Event loop error")
}
