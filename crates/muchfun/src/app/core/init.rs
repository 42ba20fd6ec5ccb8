use super::App;
use crate::app::audio_input::AudioInput;
use crate::logging_setup::LogHandle;
use anyhow::{Context, Result};
use muchfun_control::{ControllerConfig, ControllerStatus, DeviceController};
use muchfun_core::{IntensityMixer, LevelCell, Settings};
use muchfun_ui::MuchFunUi;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{error, info};

/// How long shutdown waits for the device client to stop the device
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(2);

/// Controller settings derived from the user settings
pub fn controller_config(settings: &Settings) -> ControllerConfig {
    ControllerConfig {
        address: settings.server_address.clone(),
        client_name: settings.client_name.clone(),
        ..ControllerConfig::default()
    }
}

impl App {
    /// Creates a new `App`. The window is created later, in `resumed`.
    pub fn new(
        settings: Settings,
        settings_path: Option<PathBuf>,
        log_handle: LogHandle,
    ) -> Result<Self> {
        let tokio_runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .thread_name("muchfun-client")
            .enable_all()
            .build()
            .context("Failed to create Tokio runtime")?;

        let mut controller =
            DeviceController::new(tokio_runtime.handle().clone(), controller_config(&settings));
        let mixer = IntensityMixer::new(settings.mixer.clone(), LevelCell::new());

        let message = if settings.auto_connect {
            info!("Auto-connecting to {}", settings.server_address);
            controller.connect();
            format!("Connecting to {}...", settings.server_address)
        } else {
            "Ready".to_string()
        };

        let now = Instant::now();
        Ok(Self {
            window: None,
            ui: MuchFunUi::new(),
            mixer,
            controller,
            audio: AudioInput::new(),
            settings,
            settings_path,
            log_handle,
            audio_error: None,
            message,
            last_status: ControllerStatus::default(),
            last_tick: now,
            next_frame: now,
            shut_down: false,
            tokio_runtime,
        })
    }

    /// Write the settings, including the current mixer configuration
    pub fn save_settings(&mut self) -> Result<()> {
        self.settings.mixer = self.mixer.config().clone();
        let saved = match &self.settings_path {
            Some(path) => self.settings.save_to(path),
            None => self.settings.save(),
        };
        saved.context("Failed to save settings")?;
        info!("Settings saved");
        Ok(())
    }

    /// Stop the device, close the connection and persist settings
    pub fn shutdown(&mut self) {
        if self.shut_down {
            return;
        }
        self.shut_down = true;
        info!("Shutting down");

        self.audio.stop();
        // Sends a final stop before closing
        self.controller.shutdown(SHUTDOWN_TIMEOUT);

        if let Err(e) = self.save_settings() {
            error!("{:#}", e);
        }
    }
}
