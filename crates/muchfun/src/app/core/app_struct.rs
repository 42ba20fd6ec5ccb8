//! Main application struct definition.

use crate::app::audio_input::AudioInput;
use crate::logging_setup::LogHandle;
use crate::window_context::WindowContext;
use muchfun_control::{ControllerStatus, DeviceController};
use muchfun_core::{IntensityMixer, Settings};
use muchfun_ui::MuchFunUi;
use std::path::PathBuf;
use std::time::Instant;

/// The main application state.
pub struct App {
    /// Main window, created once the event loop is running.
    pub window: Option<WindowContext>,
    /// The UI panels.
    pub ui: MuchFunUi,
    /// Merges manual, audio and pattern sources into device commands.
    pub mixer: IntensityMixer,
    /// Connection to the Buttplug server.
    pub controller: DeviceController,
    /// Microphone feeding the mixer's level cell.
    pub audio: AudioInput,
    /// Persistent settings, mixer section refreshed on save.
    pub settings: Settings,
    pub settings_path: Option<PathBuf>,
    pub log_handle: LogHandle,
    /// Last microphone failure, shown in the audio panel.
    pub audio_error: Option<String>,
    /// Status bar message.
    pub message: String,
    /// Controller status seen by the previous tick.
    pub last_status: ControllerStatus,
    /// Last update timestamp for delta time calculation.
    pub last_tick: Instant,
    pub next_frame: Instant,
    /// Set once shutdown ran, so it runs only once.
    pub shut_down: bool,
    /// Tokio runtime for the device client. Declared last so it outlives the controller.
    pub tokio_runtime: tokio::runtime::Runtime,
}
