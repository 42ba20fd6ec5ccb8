//! Applies UI actions to the mixer, controller and settings.

use super::core::controller_config;
use super::App;
use muchfun_core::is_websocket_url;
use muchfun_ui::UiAction;
use tracing::{debug, error, info, warn};

/// Handle a single UI action
pub fn handle(app: &mut App, action: UiAction) {
    debug!(?action, "UI action");
    match action {
        UiAction::Connect => {
            app.controller.update_config(controller_config(&app.settings));
            app.controller.connect();
            app.message = format!("Connecting to {}...", app.settings.server_address);
        }
        UiAction::Disconnect => {
            app.controller.disconnect();
            app.message = "Disconnected".to_string();
        }
        UiAction::ScanDevices => match app.controller.start_scanning() {
            Ok(()) => app.message = "Scanning for devices...".to_string(),
            Err(e) => {
                warn!("Scan request failed: {}", e);
                app.message = format!("Scan failed: {}", e);
            }
        },
        UiAction::SetServerAddress(address) => {
            let address = address.trim().to_string();
            if is_websocket_url(&address) {
                if address != app.settings.server_address {
                    info!("Server address set to {}", address);
                    app.settings.server_address = address;
                }
            } else {
                app.message = format!("Invalid server address: {}", address);
            }
        }

        UiAction::SetManual(level) => app.mixer.set_manual(level),
        UiAction::SetAudioEnabled(enabled) => set_audio_enabled(app, enabled),
        UiAction::SetAudioSettings(audio) => app.mixer.set_audio_settings(audio),
        UiAction::SetSmoothing(smoothing) => app.mixer.set_smoothing(smoothing),
        UiAction::ApplySmoothingPreset(preset) => {
            app.mixer.set_smoothing(preset.config());
            app.message = format!("Applied {} smoothing", preset);
        }
        UiAction::SetPatternEnabled(enabled) => {
            if !app.mixer.set_pattern_enabled(enabled) {
                app.message = "Re-arm before enabling the pattern".to_string();
            }
        }
        UiAction::SetPatternSettings(pattern) => app.mixer.set_pattern_settings(pattern),

        UiAction::SetBlendMode(mode) => {
            info!("Blend mode: {}", mode);
            app.mixer.set_blend_mode(mode);
        }
        UiAction::SetOutputRate(rate) => app.mixer.set_output_rate(rate),
        UiAction::SetChangeThreshold(threshold) => app.mixer.set_change_threshold(threshold),

        UiAction::EmergencyStop => emergency_stop(app),
        UiAction::Rearm => {
            app.mixer.rearm();
            app.message = "Re-armed".to_string();
        }

        UiAction::SetVerboseLogging(verbose) => {
            app.settings.verbose_logging = verbose;
            app.log_handle.set_verbose(verbose);
        }
        UiAction::SaveSettings => match app.save_settings() {
            Ok(()) => app.message = "Settings saved".to_string(),
            Err(e) => {
                error!("{:#}", e);
                app.message = format!("{:#}", e);
            }
        },
    }
}

fn set_audio_enabled(app: &mut App, enabled: bool) {
    if !enabled {
        app.mixer.set_audio_enabled(false);
        app.audio.stop();
        return;
    }

    if !app.mixer.set_audio_enabled(true) {
        app.message = "Re-arm before enabling audio".to_string();
        return;
    }

    match app.audio.start(app.mixer.level_cell()) {
        Ok(()) => app.audio_error = None,
        Err(e) => {
            error!("Failed to start audio input: {}", e);
            app.mixer.set_audio_enabled(false);
            app.audio_error = Some(e.to_string());
        }
    }
}

/// Zero the output, stop the device and close the microphone.
///
/// Runs ahead of everything else queued for the device.
pub fn emergency_stop(app: &mut App) {
    let command = app.mixer.emergency_stop();
    match app.controller.send(command) {
        Ok(true) => {}
        Ok(false) => debug!("Emergency stop with no device connected"),
        Err(e) => warn!("Emergency stop not forwarded: {}", e),
    }
    app.audio.stop();
    app.message = "EMERGENCY STOP ACTIVATED".to_string();
}
