//! Output tick: mixer to device.

use crate::app::App;
use muchfun_control::ConnectionState;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Advance the mixer and forward its command, once per frame
pub fn update(app: &mut App) {
    let now = Instant::now();
    let dt = now.duration_since(app.last_tick).as_secs_f32();
    app.last_tick = now;

    track_connection(app);

    if app.controller.take_resend_request() {
        app.mixer.invalidate_last_sent();
    }

    let outcome = app.mixer.tick(dt, app.controller.can_send());
    let Some(command) = outcome.command else {
        return;
    };

    match app.controller.send(command) {
        Ok(true) => {}
        // Queue full; the next tick carries the newest value
        Ok(false) => app.mixer.invalidate_last_sent(),
        Err(e) => {
            debug!("Command not delivered: {}", e);
            app.mixer.invalidate_last_sent();
        }
    }
}

fn track_connection(app: &mut App) {
    let status = app.controller.status();
    if status == app.last_status {
        return;
    }

    if status.state != app.last_status.state {
        match &status.state {
            ConnectionState::Connected => info!("Connected to Buttplug server"),
            ConnectionState::Error(e) => warn!("Connection error: {}", e),
            ConnectionState::Disconnected
                if app.last_status.state == ConnectionState::Connected =>
            {
                info!("Disconnected from server")
            }
            _ => {}
        }
    }
    if status.device != app.last_status.device {
        match &status.device {
            Some(device) => info!(
                "Using device {} ({} scalar actuators)",
                device.name, device.scalar_actuators
            ),
            None => info!("No device selected"),
        }
    }

    let text = status.status_text();
    if text != app.last_status.status_text() {
        app.message = text;
    }
    app.last_status = status;
}
