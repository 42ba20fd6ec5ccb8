//! Draws the UI and applies the resulting actions.

use crate::app::{actions, App};
use anyhow::Result;
use muchfun_ui::UiSnapshot;

pub fn render(app: &mut App) -> Result<()> {
    let Some(window) = app.window.as_mut() else {
        return Ok(());
    };

    let stats = app.controller.stats();
    let snapshot = UiSnapshot {
        status: &app.last_status,
        server_address: &app.settings.server_address,
        levels: app.mixer.levels(),
        manual: app.mixer.manual(),
        audio_enabled: app.mixer.audio_enabled(),
        pattern_enabled: app.mixer.pattern_enabled(),
        stopped: app.mixer.is_stopped(),
        config: app.mixer.config(),
        stats: &stats,
        verbose_logging: app.settings.verbose_logging,
        audio_error: app.audio_error.as_deref(),
        message: &app.message,
    };

    let ui = &mut app.ui;
    let mut ui_actions = Vec::new();
    // A discarded pass still carries the frame's input
    if !window.render(|ctx| ui_actions.extend(ui.show(ctx, &snapshot)))? {
        return Ok(());
    }

    for action in ui_actions {
        actions::handle(app, action);
    }
    Ok(())
}
