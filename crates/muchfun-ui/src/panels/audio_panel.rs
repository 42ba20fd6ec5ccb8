//! Audio Input Panel
//!
//! Enables the microphone source and edits how its level maps to intensity.

use crate::theme::colors;
use crate::widgets::{custom, LevelMeter};
use crate::{UiAction, UiSnapshot};
use egui::Ui;
use muchfun_core::AudioSettings;

#[derive(Default)]
pub struct AudioPanel;

impl AudioPanel {
    pub fn show(&mut self, ui: &mut Ui, snapshot: &UiSnapshot<'_>, actions: &mut Vec<UiAction>) {
        custom::render_header(ui, "Audio Input", colors::AUDIO);
        ui.add_space(4.0);

        let mut enabled = snapshot.audio_enabled;
        if ui
            .add_enabled(
                !snapshot.stopped,
                egui::Checkbox::new(&mut enabled, "Enable audio control"),
            )
            .changed()
        {
            actions.push(UiAction::SetAudioEnabled(enabled));
        }
        if let Some(error) = snapshot.audio_error {
            ui.colored_label(colors::ERROR_COLOR, error);
        }

        let defaults = AudioSettings::default();
        let mut settings = snapshot.config.audio;
        let mut changed = false;

        egui::Grid::new("audio_controls_grid")
            .num_columns(2)
            .spacing([8.0, 4.0])
            .show(ui, |ui| {
                ui.label("Sensitivity");
                changed |= custom::percent_slider(
                    ui,
                    &mut settings.sensitivity,
                    200.0,
                    defaults.sensitivity,
                )
                .changed();
                ui.end_row();

                ui.label("Noise floor");
                changed |= custom::percent_slider(
                    ui,
                    &mut settings.noise_floor,
                    20.0,
                    defaults.noise_floor,
                )
                .changed();
                ui.end_row();

                ui.label("Ceiling");
                changed |=
                    custom::percent_slider(ui, &mut settings.ceiling, 100.0, defaults.ceiling)
                        .changed();
                ui.end_row();
            });

        if changed {
            actions.push(UiAction::SetAudioSettings(settings));
        }

        ui.add_space(4.0);
        let levels = snapshot.levels;
        // Raw RMS scaled the same way the mixer does before smoothing
        ui.add(
            LevelMeter::new(
                "Input",
                settings.target(levels.audio_raw),
                colors::AUDIO.linear_multiply(0.6),
            )
            .active(snapshot.audio_enabled)
            .height(14.0),
        );
        ui.add(
            LevelMeter::new("Smoothed", levels.audio.value(), colors::AUDIO)
                .active(snapshot.audio_enabled),
        );
    }
}
