//! Manual intensity, emergency stop and source meters

use crate::theme::colors;
use crate::widgets::{custom, LevelMeter};
use crate::{UiAction, UiSnapshot};
use egui::{Color32, RichText, Ui};
use muchfun_core::Intensity;

#[derive(Default)]
pub struct ManualPanel;

impl ManualPanel {
    pub fn show(&mut self, ui: &mut Ui, snapshot: &UiSnapshot<'_>, actions: &mut Vec<UiAction>) {
        custom::render_header(ui, "Manual Control", colors::MANUAL);
        ui.add_space(4.0);

        // The mixer owns the value; emergency stop resets it
        let mut value = snapshot.manual.value();
        ui.add_enabled_ui(!snapshot.stopped, |ui| {
            ui.horizontal(|ui| {
                ui.label("Intensity");
                if custom::percent_slider(ui, &mut value, 100.0, 0.0).changed() {
                    actions.push(UiAction::SetManual(Intensity::new(value)));
                }
            });
        });

        ui.add_space(6.0);
        let stop = egui::Button::new(
            RichText::new("EMERGENCY STOP")
                .strong()
                .size(20.0)
                .color(Color32::WHITE),
        )
        .fill(colors::ERROR_COLOR)
        .min_size(egui::vec2(ui.available_width(), 44.0));
        if ui
            .add(stop)
            .on_hover_text("Stops the device immediately (Esc)")
            .clicked()
        {
            actions.push(UiAction::EmergencyStop);
        }

        if snapshot.stopped {
            ui.add_space(4.0);
            ui.horizontal(|ui| {
                ui.colored_label(colors::ERROR_COLOR, RichText::new("STOPPED").strong());
                if custom::hold_to_action_button(ui, "Hold to re-arm", colors::OK_COLOR) {
                    actions.push(UiAction::Rearm);
                }
            });
        }

        ui.add_space(8.0);
        let levels = snapshot.levels;
        ui.add(LevelMeter::new("Manual", levels.manual.value(), colors::MANUAL));
        ui.add(
            LevelMeter::new("Audio", levels.audio.value(), colors::AUDIO)
                .active(snapshot.audio_enabled),
        );
        ui.add(
            LevelMeter::new("Pattern", levels.pattern.value(), colors::PATTERN)
                .active(snapshot.pattern_enabled),
        );
        ui.add(LevelMeter::new("Output", levels.output.value(), colors::ACCENT).height(26.0));
    }
}
