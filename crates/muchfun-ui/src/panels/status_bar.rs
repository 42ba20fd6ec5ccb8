use crate::theme::colors;
use crate::UiSnapshot;
use egui::{RichText, Ui};

#[derive(Default)]
pub struct StatusBar;

impl StatusBar {
    pub fn show(&mut self, ui: &mut Ui, snapshot: &UiSnapshot<'_>) {
        ui.horizontal(|ui| {
            if snapshot.stopped {
                ui.label(
                    RichText::new("EMERGENCY STOP ACTIVATED")
                        .color(colors::ERROR_COLOR)
                        .strong(),
                );
            } else {
                ui.label(snapshot.message);
            }

            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                ui.label(
                    RichText::new(format!("Output {}", snapshot.levels.output))
                        .monospace()
                        .color(colors::ACCENT),
                );
                ui.separator();
                ui.label(snapshot.status.status_text());
            });
        });
    }
}
