//! Output rate, blend mode, logging and statistics

use crate::theme::colors;
use crate::widgets::custom;
use crate::{UiAction, UiSnapshot};
use egui::Ui;
use muchfun_core::BlendMode;

#[derive(Default)]
pub struct SettingsPanel;

fn blend_description(mode: BlendMode) -> &'static str {
    match mode {
        BlendMode::Max => "Strongest source wins",
        BlendMode::Additive => "Sources add up, capped at 100%",
        BlendMode::Priority => "Pattern, then audio, then manual",
    }
}

impl SettingsPanel {
    pub fn show(&mut self, ui: &mut Ui, snapshot: &UiSnapshot<'_>, actions: &mut Vec<UiAction>) {
        custom::render_header(ui, "Output & Logging", colors::ACCENT);
        ui.add_space(4.0);

        let config = snapshot.config;

        egui::Grid::new("settings_grid")
            .num_columns(2)
            .spacing([8.0, 4.0])
            .show(ui, |ui| {
                ui.label("Blend mode");
                let mut mode = config.blend_mode;
                egui::ComboBox::from_id_salt("blend_mode")
                    .selected_text(mode.to_string())
                    .show_ui(ui, |ui| {
                        for candidate in BlendMode::ALL {
                            if ui
                                .selectable_value(&mut mode, candidate, candidate.to_string())
                                .on_hover_text(blend_description(candidate))
                                .changed()
                            {
                                actions.push(UiAction::SetBlendMode(mode));
                            }
                        }
                    });
                ui.end_row();

                ui.label("Output rate");
                let mut rate = config.output_rate_hz;
                if ui
                    .add(
                        egui::DragValue::new(&mut rate)
                            .range(1.0..=20.0)
                            .speed(0.1)
                            .suffix(" Hz"),
                    )
                    .changed()
                {
                    actions.push(UiAction::SetOutputRate(rate));
                }
                ui.end_row();

                ui.label("Change threshold");
                let mut threshold = config.change_threshold * 100.0;
                if ui
                    .add(
                        egui::DragValue::new(&mut threshold)
                            .range(0.1..=10.0)
                            .speed(0.05)
                            .suffix("%"),
                    )
                    .changed()
                {
                    actions.push(UiAction::SetChangeThreshold(threshold / 100.0));
                }
                ui.end_row();
            });

        let mut verbose = snapshot.verbose_logging;
        if ui
            .checkbox(&mut verbose, "Verbose logging")
            .on_hover_text("Switch the log level between INFO and DEBUG")
            .changed()
        {
            actions.push(UiAction::SetVerboseLogging(verbose));
        }

        ui.add_space(4.0);
        let stats = snapshot.stats;
        ui.label(format!("Commands/sec: {:.1}", stats.rate()));
        ui.label(format!(
            "Sent: {}   Failed: {}",
            stats.total(),
            stats.failures()
        ));

        if ui.button("Save settings").clicked() {
            actions.push(UiAction::SaveSettings);
        }
    }
}
