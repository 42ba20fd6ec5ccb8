use crate::theme::colors;
use crate::widgets::custom;
use crate::{UiAction, UiSnapshot};
use egui::Ui;
use muchfun_core::{SmoothingKind, SmoothingPreset};

#[derive(Default)]
pub struct SmoothingPanel;

impl SmoothingPanel {
    pub fn show(&mut self, ui: &mut Ui, snapshot: &UiSnapshot<'_>, actions: &mut Vec<UiAction>) {
        custom::render_header(ui, "Smoothing", colors::AUDIO);
        ui.add_space(4.0);

        let mut config = snapshot.config.smoothing;
        let mut changed = false;

        egui::Grid::new("smoothing_grid")
            .num_columns(2)
            .spacing([8.0, 4.0])
            .show(ui, |ui| {
                ui.label("Type");
                egui::ComboBox::from_id_salt("smoothing_kind")
                    .selected_text(config.kind.to_string())
                    .show_ui(ui, |ui| {
                        for kind in SmoothingKind::ALL {
                            changed |= ui
                                .selectable_value(&mut config.kind, kind, kind.to_string())
                                .on_hover_text(kind.description())
                                .changed();
                        }
                    });
                ui.end_row();

                ui.label("Strength");
                changed |= ui
                    .add_enabled(
                        config.kind == SmoothingKind::Simple,
                        egui::Slider::new(&mut config.strength, 0.0..=0.95).fixed_decimals(2),
                    )
                    .changed();
                ui.end_row();

                let timed = matches!(config.kind, SmoothingKind::Adaptive);
                let mut attack_ms = config.attack_time * 1000.0;
                ui.label("Attack");
                if ui
                    .add_enabled(
                        timed,
                        egui::Slider::new(&mut attack_ms, 10.0..=500.0).suffix(" ms"),
                    )
                    .changed()
                {
                    config.attack_time = attack_ms / 1000.0;
                    changed = true;
                }
                ui.end_row();

                let mut decay_ms = config.decay_time * 1000.0;
                ui.label("Decay");
                if ui
                    .add_enabled(
                        timed,
                        egui::Slider::new(&mut decay_ms, 10.0..=2000.0).suffix(" ms"),
                    )
                    .changed()
                {
                    config.decay_time = decay_ms / 1000.0;
                    changed = true;
                }
                ui.end_row();
            });

        ui.weak(config.kind.description());

        if changed {
            actions.push(UiAction::SetSmoothing(config));
        }

        ui.horizontal(|ui| {
            ui.label("Presets");
            for preset in SmoothingPreset::ALL {
                if ui.button(preset.to_string()).clicked() {
                    actions.push(UiAction::ApplySmoothingPreset(preset));
                }
            }
        });
    }
}
