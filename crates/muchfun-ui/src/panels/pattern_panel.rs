//! Pattern generator controls

use crate::theme::colors;
use crate::widgets::{custom, LevelMeter};
use crate::{UiAction, UiSnapshot};
use egui::Ui;
use muchfun_core::{PatternKind, PatternSettings};

#[derive(Default)]
pub struct PatternPanel;

impl PatternPanel {
    pub fn show(&mut self, ui: &mut Ui, snapshot: &UiSnapshot<'_>, actions: &mut Vec<UiAction>) {
        custom::render_header(ui, "Pattern", colors::PATTERN);
        ui.add_space(4.0);

        let mut enabled = snapshot.pattern_enabled;
        if ui
            .add_enabled(
                !snapshot.stopped,
                egui::Checkbox::new(&mut enabled, "Enable pattern control"),
            )
            .changed()
        {
            actions.push(UiAction::SetPatternEnabled(enabled));
        }

        let defaults = PatternSettings::default();
        let mut settings = snapshot.config.pattern;
        let mut changed = false;

        egui::Grid::new("pattern_grid")
            .num_columns(2)
            .spacing([8.0, 4.0])
            .show(ui, |ui| {
                ui.label("Type");
                egui::ComboBox::from_id_salt("pattern_kind")
                    .selected_text(settings.kind.to_string())
                    .show_ui(ui, |ui| {
                        for kind in PatternKind::ALL {
                            changed |= ui
                                .selectable_value(&mut settings.kind, kind, kind.to_string())
                                .changed();
                        }
                    });
                ui.end_row();

                ui.label("Max intensity");
                changed |= custom::percent_slider(
                    ui,
                    &mut settings.max_intensity,
                    100.0,
                    defaults.max_intensity,
                )
                .changed();
                ui.end_row();

                ui.label("Speed");
                changed |= ui
                    .add(
                        egui::Slider::new(&mut settings.speed, 0.1..=5.0)
                            .logarithmic(true)
                            .suffix(" rad/s"),
                    )
                    .changed();
                ui.end_row();

                ui.label("Randomness");
                changed |= custom::percent_slider(
                    ui,
                    &mut settings.randomness,
                    100.0,
                    defaults.randomness,
                )
                .changed();
                ui.end_row();
            });

        if changed {
            actions.push(UiAction::SetPatternSettings(settings));
        }

        ui.add_space(4.0);
        ui.add(
            LevelMeter::new("Pattern", snapshot.levels.pattern.value(), colors::PATTERN)
                .active(snapshot.pattern_enabled),
        );
    }
}
