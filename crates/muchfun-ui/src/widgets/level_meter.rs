//! Horizontal level bar for one intensity source

use crate::theme::colors;
use egui::{Color32, CornerRadius, Rect, Sense, Stroke, Vec2, Widget};

pub struct LevelMeter<'a> {
    label: &'a str,
    level: f32,
    color: Color32,
    active: bool,
    height: f32,
}

impl<'a> LevelMeter<'a> {
    pub fn new(label: &'a str, level: f32, color: Color32) -> Self {
        Self {
            label,
            level,
            color,
            active: true,
            height: 18.0,
        }
    }

    /// Dim the bar when the source is disabled
    pub fn active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }

    pub fn height(mut self, height: f32) -> Self {
        self.height = height;
        self
    }
}

impl Widget for LevelMeter<'_> {
    fn ui(self, ui: &mut egui::Ui) -> egui::Response {
        let desired_size = Vec2::new(ui.available_width().max(120.0), self.height);
        let (rect, response) = ui.allocate_exact_size(desired_size, Sense::hover());

        if ui.is_rect_visible(rect) {
            let painter = ui.painter();
            painter.rect_filled(rect, CornerRadius::same(2), colors::DARKER_GREY);

            let level = if self.level.is_finite() {
                self.level.clamp(0.0, 1.0)
            } else {
                0.0
            };
            let color = if self.active {
                self.color
            } else {
                self.color.linear_multiply(0.25)
            };
            let fill =
                Rect::from_min_size(rect.min, Vec2::new(rect.width() * level, rect.height()));
            painter.rect_filled(fill, CornerRadius::same(2), color);
            painter.rect_stroke(
                rect,
                CornerRadius::same(2),
                Stroke::new(1.0, colors::STROKE_GREY),
                egui::StrokeKind::Middle,
            );

            painter.text(
                rect.left_center() + Vec2::new(6.0, 0.0),
                egui::Align2::LEFT_CENTER,
                self.label,
                egui::FontId::proportional(12.0),
                Color32::WHITE,
            );
            painter.text(
                rect.right_center() - Vec2::new(6.0, 0.0),
                egui::Align2::RIGHT_CENTER,
                format!("{:.0}%", level * 100.0),
                egui::FontId::monospace(12.0),
                Color32::WHITE,
            );
        }

        response
    }
}
