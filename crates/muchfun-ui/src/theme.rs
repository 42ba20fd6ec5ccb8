//! Dark theme and shared colors

use egui::{Color32, CornerRadius, Stroke, Style, Visuals};

/// Shared color constants
pub mod colors {
    use egui::Color32;

    pub const ACCENT: Color32 = Color32::from_rgb(233, 69, 140); // Magenta
    pub const AUDIO: Color32 = Color32::from_rgb(0, 229, 255); // Cyan
    pub const PATTERN: Color32 = Color32::from_rgb(157, 78, 221); // Purple
    pub const MANUAL: Color32 = Color32::from_rgb(0, 255, 170); // Mint
    pub const OK_COLOR: Color32 = Color32::from_rgb(60, 200, 90);
    pub const WARN_COLOR: Color32 = Color32::from_rgb(255, 170, 0);
    pub const ERROR_COLOR: Color32 = Color32::from_rgb(220, 40, 40);
    pub const DARK_GREY: Color32 = Color32::from_rgb(20, 18, 26); // Panel background
    pub const DARKER_GREY: Color32 = Color32::from_rgb(8, 6, 10); // Meter tracks
    pub const LIGHTER_GREY: Color32 = Color32::from_rgb(42, 38, 48); // Widget background
    pub const STROKE_GREY: Color32 = Color32::from_rgb(80, 76, 90);
}

fn widget(bg: Color32, stroke: Color32, fg: Color32) -> egui::style::WidgetVisuals {
    egui::style::WidgetVisuals {
        bg_fill: bg,
        weak_bg_fill: bg,
        bg_stroke: Stroke::new(1.0, stroke),
        fg_stroke: Stroke::new(1.0, fg),
        corner_radius: CornerRadius::same(2),
        expansion: 0.0,
    }
}

/// Apply the application theme to the egui context
pub fn apply(ctx: &egui::Context) {
    let visuals = Visuals {
        dark_mode: true,
        override_text_color: Some(Color32::from_rgb(235, 235, 240)),
        widgets: egui::style::Widgets {
            noninteractive: widget(colors::DARK_GREY, colors::STROKE_GREY, Color32::from_gray(180)),
            inactive: widget(colors::LIGHTER_GREY, colors::STROKE_GREY, Color32::from_gray(220)),
            hovered: widget(Color32::from_rgb(60, 56, 66), colors::ACCENT, Color32::WHITE),
            active: widget(colors::ACCENT, colors::ACCENT, Color32::BLACK),
            open: widget(colors::DARK_GREY, colors::STROKE_GREY, Color32::WHITE),
        },
        selection: egui::style::Selection {
            bg_fill: colors::ACCENT.linear_multiply(0.3),
            stroke: Stroke::new(1.0, colors::ACCENT),
        },
        hyperlink_color: colors::ACCENT,
        faint_bg_color: colors::DARKER_GREY,
        extreme_bg_color: colors::DARKER_GREY,
        warn_fg_color: colors::WARN_COLOR,
        error_fg_color: colors::ERROR_COLOR,
        window_fill: colors::DARKER_GREY,
        panel_fill: colors::DARK_GREY,
        window_stroke: Stroke::new(1.0, colors::STROKE_GREY),
        ..Visuals::dark()
    };

    let mut style = Style {
        visuals,
        ..Style::default()
    };
    style.spacing.item_spacing = egui::vec2(8.0, 6.0);
    style.spacing.button_padding = egui::vec2(10.0, 4.0);
    ctx.set_style(style);
}
