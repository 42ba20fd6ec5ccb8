use crate::theme::colors;
use egui::{
    Color32, CornerRadius, Pos2, Rect, Response, Sense, Stroke, Ui, Vec2, WidgetInfo, WidgetType,
};

/// How long the re-arm button must be held (seconds)
pub const HOLD_DURATION: f32 = 0.8;

/// Section header with an accent stripe
pub fn render_header(ui: &mut Ui, title: &str, accent: Color32) {
    let desired_size = Vec2::new(ui.available_width(), 24.0);
    let (rect, _response) = ui.allocate_at_least(desired_size, Sense::hover());

    let painter = ui.painter();
    painter.rect_filled(rect, CornerRadius::ZERO, colors::LIGHTER_GREY);

    let stripe_rect = Rect::from_min_size(rect.min, Vec2::new(3.0, rect.height()));
    painter.rect_filled(stripe_rect, CornerRadius::ZERO, accent);

    painter.text(
        Pos2::new(rect.min.x + 10.0, rect.center().y),
        egui::Align2::LEFT_CENTER,
        title.to_uppercase(),
        egui::FontId::proportional(14.0),
        ui.visuals().text_color(),
    );
}

/// Slider editing a 0-1 value shown as percent. Double-click resets.
pub fn percent_slider(
    ui: &mut Ui,
    value: &mut f32,
    max_percent: f32,
    default_value: f32,
) -> Response {
    let mut percent = *value * 100.0;
    let mut response = ui.add(
        egui::Slider::new(&mut percent, 0.0..=max_percent)
            .suffix("%")
            .fixed_decimals(0),
    );
    if response.double_clicked() {
        percent = default_value * 100.0;
        response.mark_changed();
    }
    *value = percent / 100.0;
    response
}

/// Hold-to-confirm state.
///
/// Returns `(triggered, progress)` with progress in 0.0 - 1.0.
pub fn check_hold_state(ui: &mut Ui, id: egui::Id, is_interacting: bool) -> (bool, f32) {
    let start_time_id = id.with("start_time");
    let stored: Option<f64> = ui.data_mut(|d| d.get_temp(start_time_id));

    if !is_interacting {
        if stored.is_some() {
            ui.data_mut(|d| d.remove_temp::<f64>(start_time_id));
        }
        return (false, 0.0);
    }

    let now = ui.input(|i| i.time);
    let start = match stored {
        Some(start) => start,
        None => {
            ui.data_mut(|d| d.insert_temp(start_time_id, now));
            now
        }
    };

    let progress = ((now - start) as f32 / HOLD_DURATION).clamp(0.0, 1.0);
    if progress >= 1.0 {
        ui.data_mut(|d| d.remove_temp::<f64>(start_time_id));
        (true, 1.0)
    } else {
        ui.ctx().request_repaint();
        (false, progress)
    }
}

/// Button that only fires after being held down (mouse or Space/Enter)
pub fn hold_to_action_button(ui: &mut Ui, text: &str, color: Color32) -> bool {
    let galley = ui.painter().layout_no_wrap(
        text.to_string(),
        egui::FontId::proportional(14.0),
        ui.visuals().text_color(),
    );
    let size = Vec2::new(galley.size().x + 28.0, 28.0);
    let (rect, response) = ui.allocate_at_least(size, Sense::click());
    response.widget_info(|| WidgetInfo::labeled(WidgetType::Button, ui.is_enabled(), text));

    let is_interacting = response.is_pointer_button_down_on()
        || (response.has_focus()
            && ui.input(|i| i.key_down(egui::Key::Space) || i.key_down(egui::Key::Enter)));
    let (triggered, progress) = check_hold_state(ui, response.id.with("hold"), is_interacting);

    let visuals = ui.style().interact(&response);
    let painter = ui.painter();
    painter.rect(
        rect,
        CornerRadius::same(3),
        visuals.bg_fill,
        visuals.bg_stroke,
        egui::StrokeKind::Middle,
    );
    if progress > 0.0 {
        let mut fill_rect = rect;
        fill_rect.max.x = rect.min.x + rect.width() * progress;
        painter.rect_filled(fill_rect, CornerRadius::same(3), color.linear_multiply(0.5));
    }
    if response.has_focus() {
        painter.rect_stroke(
            rect.expand(2.0),
            CornerRadius::same(4),
            Stroke::new(1.0, ui.style().visuals.selection.stroke.color),
            egui::StrokeKind::Middle,
        );
    }
    painter.text(
        rect.center(),
        egui::Align2::CENTER_CENTER,
        text,
        egui::FontId::proportional(14.0),
        visuals.text_color(),
    );

    response.on_hover_text("Hold to confirm (Mouse or Space/Enter)");
    triggered
}
