//! Server connection panel

use crate::theme::colors;
use crate::widgets::custom;
use crate::{UiAction, UiSnapshot};
use egui::{Color32, RichText, Ui};
use muchfun_control::ConnectionState;

#[derive(Default)]
pub struct ConnectionPanel {
    address: Option<String>,
}

fn state_color(state: &ConnectionState) -> Color32 {
    match state {
        ConnectionState::Connected => colors::OK_COLOR,
        ConnectionState::Connecting => colors::WARN_COLOR,
        ConnectionState::Error(_) => colors::ERROR_COLOR,
        ConnectionState::Disconnected => Color32::from_gray(150),
    }
}

impl ConnectionPanel {
    pub fn show(&mut self, ui: &mut Ui, snapshot: &UiSnapshot<'_>, actions: &mut Vec<UiAction>) {
        custom::render_header(ui, "Connection", colors::ACCENT);
        ui.add_space(4.0);

        let status = snapshot.status;
        let state_label = match &status.state {
            ConnectionState::Connected => "● Connected",
            ConnectionState::Connecting => "● Connecting...",
            ConnectionState::Error(_) => "● Error",
            ConnectionState::Disconnected => "● Disconnected",
        };
        ui.horizontal(|ui| {
            ui.label(RichText::new(state_label).color(state_color(&status.state)).strong());
            if let Some(server) = status.server_name.as_deref().filter(|s| !s.is_empty()) {
                ui.weak(format!("({})", server));
            }
        });

        let device_text = match &status.device {
            Some(device) => format!(
                "{} - {} actuator{}",
                device.name,
                device.scalar_actuators,
                if device.scalar_actuators == 1 { "" } else { "s" }
            ),
            None => "No device connected".to_string(),
        };
        ui.label(device_text);
        if let ConnectionState::Error(e) = &status.state {
            ui.colored_label(colors::ERROR_COLOR, e);
        }

        let busy = matches!(
            status.state,
            ConnectionState::Connected | ConnectionState::Connecting
        );

        let address = self
            .address
            .get_or_insert_with(|| snapshot.server_address.to_string());
        ui.horizontal(|ui| {
            ui.label("Server");
            let response = ui.add_enabled(
                !busy,
                egui::TextEdit::singleline(address).desired_width(f32::INFINITY),
            );
            if response.lost_focus() && address.as_str() != snapshot.server_address {
                actions.push(UiAction::SetServerAddress(address.trim().to_string()));
            }
        });

        ui.horizontal(|ui| {
            if busy {
                if ui.button("Disconnect").clicked() {
                    actions.push(UiAction::Disconnect);
                }
            } else if ui.button("Connect").clicked() {
                actions.push(UiAction::Connect);
            }

            let can_scan = status.state == ConnectionState::Connected && !status.scanning;
            if ui
                .add_enabled(can_scan, egui::Button::new("Scan for devices"))
                .clicked()
            {
                actions.push(UiAction::ScanDevices);
            }
            if status.scanning {
                ui.spinner();
            }
        });
    }
}
