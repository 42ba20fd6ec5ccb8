//! MuchFun UI - egui panels
//!
//! Panels read a per-frame [`UiSnapshot`] and report user input as
//! [`UiAction`]s. They never talk to the mixer or the device directly; the
//! application applies the actions.

pub mod panels;
pub mod theme;
pub mod widgets;

use muchfun_control::ControllerStatus;
use muchfun_core::{
    AudioSettings, BlendMode, CommandStats, Intensity, MixerConfig, PatternSettings,
    SmoothingConfig, SmoothingPreset, SourceLevels,
};
use panels::{
    AudioPanel, ConnectionPanel, ManualPanel, PatternPanel, SettingsPanel, SmoothingPanel,
    StatusBar,
};

/// User input, applied by the application after the frame
#[derive(Debug, Clone, PartialEq)]
pub enum UiAction {
    // Connection
    Connect,
    Disconnect,
    ScanDevices,
    SetServerAddress(String),

    // Sources
    SetManual(Intensity),
    SetAudioEnabled(bool),
    SetAudioSettings(AudioSettings),
    SetSmoothing(SmoothingConfig),
    ApplySmoothingPreset(SmoothingPreset),
    SetPatternEnabled(bool),
    SetPatternSettings(PatternSettings),

    // Mixing
    SetBlendMode(BlendMode),
    SetOutputRate(f32),
    SetChangeThreshold(f32),

    // Safety
    EmergencyStop,
    Rearm,

    // Application
    SetVerboseLogging(bool),
    SaveSettings,
}

/// Everything the panels display, gathered once per frame
pub struct UiSnapshot<'a> {
    pub status: &'a ControllerStatus,
    pub server_address: &'a str,
    pub levels: SourceLevels,
    pub manual: Intensity,
    pub audio_enabled: bool,
    pub pattern_enabled: bool,
    pub stopped: bool,
    pub config: &'a MixerConfig,
    pub stats: &'a CommandStats,
    pub verbose_logging: bool,
    /// Last audio input failure, if any
    pub audio_error: Option<&'a str>,
    /// Latest status line message
    pub message: &'a str,
}

/// Top-level UI: all panels laid out in one window
#[derive(Default)]
pub struct MuchFunUi {
    pub connection: ConnectionPanel,
    pub manual: ManualPanel,
    pub audio: AudioPanel,
    pub smoothing: SmoothingPanel,
    pub pattern: PatternPanel,
    pub settings: SettingsPanel,
    pub status_bar: StatusBar,
}

impl MuchFunUi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Draw one pass and return the actions the user triggered
    ///
    /// egui can run more than one pass per frame. Callers keep the actions of
    /// every pass, since input is only delivered to the first.
    pub fn show(&mut self, ctx: &egui::Context, snapshot: &UiSnapshot<'_>) -> Vec<UiAction> {
        let mut actions = Vec::new();

        // Escape is the keyboard emergency stop
        if ctx.input(|i| i.key_pressed(egui::Key::Escape)) {
            tracing::debug!("Escape pressed");
            actions.push(UiAction::EmergencyStop);
        }

        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            self.status_bar.show(ui, snapshot);
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| {
                ui.columns(2, |columns| {
                    self.connection.show(&mut columns[0], snapshot, &mut actions);
                    columns[0].add_space(8.0);
                    self.manual.show(&mut columns[0], snapshot, &mut actions);
                    columns[0].add_space(8.0);
                    self.settings.show(&mut columns[0], snapshot, &mut actions);

                    self.audio.show(&mut columns[1], snapshot, &mut actions);
                    columns[1].add_space(8.0);
                    self.smoothing.show(&mut columns[1], snapshot, &mut actions);
                    columns[1].add_space(8.0);
                    self.pattern.show(&mut columns[1], snapshot, &mut actions);
                });
            });
        });

        actions
    }
}
