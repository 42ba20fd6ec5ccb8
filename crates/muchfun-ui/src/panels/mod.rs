//! UI panels

pub mod audio_panel;
pub mod connection_panel;
pub mod manual_panel;
pub mod pattern_panel;
pub mod settings_panel;
pub mod smoothing_panel;
pub mod status_bar;

pub use audio_panel::AudioPanel;
pub use connection_panel::ConnectionPanel;
pub use manual_panel::ManualPanel;
pub use pattern_panel::PatternPanel;
pub use settings_panel::SettingsPanel;
pub use smoothing_panel::SmoothingPanel;
pub use status_bar::StatusBar;
