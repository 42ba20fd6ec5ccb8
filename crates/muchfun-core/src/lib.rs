//! MuchFun Core - Intensity Model and Mixing
//!
//! This crate contains the device-independent part of MuchFun:
//! - Bounded intensity values
//! - Audio level extraction and microphone capture
//! - Smoothing filters and presets
//! - Pattern generation
//! - The intensity mixer that merges all sources into device commands
//! - Settings and log configuration

pub mod audio;
pub mod error;
pub mod intensity;
pub mod logging;
pub mod mixer;
pub mod pattern;
pub mod settings;
pub mod smoothing;
pub mod stats;

// --- Re-exports grouped by category ---

// Values & errors
pub use error::{CoreError, Result};
pub use intensity::Intensity;

// Sources
pub use audio::{rms, AudioSettings, LevelCell};
#[cfg(feature = "audio")]
pub use audio::MicrophoneInput;
pub use pattern::{PatternGenerator, PatternKind, PatternSettings};
pub use smoothing::{Smoother, SmoothingConfig, SmoothingKind, SmoothingPreset};

// Mixing
pub use mixer::{
    BlendMode, DeviceCommand, IntensityMixer, MixerConfig, SourceLevels, TickOutcome,
};
pub use stats::CommandStats;

// Configuration
pub use logging::LogConfig;
pub use settings::{is_websocket_url, Settings, DEFAULT_CLIENT_NAME, DEFAULT_SERVER_ADDRESS};
