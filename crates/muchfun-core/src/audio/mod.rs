//! Audio input: level extraction, the shared level cell and microphone capture.

pub mod level;

#[cfg(feature = "audio")]
pub mod capture;

pub use level::{rms, AudioSettings, LevelCell};

#[cfg(feature = "audio")]
pub use capture::MicrophoneInput;
