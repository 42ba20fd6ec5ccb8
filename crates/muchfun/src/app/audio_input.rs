//! Microphone lifecycle.
//!
//! The stream is opened when the audio source is enabled and closed when it
//! is disabled or on emergency stop. Builds without the `audio` feature
//! report an error instead.

use muchfun_core::LevelCell;
use std::sync::Arc;

#[cfg(feature = "audio")]
use muchfun_core::MicrophoneInput;

#[derive(Default)]
pub struct AudioInput {
    #[cfg(feature = "audio")]
    microphone: Option<MicrophoneInput>,
}

impl AudioInput {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(feature = "audio")]
    pub fn is_capturing(&self) -> bool {
        self.microphone
            .as_ref()
            .is_some_and(MicrophoneInput::is_capturing)
    }

    #[cfg(not(feature = "audio"))]
    pub fn is_capturing(&self) -> bool {
        false
    }

    /// Open the default microphone unless it is already running
    #[cfg(feature = "audio")]
    pub fn start(&mut self, level: Arc<LevelCell>) -> muchfun_core::Result<()> {
        if self.is_capturing() {
            return Ok(());
        }
        self.microphone = Some(MicrophoneInput::open(level)?);
        Ok(())
    }

    #[cfg(not(feature = "audio"))]
    pub fn start(&mut self, _level: Arc<LevelCell>) -> muchfun_core::Result<()> {
        Err(muchfun_core::CoreError::AudioInput(
            "Audio support is not enabled in this build".to_string(),
        ))
    }

    pub fn stop(&mut self) {
        #[cfg(feature = "audio")]
        if let Some(mut microphone) = self.microphone.take() {
            microphone.stop();
            tracing::info!("Microphone stopped");
        }
    }
}
