//! Microphone capture using cpal.
//!
//! The stream callback runs on the backend's audio thread. It computes the
//! RMS of each buffer and publishes it into a [`LevelCell`]; nothing else
//! crosses the thread boundary.

use super::level::{rms, LevelCell};
use crate::error::{CoreError, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, Sample, SampleFormat, SizedSample, Stream, StreamConfig};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Default input device, opened once and read continuously
pub struct MicrophoneInput {
    stream: Option<Stream>,
    level: Arc<LevelCell>,
    channels: u16,
}

impl MicrophoneInput {
    /// Open the default input device and start streaming into `level`.
    pub fn open(level: Arc<LevelCell>) -> Result<Self> {
        let host = cpal::default_host();
        let device = host
            .default_input_device()
            .ok_or_else(|| CoreError::AudioInput("No input device available".to_string()))?;

        let supported = device
            .default_input_config()
            .map_err(|e| CoreError::AudioInput(format!("Failed to get input config: {}", e)))?;

        let sample_format = supported.sample_format();
        let stream_config: StreamConfig = supported.config();
        let channels = stream_config.channels;

        info!(
            "Audio config - Microphone, Channels: {}, Format: {:?}",
            channels, sample_format
        );

        let stream = match sample_format {
            SampleFormat::F32 => build_stream::<f32>(&device, &stream_config, Arc::clone(&level)),
            SampleFormat::I16 => build_stream::<i16>(&device, &stream_config, Arc::clone(&level)),
            SampleFormat::U16 => build_stream::<u16>(&device, &stream_config, Arc::clone(&level)),
            other => Err(CoreError::AudioInput(format!(
                "Unsupported sample format: {:?}",
                other
            ))),
        }?;

        stream
            .play()
            .map_err(|e| CoreError::AudioInput(format!("Failed to start input stream: {}", e)))?;

        info!("Microphone started successfully");

        Ok(Self {
            stream: Some(stream),
            level,
            channels,
        })
    }

    pub fn is_capturing(&self) -> bool {
        self.stream.is_some()
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    /// Stop the stream and zero the shared level
    pub fn stop(&mut self) {
        if let Some(stream) = self.stream.take() {
            if let Err(e) = stream.pause() {
                warn!("Error stopping audio stream: {}", e);
            }
        }
        self.level.clear();
        info!("Microphone stopped");
    }
}

impl Drop for MicrophoneInput {
    fn drop(&mut self) {
        if self.stream.is_some() {
            self.stop();
        }
    }
}

fn build_stream<T>(
    device: &cpal::Device,
    config: &StreamConfig,
    level: Arc<LevelCell>,
) -> Result<Stream>
where
    T: SizedSample,
    f32: FromSample<T>,
{
    let mut scratch: Vec<f32> = Vec::with_capacity(4096);
    device
        .build_input_stream(
            config,
            move |data: &[T], _: &cpal::InputCallbackInfo| {
                scratch.clear();
                scratch.extend(data.iter().map(|s| s.to_sample::<f32>()));
                level.store(rms(&scratch));
            },
            |err| {
                error!("Audio input error: {}", err);
            },
            None,
        )
        .map_err(|e| CoreError::AudioInput(format!("Failed to build input stream: {}", e)))
}
