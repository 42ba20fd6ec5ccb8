//! Intensity Mixer
//!
//! Merges the manual, audio-reactive and pattern sources into a single
//! bounded output value. The host calls [`IntensityMixer::tick`] from its
//! refresh loop; the mixer decides whether the new value is worth sending and
//! hands back a [`DeviceCommand`] when it is.
//!
//! Emergency stop latches: while latched, every tick yields zero and no source
//! can be re-enabled until [`IntensityMixer::rearm`] is called.

use crate::audio::{AudioSettings, LevelCell};
use crate::intensity::Intensity;
use crate::pattern::{PatternGenerator, PatternSettings};
use crate::smoothing::{SmoothingConfig, Smoother};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// How simultaneously enabled sources combine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum BlendMode {
    /// Strongest source wins
    #[default]
    Max,
    /// Sources add up, clamped to full intensity
    Additive,
    /// First enabled source in the order pattern, audio, manual
    Priority,
}

impl BlendMode {
    pub const ALL: [BlendMode; 3] = [BlendMode::Max, BlendMode::Additive, BlendMode::Priority];
}

impl fmt::Display for BlendMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Max => write!(f, "Max"),
            Self::Additive => write!(f, "Additive"),
            Self::Priority => write!(f, "Priority"),
        }
    }
}

/// Command for the device client
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DeviceCommand {
    /// Set all scalar actuators to this level
    Scalar(Intensity),
    /// Stop the device immediately
    Stop,
}

/// Mixer configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MixerConfig {
    /// Maximum commands per second sent to the device
    pub output_rate_hz: f32,
    /// Minimum change between two sends
    pub change_threshold: f32,
    pub blend_mode: BlendMode,
    pub audio: AudioSettings,
    pub smoothing: SmoothingConfig,
    pub pattern: PatternSettings,
}

impl Default for MixerConfig {
    fn default() -> Self {
        Self {
            output_rate_hz: 5.0,
            change_threshold: 0.01,
            blend_mode: BlendMode::Max,
            audio: AudioSettings::default(),
            smoothing: SmoothingConfig::default(),
            pattern: PatternSettings::default(),
        }
    }
}

impl MixerConfig {
    /// Seconds between two sends
    pub fn send_interval(&self) -> f32 {
        if self.output_rate_hz > 0.0 {
            1.0 / self.output_rate_hz
        } else {
            f32::INFINITY
        }
    }
}

/// Per-source levels of the last tick, for meters
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SourceLevels {
    pub manual: Intensity,
    /// Raw RMS read from the capture slot
    pub audio_raw: f32,
    pub audio: Intensity,
    pub pattern: Intensity,
    pub output: Intensity,
}

/// Result of one tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickOutcome {
    pub levels: SourceLevels,
    pub command: Option<DeviceCommand>,
}

pub struct IntensityMixer {
    config: MixerConfig,
    manual: Intensity,
    audio_enabled: bool,
    pattern_enabled: bool,
    stopped: bool,
    level_cell: Arc<LevelCell>,
    smoother: Smoother,
    pattern: PatternGenerator,
    last_sent: Option<Intensity>,
    since_last_send: f32,
    levels: SourceLevels,
}

impl IntensityMixer {
    pub fn new(config: MixerConfig, level_cell: Arc<LevelCell>) -> Self {
        let pattern = PatternGenerator::new(config.pattern);
        Self::with_pattern(config, level_cell, pattern)
    }

    /// Mixer with an explicit pattern generator (e.g. a seeded one)
    pub fn with_pattern(
        config: MixerConfig,
        level_cell: Arc<LevelCell>,
        pattern: PatternGenerator,
    ) -> Self {
        Self {
            smoother: Smoother::new(config.smoothing),
            config,
            manual: Intensity::ZERO,
            audio_enabled: false,
            pattern_enabled: false,
            stopped: false,
            level_cell,
            pattern,
            last_sent: None,
            since_last_send: 0.0,
            levels: SourceLevels::default(),
        }
    }

    pub fn config(&self) -> &MixerConfig {
        &self.config
    }

    /// Shared slot the capture thread writes into
    pub fn level_cell(&self) -> Arc<LevelCell> {
        Arc::clone(&self.level_cell)
    }

    // --- Sources ---

    pub fn set_manual(&mut self, level: impl Into<Intensity>) {
        let level = level.into();
        if self.stopped && !level.is_zero() {
            debug!("Manual intensity ignored while emergency stop is latched");
            return;
        }
        self.manual = level;
    }

    pub fn manual(&self) -> Intensity {
        self.manual
    }

    /// Enable or disable the audio source. Returns false if refused.
    pub fn set_audio_enabled(&mut self, enabled: bool) -> bool {
        if enabled && self.stopped {
            warn!("Audio source cannot be enabled while emergency stop is latched");
            return false;
        }
        if !enabled {
            self.smoother.reset();
        }
        if self.audio_enabled != enabled {
            info!("Audio source {}", if enabled { "enabled" } else { "disabled" });
        }
        self.audio_enabled = enabled;
        true
    }

    pub fn audio_enabled(&self) -> bool {
        self.audio_enabled
    }

    /// Enable or disable the pattern source. Returns false if refused.
    pub fn set_pattern_enabled(&mut self, enabled: bool) -> bool {
        if enabled && self.stopped {
            warn!("Pattern source cannot be enabled while emergency stop is latched");
            return false;
        }
        if enabled != self.pattern_enabled {
            self.pattern.reset();
            info!(
                "Pattern source {} - Type: {}",
                if enabled { "enabled" } else { "disabled" },
                self.config.pattern.kind
            );
        }
        self.pattern_enabled = enabled;
        true
    }

    pub fn pattern_enabled(&self) -> bool {
        self.pattern_enabled
    }

    // --- Configuration ---

    pub fn set_blend_mode(&mut self, mode: BlendMode) {
        self.config.blend_mode = mode;
    }

    pub fn set_smoothing(&mut self, smoothing: SmoothingConfig) {
        self.config.smoothing = smoothing;
        self.smoother.set_config(smoothing);
    }

    pub fn set_audio_settings(&mut self, audio: AudioSettings) {
        self.config.audio = audio;
    }

    pub fn set_pattern_settings(&mut self, pattern: PatternSettings) {
        if pattern.kind != self.config.pattern.kind {
            info!("Pattern type changed to: {}", pattern.kind);
        }
        self.config.pattern = pattern;
        self.pattern.set_settings(pattern);
    }

    pub fn set_output_rate(&mut self, rate_hz: f32) {
        self.config.output_rate_hz = rate_hz.max(0.0);
    }

    pub fn set_change_threshold(&mut self, threshold: f32) {
        self.config.change_threshold = threshold.max(0.0);
    }

    // --- Emergency stop ---

    /// Force output to zero and disable every source until re-armed.
    pub fn emergency_stop(&mut self) -> DeviceCommand {
        warn!("EMERGENCY STOP ACTIVATED");
        self.stopped = true;
        self.manual = Intensity::ZERO;
        self.audio_enabled = false;
        self.pattern_enabled = false;
        self.smoother.reset();
        self.pattern.reset();
        self.levels = SourceLevels::default();
        self.last_sent = Some(Intensity::ZERO);
        self.since_last_send = 0.0;
        DeviceCommand::Stop
    }

    /// Clear the stop latch. Sources stay disabled until the user enables them.
    pub fn rearm(&mut self) {
        if self.stopped {
            info!("Emergency stop re-armed");
        }
        self.stopped = false;
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    // --- Output ---

    /// Levels computed by the last tick
    pub fn levels(&self) -> SourceLevels {
        self.levels
    }

    pub fn last_sent(&self) -> Option<Intensity> {
        self.last_sent
    }

    /// Forget the last sent value so the next tick sends again
    /// (used after a failed send).
    pub fn invalidate_last_sent(&mut self) {
        self.last_sent = None;
    }

    /// Advance all sources by `dt` seconds and decide what to send.
    ///
    /// When `connected` is false the levels are still computed for display,
    /// but nothing is emitted and no send history is kept.
    pub fn tick(&mut self, dt: f32, connected: bool) -> TickOutcome {
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };

        if self.stopped {
            self.levels = SourceLevels::default();
            if !connected {
                self.last_sent = None;
            }
            return TickOutcome {
                levels: self.levels,
                command: None,
            };
        }

        let audio_raw = if self.audio_enabled {
            self.level_cell.load()
        } else {
            0.0
        };
        let audio = if self.audio_enabled {
            let target = self.config.audio.target(audio_raw);
            let smoothed = self.smoother.step(target, dt);
            Intensity::new(smoothed.min(self.config.audio.ceiling))
        } else {
            Intensity::ZERO
        };

        let pattern = if self.pattern_enabled {
            Intensity::new(self.pattern.advance(dt))
        } else {
            Intensity::ZERO
        };

        let output = self.blend(audio, pattern);
        self.levels = SourceLevels {
            manual: self.manual,
            audio_raw,
            audio,
            pattern,
            output,
        };

        if !connected {
            self.last_sent = None;
            self.since_last_send = 0.0;
            return TickOutcome {
                levels: self.levels,
                command: None,
            };
        }

        self.since_last_send += dt;
        let command = match self.last_sent {
            None => Some(output),
            Some(last) => {
                let interval = self.config.send_interval();
                let due = self.since_last_send + 1e-6 >= interval;
                let changed = output.distance(last) >= self.config.change_threshold
                    || (output.is_zero() && !last.is_zero());
                (due && changed).then_some(output)
            }
        }
        .map(|level| {
            debug!(
                "Device update - Pattern: {:.3}, Audio: {:.3}, Manual: {:.3}, Combined: {:.3}",
                pattern.value(),
                audio.value(),
                self.manual.value(),
                level.value()
            );
            self.last_sent = Some(level);
            self.since_last_send = 0.0;
            DeviceCommand::Scalar(level)
        });

        TickOutcome {
            levels: self.levels,
            command,
        }
    }

    fn blend(&self, audio: Intensity, pattern: Intensity) -> Intensity {
        match self.config.blend_mode {
            BlendMode::Max => self.manual.max(audio).max(pattern),
            BlendMode::Additive => {
                Intensity::new(self.manual.value() + audio.value() + pattern.value())
            }
            BlendMode::Priority => {
                if self.pattern_enabled {
                    pattern
                } else if self.audio_enabled {
                    audio
                } else {
                    self.manual
                }
            }
        }
    }
}
