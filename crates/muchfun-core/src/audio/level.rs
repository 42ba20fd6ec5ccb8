//! Audio level extraction and the shared last-value cell

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;

/// RMS of a buffer. Non-finite samples count as silence.
pub fn rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum: f32 = samples
        .iter()
        .map(|&s| if s.is_finite() { s * s } else { 0.0 })
        .sum();
    (sum / samples.len() as f32).sqrt()
}

/// Single-slot audio level shared between the capture callback and the
/// output tick. Writers overwrite, readers never block.
#[derive(Debug, Default)]
pub struct LevelCell {
    bits: AtomicU32,
    writes: AtomicU64,
}

impl LevelCell {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Publish the newest level (last write wins)
    pub fn store(&self, level: f32) {
        let level = if level.is_finite() { level.max(0.0) } else { 0.0 };
        self.bits.store(level.to_bits(), Ordering::Relaxed);
        self.writes.fetch_add(1, Ordering::Relaxed);
    }

    /// Read the most recent level
    pub fn load(&self) -> f32 {
        f32::from_bits(self.bits.load(Ordering::Relaxed))
    }

    /// Number of buffers published so far
    pub fn write_count(&self) -> u64 {
        self.writes.load(Ordering::Relaxed)
    }

    pub fn clear(&self) {
        self.bits.store(0f32.to_bits(), Ordering::Relaxed);
    }
}

/// How a raw RMS level becomes a target intensity
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioSettings {
    /// User sensitivity factor (slider 0-200%)
    pub sensitivity: f32,
    /// Fixed pre-gain applied to the RMS before sensitivity
    pub gain: f32,
    /// Targets below this are treated as silence
    pub noise_floor: f32,
    /// Upper bound of the audio source after smoothing
    pub ceiling: f32,
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            sensitivity: 0.5,
            gain: 5.0,
            noise_floor: 0.02,
            ceiling: 0.8,
        }
    }
}

impl AudioSettings {
    /// Target level for a raw RMS value, before smoothing
    pub fn target(&self, rms: f32) -> f32 {
        if !rms.is_finite() {
            return 0.0;
        }
        let target = (rms * self.gain * self.sensitivity.max(0.0)).clamp(0.0, 1.0);
        if target < self.noise_floor {
            0.0
        } else {
            target
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::thread;

    #[test]
    fn test_rms_of_constant_signal() {
        assert_relative_eq!(rms(&[0.5; 256]), 0.5);
        assert_eq!(rms(&[]), 0.0);
    }

    #[test]
    fn test_rms_ignores_non_finite() {
        let v = rms(&[f32::NAN, f32::INFINITY, 0.0, 0.0]);
        assert_eq!(v, 0.0);
    }

    #[test]
    fn test_level_cell_last_write_wins() {
        let cell = LevelCell::new();
        cell.store(0.1);
        cell.store(0.3);
        assert_relative_eq!(cell.load(), 0.3);
        assert_eq!(cell.write_count(), 2);
    }

    #[test]
    fn test_level_cell_across_threads() {
        let cell = LevelCell::new();
        let writer = Arc::clone(&cell);
        let handle = thread::spawn(move || {
            for i in 0..100 {
                writer.store(i as f32 / 100.0);
            }
        });
        handle.join().unwrap();
        assert_relative_eq!(cell.load(), 0.99);
    }

    #[test]
    fn test_target_applies_noise_floor() {
        let settings = AudioSettings::default();
        assert_eq!(settings.target(0.001), 0.0);
        assert_relative_eq!(settings.target(0.1), 0.25);
        assert_eq!(settings.target(10.0), 1.0);
    }
}
