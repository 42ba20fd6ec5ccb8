//! Pattern generator
//!
//! Produces a time-varying level from a phase accumulator. Every pattern is
//! periodic in phase, so with randomness disabled the output repeats exactly.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::f32::consts::{PI, TAU};
use std::fmt;

/// Scale applied to the randomness amount before it becomes jitter
const JITTER_SCALE: f32 = 0.3;

/// Pattern shape
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum PatternKind {
    /// Smooth sine wave
    #[default]
    Wave,
    /// Square wave, on for half a cycle
    Pulse,
    /// Sawtooth
    Ramp,
    /// Steady level with a slow, small wobble
    Steady,
    /// Two interfering waves
    Chaos,
    /// Double pulse followed by a rest
    Heartbeat,
}

impl PatternKind {
    pub const ALL: [PatternKind; 6] = [
        PatternKind::Wave,
        PatternKind::Pulse,
        PatternKind::Ramp,
        PatternKind::Steady,
        PatternKind::Chaos,
        PatternKind::Heartbeat,
    ];

    /// Base value for a phase in radians, always in `[0, 1]`.
    pub fn sample(self, phase: f32) -> f32 {
        let cycle = phase.rem_euclid(TAU);
        let value = match self {
            Self::Wave => (phase.sin() + 1.0) / 2.0,
            Self::Pulse => {
                if cycle < PI {
                    1.0
                } else {
                    0.0
                }
            }
            Self::Ramp => cycle / TAU,
            Self::Steady => 0.7 + 0.1 * (phase * 0.5).sin(),
            Self::Chaos => (phase.sin() * (phase * 1.5).cos() + 1.0) / 2.0,
            Self::Heartbeat => {
                if cycle < 0.3 {
                    (cycle * 10.0).sin().powi(2)
                } else if cycle < 0.8 {
                    ((cycle - 0.3) * 12.0).sin().powi(2)
                } else {
                    0.0
                }
            }
        };
        value.clamp(0.0, 1.0)
    }

    /// Phase length after which `sample` repeats
    pub fn period(self) -> f32 {
        match self {
            Self::Steady | Self::Chaos => 2.0 * TAU,
            _ => TAU,
        }
    }
}

impl fmt::Display for PatternKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Wave => "Wave",
            Self::Pulse => "Pulse",
            Self::Ramp => "Ramp",
            Self::Steady => "Steady",
            Self::Chaos => "Chaos",
            Self::Heartbeat => "Heartbeat",
        };
        write!(f, "{}", name)
    }
}

/// User-facing pattern parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatternSettings {
    pub kind: PatternKind,
    /// Peak level the pattern reaches (0-1)
    pub max_intensity: f32,
    /// Phase speed in radians per second
    pub speed: f32,
    /// Jitter amount (0 disables the random source)
    pub randomness: f32,
}

impl Default for PatternSettings {
    fn default() -> Self {
        Self {
            kind: PatternKind::Wave,
            max_intensity: 0.5,
            speed: 0.5,
            randomness: 0.0,
        }
    }
}

/// Phase accumulator plus the pattern parameters
#[derive(Debug, Clone)]
pub struct PatternGenerator {
    settings: PatternSettings,
    time: f32,
    rng: StdRng,
    current: f32,
}

impl Default for PatternGenerator {
    fn default() -> Self {
        Self::new(PatternSettings::default())
    }
}

impl PatternGenerator {
    pub fn new(settings: PatternSettings) -> Self {
        Self::with_rng(settings, StdRng::from_os_rng())
    }

    /// Generator with a fixed seed, for reproducible jitter
    pub fn with_seed(settings: PatternSettings, seed: u64) -> Self {
        Self::with_rng(settings, StdRng::seed_from_u64(seed))
    }

    fn with_rng(settings: PatternSettings, rng: StdRng) -> Self {
        Self {
            settings,
            time: 0.0,
            rng,
            current: 0.0,
        }
    }

    pub fn settings(&self) -> &PatternSettings {
        &self.settings
    }

    /// Update parameters. Switching the pattern kind restarts the phase.
    pub fn set_settings(&mut self, settings: PatternSettings) {
        if settings.kind != self.settings.kind {
            self.time = 0.0;
        }
        self.settings = settings;
    }

    /// Elapsed pattern time in seconds
    pub fn time(&self) -> f32 {
        self.time
    }

    pub fn phase(&self) -> f32 {
        self.time * self.settings.speed
    }

    /// Last produced level
    pub fn current(&self) -> f32 {
        self.current
    }

    pub fn reset(&mut self) {
        self.time = 0.0;
        self.current = 0.0;
    }

    /// Deterministic level at an arbitrary time, without jitter.
    pub fn value_at(&self, time: f32) -> f32 {
        let base = self.settings.kind.sample(time * self.settings.speed);
        base * self.settings.max_intensity.clamp(0.0, 1.0)
    }

    /// Advance by `dt` seconds and return the new level.
    pub fn advance(&mut self, dt: f32) -> f32 {
        self.time += dt.max(0.0);
        // Keep the accumulator small; the pattern repeats every period anyway
        let period = self.settings.kind.period();
        if self.settings.speed > 0.0 && self.phase() > period * 1024.0 {
            self.time = self.time.rem_euclid(period / self.settings.speed);
        }

        let mut base = self.settings.kind.sample(self.phase());
        let randomness = self.settings.randomness.clamp(0.0, 1.0);
        if randomness > 0.0 {
            let offset = (self.rng.random::<f32>() - 0.5) * 2.0 * randomness * JITTER_SCALE;
            base = (base + offset).clamp(0.0, 1.0);
        }

        self.current = base * self.settings.max_intensity.clamp(0.0, 1.0);
        self.current
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_wave_extremes() {
        assert_relative_eq!(PatternKind::Wave.sample(PI / 2.0), 1.0);
        assert_relative_eq!(PatternKind::Wave.sample(3.0 * PI / 2.0), 0.0, epsilon = 1e-6);
    }

    #[test]
    fn test_pulse_halves() {
        assert_eq!(PatternKind::Pulse.sample(0.5), 1.0);
        assert_eq!(PatternKind::Pulse.sample(PI + 0.5), 0.0);
        assert_eq!(PatternKind::Pulse.sample(TAU + 0.5), 1.0);
    }

    #[test]
    fn test_ramp_rises_through_cycle() {
        assert_relative_eq!(PatternKind::Ramp.sample(0.0), 0.0);
        assert_relative_eq!(PatternKind::Ramp.sample(PI), 0.5);
    }

    #[test]
    fn test_heartbeat_rests() {
        assert_eq!(PatternKind::Heartbeat.sample(2.0), 0.0);
        assert!(PatternKind::Heartbeat.sample(0.15) > 0.9);
    }

    #[test]
    fn test_all_kinds_bounded() {
        for kind in PatternKind::ALL {
            for i in 0..1000 {
                let v = kind.sample(i as f32 * 0.037);
                assert!((0.0..=1.0).contains(&v), "{} produced {}", kind, v);
            }
        }
    }

    #[test]
    fn test_kind_change_resets_time() {
        let mut gen = PatternGenerator::with_seed(PatternSettings::default(), 1);
        gen.advance(3.0);
        assert!(gen.time() > 0.0);
        gen.set_settings(PatternSettings {
            kind: PatternKind::Pulse,
            ..PatternSettings::default()
        });
        assert_eq!(gen.time(), 0.0);
    }

    #[test]
    fn test_max_intensity_scales_output() {
        let settings = PatternSettings {
            kind: PatternKind::Pulse,
            max_intensity: 0.4,
            speed: 1.0,
            randomness: 0.0,
        };
        let mut gen = PatternGenerator::with_seed(settings, 7);
        assert_relative_eq!(gen.advance(0.5), 0.4);
    }

    #[test]
    fn test_jitter_stays_bounded() {
        let settings = PatternSettings {
            kind: PatternKind::Steady,
            max_intensity: 1.0,
            speed: 1.0,
            randomness: 1.0,
        };
        let mut gen = PatternGenerator::with_seed(settings, 42);
        for _ in 0..500 {
            let v = gen.advance(0.05);
            assert!((0.0..=1.0).contains(&v));
        }
    }
}
