//! Audio level smoothing
//!
//! Turns a jittery per-buffer audio target into a level that is pleasant to
//! feel. Four filters are available, from no smoothing at all to a small
//! velocity model. Presets bundle the common combinations.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Below this level a falling signal with a zero target snaps to zero.
pub const CUTOFF_THRESHOLD: f32 = 0.005;

/// Lower bound for attack and decay times (seconds)
pub const MIN_TIME_CONSTANT: f32 = 0.01;

/// Smoothing algorithm
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum SmoothingKind {
    /// Instant response
    None,
    /// Exponential moving average weighted by `strength`
    Simple,
    /// Attack/decay envelope: quick up, controlled down
    #[default]
    Adaptive,
    /// Damped velocity model
    Momentum,
}

impl SmoothingKind {
    pub const ALL: [SmoothingKind; 4] = [
        SmoothingKind::None,
        SmoothingKind::Simple,
        SmoothingKind::Adaptive,
        SmoothingKind::Momentum,
    ];

    /// Short description for the UI
    pub fn description(self) -> &'static str {
        match self {
            Self::None => "No smoothing - instant response",
            Self::Simple => "Gentle exponential smoothing",
            Self::Adaptive => "Quick up, controlled down",
            Self::Momentum => "Physics simulation (experimental)",
        }
    }
}

impl fmt::Display for SmoothingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "None"),
            Self::Simple => write!(f, "Simple"),
            Self::Adaptive => write!(f, "Adaptive"),
            Self::Momentum => write!(f, "Momentum"),
        }
    }
}

/// Smoothing parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmoothingConfig {
    pub kind: SmoothingKind,
    /// 0.0 = no smoothing, 1.0 = maximum smoothing (Simple only)
    pub strength: f32,
    /// Seconds to follow a rising signal (Adaptive)
    pub attack_time: f32,
    /// Seconds to follow a falling signal (Adaptive)
    pub decay_time: f32,
}

impl Default for SmoothingConfig {
    fn default() -> Self {
        Self {
            kind: SmoothingKind::Adaptive,
            strength: 0.3,
            attack_time: 0.05,
            decay_time: 0.1,
        }
    }
}

/// Named parameter bundles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SmoothingPreset {
    Responsive,
    Smooth,
    Bouncy,
}

impl SmoothingPreset {
    pub const ALL: [SmoothingPreset; 3] = [
        SmoothingPreset::Responsive,
        SmoothingPreset::Smooth,
        SmoothingPreset::Bouncy,
    ];

    pub fn config(self) -> SmoothingConfig {
        match self {
            Self::Responsive => SmoothingConfig {
                kind: SmoothingKind::Adaptive,
                strength: 0.2,
                attack_time: 0.02,
                decay_time: 0.05,
            },
            Self::Smooth => SmoothingConfig {
                kind: SmoothingKind::Simple,
                strength: 0.6,
                attack_time: 0.1,
                decay_time: 0.3,
            },
            Self::Bouncy => SmoothingConfig {
                kind: SmoothingKind::Momentum,
                strength: 0.4,
                attack_time: 0.05,
                decay_time: 0.2,
            },
        }
    }
}

impl fmt::Display for SmoothingPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Responsive => write!(f, "Responsive"),
            Self::Smooth => write!(f, "Smooth"),
            Self::Bouncy => write!(f, "Bouncy"),
        }
    }
}

// Momentum model constants
const MOMENTUM_FACTOR: f32 = 0.5;
const MOMENTUM_DAMPING: f32 = 0.4;
const MOMENTUM_RESPONSIVENESS: f32 = 2.0;
const MOMENTUM_NEAR_TARGET: f32 = 0.1;
const MOMENTUM_EXTRA_DAMPING: f32 = 0.8;

/// Stateful smoothing filter
#[derive(Debug, Clone, Default)]
pub struct Smoother {
    config: SmoothingConfig,
    current: f32,
    velocity: f32,
}

impl Smoother {
    pub fn new(config: SmoothingConfig) -> Self {
        Self {
            config,
            current: 0.0,
            velocity: 0.0,
        }
    }

    pub fn config(&self) -> &SmoothingConfig {
        &self.config
    }

    /// Swap parameters without dropping the current level
    pub fn set_config(&mut self, config: SmoothingConfig) {
        if config.kind != self.config.kind {
            self.velocity = 0.0;
        }
        self.config = config;
    }

    /// Last smoothed value
    pub fn current(&self) -> f32 {
        self.current
    }

    /// Drop all state (used by emergency stop and when audio is disabled)
    pub fn reset(&mut self) {
        self.current = 0.0;
        self.velocity = 0.0;
    }

    /// Advance the filter towards `target` over `dt` seconds.
    pub fn step(&mut self, target: f32, dt: f32) -> f32 {
        let target = if target.is_finite() {
            target.clamp(0.0, 1.0)
        } else {
            0.0
        };
        let dt = dt.max(0.0);
        let current = self.current;

        let next = match self.config.kind {
            SmoothingKind::None => target,
            SmoothingKind::Simple => {
                let s = self.config.strength.clamp(0.0, 1.0);
                s * current + (1.0 - s) * target
            }
            SmoothingKind::Adaptive => {
                let attack = self.config.attack_time.max(MIN_TIME_CONSTANT);
                let decay = self.config.decay_time.max(MIN_TIME_CONSTANT);
                if target > current {
                    let factor = (dt / attack).min(1.0);
                    current + (target - current) * factor
                } else if target == 0.0 {
                    // Exponential falloff, never more than 95% per step
                    let factor = 1.0 - (dt / decay).min(0.95);
                    current * factor
                } else {
                    let factor = (dt / decay).min(1.0);
                    current + (target - current) * factor
                }
            }
            SmoothingKind::Momentum => {
                let desired = target - current;
                self.velocity = MOMENTUM_FACTOR * self.velocity
                    + (1.0 - MOMENTUM_FACTOR) * desired * MOMENTUM_RESPONSIVENESS;
                self.velocity *= 1.0 - MOMENTUM_DAMPING * dt;
                let next = current + self.velocity * dt;
                if (target - current).abs() < MOMENTUM_NEAR_TARGET {
                    self.velocity *= 1.0 - MOMENTUM_EXTRA_DAMPING * dt;
                }
                next
            }
        };

        let next = if next < CUTOFF_THRESHOLD && target == 0.0 {
            self.velocity = 0.0;
            0.0
        } else {
            next.clamp(0.0, 1.0)
        };

        self.current = next;
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn smoother(kind: SmoothingKind) -> Smoother {
        Smoother::new(SmoothingConfig {
            kind,
            ..Default::default()
        })
    }

    #[test]
    fn test_none_is_instant() {
        let mut s = smoother(SmoothingKind::None);
        assert_eq!(s.step(0.7, 0.02), 0.7);
        assert_eq!(s.step(0.1, 0.02), 0.1);
    }

    #[test]
    fn test_simple_blends_by_strength() {
        let mut s = Smoother::new(SmoothingConfig {
            kind: SmoothingKind::Simple,
            strength: 0.5,
            ..Default::default()
        });
        assert_relative_eq!(s.step(1.0, 0.02), 0.5);
        assert_relative_eq!(s.step(1.0, 0.02), 0.75);
    }

    #[test]
    fn test_adaptive_attack_reaches_target_after_attack_time() {
        let mut s = Smoother::new(SmoothingConfig {
            kind: SmoothingKind::Adaptive,
            attack_time: 0.05,
            ..Default::default()
        });
        // dt >= attack time jumps straight to the target
        assert_relative_eq!(s.step(0.6, 0.05), 0.6);
    }

    #[test]
    fn test_adaptive_decay_to_zero_is_capped() {
        let mut s = Smoother::new(SmoothingConfig {
            kind: SmoothingKind::Adaptive,
            attack_time: 0.01,
            decay_time: 0.1,
            ..Default::default()
        });
        s.step(1.0, 1.0);
        // A huge dt still keeps 5% of the level
        assert_relative_eq!(s.step(0.0, 10.0), 0.05, epsilon = 1e-6);
    }

    #[test]
    fn test_cutoff_snaps_to_zero() {
        let mut s = smoother(SmoothingKind::Simple);
        s.step(0.004, 1.0);
        assert_eq!(s.step(0.0, 0.02), 0.0);
    }

    #[test]
    fn test_momentum_moves_towards_target() {
        let mut s = smoother(SmoothingKind::Momentum);
        let mut last = 0.0;
        for _ in 0..50 {
            last = s.step(0.8, 0.02);
        }
        assert!(last > 0.0 && last <= 1.0, "momentum level {}", last);
    }

    #[test]
    fn test_non_finite_target_is_zero() {
        let mut s = smoother(SmoothingKind::None);
        assert_eq!(s.step(f32::NAN, 0.02), 0.0);
    }

    #[test]
    fn test_presets() {
        assert_eq!(
            SmoothingPreset::Responsive.config().kind,
            SmoothingKind::Adaptive
        );
        assert_eq!(SmoothingPreset::Smooth.config().kind, SmoothingKind::Simple);
        assert_eq!(SmoothingPreset::Bouncy.config().kind, SmoothingKind::Momentum);
    }
}
