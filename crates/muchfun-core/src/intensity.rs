//! Normalized actuation strength.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Device actuation strength, always within `[0.0, 1.0]`.
///
/// Every constructor clamps, and NaN collapses to zero, so a value of this
/// type can be handed to the device client without further checks.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(from = "f32", into = "f32")]
pub struct Intensity(f32);

impl Intensity {
    /// Fully off
    pub const ZERO: Intensity = Intensity(0.0);
    /// Fully on
    pub const MAX: Intensity = Intensity(1.0);

    /// Create a new intensity, clamping into range.
    pub fn new(value: f32) -> Self {
        if value.is_nan() {
            Self(0.0)
        } else {
            Self(value.clamp(0.0, 1.0))
        }
    }

    /// Create from a percentage (0-100), as shown on sliders.
    pub fn from_percent(percent: f32) -> Self {
        Self::new(percent / 100.0)
    }

    /// Raw value
    pub fn value(self) -> f32 {
        self.0
    }

    /// Value as percentage
    pub fn percent(self) -> f32 {
        self.0 * 100.0
    }

    pub fn is_zero(self) -> bool {
        self.0 <= 0.0
    }

    /// Absolute distance to another intensity
    pub fn distance(self, other: Intensity) -> f32 {
        (self.0 - other.0).abs()
    }

    /// The larger of two intensities
    pub fn max(self, other: Intensity) -> Intensity {
        if other.0 > self.0 {
            other
        } else {
            self
        }
    }

    /// Scale by a factor, clamping the result
    pub fn scaled(self, factor: f32) -> Intensity {
        Intensity::new(self.0 * factor)
    }
}

impl From<f32> for Intensity {
    fn from(value: f32) -> Self {
        Intensity::new(value)
    }
}

impl From<Intensity> for f32 {
    fn from(value: Intensity) -> Self {
        value.0
    }
}

impl From<Intensity> for f64 {
    fn from(value: Intensity) -> Self {
        value.0 as f64
    }
}

impl fmt::Display for Intensity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.0}%", self.percent())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamps_out_of_range() {
        assert_eq!(Intensity::new(-0.5).value(), 0.0);
        assert_eq!(Intensity::new(1.5).value(), 1.0);
        assert_eq!(Intensity::new(0.25).value(), 0.25);
    }

    #[test]
    fn test_nan_is_zero() {
        assert_eq!(Intensity::new(f32::NAN), Intensity::ZERO);
        assert_eq!(Intensity::new(f32::INFINITY), Intensity::MAX);
    }

    #[test]
    fn test_percent_conversion() {
        let i = Intensity::from_percent(40.0);
        assert!((i.value() - 0.4).abs() < 1e-6);
        assert_eq!(format!("{}", i), "40%");
    }

    #[test]
    fn test_deserialize_clamps() {
        let i: Intensity = serde_json::from_str("3.0").unwrap();
        assert_eq!(i, Intensity::MAX);
    }
}
