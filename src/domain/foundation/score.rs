//! Score value object (0-100 scale) for confidence and fit values.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A confidence or fit value between 0 and 100 inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Score(u8);

impl Score {
    /// Zero score.
    pub const ZERO: Self = Self(0);

    /// Maximum score.
    pub const MAX: Self = Self(100);

    /// Creates a new Score, clamping to valid range.
    pub fn new(value: u8) -> Self {
        Self(value.min(100))
    }

    /// Returns the value as u8.
    pub fn value(&self) -> u8 {
        self.0
    }

    /// Returns this score multiplied by a factor, floored and clamped.
    ///
    /// Flooring keeps the result at or below the exact product, so a
    /// penalty factor is a hard ceiling rather than a rounding target.
    pub fn scaled_down(&self, factor: f64) -> Self {
        let scaled = (f64::from(self.0) * factor).floor();
        Self::new(scaled.clamp(0.0, 100.0) as u8)
    }

    /// Returns the smaller of this score and a ceiling.
    pub fn capped_at(&self, ceiling: Score) -> Self {
        Self(self.0.min(ceiling.0))
    }
}

impl Default for Score {
    fn default() -> Self {
        Self::ZERO
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
