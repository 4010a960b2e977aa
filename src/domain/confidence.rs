//! Confidence Scorer - deterministic evidence-to-confidence mapping.
//!
//! Band membership is fixed by distinct-indicator-type count alone; this is
//! the contract callers rely on. Occurrence counts only move the score
//! within the band.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::Score;
use crate::domain::ledger::CategoryTally;

/// Maps (distinct types, occurrences) to a confidence score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfidenceModel {
    /// Points added per occurrence beyond the distinct-type count, within
    /// the band ceiling.
    pub occurrence_step: u8,
}

impl Default for ConfidenceModel {
    fn default() -> Self {
        Self { occurrence_step: 3 }
    }
}

impl ConfidenceModel {
    /// Band bounds for a distinct-type count.
    pub fn band(distinct: usize) -> (u8, u8) {
        match distinct {
            0 => (0, 29),
            1 => (30, 49),
            2 => (50, 69),
            3 => (70, 89),
            _ => (90, 100),
        }
    }

    /// Confidence for one category tally.
    ///
    /// Starts at the band floor; each occurrence beyond the distinct count
    /// adds `occurrence_step` points, clamped at the band ceiling.
    pub fn score(&self, tally: &CategoryTally) -> Score {
        self.score_counts(tally.distinct_count(), tally.occurrences)
    }

    pub fn score_counts(&self, distinct: usize, occurrences: u32) -> Score {
        let (floor, ceiling) = Self::band(distinct);
        let surplus = occurrences.saturating_sub(distinct as u32);
        let raw = u32::from(floor) + surplus * u32::from(self.occurrence_step);
        Score::new(raw.min(u32::from(ceiling)) as u8)
    }
}
