//! Conflict Detector - cross-dimension contradiction flagging.
//!
//! Contradictions are an explicit, enumerable pair table, never inferred.
//! When both sides of a pair are held with real confidence, the profile is
//! flagged and the affected dimensions' reported confidence is capped
//! rather than silently picking a winner.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::domain::classifier::{DimensionClassification, DimensionState};
use crate::domain::foundation::Score;
use crate::domain::indicator::Dimension;

/// One side of a contradiction pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContradictionSide {
    pub dimension: Dimension,
    pub category: String,
}

impl ContradictionSide {
    pub fn new(dimension: Dimension, category: impl Into<String>) -> Self {
        Self {
            dimension,
            category: category.into(),
        }
    }
}

/// A configured pair of mutually contradictory resolved labels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContradictionRule {
    pub first: ContradictionSide,
    pub second: ContradictionSide,
}

/// A raised contradiction, carried on the profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContradictionFlag {
    pub first: ContradictionSide,
    pub second: ContradictionSide,
}

/// Settings for contradiction detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConflictSettings {
    /// Both sides must individually reach this confidence to trigger.
    pub trigger_threshold: u8,
    /// Ceiling applied to affected dimensions' reported confidence.
    pub confidence_cap: u8,
}

impl Default for ConflictSettings {
    fn default() -> Self {
        Self {
            trigger_threshold: 50,
            confidence_cap: 50,
        }
    }
}

/// Applies the contradiction pair table to a user's classifications.
pub struct ConflictDetector {
    rules: Vec<ContradictionRule>,
    settings: ConflictSettings,
}

impl ConflictDetector {
    pub fn new(rules: Vec<ContradictionRule>, settings: ConflictSettings) -> Self {
        Self { rules, settings }
    }

    /// Detects contradictions and caps affected confidences in place.
    ///
    /// Returns the raised flags in rule-table order.
    pub fn apply(
        &self,
        classifications: &mut BTreeMap<Dimension, DimensionClassification>,
    ) -> Vec<ContradictionFlag> {
        let mut flags = Vec::new();
        for rule in &self.rules {
            if self.side_holds(classifications, &rule.first)
                && self.side_holds(classifications, &rule.second)
            {
                flags.push(ContradictionFlag {
                    first: rule.first.clone(),
                    second: rule.second.clone(),
                });
                self.cap(classifications, rule.first.dimension);
                self.cap(classifications, rule.second.dimension);
            }
        }
        flags
    }

    fn side_holds(
        &self,
        classifications: &BTreeMap<Dimension, DimensionClassification>,
        side: &ContradictionSide,
    ) -> bool {
        // Only a resolved label can contradict; a mixed dimension has no
        // clear primary to hold against the other side.
        classifications
            .get(&side.dimension)
            .map(|c| {
                c.state == DimensionState::Resolved
                    && c.primary_category() == Some(side.category.as_str())
                    && c.confidence.value() >= self.settings.trigger_threshold
            })
            .unwrap_or(false)
    }

    fn cap(
        &self,
        classifications: &mut BTreeMap<Dimension, DimensionClassification>,
        dimension: Dimension,
    ) {
        if let Some(classification) = classifications.get_mut(&dimension) {
            classification.confidence = classification
                .confidence
                .capped_at(Score::new(self.settings.confidence_cap));
        }
    }
}
