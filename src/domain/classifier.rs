//! Dimension Classifier - resolves one dimension's evidence into a
//! classification through a small state machine.
//!
//! Lifecycle per dimension: `Unclassified` -> `Candidate` once one category
//! clears the candidate threshold, then a terminal `Resolved` or `Mixed`.
//! `Insufficient` is terminal from the start when the user is below the
//! minimum post count.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::confidence::ConfidenceModel;
use crate::domain::foundation::{Score, StateMachine};
use crate::domain::indicator::Dimension;
use crate::domain::ledger::{CategoryTally, UserEvidenceLedger};

/// Classification state for one dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DimensionState {
    Unclassified,
    Candidate,
    Resolved,
    Mixed,
    Insufficient,
}

impl DimensionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            DimensionState::Unclassified => "unclassified",
            DimensionState::Candidate => "candidate",
            DimensionState::Resolved => "resolved",
            DimensionState::Mixed => "mixed",
            DimensionState::Insufficient => "insufficient_data",
        }
    }
}

impl fmt::Display for DimensionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl StateMachine for DimensionState {
    fn can_transition_to(&self, target: &Self) -> bool {
        self.valid_transitions().contains(target)
    }

    fn valid_transitions(&self) -> Vec<Self> {
        match self {
            DimensionState::Unclassified => {
                vec![DimensionState::Candidate, DimensionState::Insufficient]
            }
            DimensionState::Candidate => {
                vec![DimensionState::Resolved, DimensionState::Mixed]
            }
            DimensionState::Resolved
            | DimensionState::Mixed
            | DimensionState::Insufficient => vec![],
        }
    }
}

/// One scored category with its supporting evidence types.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryScore {
    pub category: String,
    pub confidence: Score,
    /// Distinct indicator types supporting the category, sorted.
    pub evidence: Vec<String>,
}

/// Outcome of classifying one dimension for one user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimensionClassification {
    pub dimension: Dimension,
    pub state: DimensionState,
    pub primary: Option<CategoryScore>,
    pub secondary: Option<CategoryScore>,
    /// Effective confidence: the primary's raw score, penalized when mixed,
    /// and possibly capped later by the conflict detector.
    pub confidence: Score,
}

impl DimensionClassification {
    fn empty(dimension: Dimension, state: DimensionState) -> Self {
        Self {
            dimension,
            state,
            primary: None,
            secondary: None,
            confidence: Score::ZERO,
        }
    }

    pub fn primary_category(&self) -> Option<&str> {
        self.primary.as_ref().map(|p| p.category.as_str())
    }
}

/// Thresholds governing dimension resolution.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierSettings {
    /// Users below this in-window post count are insufficient for every
    /// dimension regardless of evidence strength.
    pub min_posts: u32,
    /// Minimum confidence for a category to be considered at all.
    pub candidate_threshold: u8,
    /// Minimum confidence for a runner-up to be reported as secondary.
    pub secondary_threshold: u8,
    /// Minimum runner-up confidence for a mixed outcome.
    pub mixed_threshold: u8,
    /// Maximum primary-to-runner-up gap for a mixed outcome.
    pub closeness_threshold: u8,
    /// Factor applied to the higher raw score when mixed.
    pub mixed_penalty: f64,
}

impl Default for ClassifierSettings {
    fn default() -> Self {
        Self {
            min_posts: 5,
            candidate_threshold: 30,
            secondary_threshold: 40,
            mixed_threshold: 50,
            closeness_threshold: 10,
            mixed_penalty: 0.6,
        }
    }
}

/// Classifies dimensions from an evidence ledger.
pub struct DimensionClassifier {
    model: ConfidenceModel,
    settings: ClassifierSettings,
}

impl DimensionClassifier {
    pub fn new(model: ConfidenceModel, settings: ClassifierSettings) -> Self {
        Self { model, settings }
    }

    /// Classifies one dimension of one user's ledger.
    pub fn classify(
        &self,
        dimension: Dimension,
        ledger: &UserEvidenceLedger,
    ) -> DimensionClassification {
        if ledger.posts_considered() < self.settings.min_posts {
            return DimensionClassification::empty(dimension, DimensionState::Insufficient);
        }

        let mut candidates: Vec<(CategoryScore, usize)> = ledger
            .categories(dimension)
            .iter()
            .map(|(category, tally)| (self.category_score(category, tally), tally.distinct_count()))
            .filter(|(scored, _)| scored.confidence.value() >= self.settings.candidate_threshold)
            .collect();

        if candidates.is_empty() {
            return DimensionClassification::empty(dimension, DimensionState::Unclassified);
        }

        // Score descending, then distinct-type count descending; the map's
        // category order settles remaining ties lexically.
        candidates.sort_by(|(a, a_distinct), (b, b_distinct)| {
            b.confidence
                .cmp(&a.confidence)
                .then_with(|| b_distinct.cmp(a_distinct))
                .then_with(|| a.category.cmp(&b.category))
        });

        let mut ranked = candidates.into_iter().map(|(scored, _)| scored);
        let primary = ranked.next();
        let runner_up = ranked.next();

        let Some(primary) = primary else {
            return DimensionClassification::empty(dimension, DimensionState::Unclassified);
        };

        if let Some(runner_up) = &runner_up {
            let gap = primary.confidence.value() - runner_up.confidence.value();
            if runner_up.confidence.value() >= self.settings.mixed_threshold
                && gap <= self.settings.closeness_threshold
            {
                let confidence = primary.confidence.scaled_down(self.settings.mixed_penalty);
                return DimensionClassification {
                    dimension,
                    state: DimensionState::Mixed,
                    confidence,
                    primary: Some(primary),
                    secondary: Some(runner_up.clone()),
                };
            }
        }

        let secondary = runner_up
            .filter(|r| r.confidence.value() >= self.settings.secondary_threshold);
        let confidence = primary.confidence;
        DimensionClassification {
            dimension,
            state: DimensionState::Resolved,
            primary: Some(primary),
            secondary,
            confidence,
        }
    }

    fn category_score(&self, category: &str, tally: &CategoryTally) -> CategoryScore {
        CategoryScore {
            category: category.to_string(),
            confidence: self.model.score(tally),
            evidence: tally.distinct.iter().cloned().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::extractor::ExtractionOutput;
    use crate::domain::foundation::Timestamp;
    use crate::domain::indicator::EvidenceEvent;
    use crate::domain::post::{Engagement, Post};
    use crate::domain::signals::PostSignals;

    fn classifier() -> DimensionClassifier {
        DimensionClassifier::new(ConfidenceModel::default(), ClassifierSettings::default())
    }

    fn ledger_with(posts: u32, events: Vec<(&str, &str, u32)>) -> UserEvidenceLedger {
        let mut ledger = UserEvidenceLedger::new("alice");
        for i in 0..posts {
            let id = format!("p{i}");
            let post = Post::new(
                &id,
                "alice",
                Timestamp::from_unix_secs(1_700_000_000 + u64::from(i)),
                "body",
                vec![],
                Engagement::default(),
            )
            .unwrap();
            let events = if i == 0 {
                events
                    .iter()
                    .map(|(category, indicator, weight)| {
                        EvidenceEvent::new(&id, Dimension::Timeframe, *category, *indicator, *weight)
                    })
                    .collect()
            } else {
                vec![]
            };
            let output = ExtractionOutput {
                events,
                instruments: vec![],
                has_symbols: false,
            };
            ledger.record(&post, &output, PostSignals::default(), 1);
        }
        ledger
    }

    #[test]
    fn below_minimum_posts_is_insufficient() {
        let ledger = ledger_with(4, vec![("ultra_short_term", "scalp", 10)]);
        let result = classifier().classify(Dimension::Timeframe, &ledger);
        assert_eq!(result.state, DimensionState::Insufficient);
        assert!(result.primary.is_none());
        assert_eq!(result.confidence, Score::ZERO);
    }

    #[test]
    fn no_candidate_above_threshold_stays_unclassified() {
        let ledger = ledger_with(5, vec![]);
        let result = classifier().classify(Dimension::Timeframe, &ledger);
        assert_eq!(result.state, DimensionState::Unclassified);
    }

    #[test]
    fn single_strong_category_resolves() {
        // 4 distinct, 6 occurrences -> 96
        let ledger = ledger_with(
            5,
            vec![
                ("ultra_short_term", "scalp", 2),
                ("ultra_short_term", "0dte", 2),
                ("ultra_short_term", "day trade", 1),
                ("ultra_short_term", "expiry_within_1d", 1),
            ],
        );
        let result = classifier().classify(Dimension::Timeframe, &ledger);
        assert_eq!(result.state, DimensionState::Resolved);
        assert_eq!(result.primary_category(), Some("ultra_short_term"));
        assert_eq!(result.confidence.value(), 96);
        assert!(result.secondary.is_none());
        let evidence = &result.primary.unwrap().evidence;
        assert_eq!(evidence.len(), 4);
    }

    #[test]
    fn close_second_above_fifty_goes_mixed_with_penalty() {
        // primary: 3 distinct, 5 occ -> 76; second: 3 distinct, 3 occ -> 70
        let ledger = ledger_with(
            5,
            vec![
                ("short_term", "swing", 2),
                ("short_term", "weekly", 2),
                ("short_term", "expiry_within_7d", 1),
                ("long_term", "leaps", 1),
                ("long_term", "buy and hold", 1),
                ("long_term", "expiry_beyond_180d", 1),
            ],
        );
        let result = classifier().classify(Dimension::Timeframe, &ledger);
        assert_eq!(result.state, DimensionState::Mixed);
        // floor(0.6 * 76) = 45; the penalized score never exceeds the
        // exact product.
        assert_eq!(result.confidence.value(), 45);
        assert_eq!(result.primary_category(), Some("short_term"));
        assert_eq!(
            result.secondary.as_ref().map(|s| s.category.as_str()),
            Some("long_term")
        );
    }

    #[test]
    fn distant_second_above_forty_becomes_secondary() {
        // primary: 4 distinct, 8 occ -> 100; second: 1 distinct, 5 occ -> 42
        let ledger = ledger_with(
            5,
            vec![
                ("ultra_short_term", "scalp", 3),
                ("ultra_short_term", "0dte", 2),
                ("ultra_short_term", "day trade", 2),
                ("ultra_short_term", "expiry_within_1d", 1),
                ("medium_term", "position trade", 5),
            ],
        );
        let result = classifier().classify(Dimension::Timeframe, &ledger);
        assert_eq!(result.state, DimensionState::Resolved);
        assert_eq!(result.confidence.value(), 100);
        assert_eq!(
            result.secondary.as_ref().map(|s| s.category.as_str()),
            Some("medium_term")
        );
    }

    #[test]
    fn weak_second_below_forty_is_dropped() {
        // second: 1 distinct, 1 occ -> 30
        let ledger = ledger_with(
            5,
            vec![
                ("ultra_short_term", "scalp", 3),
                ("ultra_short_term", "0dte", 2),
                ("ultra_short_term", "day trade", 2),
                ("ultra_short_term", "expiry_within_1d", 1),
                ("medium_term", "position trade", 1),
            ],
        );
        let result = classifier().classify(Dimension::Timeframe, &ledger);
        assert_eq!(result.state, DimensionState::Resolved);
        assert!(result.secondary.is_none());
    }

    #[test]
    fn equal_scores_tie_break_on_distinct_then_lexical() {
        // Both categories: 2 distinct, 2 occ -> 50. Lexical order wins.
        let ledger = ledger_with(
            5,
            vec![
                ("long_term", "leaps", 1),
                ("long_term", "hold", 1),
                ("medium_term", "position trade", 1),
                ("medium_term", "monthly", 1),
            ],
        );
        let result = classifier().classify(Dimension::Timeframe, &ledger);
        // 50 vs 50 within closeness -> mixed, primary is lexically first
        assert_eq!(result.state, DimensionState::Mixed);
        assert_eq!(result.primary_category(), Some("long_term"));
    }

    #[test]
    fn state_machine_allows_only_documented_transitions() {
        use crate::domain::foundation::StateMachine;

        assert!(DimensionState::Unclassified.can_transition_to(&DimensionState::Candidate));
        assert!(DimensionState::Unclassified.can_transition_to(&DimensionState::Insufficient));
        assert!(DimensionState::Candidate.can_transition_to(&DimensionState::Mixed));
        assert!(!DimensionState::Resolved.can_transition_to(&DimensionState::Candidate));
        assert!(!DimensionState::Unclassified.can_transition_to(&DimensionState::Resolved));
        assert!(DimensionState::Insufficient.is_terminal());
        assert!(!DimensionState::Candidate.is_terminal());
    }

    #[test]
    fn transition_rejects_invalid_target() {
        use crate::domain::foundation::StateMachine;

        let result = DimensionState::Resolved.transition_to(DimensionState::Candidate);
        assert!(result.is_err());
        assert!(DimensionState::Unclassified
            .transition_to(DimensionState::Candidate)
            .is_ok());
    }
}
