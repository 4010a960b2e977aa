//! Scalar tone signals scored per post: antagonism and urgency.
//!
//! These sit outside the four classification dimensions but follow the same
//! evidence philosophy: additive points per matched phrase, capped at 100.
//! A profile carries the mean across the user's considered posts.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::Score;
use crate::domain::text;

/// Phrase groups feeding the antagonism and urgency point tables.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalLexicon {
    pub strong_negative: Vec<String>,
    pub disagreement: Vec<String>,
    pub mocking: Vec<String>,
    pub warning: Vec<String>,
    pub immediate_action: Vec<String>,
    pub time_pressure: Vec<String>,
    pub action_call: Vec<String>,
    pub fomo: Vec<String>,
}

/// Antagonism and urgency for one post, each in [0, 100].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostSignals {
    pub antagonism: Score,
    pub urgency: Score,
}

const ANTAGONISM_STRONG_NEGATIVE: u32 = 5;
const ANTAGONISM_DISAGREEMENT: u32 = 3;
const ANTAGONISM_MOCKING: u32 = 2;
const ANTAGONISM_WARNING: u32 = 1;
const ANTAGONISM_ALL_CAPS: u32 = 10;
const ANTAGONISM_PER_EXCLAMATION: u32 = 2;

const URGENCY_IMMEDIATE_ACTION: u32 = 8;
const URGENCY_TIME_PRESSURE: u32 = 5;
const URGENCY_ACTION_CALL: u32 = 10;
const URGENCY_FOMO: u32 = 7;
const URGENCY_ALL_CAPS: u32 = 15;
const URGENCY_PER_EXCLAMATION: u32 = 3;

#[derive(Debug, Clone)]
struct Group {
    phrases: Vec<Vec<String>>,
    points: u32,
}

impl Group {
    fn compile(phrases: &[String], points: u32) -> Self {
        Self {
            phrases: phrases
                .iter()
                .map(|p| text::tokenize(p))
                .filter(|t| !t.is_empty())
                .collect(),
            points,
        }
    }

    fn score(&self, tokens: &[String]) -> u32 {
        self.phrases
            .iter()
            .map(|p| text::count_phrase(tokens, p) * self.points)
            .sum()
    }
}

/// Scores posts against a compiled signal lexicon.
pub struct SignalScorer {
    antagonism: Vec<Group>,
    urgency: Vec<Group>,
}

impl SignalScorer {
    pub fn new(lexicon: &SignalLexicon) -> Self {
        Self {
            antagonism: vec![
                Group::compile(&lexicon.strong_negative, ANTAGONISM_STRONG_NEGATIVE),
                Group::compile(&lexicon.disagreement, ANTAGONISM_DISAGREEMENT),
                Group::compile(&lexicon.mocking, ANTAGONISM_MOCKING),
                Group::compile(&lexicon.warning, ANTAGONISM_WARNING),
            ],
            urgency: vec![
                Group::compile(&lexicon.immediate_action, URGENCY_IMMEDIATE_ACTION),
                Group::compile(&lexicon.time_pressure, URGENCY_TIME_PRESSURE),
                Group::compile(&lexicon.action_call, URGENCY_ACTION_CALL),
                Group::compile(&lexicon.fomo, URGENCY_FOMO),
            ],
        }
    }

    /// Scores one post body. Both totals clamp at 100.
    pub fn score(&self, body: &str) -> PostSignals {
        let tokens = text::tokenize(body);
        let all_caps = text::is_all_caps(body);
        let exclamations = text::exclamation_count(body);

        let mut antagonism: u32 = self.antagonism.iter().map(|g| g.score(&tokens)).sum();
        if all_caps {
            antagonism += ANTAGONISM_ALL_CAPS;
        }
        antagonism += exclamations * ANTAGONISM_PER_EXCLAMATION;

        let mut urgency: u32 = self.urgency.iter().map(|g| g.score(&tokens)).sum();
        if all_caps {
            urgency += URGENCY_ALL_CAPS;
        }
        urgency += exclamations * URGENCY_PER_EXCLAMATION;

        PostSignals {
            antagonism: Score::new(antagonism.min(100) as u8),
            urgency: Score::new(urgency.min(100) as u8),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lexicon() -> SignalLexicon {
        SignalLexicon {
            strong_negative: vec!["idiot".into(), "clown".into()],
            disagreement: vec!["wrong".into(), "no way".into()],
            mocking: vec!["lmao".into(), "cope".into()],
            warning: vec!["careful".into()],
            immediate_action: vec!["right now".into(), "asap".into()],
            time_pressure: vec!["before close".into()],
            action_call: vec!["buy now".into(), "load up".into()],
            fomo: vec!["missing out".into()],
        }
    }

    fn scorer() -> SignalScorer {
        SignalScorer::new(&lexicon())
    }

    #[test]
    fn neutral_text_scores_zero() {
        let signals = scorer().score("watching the market quietly this evening");
        assert_eq!(signals.antagonism, Score::ZERO);
        assert_eq!(signals.urgency, Score::ZERO);
    }

    #[test]
    fn antagonism_points_add_per_group() {
        // idiot(5) + wrong(3) + lmao(2) + careful(1) = 11
        let signals = scorer().score("lmao you are wrong, careful idiot");
        assert_eq!(signals.antagonism.value(), 11);
    }

    #[test]
    fn urgency_points_add_per_group() {
        // right now(8) + before close(5) + buy now(10) = 23
        let signals = scorer().score("buy now before close, right now people");
        assert_eq!(signals.urgency.value(), 23);
    }

    #[test]
    fn all_caps_adds_to_both_signals() {
        let signals = scorer().score("SELLING EVERYTHING SOON");
        assert_eq!(signals.antagonism.value(), 10);
        assert_eq!(signals.urgency.value(), 15);
    }

    #[test]
    fn exclamation_marks_add_per_mark() {
        let signals = scorer().score("huge move!!");
        assert_eq!(signals.antagonism.value(), 4);
        assert_eq!(signals.urgency.value(), 6);
    }

    #[test]
    fn repeated_phrases_count_each_occurrence() {
        let signals = scorer().score("asap asap asap");
        assert_eq!(signals.urgency.value(), 24);
    }

    #[test]
    fn scores_cap_at_one_hundred() {
        let body = "load up ".repeat(20);
        let signals = scorer().score(&body);
        assert_eq!(signals.urgency, Score::MAX);
    }

    #[test]
    fn empty_lexicon_still_scores_structure() {
        let scorer = SignalScorer::new(&SignalLexicon::default());
        let signals = scorer.score("GOING ALL IN TODAY!!!");
        assert_eq!(signals.antagonism.value(), 16);
        assert_eq!(signals.urgency.value(), 24);
    }
}
