//! Profile Assembler - folds classifications, instrument evidence, and
//! scalar signals into the emitted UserProfile.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::domain::classifier::{DimensionClassification, DimensionState};
use crate::domain::confidence::ConfidenceModel;
use crate::domain::conflict::ContradictionFlag;
use crate::domain::foundation::{Score, Timestamp, ValidationError};
use crate::domain::indicator::Dimension;
use crate::domain::instruments::InstrumentClass;
use crate::domain::ledger::UserEvidenceLedger;
use crate::domain::post::AnalysisWindow;

/// Enumerated in-app trading likelihood, bucketed from product fit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Likelihood {
    Low,
    Medium,
    High,
    VeryHigh,
}

impl Likelihood {
    pub fn from_score(score: Score) -> Self {
        match score.value() {
            85..=100 => Likelihood::VeryHigh,
            65..=84 => Likelihood::High,
            40..=64 => Likelihood::Medium,
            _ => Likelihood::Low,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Likelihood::Low => "low",
            Likelihood::Medium => "medium",
            Likelihood::High => "high",
            Likelihood::VeryHigh => "very_high",
        }
    }
}

impl fmt::Display for Likelihood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The in-window period a profile covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisPeriod {
    pub start: Timestamp,
    pub end: Timestamp,
}

impl From<AnalysisWindow> for AnalysisPeriod {
    fn from(window: AnalysisWindow) -> Self {
        Self {
            start: window.start,
            end: window.end,
        }
    }
}

/// Reported outcome for the timeframe and strategy dimensions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimensionReport {
    pub state: DimensionState,
    pub primary: Option<String>,
    pub confidence: Score,
    pub evidence: Vec<String>,
    pub secondary: Option<String>,
    pub secondary_confidence: Option<Score>,
}

impl DimensionReport {
    fn from_classification(c: &DimensionClassification) -> Self {
        Self {
            state: c.state,
            primary: c.primary.as_ref().map(|p| p.category.clone()),
            confidence: c.confidence,
            evidence: c
                .primary
                .as_ref()
                .map(|p| p.evidence.clone())
                .unwrap_or_default(),
            secondary: c.secondary.as_ref().map(|s| s.category.clone()),
            secondary_confidence: c.secondary.as_ref().map(|s| s.confidence),
        }
    }
}

/// Reported conviction: level plus supporting evidence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConvictionReport {
    pub state: DimensionState,
    pub level: Option<String>,
    pub score: Score,
    pub evidence: Vec<String>,
}

/// Reported risk posture.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskReport {
    pub state: DimensionState,
    pub category: Option<String>,
    pub score: Score,
    pub evidence: Vec<String>,
}

/// Reported instrument preference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstrumentsReport {
    pub primary: Option<InstrumentClass>,
    pub types: Vec<InstrumentClass>,
    pub confidence: Score,
}

/// One emitted record per analyzed user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub username: String,
    pub total_posts: u32,
    pub analysis_period: Option<AnalysisPeriod>,
    pub timeframe: DimensionReport,
    pub strategy: DimensionReport,
    pub conviction: ConvictionReport,
    pub risk_profile: RiskReport,
    pub instruments: InstrumentsReport,
    pub product_fit_score: Score,
    pub in_app_trading_likelihood: Likelihood,
    pub contradiction_flags: Vec<ContradictionFlag>,
    pub antagonism_score: u8,
    pub urgency_score: u8,
    pub avg_likes: f64,
    pub avg_replies: f64,
}

/// Affinity tables and weights for the product-fit score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductFitModel {
    pub timeframe_weight: f64,
    pub strategy_weight: f64,
    pub risk_weight: f64,
    pub timeframe_affinity: BTreeMap<String, u8>,
    pub strategy_affinity: BTreeMap<String, u8>,
    pub risk_affinity: BTreeMap<String, u8>,
    /// Affinity contributed by an unresolved, mixed, or insufficient
    /// dimension.
    pub unresolved_affinity: u8,
}

impl ProductFitModel {
    /// Checks that weights sum to 1 and affinities stay in range.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let sum = self.timeframe_weight + self.strategy_weight + self.risk_weight;
        if (sum - 1.0).abs() > 1e-9 {
            return Err(ValidationError::invalid_format(
                "product_fit_weights",
                format!("weights sum to {sum}, expected 1.0"),
            ));
        }
        for (name, table) in [
            ("timeframe_affinity", &self.timeframe_affinity),
            ("strategy_affinity", &self.strategy_affinity),
            ("risk_affinity", &self.risk_affinity),
        ] {
            for (category, value) in table {
                if *value > 100 {
                    return Err(ValidationError::out_of_range(
                        format!("{name}.{category}"),
                        0,
                        100,
                        i64::from(*value),
                    ));
                }
            }
        }
        if self.unresolved_affinity > 100 {
            return Err(ValidationError::out_of_range(
                "unresolved_affinity",
                0,
                100,
                i64::from(self.unresolved_affinity),
            ));
        }
        Ok(())
    }

    /// Weighted product-fit score across timeframe, strategy, and risk.
    pub fn score(
        &self,
        timeframe: &DimensionClassification,
        strategy: &DimensionClassification,
        risk: &DimensionClassification,
    ) -> Score {
        let raw = self.timeframe_weight * self.affinity(&self.timeframe_affinity, timeframe)
            + self.strategy_weight * self.affinity(&self.strategy_affinity, strategy)
            + self.risk_weight * self.affinity(&self.risk_affinity, risk);
        Score::new(raw.round().clamp(0.0, 100.0) as u8)
    }

    fn affinity(&self, table: &BTreeMap<String, u8>, c: &DimensionClassification) -> f64 {
        if c.state != DimensionState::Resolved {
            return f64::from(self.unresolved_affinity);
        }
        c.primary_category()
            .and_then(|category| table.get(category))
            .copied()
            .map(f64::from)
            .unwrap_or(f64::from(self.unresolved_affinity))
    }
}

/// Builds UserProfiles from per-user run state.
pub struct ProfileAssembler {
    fit: ProductFitModel,
    confidence: ConfidenceModel,
}

impl ProfileAssembler {
    pub fn new(fit: ProductFitModel, confidence: ConfidenceModel) -> Self {
        Self { fit, confidence }
    }

    pub fn assemble(
        &self,
        ledger: &UserEvidenceLedger,
        classifications: &BTreeMap<Dimension, DimensionClassification>,
        contradiction_flags: Vec<ContradictionFlag>,
        period: Option<AnalysisPeriod>,
    ) -> UserProfile {
        let timeframe = &classifications[&Dimension::Timeframe];
        let strategy = &classifications[&Dimension::Strategy];
        let conviction = &classifications[&Dimension::Conviction];
        let risk = &classifications[&Dimension::Risk];

        let product_fit_score = self.fit.score(timeframe, strategy, risk);

        UserProfile {
            username: ledger.username().to_string(),
            total_posts: ledger.posts_considered(),
            analysis_period: period,
            timeframe: DimensionReport::from_classification(timeframe),
            strategy: DimensionReport::from_classification(strategy),
            conviction: ConvictionReport {
                state: conviction.state,
                level: conviction.primary.as_ref().map(|p| p.category.clone()),
                score: conviction.confidence,
                evidence: conviction
                    .primary
                    .as_ref()
                    .map(|p| p.evidence.clone())
                    .unwrap_or_default(),
            },
            risk_profile: RiskReport {
                state: risk.state,
                category: risk.primary.as_ref().map(|p| p.category.clone()),
                score: risk.confidence,
                evidence: risk
                    .primary
                    .as_ref()
                    .map(|p| p.evidence.clone())
                    .unwrap_or_default(),
            },
            instruments: self.instruments(ledger),
            product_fit_score,
            in_app_trading_likelihood: Likelihood::from_score(product_fit_score),
            contradiction_flags,
            antagonism_score: ledger.mean_antagonism(),
            urgency_score: ledger.mean_urgency(),
            avg_likes: ledger.avg_likes(),
            avg_replies: ledger.avg_replies(),
        }
    }

    /// Resolves instrument preference by strict precedence; plain ticker
    /// mentions fall through to stocks_only only when no richer channel
    /// has evidence.
    fn instruments(&self, ledger: &UserEvidenceLedger) -> InstrumentsReport {
        let tallies = ledger.instrument_tallies();
        let types: Vec<InstrumentClass> = InstrumentClass::PRECEDENCE
            .iter()
            .filter(|class| tallies.contains_key(class))
            .copied()
            .collect();

        if let Some(primary) = types.first().copied() {
            let tally = &tallies[&primary];
            return InstrumentsReport {
                primary: Some(primary),
                types,
                confidence: self.confidence.score(tally),
            };
        }

        if ledger.posts_with_symbols() > 0 {
            return InstrumentsReport {
                primary: Some(InstrumentClass::StocksOnly),
                types: vec![InstrumentClass::StocksOnly],
                confidence: self
                    .confidence
                    .score_counts(1, ledger.posts_with_symbols()),
            };
        }

        InstrumentsReport {
            primary: None,
            types: vec![],
            confidence: Score::ZERO,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::classifier::CategoryScore;
    use crate::domain::extractor::ExtractionOutput;
    use crate::domain::instruments::InstrumentEvent;
    use crate::domain::post::{Engagement, Post};
    use crate::domain::signals::PostSignals;

    fn fit_model() -> ProductFitModel {
        ProductFitModel {
            timeframe_weight: 0.4,
            strategy_weight: 0.35,
            risk_weight: 0.25,
            timeframe_affinity: BTreeMap::from([
                ("ultra_short_term".to_string(), 100),
                ("short_term".to_string(), 85),
                ("long_term".to_string(), 20),
            ]),
            strategy_affinity: BTreeMap::from([
                ("day_trader".to_string(), 100),
                ("value_investor".to_string(), 15),
            ]),
            risk_affinity: BTreeMap::from([
                ("aggressive".to_string(), 100),
                ("conservative".to_string(), 20),
            ]),
            unresolved_affinity: 0,
        }
    }

    fn resolved(dimension: Dimension, category: &str, confidence: u8) -> DimensionClassification {
        DimensionClassification {
            dimension,
            state: DimensionState::Resolved,
            primary: Some(CategoryScore {
                category: category.to_string(),
                confidence: Score::new(confidence),
                evidence: vec!["kw".to_string()],
            }),
            secondary: None,
            confidence: Score::new(confidence),
        }
    }

    fn insufficient(dimension: Dimension) -> DimensionClassification {
        DimensionClassification {
            dimension,
            state: DimensionState::Insufficient,
            primary: None,
            secondary: None,
            confidence: Score::ZERO,
        }
    }

    fn all_classifications(
        timeframe: DimensionClassification,
        strategy: DimensionClassification,
        conviction: DimensionClassification,
        risk: DimensionClassification,
    ) -> BTreeMap<Dimension, DimensionClassification> {
        BTreeMap::from([
            (Dimension::Timeframe, timeframe),
            (Dimension::Strategy, strategy),
            (Dimension::Conviction, conviction),
            (Dimension::Risk, risk),
        ])
    }

    fn ledger_with_instruments(instruments: Vec<InstrumentEvent>, symbols: bool) -> UserEvidenceLedger {
        let mut ledger = UserEvidenceLedger::new("alice");
        let post = Post::new(
            "1",
            "alice",
            Timestamp::from_unix_secs(1_700_000_000),
            "body",
            vec![],
            Engagement { likes: 4, replies: 2 },
        )
        .unwrap();
        let output = ExtractionOutput {
            events: vec![],
            instruments,
            has_symbols: symbols,
        };
        ledger.record(&post, &output, PostSignals::default(), 1);
        ledger
    }

    fn assembler() -> ProfileAssembler {
        ProfileAssembler::new(fit_model(), ConfidenceModel::default())
    }

    #[test]
    fn likelihood_buckets_match_thresholds() {
        assert_eq!(Likelihood::from_score(Score::new(85)), Likelihood::VeryHigh);
        assert_eq!(Likelihood::from_score(Score::new(84)), Likelihood::High);
        assert_eq!(Likelihood::from_score(Score::new(65)), Likelihood::High);
        assert_eq!(Likelihood::from_score(Score::new(64)), Likelihood::Medium);
        assert_eq!(Likelihood::from_score(Score::new(40)), Likelihood::Medium);
        assert_eq!(Likelihood::from_score(Score::new(39)), Likelihood::Low);
    }

    #[test]
    fn product_fit_weights_affinities() {
        let model = fit_model();
        let score = model.score(
            &resolved(Dimension::Timeframe, "ultra_short_term", 90),
            &resolved(Dimension::Strategy, "day_trader", 80),
            &resolved(Dimension::Risk, "aggressive", 70),
        );
        // 0.4*100 + 0.35*100 + 0.25*100 = 100
        assert_eq!(score.value(), 100);

        let score = model.score(
            &resolved(Dimension::Timeframe, "long_term", 90),
            &resolved(Dimension::Strategy, "value_investor", 80),
            &resolved(Dimension::Risk, "conservative", 70),
        );
        // 0.4*20 + 0.35*15 + 0.25*20 = 18.25 -> 18
        assert_eq!(score.value(), 18);
    }

    #[test]
    fn unresolved_dimension_contributes_unresolved_affinity() {
        let model = fit_model();
        let score = model.score(
            &resolved(Dimension::Timeframe, "ultra_short_term", 90),
            &insufficient(Dimension::Strategy),
            &insufficient(Dimension::Risk),
        );
        // 0.4*100 + 0.35*0 + 0.25*0 = 40
        assert_eq!(score.value(), 40);
    }

    #[test]
    fn unknown_category_falls_back_to_unresolved_affinity() {
        let model = fit_model();
        let score = model.score(
            &resolved(Dimension::Timeframe, "unheard_of", 90),
            &insufficient(Dimension::Strategy),
            &insufficient(Dimension::Risk),
        );
        assert_eq!(score.value(), 0);
    }

    #[test]
    fn validate_rejects_weights_not_summing_to_one() {
        let mut model = fit_model();
        model.risk_weight = 0.5;
        assert!(model.validate().is_err());
        assert!(fit_model().validate().is_ok());
    }

    #[test]
    fn validate_rejects_out_of_range_affinity() {
        let mut model = fit_model();
        model.timeframe_affinity.insert("broken".to_string(), 101);
        assert!(model.validate().is_err());
    }

    #[test]
    fn instrument_precedence_prefers_options_over_crypto() {
        let ledger = ledger_with_instruments(
            vec![
                InstrumentEvent {
                    class: InstrumentClass::Crypto,
                    indicator: "btc".to_string(),
                    weight: 1,
                },
                InstrumentEvent {
                    class: InstrumentClass::Options,
                    indicator: "call".to_string(),
                    weight: 1,
                },
            ],
            false,
        );
        let report = assembler().instruments(&ledger);
        assert_eq!(report.primary, Some(InstrumentClass::Options));
        assert_eq!(
            report.types,
            vec![InstrumentClass::Options, InstrumentClass::Crypto]
        );
    }

    #[test]
    fn symbols_without_channel_evidence_mean_stocks_only() {
        let ledger = ledger_with_instruments(vec![], true);
        let report = assembler().instruments(&ledger);
        assert_eq!(report.primary, Some(InstrumentClass::StocksOnly));
        assert_eq!(report.types, vec![InstrumentClass::StocksOnly]);
        assert!(report.confidence.value() >= 30);
    }

    #[test]
    fn no_instrument_evidence_leaves_preference_empty() {
        let ledger = ledger_with_instruments(vec![], false);
        let report = assembler().instruments(&ledger);
        assert_eq!(report.primary, None);
        assert!(report.types.is_empty());
        assert_eq!(report.confidence, Score::ZERO);
    }

    #[test]
    fn assemble_builds_full_profile() {
        let ledger = ledger_with_instruments(
            vec![InstrumentEvent {
                class: InstrumentClass::Options,
                indicator: "call".to_string(),
                weight: 1,
            }],
            true,
        );
        let classifications = all_classifications(
            resolved(Dimension::Timeframe, "ultra_short_term", 90),
            resolved(Dimension::Strategy, "day_trader", 80),
            resolved(Dimension::Conviction, "high", 70),
            resolved(Dimension::Risk, "aggressive", 60),
        );

        let profile = assembler().assemble(&ledger, &classifications, vec![], None);

        assert_eq!(profile.username, "alice");
        assert_eq!(profile.total_posts, 1);
        assert_eq!(profile.timeframe.primary.as_deref(), Some("ultra_short_term"));
        assert_eq!(profile.conviction.level.as_deref(), Some("high"));
        assert_eq!(profile.risk_profile.category.as_deref(), Some("aggressive"));
        assert_eq!(profile.product_fit_score.value(), 100);
        assert_eq!(profile.in_app_trading_likelihood, Likelihood::VeryHigh);
        assert_eq!(profile.instruments.primary, Some(InstrumentClass::Options));
        assert_eq!(profile.avg_likes, 4.0);
        assert_eq!(profile.avg_replies, 2.0);
        assert!(profile.contradiction_flags.is_empty());
    }
}
