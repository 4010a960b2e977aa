//! Classification methodology: the versioned rule tables a run executes.
//!
//! Every behavior knob lives here - indicator tables, confidence bands,
//! thresholds, contradiction pairs, product-fit weights. A methodology is
//! loaded once, validated, and shared read-only across all workers.
//!
//! The builtin methodology ships a complete default rule set; a YAML file
//! may override any section independently.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::config::ConfigError;
use crate::domain::classifier::ClassifierSettings;
use crate::domain::confidence::ConfidenceModel;
use crate::domain::conflict::{ConflictSettings, ContradictionRule, ContradictionSide};
use crate::domain::extractor::ExpiryRules;
use crate::domain::foundation::ValidationError;
use crate::domain::indicator::{Dimension, IndicatorDefinition};
use crate::domain::instruments::{InstrumentClass, InstrumentIndicator, InstrumentRules};
use crate::domain::profile::ProductFitModel;
use crate::domain::signals::SignalLexicon;

/// The full rule set for one run, immutable once loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodologyConfig {
    #[serde(default = "default_version")]
    pub version: String,

    /// Keyword indicator tables for all four dimensions.
    #[serde(default = "default_indicators")]
    pub indicators: Vec<IndicatorDefinition>,

    #[serde(default = "default_instrument_rules")]
    pub instrument_rules: InstrumentRules,

    #[serde(default)]
    pub expiry: ExpiryRules,

    #[serde(default = "default_signal_lexicon")]
    pub signal_lexicon: SignalLexicon,

    #[serde(default)]
    pub confidence: ConfidenceModel,

    #[serde(default)]
    pub classifier: ClassifierSettings,

    #[serde(default)]
    pub conflict: ConflictSettings,

    #[serde(default = "default_contradictions")]
    pub contradictions: Vec<ContradictionRule>,

    #[serde(default = "default_product_fit")]
    pub product_fit: ProductFitModel,

    /// When set, occurrences from the most recent half of a user's
    /// in-window posts count twice. Distinct-type sets are unaffected, so
    /// confidence bands never change, only within-band position.
    #[serde(default)]
    pub recency_weighting: bool,
}

impl Default for MethodologyConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            indicators: default_indicators(),
            instrument_rules: default_instrument_rules(),
            expiry: ExpiryRules::default(),
            signal_lexicon: default_signal_lexicon(),
            confidence: ConfidenceModel::default(),
            classifier: ClassifierSettings::default(),
            conflict: ConflictSettings::default(),
            contradictions: default_contradictions(),
            product_fit: default_product_fit(),
            recency_weighting: false,
        }
    }
}

static BUILTIN: Lazy<MethodologyConfig> = Lazy::new(MethodologyConfig::default);

impl MethodologyConfig {
    /// The builtin methodology shipped with the binary.
    pub fn builtin() -> &'static MethodologyConfig {
        &BUILTIN
    }

    /// Loads a methodology from a YAML file.
    ///
    /// Omitted sections fall back to the builtin defaults.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::MethodologyIo {
            path: path.display().to_string(),
            source,
        })?;
        let config: MethodologyConfig = serde_yaml::from_str(&raw)?;
        Ok(config)
    }

    /// Validates the loaded rule tables.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.version.trim().is_empty() {
            return Err(ValidationError::empty_field("version"));
        }
        for def in &self.indicators {
            if def.category.trim().is_empty() {
                return Err(ValidationError::empty_field("indicator.category"));
            }
            if def.phrases.iter().all(|p| p.trim().is_empty()) {
                return Err(ValidationError::empty_field("indicator.phrases"));
            }
            if def.weight == 0 {
                return Err(ValidationError::out_of_range(
                    "indicator.weight",
                    1,
                    u32::MAX as i64,
                    0,
                ));
            }
        }
        for ind in &self.instrument_rules.indicators {
            if ind.phrases.iter().all(|p| p.trim().is_empty()) {
                return Err(ValidationError::empty_field("instrument.phrases"));
            }
        }
        if self.confidence.occurrence_step == 0 {
            return Err(ValidationError::out_of_range("confidence.occurrence_step", 1, 100, 0));
        }
        let penalty = self.classifier.mixed_penalty;
        if !(penalty > 0.0 && penalty <= 1.0) {
            return Err(ValidationError::invalid_format(
                "classifier.mixed_penalty",
                format!("{penalty} is outside (0, 1]"),
            ));
        }
        self.product_fit.validate()?;
        Ok(())
    }
}

fn default_version() -> String {
    "1.0.0".to_string()
}

fn def(dimension: Dimension, category: &str, phrases: &[&str]) -> IndicatorDefinition {
    IndicatorDefinition {
        dimension,
        category: category.to_string(),
        phrases: phrases.iter().map(|p| p.to_string()).collect(),
        weight: 1,
        co_occurs_with: None,
    }
}

fn default_indicators() -> Vec<IndicatorDefinition> {
    use Dimension::{Conviction, Risk, Strategy, Timeframe};
    vec![
        // timeframe: ultra_short_term
        def(Timeframe, "ultra_short_term", &["0dte"]),
        def(Timeframe, "ultra_short_term", &["same day"]),
        def(Timeframe, "ultra_short_term", &["intraday"]),
        def(Timeframe, "ultra_short_term", &["scalp", "scalping"]),
        def(Timeframe, "ultra_short_term", &["day trade", "day trading"]),
        def(Timeframe, "ultra_short_term", &["quick flip"]),
        def(Timeframe, "ultra_short_term", &["in and out"]),
        def(Timeframe, "ultra_short_term", &["1m chart", "5m chart", "15m chart"]),
        def(Timeframe, "ultra_short_term", &["vwap"]),
        def(Timeframe, "ultra_short_term", &["level 2"]),
        // timeframe: short_term
        def(Timeframe, "short_term", &["swing trade", "swing trading"]),
        def(Timeframe, "short_term", &["few days"]),
        def(Timeframe, "short_term", &["short term"]),
        def(Timeframe, "short_term", &["weekly"]),
        def(Timeframe, "short_term", &["this week"]),
        def(Timeframe, "short_term", &["1h chart", "4h chart"]),
        def(
            Timeframe,
            "short_term",
            &["holding through week", "holding through earnings"],
        ),
        def(Timeframe, "short_term", &["3 day play"]),
        // timeframe: medium_term
        def(Timeframe, "medium_term", &["position trade", "position trading"]),
        def(Timeframe, "medium_term", &["medium term"]),
        def(Timeframe, "medium_term", &["few weeks"]),
        def(Timeframe, "medium_term", &["couple months"]),
        def(Timeframe, "medium_term", &["momentum play"]),
        def(Timeframe, "medium_term", &["building position"]),
        def(Timeframe, "medium_term", &["accumulate", "accumulating"]),
        def(Timeframe, "medium_term", &["monthly expiration"]),
        def(Timeframe, "medium_term", &["leaps", "leap"]),
        // timeframe: long_term
        def(Timeframe, "long_term", &["long term"]),
        def(Timeframe, "long_term", &["holding"]),
        def(Timeframe, "long_term", &["investor"]),
        def(Timeframe, "long_term", &["buy and hold"]),
        def(Timeframe, "long_term", &["retirement"]),
        def(Timeframe, "long_term", &["years", "year"]),
        def(Timeframe, "long_term", &["forever hold"]),
        def(Timeframe, "long_term", &["core holding"]),
        def(Timeframe, "long_term", &["never selling"]),
        def(Timeframe, "long_term", &["dividend"]),
        // strategy: scalper
        def(Strategy, "scalper", &["scalp", "scalping"]),
        def(Strategy, "scalper", &["quick flip"]),
        def(Strategy, "scalper", &["in and out"]),
        def(Strategy, "scalper", &["ticks", "tick"]),
        def(Strategy, "scalper", &["level 2"]),
        def(Strategy, "scalper", &["tape reading"]),
        def(Strategy, "scalper", &["seconds to minutes"]),
        // strategy: day_trader
        def(Strategy, "day_trader", &["day trade", "day trading"]),
        def(Strategy, "day_trader", &["0dte"]),
        def(Strategy, "day_trader", &["intraday"]),
        def(Strategy, "day_trader", &["end of day"]),
        def(Strategy, "day_trader", &["no overnight risk"]),
        def(
            Strategy,
            "day_trader",
            &[
                "close all positions",
                "closes all positions",
                "closed all positions",
                "closing all positions",
            ],
        ),
        // strategy: swing_trader
        def(Strategy, "swing_trader", &["swing trade", "swing trading"]),
        def(Strategy, "swing_trader", &["swing"]),
        def(Strategy, "swing_trader", &["few days"]),
        def(Strategy, "swing_trader", &["weekly setup"]),
        def(Strategy, "swing_trader", &["short term play"]),
        def(Strategy, "swing_trader", &["2 day", "3 day", "5 day"]),
        // strategy: momentum_trader
        def(Strategy, "momentum_trader", &["momentum"]),
        def(Strategy, "momentum_trader", &["breakout"]),
        def(Strategy, "momentum_trader", &["trending"]),
        def(Strategy, "momentum_trader", &["riding the wave"]),
        def(Strategy, "momentum_trader", &["catching the move"]),
        def(Strategy, "momentum_trader", &["volume surge"]),
        def(Strategy, "momentum_trader", &["strong move"]),
        // strategy: value_investor
        def(Strategy, "value_investor", &["undervalued"]),
        def(Strategy, "value_investor", &["cheap"]),
        def(Strategy, "value_investor", &["pe ratio"]),
        def(Strategy, "value_investor", &["value"]),
        def(Strategy, "value_investor", &["fundamentals"]),
        def(Strategy, "value_investor", &["intrinsic value"]),
        def(Strategy, "value_investor", &["margin of safety"]),
        def(Strategy, "value_investor", &["buying the dip"]),
        def(Strategy, "value_investor", &["discount"]),
        // strategy: growth_investor
        def(Strategy, "growth_investor", &["growth stock"]),
        def(Strategy, "growth_investor", &["revenue growth"]),
        def(Strategy, "growth_investor", &["disruptive"]),
        def(Strategy, "growth_investor", &["innovation"]),
        def(Strategy, "growth_investor", &["future potential"]),
        def(Strategy, "growth_investor", &["high growth"]),
        def(Strategy, "growth_investor", &["expansion"]),
        def(Strategy, "growth_investor", &["scaling"]),
        // strategy: income_trader
        def(Strategy, "income_trader", &["dividends", "dividend"]),
        def(Strategy, "income_trader", &["income"]),
        def(Strategy, "income_trader", &["covered calls", "covered call"]),
        def(Strategy, "income_trader", &["selling premium"]),
        def(Strategy, "income_trader", &["theta gang"]),
        def(Strategy, "income_trader", &["yield"]),
        def(Strategy, "income_trader", &["monthly income"]),
        def(Strategy, "income_trader", &["cash flow"]),
        // strategy: contrarian
        def(Strategy, "contrarian", &["contrarian"]),
        def(Strategy, "contrarian", &["buying the dip"]),
        def(Strategy, "contrarian", &["everyone wrong"]),
        def(Strategy, "contrarian", &["fade the move"]),
        def(Strategy, "contrarian", &["oversold"]),
        def(Strategy, "contrarian", &["overbought"]),
        def(Strategy, "contrarian", &["sentiment extreme"]),
        def(Strategy, "contrarian", &["against the crowd"]),
        // conviction
        def(Conviction, "high", &["all in"]),
        def(Conviction, "high", &["biggest position"]),
        def(Conviction, "high", &["no doubt"]),
        def(Conviction, "high", &["guaranteed"]),
        def(Conviction, "high", &["adding more"]),
        def(Conviction, "high", &["very confident"]),
        def(Conviction, "high", &["heavy position"]),
        def(Conviction, "high", &["max conviction"]),
        def(Conviction, "medium", &["good setup"]),
        def(Conviction, "medium", &["think it goes"]),
        def(Conviction, "medium", &["should work"]),
        def(Conviction, "medium", &["starter position"]),
        def(Conviction, "medium", &["moderate size"]),
        def(Conviction, "medium", &["will add if"]),
        def(Conviction, "low", &["lottery ticket"]),
        def(Conviction, "low", &["small spec"]),
        def(Conviction, "low", &["might work"]),
        def(Conviction, "low", &["we'll see"]),
        def(Conviction, "low", &["risky"]),
        def(Conviction, "low", &["yolo"]),
        // risk
        def(Risk, "aggressive", &["0dte"]),
        def(Risk, "aggressive", &["tqqq", "sqqq"]),
        def(Risk, "aggressive", &["leverage"]),
        def(Risk, "aggressive", &["margin"]),
        def(Risk, "aggressive", &["yolo"]),
        def(Risk, "aggressive", &["all in"]),
        def(Risk, "aggressive", &["3x etf"]),
        def(Risk, "aggressive", &["high risk"]),
        def(Risk, "conservative", &["dividend"]),
        def(Risk, "conservative", &["blue chip"]),
        def(Risk, "conservative", &["safe"]),
        def(Risk, "conservative", &["stable"]),
        def(Risk, "conservative", &["capital preservation"]),
        def(Risk, "conservative", &["low risk"]),
        def(Risk, "conservative", &["defensive"]),
    ]
}

fn instrument(class: InstrumentClass, phrases: &[&str]) -> InstrumentIndicator {
    InstrumentIndicator {
        class,
        phrases: phrases.iter().map(|p| p.to_string()).collect(),
    }
}

fn default_instrument_rules() -> InstrumentRules {
    use InstrumentClass::{Crypto, Futures, LeveragedEtf, Options};
    InstrumentRules {
        indicators: vec![
            instrument(Options, &["calls", "call"]),
            instrument(Options, &["puts", "put"]),
            instrument(Options, &["options", "option"]),
            instrument(Options, &["strike"]),
            instrument(Options, &["expiry", "expiration"]),
            instrument(Options, &["theta"]),
            instrument(Options, &["delta"]),
            instrument(Options, &["vega"]),
            instrument(Options, &["implied volatility", "iv"]),
            instrument(Options, &["premium"]),
            instrument(Options, &["otm"]),
            instrument(Options, &["itm"]),
            instrument(Options, &["atm"]),
            instrument(Crypto, &["bitcoin", "btc"]),
            instrument(Crypto, &["ethereum", "eth"]),
            instrument(Crypto, &["crypto"]),
            instrument(Crypto, &["altcoin", "altcoins"]),
            instrument(Crypto, &["solana", "sol"]),
            instrument(Crypto, &["doge", "dogecoin"]),
            instrument(Futures, &["futures", "future"]),
            instrument(Futures, &["contracts", "contract"]),
            instrument(LeveragedEtf, &["leveraged etf", "leveraged"]),
            instrument(LeveragedEtf, &["3x etf", "3x"]),
            instrument(LeveragedEtf, &["2x"]),
            instrument(LeveragedEtf, &["inverse etf", "inverse"]),
            instrument(LeveragedEtf, &["short etf"]),
        ],
        leveraged_symbols: [
            "TQQQ", "SQQQ", "UVXY", "SPXU", "SPXL", "TNA", "TZA", "UPRO", "SDOW", "UDOW",
            "LABU", "LABD", "NAIL", "NUGT",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect(),
    }
}

fn words(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn default_signal_lexicon() -> SignalLexicon {
    SignalLexicon {
        strong_negative: words(&["stupid", "dumb", "idiot", "moron", "loser", "clown"]),
        disagreement: words(&[
            "wrong",
            "disagree",
            "nope",
            "nah",
            "no way",
            "false",
            "incorrect",
        ]),
        mocking: words(&[
            "lol",
            "lmao",
            "haha",
            "joke",
            "delusional",
            "cope",
            "copium",
            "salty",
            "rekt",
        ]),
        warning: words(&["careful", "be careful", "watch out", "caution", "warning"]),
        immediate_action: words(&[
            "right now",
            "asap",
            "immediately",
            "immediate",
            "buying now",
            "selling now",
        ]),
        time_pressure: words(&["quick", "fast", "today", "before close", "last chance"]),
        action_call: words(&["buy now", "sell now", "get in", "load up", "time to buy"]),
        fomo: words(&[
            "fomo",
            "missing out",
            "don't miss",
            "dont miss",
            "once in a lifetime",
            "can't miss",
        ]),
    }
}

fn default_contradictions() -> Vec<ContradictionRule> {
    let pair = |first_dim, first: &str, second_dim, second: &str| ContradictionRule {
        first: ContradictionSide::new(first_dim, first),
        second: ContradictionSide::new(second_dim, second),
    };
    vec![
        pair(
            Dimension::Timeframe,
            "ultra_short_term",
            Dimension::Strategy,
            "value_investor",
        ),
        pair(Dimension::Timeframe, "long_term", Dimension::Strategy, "scalper"),
        pair(Dimension::Timeframe, "long_term", Dimension::Strategy, "day_trader"),
        pair(Dimension::Risk, "conservative", Dimension::Strategy, "scalper"),
    ]
}

fn default_product_fit() -> ProductFitModel {
    let table = |entries: &[(&str, u8)]| {
        entries
            .iter()
            .map(|(category, value)| (category.to_string(), *value))
            .collect()
    };
    ProductFitModel {
        timeframe_weight: 0.4,
        strategy_weight: 0.35,
        risk_weight: 0.25,
        timeframe_affinity: table(&[
            ("ultra_short_term", 100),
            ("short_term", 85),
            ("medium_term", 45),
            ("long_term", 15),
        ]),
        strategy_affinity: table(&[
            ("scalper", 100),
            ("day_trader", 100),
            ("momentum_trader", 85),
            ("swing_trader", 70),
            ("contrarian", 50),
            ("income_trader", 35),
            ("growth_investor", 25),
            ("value_investor", 15),
        ]),
        risk_affinity: table(&[("aggressive", 100), ("moderate", 55), ("conservative", 20)]),
        unresolved_affinity: 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn builtin_methodology_is_valid() {
        assert!(MethodologyConfig::builtin().validate().is_ok());
    }

    #[test]
    fn builtin_covers_all_dimensions() {
        let methodology = MethodologyConfig::builtin();
        for dimension in Dimension::ALL {
            assert!(
                methodology.indicators.iter().any(|d| d.dimension == dimension),
                "no indicators for {dimension}"
            );
        }
    }

    #[test]
    fn builtin_product_fit_weights_sum_to_one() {
        let fit = &MethodologyConfig::builtin().product_fit;
        let sum = fit.timeframe_weight + fit.strategy_weight + fit.risk_weight;
        assert!((sum - 1.0).abs() < 1e-9);
    }

    #[test]
    fn builtin_leveraged_symbols_include_known_tickers() {
        let rules = &MethodologyConfig::builtin().instrument_rules;
        assert!(rules.leveraged_symbols.contains(&"TQQQ".to_string()));
        assert!(rules.leveraged_symbols.contains(&"NUGT".to_string()));
    }

    #[test]
    fn validate_rejects_zero_weight_indicator() {
        let mut methodology = MethodologyConfig::default();
        methodology.indicators[0].weight = 0;
        assert!(methodology.validate().is_err());
    }

    #[test]
    fn validate_rejects_penalty_above_one() {
        let mut methodology = MethodologyConfig::default();
        methodology.classifier.mixed_penalty = 1.5;
        assert!(methodology.validate().is_err());
    }

    #[test]
    fn validate_rejects_blank_version() {
        let mut methodology = MethodologyConfig::default();
        methodology.version = "  ".to_string();
        assert!(methodology.validate().is_err());
    }

    #[test]
    fn yaml_overrides_merge_with_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "version: \"2.0.0\"\nclassifier:\n  min_posts: 10\n  candidate_threshold: 30\n  secondary_threshold: 40\n  mixed_threshold: 50\n  closeness_threshold: 10\n  mixed_penalty: 0.6\nrecency_weighting: true"
        )
        .unwrap();

        let methodology = MethodologyConfig::from_yaml_file(file.path()).unwrap();

        assert_eq!(methodology.version, "2.0.0");
        assert_eq!(methodology.classifier.min_posts, 10);
        assert!(methodology.recency_weighting);
        // untouched sections keep builtin defaults
        assert!(!methodology.indicators.is_empty());
        assert_eq!(methodology.conflict.confidence_cap, 50);
    }

    #[test]
    fn missing_yaml_file_is_an_io_error() {
        let result = MethodologyConfig::from_yaml_file("/nonexistent/methodology.yaml");
        assert!(matches!(result, Err(ConfigError::MethodologyIo { .. })));
    }
}
