//! Indicator Extractor - scans one post against the configured indicator
//! tables and emits typed evidence events.
//!
//! Matching is case-insensitive over normalized tokens. Within one
//! (dimension, category) table the longest phrase wins each token span, so
//! "swing" inside "swing trade" never registers twice for the same
//! category. Resolution across categories happens later, in the classifier.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::foundation::AnalysisError;
use crate::domain::indicator::{Dimension, EvidenceEvent, IndicatorDefinition};
use crate::domain::instruments::{InstrumentClass, InstrumentEvent, InstrumentRules};
use crate::domain::post::Post;
use crate::domain::text;

/// Indicator type tags for structured (non-keyword) expiry evidence.
pub const EXPIRY_WITHIN_1D: &str = "expiry_within_1d";
pub const EXPIRY_WITHIN_7D: &str = "expiry_within_7d";
pub const EXPIRY_WITHIN_90D: &str = "expiry_within_90d";
pub const EXPIRY_BEYOND_180D: &str = "expiry_beyond_180d";

/// Maps numeric expiry buckets onto timeframe categories.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExpiryRules {
    pub within_1d: String,
    pub within_7d: String,
    pub within_90d: String,
    pub beyond_180d: String,
    /// When set, a date-like token that cannot be resolved fails the post's
    /// user with an error marker instead of being ignored.
    pub strict: bool,
}

impl Default for ExpiryRules {
    fn default() -> Self {
        Self {
            within_1d: "ultra_short_term".to_string(),
            within_7d: "short_term".to_string(),
            within_90d: "medium_term".to_string(),
            beyond_180d: "long_term".to_string(),
            strict: false,
        }
    }
}

/// Everything extracted from one post.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractionOutput {
    pub events: Vec<EvidenceEvent>,
    pub instruments: Vec<InstrumentEvent>,
    pub has_symbols: bool,
}

#[derive(Debug, Clone)]
struct CompiledPhrase {
    tokens: Vec<String>,
    /// Canonical indicator type: the defining phrase of the source record.
    indicator: String,
    weight: u32,
    co_occurs: Option<Vec<String>>,
}

/// Stateless matcher over immutable, compiled indicator tables.
pub struct IndicatorExtractor {
    tables: BTreeMap<(Dimension, String), Vec<CompiledPhrase>>,
    instrument_tables: BTreeMap<InstrumentClass, Vec<CompiledPhrase>>,
    leveraged_symbols: BTreeSet<String>,
    expiry: ExpiryRules,
}

impl IndicatorExtractor {
    /// Compiles indicator tables for matching.
    ///
    /// Within one category, phrases are ordered longest first (then
    /// lexically) so the scan is deterministic and longest-match-wins.
    pub fn new(
        indicators: &[IndicatorDefinition],
        instrument_rules: &InstrumentRules,
        expiry: ExpiryRules,
    ) -> Self {
        let mut tables: BTreeMap<(Dimension, String), Vec<CompiledPhrase>> = BTreeMap::new();
        for def in indicators {
            let indicator = def
                .phrases
                .first()
                .map(|p| p.to_lowercase())
                .unwrap_or_default();
            let co_occurs = def
                .co_occurs_with
                .as_deref()
                .map(text::tokenize)
                .filter(|t| !t.is_empty());
            let entry = tables
                .entry((def.dimension, def.category.clone()))
                .or_default();
            for phrase in &def.phrases {
                let tokens = text::tokenize(phrase);
                if tokens.is_empty() {
                    continue;
                }
                entry.push(CompiledPhrase {
                    tokens,
                    indicator: indicator.clone(),
                    weight: def.weight,
                    co_occurs: co_occurs.clone(),
                });
            }
        }
        for phrases in tables.values_mut() {
            sort_longest_first(phrases);
        }

        let mut instrument_tables: BTreeMap<InstrumentClass, Vec<CompiledPhrase>> =
            BTreeMap::new();
        for ind in &instrument_rules.indicators {
            let indicator = ind
                .phrases
                .first()
                .map(|p| p.to_lowercase())
                .unwrap_or_default();
            let entry = instrument_tables.entry(ind.class).or_default();
            for phrase in &ind.phrases {
                let tokens = text::tokenize(phrase);
                if tokens.is_empty() {
                    continue;
                }
                entry.push(CompiledPhrase {
                    tokens,
                    indicator: indicator.clone(),
                    weight: 1,
                    co_occurs: None,
                });
            }
        }
        for phrases in instrument_tables.values_mut() {
            sort_longest_first(phrases);
        }

        Self {
            tables,
            instrument_tables,
            leveraged_symbols: instrument_rules
                .leveraged_symbols
                .iter()
                .map(|s| s.to_uppercase())
                .collect(),
            expiry,
        }
    }

    /// Extracts all evidence events from one post.
    ///
    /// A post may legitimately match many categories across dimensions;
    /// no resolution happens here.
    pub fn extract(&self, post: &Post) -> Result<ExtractionOutput, AnalysisError> {
        let tokens = text::tokenize(post.body());
        let mut output = ExtractionOutput {
            has_symbols: !post.symbols().is_empty(),
            ..Default::default()
        };

        for ((dimension, category), phrases) in &self.tables {
            for (indicator, weight) in scan_category(&tokens, phrases) {
                output.events.push(EvidenceEvent::new(
                    post.id(),
                    *dimension,
                    category.clone(),
                    indicator,
                    weight,
                ));
            }
        }

        self.extract_expiries(post, &tokens, &mut output.events)?;

        for (class, phrases) in &self.instrument_tables {
            for (indicator, weight) in scan_category(&tokens, phrases) {
                output.instruments.push(InstrumentEvent {
                    class: *class,
                    indicator,
                    weight,
                });
            }
        }
        for symbol in post.symbols() {
            let upper = symbol.to_uppercase();
            if self.leveraged_symbols.contains(&upper) {
                output.instruments.push(InstrumentEvent {
                    class: InstrumentClass::LeveragedEtf,
                    indicator: upper,
                    weight: 1,
                });
            }
        }

        Ok(output)
    }

    /// Resolves explicit date-like tokens against the post timestamp and
    /// emits bucketed timeframe evidence. `0dte` counts as same-day expiry.
    fn extract_expiries(
        &self,
        post: &Post,
        tokens: &[String],
        events: &mut Vec<EvidenceEvent>,
    ) -> Result<(), AnalysisError> {
        for token in tokens {
            if token == "0dte" {
                self.push_expiry_event(post, 0, events);
            }
        }

        for word in text::raw_words(post.body()) {
            let trimmed =
                word.trim_matches(|c: char| !c.is_ascii_digit() && c != '/');
            if !trimmed.contains('/') {
                continue;
            }
            match parse_expiry_date(trimmed, post) {
                Ok(Some(days)) => self.push_expiry_event(post, days, events),
                Ok(None) => {}
                Err(()) => {
                    if self.expiry.strict {
                        return Err(AnalysisError::UnparseableExpiry {
                            post_id: post.id().to_string(),
                            token: trimmed.to_string(),
                        });
                    }
                }
            }
        }
        Ok(())
    }

    fn push_expiry_event(&self, post: &Post, days: i64, events: &mut Vec<EvidenceEvent>) {
        let (category, indicator) = match days {
            0..=1 => (&self.expiry.within_1d, EXPIRY_WITHIN_1D),
            2..=7 => (&self.expiry.within_7d, EXPIRY_WITHIN_7D),
            8..=90 => (&self.expiry.within_90d, EXPIRY_WITHIN_90D),
            d if d > 180 => (&self.expiry.beyond_180d, EXPIRY_BEYOND_180D),
            // 91-180 days and past dates fall outside every bucket
            _ => return,
        };
        events.push(EvidenceEvent::new(
            post.id(),
            Dimension::Timeframe,
            category.clone(),
            indicator,
            1,
        ));
    }
}

fn sort_longest_first(phrases: &mut [CompiledPhrase]) {
    phrases.sort_by(|a, b| {
        b.tokens
            .len()
            .cmp(&a.tokens.len())
            .then_with(|| a.tokens.cmp(&b.tokens))
    });
}

/// Greedy longest-match scan of one category's phrase table.
///
/// Each token span can fire at most once for the category; across
/// categories spans are independent.
fn scan_category(tokens: &[String], phrases: &[CompiledPhrase]) -> Vec<(String, u32)> {
    let mut hits = Vec::new();
    let mut i = 0;
    while i < tokens.len() {
        let mut advanced = false;
        for phrase in phrases {
            if i + phrase.tokens.len() > tokens.len() {
                continue;
            }
            if tokens[i..i + phrase.tokens.len()] != phrase.tokens[..] {
                continue;
            }
            if let Some(co) = &phrase.co_occurs {
                if !text::contains_phrase(tokens, co) {
                    continue;
                }
            }
            hits.push((phrase.indicator.clone(), phrase.weight));
            i += phrase.tokens.len();
            advanced = true;
            break;
        }
        if !advanced {
            i += 1;
        }
    }
    hits
}

/// Parses a `M/D` or `M/D/Y` token relative to the post timestamp.
///
/// Returns Ok(Some(days_until)), Ok(None) when the token is not an expiry
/// (e.g. a past dated expiry), or Err(()) when it is date-like but cannot
/// be resolved.
fn parse_expiry_date(token: &str, post: &Post) -> Result<Option<i64>, ()> {
    let parts: Vec<&str> = token.split('/').collect();
    if !(2..=3).contains(&parts.len()) {
        return Ok(None);
    }
    if parts.iter().any(|p| p.is_empty() || !p.chars().all(|c| c.is_ascii_digit())) {
        return Ok(None);
    }

    let month: u32 = parts[0].parse().map_err(|_| ())?;
    let day: u32 = parts[1].parse().map_err(|_| ())?;
    if !(1..=12).contains(&month) || !(1..=31).contains(&day) {
        return Err(());
    }

    let posted = post.created_at();
    let date = match parts.get(2) {
        Some(raw_year) => {
            let year: i32 = raw_year.parse().map_err(|_| ())?;
            let year = if raw_year.len() == 2 { 2000 + year } else { year };
            if !(2000..=2100).contains(&year) {
                return Err(());
            }
            NaiveDate::from_ymd_opt(year, month, day).ok_or(())?
        }
        None => {
            // Same-year assumption; a date already past rolls to next year.
            let this_year = NaiveDate::from_ymd_opt(posted.year(), month, day).ok_or(())?;
            if this_year < posted.date() {
                NaiveDate::from_ymd_opt(posted.year() + 1, month, day).ok_or(())?
            } else {
                this_year
            }
        }
    };

    let days = posted.days_until(date);
    if days < 0 {
        return Ok(None);
    }
    Ok(Some(days))
}
