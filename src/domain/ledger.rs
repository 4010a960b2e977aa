//! Evidence Aggregator - per-user accumulation of extracted evidence.
//!
//! A ledger lives for one batch run only. All maps are ordered so that
//! iteration, and therefore classification, is deterministic for a given
//! set of posts.

use std::collections::{BTreeMap, BTreeSet};

use crate::domain::extractor::ExtractionOutput;
use crate::domain::indicator::Dimension;
use crate::domain::instruments::InstrumentClass;
use crate::domain::post::{Engagement, Post};
use crate::domain::signals::PostSignals;

/// Accumulated evidence for one (dimension, category) pair.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryTally {
    /// Weighted occurrence total across all matches.
    pub occurrences: u32,
    /// Distinct indicator types seen, recency-independent.
    pub distinct: BTreeSet<String>,
    /// Posts that contributed at least one match.
    pub posts: BTreeSet<String>,
}

impl CategoryTally {
    pub fn distinct_count(&self) -> usize {
        self.distinct.len()
    }
}

/// All evidence accumulated for one user in one run.
#[derive(Debug, Clone, Default)]
pub struct UserEvidenceLedger {
    username: String,
    dimensions: BTreeMap<Dimension, BTreeMap<String, CategoryTally>>,
    instruments: BTreeMap<InstrumentClass, CategoryTally>,
    posts_considered: u32,
    posts_with_symbols: u32,
    antagonism_total: u32,
    urgency_total: u32,
    likes_total: u64,
    replies_total: u64,
}

impl UserEvidenceLedger {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            ..Self::default()
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    /// Folds one post's extraction output into the ledger.
    ///
    /// `occurrence_multiplier` scales occurrence counts (recency weighting);
    /// distinct-type sets are never scaled.
    pub fn record(
        &mut self,
        post: &Post,
        output: &ExtractionOutput,
        signals: PostSignals,
        occurrence_multiplier: u32,
    ) {
        self.posts_considered += 1;
        if output.has_symbols {
            self.posts_with_symbols += 1;
        }
        self.antagonism_total += u32::from(signals.antagonism.value());
        self.urgency_total += u32::from(signals.urgency.value());
        let Engagement { likes, replies } = post.engagement();
        self.likes_total += u64::from(likes);
        self.replies_total += u64::from(replies);

        for event in &output.events {
            let tally = self
                .dimensions
                .entry(event.dimension)
                .or_default()
                .entry(event.category.clone())
                .or_default();
            tally.occurrences += event.weight * occurrence_multiplier;
            tally.distinct.insert(event.indicator.clone());
            tally.posts.insert(event.post_id.clone());
        }

        for event in &output.instruments {
            let tally = self.instruments.entry(event.class).or_default();
            tally.occurrences += event.weight * occurrence_multiplier;
            tally.distinct.insert(event.indicator.clone());
            tally.posts.insert(post.id().to_string());
        }
    }

    pub fn posts_considered(&self) -> u32 {
        self.posts_considered
    }

    pub fn posts_with_symbols(&self) -> u32 {
        self.posts_with_symbols
    }

    /// Category tallies for one dimension, ordered by category name.
    pub fn categories(&self, dimension: Dimension) -> &BTreeMap<String, CategoryTally> {
        static EMPTY: BTreeMap<String, CategoryTally> = BTreeMap::new();
        self.dimensions.get(&dimension).unwrap_or(&EMPTY)
    }

    pub fn instrument_tallies(&self) -> &BTreeMap<InstrumentClass, CategoryTally> {
        &self.instruments
    }

    /// Mean antagonism across considered posts, zero when empty.
    pub fn mean_antagonism(&self) -> u8 {
        self.mean(self.antagonism_total)
    }

    /// Mean urgency across considered posts, zero when empty.
    pub fn mean_urgency(&self) -> u8 {
        self.mean(self.urgency_total)
    }

    /// Average likes per considered post, rounded.
    pub fn avg_likes(&self) -> f64 {
        self.avg(self.likes_total)
    }

    /// Average replies per considered post, rounded.
    pub fn avg_replies(&self) -> f64 {
        self.avg(self.replies_total)
    }

    fn mean(&self, total: u32) -> u8 {
        if self.posts_considered == 0 {
            return 0;
        }
        ((f64::from(total) / f64::from(self.posts_considered)).round() as u32).min(100) as u8
    }

    fn avg(&self, total: u64) -> f64 {
        if self.posts_considered == 0 {
            return 0.0;
        }
        (total as f64 / f64::from(self.posts_considered) * 100.0).round() / 100.0
    }
}
