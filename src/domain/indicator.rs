//! Indicator definitions and evidence events.
//!
//! Indicator tables are open-ended configuration data: a uniform
//! (phrases, weight, dimension, category) record structure processed by one
//! generic matcher, never per-category special cases.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::foundation::ValidationError;

/// One of the four classification dimensions.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    Timeframe,
    Strategy,
    Conviction,
    Risk,
}

impl Dimension {
    /// All dimensions in a fixed, deterministic order.
    pub const ALL: [Dimension; 4] = [
        Dimension::Timeframe,
        Dimension::Strategy,
        Dimension::Conviction,
        Dimension::Risk,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Dimension::Timeframe => "timeframe",
            Dimension::Strategy => "strategy",
            Dimension::Conviction => "conviction",
            Dimension::Risk => "risk",
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One configured indicator: a phrase set mapped to a (dimension, category)
/// pair, with an occurrence weight and optional co-occurrence requirement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorDefinition {
    pub dimension: Dimension,
    pub category: String,
    /// Case-insensitive phrases; multi-word phrases match token sequences.
    pub phrases: Vec<String>,
    /// How many occurrences a single match contributes.
    #[serde(default = "default_weight")]
    pub weight: u32,
    /// Phrase that must also appear somewhere in the same post for this
    /// indicator to fire.
    #[serde(default)]
    pub co_occurs_with: Option<String>,
}

fn default_weight() -> u32 {
    1
}

impl IndicatorDefinition {
    /// Creates an indicator definition, validating category and phrases.
    pub fn new(
        dimension: Dimension,
        category: impl Into<String>,
        phrases: Vec<&str>,
    ) -> Result<Self, ValidationError> {
        let category = category.into();
        if category.trim().is_empty() {
            return Err(ValidationError::empty_field("category"));
        }
        if phrases.is_empty() {
            return Err(ValidationError::empty_field("phrases"));
        }
        Ok(Self {
            dimension,
            category,
            phrases: phrases.into_iter().map(str::to_string).collect(),
            weight: 1,
            co_occurs_with: None,
        })
    }
}

/// A typed evidence event produced when an indicator matches one post.
///
/// Transient: events exist only between extraction and aggregation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvidenceEvent {
    pub post_id: String,
    pub dimension: Dimension,
    pub category: String,
    /// The distinct indicator type that fired: the canonical phrase for
    /// keyword indicators, or a structured tag such as `expiry_within_1d`.
    pub indicator: String,
    pub weight: u32,
}

impl EvidenceEvent {
    pub fn new(
        post_id: impl Into<String>,
        dimension: Dimension,
        category: impl Into<String>,
        indicator: impl Into<String>,
        weight: u32,
    ) -> Self {
        Self {
            post_id: post_id.into(),
            dimension,
            category: category.into(),
            indicator: indicator.into(),
            weight,
        }
    }
}
