//! Instrument preference types.
//!
//! Instrument classes are a closed set with a strict, mutually exclusive
//! precedence order: options > crypto > futures > leveraged_etf >
//! stocks_only. The first class with matching evidence wins.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::foundation::ValidationError;

/// A tradeable instrument class.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum InstrumentClass {
    Options,
    Crypto,
    Futures,
    LeveragedEtf,
    StocksOnly,
}

impl InstrumentClass {
    /// Classes in classification precedence order, highest first.
    pub const PRECEDENCE: [InstrumentClass; 5] = [
        InstrumentClass::Options,
        InstrumentClass::Crypto,
        InstrumentClass::Futures,
        InstrumentClass::LeveragedEtf,
        InstrumentClass::StocksOnly,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            InstrumentClass::Options => "options",
            InstrumentClass::Crypto => "crypto",
            InstrumentClass::Futures => "futures",
            InstrumentClass::LeveragedEtf => "leveraged_etf",
            InstrumentClass::StocksOnly => "stocks_only",
        }
    }
}

impl fmt::Display for InstrumentClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One configured instrument indicator: a phrase set mapped to a class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstrumentIndicator {
    pub class: InstrumentClass,
    pub phrases: Vec<String>,
}

impl InstrumentIndicator {
    pub fn new(class: InstrumentClass, phrases: Vec<&str>) -> Result<Self, ValidationError> {
        if phrases.is_empty() {
            return Err(ValidationError::empty_field("phrases"));
        }
        Ok(Self {
            class,
            phrases: phrases.into_iter().map(str::to_string).collect(),
        })
    }
}

/// Instrument matching rules: keyword indicators plus the leveraged-ETF
/// ticker list matched against a post's symbols field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstrumentRules {
    pub indicators: Vec<InstrumentIndicator>,
    pub leveraged_symbols: Vec<String>,
}

/// Evidence that one post points at an instrument class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstrumentEvent {
    pub class: InstrumentClass,
    pub indicator: String,
    pub weight: u32,
}
