//! Batch report assembly: profiles plus run-level accounting.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::domain::classifier::DimensionState;
use crate::domain::foundation::Timestamp;
use crate::domain::profile::{DimensionReport, UserProfile};

/// A user whose analysis failed; the rest of the batch is unaffected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedUser {
    pub username: String,
    pub reason: String,
}

/// Category counts across the batch, one map per classified facet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Distributions {
    pub timeframe: BTreeMap<String, u32>,
    pub strategy: BTreeMap<String, u32>,
    pub conviction: BTreeMap<String, u32>,
    pub risk: BTreeMap<String, u32>,
    pub likelihood: BTreeMap<String, u32>,
}

/// The full output of one batch run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchReport {
    pub run_id: Uuid,
    pub methodology_version: String,
    pub generated_at: Timestamp,
    pub total_users: usize,
    /// Malformed input records dropped before analysis.
    pub skipped_posts: u32,
    pub failed_users: Vec<FailedUser>,
    pub distributions: Distributions,
    /// Sorted by product-fit score descending, ties by username ascending.
    pub profiles: Vec<UserProfile>,
}

impl BatchReport {
    pub fn new(
        methodology_version: impl Into<String>,
        skipped_posts: u32,
        mut profiles: Vec<UserProfile>,
        failed_users: Vec<FailedUser>,
    ) -> Self {
        profiles.sort_by(|a, b| {
            b.product_fit_score
                .cmp(&a.product_fit_score)
                .then_with(|| a.username.cmp(&b.username))
        });

        let mut distributions = Distributions::default();
        for profile in &profiles {
            bump(&mut distributions.timeframe, dimension_label(&profile.timeframe));
            bump(&mut distributions.strategy, dimension_label(&profile.strategy));
            bump(
                &mut distributions.conviction,
                facet_label(profile.conviction.state, profile.conviction.level.as_deref()),
            );
            bump(
                &mut distributions.risk,
                facet_label(profile.risk_profile.state, profile.risk_profile.category.as_deref()),
            );
            bump(
                &mut distributions.likelihood,
                profile.in_app_trading_likelihood.as_str().to_string(),
            );
        }

        Self {
            run_id: Uuid::new_v4(),
            methodology_version: methodology_version.into(),
            generated_at: Timestamp::now(),
            total_users: profiles.len(),
            skipped_posts,
            failed_users,
            distributions,
            profiles,
        }
    }
}

fn dimension_label(report: &DimensionReport) -> String {
    facet_label(report.state, report.primary.as_deref())
}

/// Resolved facets count under their category; everything else counts
/// under its state name.
fn facet_label(state: DimensionState, category: Option<&str>) -> String {
    match (state, category) {
        (DimensionState::Resolved, Some(category)) => category.to_string(),
        _ => state.as_str().to_string(),
    }
}

fn bump(map: &mut BTreeMap<String, u32>, label: String) {
    *map.entry(label).or_insert(0) += 1;
}
