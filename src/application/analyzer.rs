//! Batch analysis runner: per-user parallel classification.
//!
//! Per-user work shares nothing but the read-only methodology, so users run
//! as independent workers. Within one user, posts fold in timestamp order;
//! that ordering only matters when recency weighting is enabled.

use std::collections::BTreeMap;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::application::report::{BatchReport, FailedUser};
use crate::config::MethodologyConfig;
use crate::domain::classifier::{DimensionClassification, DimensionClassifier};
use crate::domain::conflict::ConflictDetector;
use crate::domain::extractor::IndicatorExtractor;
use crate::domain::foundation::AnalysisError;
use crate::domain::indicator::Dimension;
use crate::domain::ledger::UserEvidenceLedger;
use crate::domain::post::{AnalysisWindow, Post};
use crate::domain::profile::{AnalysisPeriod, ProfileAssembler, UserProfile};
use crate::domain::signals::SignalScorer;
use crate::ports::PostBatch;

/// Run-wide options for one batch.
#[derive(Debug, Clone, Copy)]
pub struct BatchOptions {
    /// Explicit analysis window; derived from the posts when unset.
    pub window: Option<AnalysisWindow>,
    /// Maximum concurrent per-user workers.
    pub workers: usize,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            window: None,
            workers: 4,
        }
    }
}

/// Compiled classification engine, immutable for the lifetime of a run.
pub struct Analyzer {
    extractor: IndicatorExtractor,
    signals: SignalScorer,
    classifier: DimensionClassifier,
    conflicts: ConflictDetector,
    assembler: ProfileAssembler,
    recency_weighting: bool,
    methodology_version: String,
}

impl Analyzer {
    /// Compiles all rule tables of a validated methodology.
    pub fn new(methodology: &MethodologyConfig) -> Self {
        Self {
            extractor: IndicatorExtractor::new(
                &methodology.indicators,
                &methodology.instrument_rules,
                methodology.expiry.clone(),
            ),
            signals: SignalScorer::new(&methodology.signal_lexicon),
            classifier: DimensionClassifier::new(
                methodology.confidence,
                methodology.classifier,
            ),
            conflicts: ConflictDetector::new(
                methodology.contradictions.clone(),
                methodology.conflict,
            ),
            assembler: ProfileAssembler::new(
                methodology.product_fit.clone(),
                methodology.confidence,
            ),
            recency_weighting: methodology.recency_weighting,
            methodology_version: methodology.version.clone(),
        }
    }

    pub fn methodology_version(&self) -> &str {
        &self.methodology_version
    }

    /// Classifies one user from their posts.
    ///
    /// Pure and deterministic: the same posts and window always produce an
    /// identical profile.
    pub fn analyze_user(
        &self,
        username: &str,
        posts: &[Post],
        window: AnalysisWindow,
    ) -> Result<UserProfile, AnalysisError> {
        let mut considered: Vec<&Post> = posts
            .iter()
            .filter(|p| window.contains(p.created_at()))
            .collect();
        considered.sort_by(|a, b| {
            a.created_at()
                .cmp(&b.created_at())
                .then_with(|| a.id().cmp(b.id()))
        });

        if considered.is_empty() {
            return Err(AnalysisError::NoPostsInWindow {
                username: username.to_string(),
            });
        }

        // Occurrences from the most recent half count twice when recency
        // weighting is on; distinct-type sets are unaffected either way.
        let recent_from = considered.len() / 2;
        let mut ledger = UserEvidenceLedger::new(username);
        for (i, post) in considered.iter().enumerate() {
            let output = self.extractor.extract(post)?;
            let signals = self.signals.score(post.body());
            let multiplier = if self.recency_weighting && i >= recent_from {
                2
            } else {
                1
            };
            ledger.record(post, &output, signals, multiplier);
        }

        let mut classifications: BTreeMap<Dimension, DimensionClassification> = Dimension::ALL
            .iter()
            .map(|dimension| (*dimension, self.classifier.classify(*dimension, &ledger)))
            .collect();
        let flags = self.conflicts.apply(&mut classifications);
        if !flags.is_empty() {
            debug!(username, flags = flags.len(), "contradictions detected");
        }

        let start = considered.iter().map(|p| p.created_at()).min();
        let end = considered.iter().map(|p| p.created_at()).max();
        let period = start.zip(end).map(|(start, end)| AnalysisPeriod { start, end });

        Ok(self.assembler.assemble(&ledger, &classifications, flags, period))
    }

    /// Runs a full batch, one independent worker per user.
    ///
    /// A failed or cancelled user never emits a partial profile and never
    /// aborts the rest of the batch.
    pub async fn run_batch(self: Arc<Self>, batch: PostBatch, options: BatchOptions) -> BatchReport {
        let window = options
            .window
            .or_else(|| AnalysisWindow::covering(&batch.posts));
        let Some(window) = window else {
            info!("batch contained no posts");
            return BatchReport::new(&self.methodology_version, batch.skipped, vec![], vec![]);
        };

        let mut by_user: BTreeMap<String, Vec<Post>> = BTreeMap::new();
        for post in batch.posts {
            by_user.entry(post.author().to_string()).or_default().push(post);
        }
        info!(
            users = by_user.len(),
            skipped_posts = batch.skipped,
            "starting batch analysis"
        );

        let semaphore = Arc::new(Semaphore::new(options.workers.max(1)));
        let mut tasks = JoinSet::new();
        for (username, posts) in by_user {
            let analyzer = Arc::clone(&self);
            let semaphore = Arc::clone(&semaphore);
            tasks.spawn(async move {
                let _permit = match semaphore.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(_) => {
                        return (
                            username.clone(),
                            Err(AnalysisError::Cancelled { username }),
                        );
                    }
                };
                let result = analyzer.analyze_user(&username, &posts, window);
                (username, result)
            });
        }

        let mut profiles = Vec::new();
        let mut failed_users = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((_, Ok(profile))) => profiles.push(profile),
                Ok((username, Err(error))) => {
                    warn!(username, %error, "user analysis failed");
                    failed_users.push(FailedUser {
                        username,
                        reason: error.to_string(),
                    });
                }
                Err(join_error) => {
                    // A cancelled or panicked worker drops its partial
                    // state whole; nothing partial is ever emitted.
                    warn!(%join_error, "analysis worker did not complete");
                }
            }
        }
        failed_users.sort_by(|a, b| a.username.cmp(&b.username));

        BatchReport::new(&self.methodology_version, batch.skipped, profiles, failed_users)
    }
}
