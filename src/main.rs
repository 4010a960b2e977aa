//! trader-lens batch analysis binary.
//!
//! Reads a JSON post collection, classifies every author against the
//! configured methodology, and writes a batch report.
//!
//! # Environment Variables
//!
//! - `TRADER_LENS__ANALYSIS__POSTS_PATH` — input JSON file (default: posts.json)
//! - `TRADER_LENS__ANALYSIS__OUTPUT_PATH` — report file (default: profiles.json)
//! - `TRADER_LENS__ANALYSIS__METHODOLOGY_PATH` — methodology YAML (default: builtin)
//! - `TRADER_LENS__ANALYSIS__WINDOW_HOURS` — window length anchored at the newest post
//! - `TRADER_LENS__ANALYSIS__WORKERS` — parallel per-user workers (default: 4)
//! - `RUST_LOG` — tracing filter (default: "info")

use std::error::Error;
use std::sync::Arc;

use tracing::info;

use trader_lens::adapters::{JsonPostSource, JsonReportSink};
use trader_lens::application::{Analyzer, BatchOptions};
use trader_lens::config::{AppConfig, MethodologyConfig};
use trader_lens::domain::post::AnalysisWindow;
use trader_lens::ports::{PostSource, ProfileSink};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let config = AppConfig::load()?;
    config.validate()?;

    // A broken methodology is fatal before any user is processed.
    let methodology = match &config.analysis.methodology_path {
        Some(path) => {
            let methodology = MethodologyConfig::from_yaml_file(path)?;
            methodology.validate()?;
            info!(path = %path, version = %methodology.version, "loaded methodology");
            methodology
        }
        None => {
            let methodology = MethodologyConfig::builtin().clone();
            info!(version = %methodology.version, "using builtin methodology");
            methodology
        }
    };

    let source = JsonPostSource::new(&config.analysis.posts_path);
    let batch = source.fetch().await?;
    info!(
        posts = batch.posts.len(),
        skipped = batch.skipped,
        "loaded post collection"
    );

    let window = config.analysis.window_hours.and_then(|hours| {
        let end = batch.posts.iter().map(|p| p.created_at()).max()?;
        AnalysisWindow::new(end.minus_hours(hours as i64), end).ok()
    });

    let analyzer = Arc::new(Analyzer::new(&methodology));
    let report = analyzer
        .run_batch(
            batch,
            BatchOptions {
                window,
                workers: config.analysis.workers,
            },
        )
        .await;
    info!(
        users = report.total_users,
        failed = report.failed_users.len(),
        run_id = %report.run_id,
        "batch analysis complete"
    );

    JsonReportSink::new(&config.analysis.output_path)
        .write(&report)
        .await?;

    Ok(())
}
