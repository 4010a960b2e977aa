//! JSON file adapter for the ProfileSink port.

use async_trait::async_trait;
use std::path::PathBuf;
use tracing::info;

use crate::application::report::BatchReport;
use crate::ports::{ProfileSink, SinkError};

/// Writes the batch report as pretty-printed JSON.
pub struct JsonReportSink {
    path: PathBuf,
}

impl JsonReportSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl ProfileSink for JsonReportSink {
    async fn write(&self, report: &BatchReport) -> Result<(), SinkError> {
        let json = serde_json::to_vec_pretty(report)?;
        tokio::fs::write(&self.path, json).await?;
        info!(
            path = %self.path.display(),
            users = report.total_users,
            "batch report written"
        );
        Ok(())
    }
}
