//! ProfileSink port for emitting batch reports

use async_trait::async_trait;
use thiserror::Error;

use crate::application::report::BatchReport;

/// Errors that can occur while writing a report.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("IO error writing report: {0}")]
    Io(#[from] std::io::Error),

    #[error("Report serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Receives the finished batch report.
#[async_trait]
pub trait ProfileSink: Send + Sync {
    async fn write(&self, report: &BatchReport) -> Result<(), SinkError>;
}
