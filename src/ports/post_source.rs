//! PostSource port for post ingestion

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::post::Post;

/// Errors that can occur while fetching posts.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Post source not found: {0}")]
    NotFound(String),

    #[error("IO error reading posts: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed post data: {0}")]
    Malformed(String),
}

/// A fetched collection of posts with skipped-record accounting.
#[derive(Debug, Clone, Default)]
pub struct PostBatch {
    pub posts: Vec<Post>,
    /// Records dropped for missing author or timestamp. Skips never abort
    /// the batch.
    pub skipped: u32,
}

/// Supplies the bounded-window post collection for one run.
#[async_trait]
pub trait PostSource: Send + Sync {
    async fn fetch(&self) -> Result<PostBatch, SourceError>;
}
