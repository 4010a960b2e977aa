//! JSON file adapter for the PostSource port.
//!
//! Reads the raw post collection exported by the ingestion pipeline. A
//! record missing its author or timestamp is skipped and counted, never
//! aborting the batch.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::path::PathBuf;
use tracing::{debug, warn};

use crate::domain::foundation::Timestamp;
use crate::domain::post::{Engagement, Post};
use crate::ports::{PostBatch, PostSource, SourceError};

/// One raw record as exported upstream; every field may be absent.
#[derive(Debug, Deserialize)]
struct RawPost {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    body: Option<String>,
    #[serde(default)]
    symbols: Option<Vec<String>>,
    #[serde(default)]
    likes_count: Option<u32>,
    #[serde(default)]
    replies_count: Option<u32>,
}

/// Loads posts from a JSON array file.
pub struct JsonPostSource {
    path: PathBuf,
}

impl JsonPostSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl PostSource for JsonPostSource {
    async fn fetch(&self) -> Result<PostBatch, SourceError> {
        let raw = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                SourceError::NotFound(self.path.display().to_string())
            } else {
                SourceError::Io(e)
            }
        })?;
        let records: Vec<RawPost> =
            serde_json::from_str(&raw).map_err(|e| SourceError::Malformed(e.to_string()))?;

        let mut batch = PostBatch::default();
        for (index, record) in records.into_iter().enumerate() {
            match convert(index, record) {
                Some(post) => batch.posts.push(post),
                None => {
                    batch.skipped += 1;
                    debug!(index, "skipped malformed post record");
                }
            }
        }
        if batch.skipped > 0 {
            warn!(skipped = batch.skipped, "dropped malformed post records");
        }
        Ok(batch)
    }
}

fn convert(index: usize, record: RawPost) -> Option<Post> {
    let username = record.username.filter(|u| !u.trim().is_empty())?;
    let created_at = record.created_at?;
    let id = record
        .id
        .filter(|i| !i.trim().is_empty())
        .unwrap_or_else(|| format!("record-{index}"));
    Post::new(
        id,
        username,
        Timestamp::from_datetime(created_at),
        record.body.unwrap_or_default(),
        record.symbols.unwrap_or_default(),
        Engagement {
            likes: record.likes_count.unwrap_or(0),
            replies: record.replies_count.unwrap_or(0),
        },
    )
    .ok()
}
