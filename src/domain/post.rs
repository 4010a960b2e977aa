//! Post and analysis window types.
//!
//! Posts are created and owned by the external ingestion collaborator;
//! the core borrows read-only access for the duration of one batch run.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{Timestamp, ValidationError};

/// Engagement counters attached to a post.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Engagement {
    pub likes: u32,
    pub replies: u32,
}

/// A single immutable social post about trading activity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    id: String,
    author: String,
    created_at: Timestamp,
    body: String,
    symbols: Vec<String>,
    engagement: Engagement,
}

impl Post {
    /// Creates a post, validating that id and author are present.
    pub fn new(
        id: impl Into<String>,
        author: impl Into<String>,
        created_at: Timestamp,
        body: impl Into<String>,
        symbols: Vec<String>,
        engagement: Engagement,
    ) -> Result<Self, ValidationError> {
        let id = id.into();
        let author = author.into();
        if id.trim().is_empty() {
            return Err(ValidationError::empty_field("id"));
        }
        if author.trim().is_empty() {
            return Err(ValidationError::empty_field("author"));
        }
        Ok(Self {
            id,
            author,
            created_at,
            body: body.into(),
            symbols,
            engagement,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn author(&self) -> &str {
        &self.author
    }

    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    pub fn engagement(&self) -> Engagement {
        self.engagement
    }
}

/// The bounded time window a batch run considers.
///
/// A ledger only accumulates evidence from posts whose timestamp falls
/// inside the active window (inclusive on both ends).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisWindow {
    pub start: Timestamp,
    pub end: Timestamp,
}

impl AnalysisWindow {
    /// Creates a window, validating that start does not exceed end.
    pub fn new(start: Timestamp, end: Timestamp) -> Result<Self, ValidationError> {
        if start.is_after(&end) {
            return Err(ValidationError::invalid_format(
                "analysis_window",
                "start is after end",
            ));
        }
        Ok(Self { start, end })
    }

    /// Derives the tightest window covering a set of posts.
    ///
    /// Returns None for an empty slice.
    pub fn covering(posts: &[Post]) -> Option<Self> {
        let start = posts.iter().map(|p| p.created_at()).min()?;
        let end = posts.iter().map(|p| p.created_at()).max()?;
        Some(Self { start, end })
    }

    /// Checks whether a timestamp falls inside the window.
    pub fn contains(&self, ts: Timestamp) -> bool {
        !ts.is_before(&self.start) && !ts.is_after(&self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(secs: u64) -> Timestamp {
        Timestamp::from_unix_secs(secs)
    }

    fn post(id: &str, author: &str, secs: u64) -> Post {
        Post::new(id, author, ts(secs), "body", vec![], Engagement::default()).unwrap()
    }

    #[test]
    fn post_new_rejects_empty_id() {
        let result = Post::new("", "alice", ts(0), "x", vec![], Engagement::default());
        assert_eq!(result, Err(ValidationError::empty_field("id")));
    }

    #[test]
    fn post_new_rejects_blank_author() {
        let result = Post::new("1", "  ", ts(0), "x", vec![], Engagement::default());
        assert_eq!(result, Err(ValidationError::empty_field("author")));
    }

    #[test]
    fn post_accessors_return_fields() {
        let p = Post::new(
            "42",
            "bob",
            ts(100),
            "Scalping $SPY",
            vec!["SPY".to_string()],
            Engagement { likes: 3, replies: 1 },
        )
        .unwrap();

        assert_eq!(p.id(), "42");
        assert_eq!(p.author(), "bob");
        assert_eq!(p.body(), "Scalping $SPY");
        assert_eq!(p.symbols(), ["SPY".to_string()]);
        assert_eq!(p.engagement().likes, 3);
    }

    #[test]
    fn window_new_rejects_inverted_bounds() {
        assert!(AnalysisWindow::new(ts(100), ts(50)).is_err());
        assert!(AnalysisWindow::new(ts(50), ts(50)).is_ok());
    }

    #[test]
    fn window_contains_is_inclusive() {
        let window = AnalysisWindow::new(ts(100), ts(200)).unwrap();
        assert!(window.contains(ts(100)));
        assert!(window.contains(ts(150)));
        assert!(window.contains(ts(200)));
        assert!(!window.contains(ts(99)));
        assert!(!window.contains(ts(201)));
    }

    #[test]
    fn window_covering_spans_all_posts() {
        let posts = vec![post("1", "a", 300), post("2", "a", 100), post("3", "b", 200)];
        let window = AnalysisWindow::covering(&posts).unwrap();
        assert_eq!(window.start, ts(100));
        assert_eq!(window.end, ts(300));
    }

    #[test]
    fn window_covering_empty_is_none() {
        assert!(AnalysisWindow::covering(&[]).is_none());
    }
}
