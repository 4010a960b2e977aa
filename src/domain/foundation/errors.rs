//! Error types for the domain layer.

use thiserror::Error;

/// Errors that occur during value object construction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Field '{field}' cannot be empty")]
    EmptyField { field: String },

    #[error("Field '{field}' must be between {min} and {max}, got {actual}")]
    OutOfRange {
        field: String,
        min: i64,
        max: i64,
        actual: i64,
    },

    #[error("Field '{field}' has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

impl ValidationError {
    /// Creates an empty field validation error.
    pub fn empty_field(field: impl Into<String>) -> Self {
        ValidationError::EmptyField {
            field: field.into(),
        }
    }

    /// Creates an out of range validation error.
    pub fn out_of_range(field: impl Into<String>, min: i64, max: i64, actual: i64) -> Self {
        ValidationError::OutOfRange {
            field: field.into(),
            min,
            max,
            actual,
        }
    }

    /// Creates an invalid format validation error.
    pub fn invalid_format(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ValidationError::InvalidFormat {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Failures isolated to a single user's analysis.
///
/// These never abort a batch: the affected profile carries an error marker
/// and the remaining users are processed normally.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnalysisError {
    #[error("Could not resolve expiry token '{token}' in post {post_id}")]
    UnparseableExpiry { post_id: String, token: String },

    #[error("User '{username}' has no posts inside the analysis window")]
    NoPostsInWindow { username: String },

    #[error("Worker for user '{username}' was cancelled before completion")]
    Cancelled { username: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_error_empty_field_displays_correctly() {
        let err = ValidationError::empty_field("username");
        assert_eq!(format!("{}", err), "Field 'username' cannot be empty");
    }

    #[test]
    fn validation_error_out_of_range_displays_correctly() {
        let err = ValidationError::out_of_range("score", 0, 100, 120);
        assert_eq!(
            format!("{}", err),
            "Field 'score' must be between 0 and 100, got 120"
        );
    }

    #[test]
    fn validation_error_invalid_format_displays_correctly() {
        let err = ValidationError::invalid_format("window", "start after end");
        assert_eq!(
            format!("{}", err),
            "Field 'window' has invalid format: start after end"
        );
    }

    #[test]
    fn analysis_error_displays_context() {
        let err = AnalysisError::UnparseableExpiry {
            post_id: "123".to_string(),
            token: "13/45".to_string(),
        };
        assert_eq!(
            format!("{}", err),
            "Could not resolve expiry token '13/45' in post 123"
        );
    }
}
