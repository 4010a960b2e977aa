//! Configuration error types

use thiserror::Error;

use crate::domain::foundation::ValidationError;

/// Errors that can occur while loading configuration.
///
/// All of these are fatal before any user is processed; proceeding with a
/// broken methodology would silently corrupt every profile in the batch.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Failed to read methodology file {path}: {source}")]
    MethodologyIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Methodology parsing failed: {0}")]
    MethodologyParse(#[from] serde_yaml::Error),

    #[error("Methodology validation failed: {0}")]
    InvalidMethodology(#[from] ValidationError),
}
