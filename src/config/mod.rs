//! Application configuration module
//!
//! Type-safe configuration loading from environment variables using the
//! `config` and `dotenvy` crates. Configuration is loaded with the
//! `TRADER_LENS` prefix and nested values use double underscores as
//! separators.
//!
//! # Example
//!
//! ```no_run
//! use trader_lens::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//! ```

mod error;
mod methodology;

pub use error::ConfigError;
pub use methodology::MethodologyConfig;

use serde::Deserialize;

use crate::domain::foundation::ValidationError;

/// Root application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Batch analysis settings (paths, window, parallelism).
    #[serde(default)]
    pub analysis: AnalysisConfig,
}

/// Settings for one batch analysis run.
#[derive(Debug, Clone, Deserialize)]
pub struct AnalysisConfig {
    /// JSON file holding the raw post collection.
    #[serde(default = "default_posts_path")]
    pub posts_path: String,

    /// Where the batch report is written.
    #[serde(default = "default_output_path")]
    pub output_path: String,

    /// Optional methodology YAML; the builtin rule set applies when unset.
    #[serde(default)]
    pub methodology_path: Option<String>,

    /// Optional analysis window length in hours, anchored at the newest
    /// post. Unset means the window covers all supplied posts.
    #[serde(default)]
    pub window_hours: Option<u64>,

    /// Number of parallel per-user workers.
    #[serde(default = "default_workers")]
    pub workers: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            posts_path: default_posts_path(),
            output_path: default_output_path(),
            methodology_path: None,
            window_hours: None,
            workers: default_workers(),
        }
    }
}

fn default_posts_path() -> String {
    "posts.json".to_string()
}

fn default_output_path() -> String {
    "profiles.json".to_string()
}

fn default_workers() -> usize {
    4
}

impl AppConfig {
    /// Load configuration from environment variables.
    ///
    /// Loads a `.env` file if present, then reads variables with the
    /// `TRADER_LENS` prefix, `__` separating nested values:
    ///
    /// - `TRADER_LENS__ANALYSIS__POSTS_PATH=data/posts.json`
    /// - `TRADER_LENS__ANALYSIS__WORKERS=8`
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("TRADER_LENS")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.analysis.validate()
    }
}

impl AnalysisConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.posts_path.trim().is_empty() {
            return Err(ValidationError::empty_field("analysis.posts_path"));
        }
        if self.output_path.trim().is_empty() {
            return Err(ValidationError::empty_field("analysis.output_path"));
        }
        if self.workers == 0 {
            return Err(ValidationError::out_of_range("analysis.workers", 1, 1024, 0));
        }
        if self.window_hours == Some(0) {
            return Err(ValidationError::out_of_range("analysis.window_hours", 1, i64::MAX, 0));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::Mutex;

    // Env vars are process-global; serialize the tests that touch them.
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    fn clear_env() {
        env::remove_var("TRADER_LENS__ANALYSIS__POSTS_PATH");
        env::remove_var("TRADER_LENS__ANALYSIS__OUTPUT_PATH");
        env::remove_var("TRADER_LENS__ANALYSIS__WORKERS");
        env::remove_var("TRADER_LENS__ANALYSIS__WINDOW_HOURS");
    }

    #[test]
    fn load_uses_defaults_without_env() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();
        let config = AppConfig::load().unwrap();

        assert_eq!(config.analysis.posts_path, "posts.json");
        assert_eq!(config.analysis.output_path, "profiles.json");
        assert_eq!(config.analysis.workers, 4);
        assert_eq!(config.analysis.window_hours, None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn load_reads_nested_env_values() {
        let _guard = ENV_MUTEX.lock().unwrap();
        env::set_var("TRADER_LENS__ANALYSIS__POSTS_PATH", "data/feed.json");
        env::set_var("TRADER_LENS__ANALYSIS__WORKERS", "8");
        let config = AppConfig::load();
        clear_env();

        let config = config.unwrap();
        assert_eq!(config.analysis.posts_path, "data/feed.json");
        assert_eq!(config.analysis.workers, 8);
    }

    #[test]
    fn validate_rejects_zero_workers() {
        let config = AnalysisConfig {
            workers: 0,
            ..AnalysisConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_blank_posts_path() {
        let config = AnalysisConfig {
            posts_path: " ".to_string(),
            ..AnalysisConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
