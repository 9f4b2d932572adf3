//! Error types for the retention engine
//!
//! Pruning, classification, and statistics are total and never fail. Errors
//! only come from parsing transcripts and configurations, and from explicit
//! config validation requested by the caller.

use thiserror::Error;

/// Result type alias for retention operations
pub type Result<T> = std::result::Result<T, RetentionError>;

/// Main error type for retention operations
#[derive(Error, Debug)]
pub enum RetentionError {
    /// A pruning configuration failed validation
    #[error("Invalid pruning config: {0}")]
    InvalidConfig(String),

    /// JSON input (transcript or config) could not be decoded
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A TOML config could not be decoded
    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// Generic error with context
    #[error("{context}: {source}")]
    WithContext {
        /// What was being attempted
        context: String,
        /// Underlying failure
        source: Box<RetentionError>,
    },
}

impl RetentionError {
    /// Add context to an error
    pub fn context(self, context: impl Into<String>) -> Self {
        Self::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Innermost error, skipping context layers
    pub fn root(&self) -> &RetentionError {
        match self {
            Self::WithContext { source, .. } => source.root(),
            other => other,
        }
    }
}

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to a Result
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.context(context))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_context() {
        let err = RetentionError::InvalidConfig("max_age_hours is NaN".to_string());
        let err = err.context("Failed to load policy");

        let rendered = err.to_string();
        assert!(rendered.contains("Failed to load policy"));
        assert!(rendered.contains("max_age_hours is NaN"));
    }

    #[test]
    fn test_result_ext() {
        let result: Result<()> = Err(RetentionError::InvalidConfig("bad".to_string()));
        let result = result.context("Config validation failed");

        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("Config validation failed"));
    }

    #[test]
    fn test_root_skips_context() {
        let err = RetentionError::InvalidConfig("bad".to_string())
            .context("inner")
            .context("outer");

        assert!(matches!(err.root(), RetentionError::InvalidConfig(_)));
        assert!(err.to_string().starts_with("outer: inner: "));
    }

    #[test]
    fn test_json_error_converts() {
        let parse: std::result::Result<serde_json::Value, _> = serde_json::from_str("{");
        let err: RetentionError = parse.unwrap_err().into();
        assert!(matches!(err, RetentionError::Json(_)));
    }
}
