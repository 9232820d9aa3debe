//! Error types for PawSense

use thiserror::Error;

/// Errors that can occur while fetching, decoding, or resolving predictions
#[derive(Debug, Error)]
pub enum CollarError {
    #[error("Invalid time of day: {0}")]
    ParseError(String),

    #[error("Prediction service unavailable: {0}")]
    NetworkError(String),

    #[error("Malformed prediction payload: {0}")]
    SchemaError(String),

    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    #[error("Please enter a message")]
    EmptyMessage,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CollarError {
    /// Whether the prediction pipeline recovers from this error with a fallback chain
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            CollarError::ParseError(_) | CollarError::NetworkError(_) | CollarError::SchemaError(_)
        )
    }
}

impl From<reqwest::Error> for CollarError {
    fn from(e: reqwest::Error) -> Self {
        CollarError::NetworkError(e.to_string())
    }
}
