//! Error types shared across the crate.

use std::path::PathBuf;
use thiserror::Error;

/// Crate-wide error type.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Agent service error: {0}")]
    ProviderError(String),

    #[error("Agent service request failed: {0}")]
    ProviderRequestFailed(String),

    #[error("Agent service not configured: {0}")]
    ProviderNotConfigured(String),

    #[error("Agent not found: {0}")]
    AgentNotFound(String),

    #[error("Invalid chunk configuration: max_size={max_size}, overlap={overlap}")]
    InvalidChunkConfig { max_size: usize, overlap: usize },

    #[error("An indexing run is already in progress")]
    IndexingInProgress,

    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Watch error: {0}")]
    Watch(String),
}

impl From<config::ConfigError> for ApiError {
    fn from(err: config::ConfigError) -> Self {
        ApiError::ConfigError(err.to_string())
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Serialization(err.to_string())
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ApiError::ProviderRequestFailed(format!("request timed out: {}", err))
        } else if err.is_status() {
            ApiError::ProviderError(err.to_string())
        } else {
            ApiError::ProviderRequestFailed(err.to_string())
        }
    }
}

impl From<notify::Error> for ApiError {
    fn from(err: notify::Error) -> Self {
        ApiError::Watch(err.to_string())
    }
}
