//! Error types for the search pipeline and its configuration

use std::time::Duration;

use thiserror::Error;

/// Failure of an external provider call.
///
/// Cloneable so the last failure can live in the published view.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SearchError {
    #[error("Search provider unavailable: {0}")]
    Unavailable(String),

    #[error("Search request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Backend returned status {0}")]
    Status(u16),

    #[error("Malformed backend response: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for SearchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            SearchError::Decode(e.to_string())
        } else if let Some(status) = e.status() {
            SearchError::Status(status.as_u16())
        } else {
            SearchError::Unavailable(e.to_string())
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid value for {key}: {reason}")]
    InvalidVar { key: String, reason: String },
}
