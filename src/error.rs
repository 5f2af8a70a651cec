//! Error types and result definitions

use thiserror::Error;

/// Result type alias for Kairos operations
pub type Result<T> = std::result::Result<T, KairosError>;

/// Main error type for Kairos
#[derive(Error, Debug)]
pub enum KairosError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// A query template could not be composed or parsed
    #[error("Query error: {0}")]
    Query(String),

    /// The fragments client failed to connect or to stream results
    #[error("Client error: {0}")]
    Client(String),

    /// A temporal annotation value could not be interpreted
    #[error("Time error: {0}")]
    Time(String),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<reqwest::Error> for KairosError {
    fn from(err: reqwest::Error) -> Self {
        KairosError::Client(err.to_string())
    }
}

impl From<oxigraph::store::StorageError> for KairosError {
    fn from(err: oxigraph::store::StorageError) -> Self {
        KairosError::Client(err.to_string())
    }
}

impl From<oxigraph::store::LoaderError> for KairosError {
    fn from(err: oxigraph::store::LoaderError) -> Self {
        KairosError::Client(err.to_string())
    }
}

impl From<crate::config::ConfigError> for KairosError {
    fn from(err: crate::config::ConfigError) -> Self {
        KairosError::Config(err.to_string())
    }
}
