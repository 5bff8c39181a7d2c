//! Error types for docqa.

use thiserror::Error;

/// Library-level error type for docqa operations.
#[derive(Error, Debug)]
pub enum DocQaError {
    #[error("Unsupported document format: {0}")]
    UnsupportedFormat(String),

    #[error("Failed to parse document: {0}")]
    Parse(String),

    #[error("Embedding generation failed: {0}")]
    Embedding(String),

    #[error("Vector store error: {0}")]
    Store(String),

    #[error("Answer generation failed: {0}")]
    Generation(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// Persistence failure inside the SQLite-backed store.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
}

/// Result type alias for docqa operations.
pub type Result<T> = std::result::Result<T, DocQaError>;
