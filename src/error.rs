//! Error types for LiSearch.

use thiserror::Error;

/// Library-level error type for LiSearch operations.
#[derive(Error, Debug)]
pub enum LisearchError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Backend error: {0}")]
    Backend(String),

    #[error("LLM provider error: {0}")]
    Provider(String),

    #[error("OpenAI API error: {0}")]
    OpenAI(String),

    #[error("Request timed out after {0} seconds")]
    Timeout(u64),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Agent error: {0}")]
    Agent(String),
}

/// Result type alias for LiSearch operations.
pub type Result<T> = std::result::Result<T, LisearchError>;
