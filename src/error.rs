//! Error types for Paddock.

use thiserror::Error;

/// Library-level error type for Paddock operations.
#[derive(Error, Debug)]
pub enum PaddockError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Scraping failed: {0}")]
    Scraping(String),

    #[error("Headless browser error: {0}")]
    Browser(String),

    #[error("Chunking failed: {0}")]
    Chunking(String),

    #[error("Embedding generation failed: {0}")]
    Embedding(String),

    #[error("Vector store error: {0}")]
    VectorStore(String),

    #[error("Translation failed: {0}")]
    Translation(String),

    #[error("RAG error: {0}")]
    Rag(String),

    #[error("LLM API error: {0}")]
    Llm(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type alias for Paddock operations.
pub type Result<T> = std::result::Result<T, PaddockError>;
