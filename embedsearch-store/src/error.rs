//! Error types for embedsearch-store

use thiserror::Error;

/// Errors that can occur while embedding, indexing or querying
#[derive(Debug, Error)]
pub enum EmbedSearchError {
    /// Embedding model could not be loaded (fatal, not retried)
    #[error("Model load failed: {0}")]
    ModelLoad(String),

    /// Embedding generation error
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// Vector dimension does not match the index
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Caller passed an unusable argument
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Remote index could not be created
    #[error("Index creation failed: {0}")]
    IndexCreation(String),

    /// Remote index does not exist
    #[error("Index not found: {0}")]
    IndexNotFound(String),

    /// Remote index never reported ready
    #[error("Index '{index}' never became ready after {attempts} attempts")]
    ReadinessTimeout { index: String, attempts: u32 },

    /// Wait aborted through a cancel flag
    #[error("Operation cancelled: {0}")]
    Cancelled(String),

    /// Upsert rejected or failed
    #[error("Upsert failed: {0}")]
    Upsert(String),

    /// Query rejected or failed
    #[error("Query failed: {0}")]
    Query(String),

    /// Index stats request failed
    #[error("Stats failed: {0}")]
    Stats(String),

    /// Non-success HTTP status from the vector service
    #[error("HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    /// Network or TLS failure before a response was received
    #[error("HTTP transport error: {0}")]
    Transport(String),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Missing or invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl EmbedSearchError {
    /// Create a model load error
    pub fn model(msg: impl Into<String>) -> Self {
        Self::ModelLoad(msg.into())
    }

    /// Create an embedding error
    pub fn embedding(msg: impl Into<String>) -> Self {
        Self::Embedding(msg.into())
    }

    pub fn dimension(expected: usize, actual: usize) -> Self {
        Self::DimensionMismatch { expected, actual }
    }

    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    pub fn index_creation(msg: impl Into<String>) -> Self {
        Self::IndexCreation(msg.into())
    }

    pub fn not_found(name: impl Into<String>) -> Self {
        Self::IndexNotFound(name.into())
    }

    pub fn upsert(msg: impl Into<String>) -> Self {
        Self::Upsert(msg.into())
    }

    pub fn query(msg: impl Into<String>) -> Self {
        Self::Query(msg.into())
    }

    pub fn stats(msg: impl Into<String>) -> Self {
        Self::Stats(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// True for a 409 Conflict from the vector service
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::HttpStatus { status: 409, .. })
    }

    /// True for a 404 Not Found from the vector service
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::HttpStatus { status: 404, .. } | Self::IndexNotFound(_))
    }
}

/// Result type for embedsearch operations
pub type Result<T> = std::result::Result<T, EmbedSearchError>;
