//! Error types and result aliases.
//!
//! Defines the core `GateError` enumeration, its HTTP status mapping, and the
//! common `Result` type.

use thiserror::Error;

/// Gateway errors. Every variant maps to a fixed HTTP status at the handler boundary.
#[derive(Debug, Error)]
pub enum GateError {
    /// Supplied API key does not match the configured secret.
    #[error("Unauthorized")]
    Unauthorized,

    /// A required field is missing from the request.
    #[error("{0}")]
    Validation(String),

    /// Rate limit exceeded.
    #[error("rate limit exceeded for client: {client}")]
    RateLimited { client: String },

    /// Request body larger than the configured maximum.
    #[error("request body exceeds {limit} bytes")]
    PayloadTooLarge { limit: usize },

    /// Malformed JSON body or stored value.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Key-value store I/O failure.
    #[error("store error: {0}")]
    Store(String),

    /// Edge cache failure.
    #[error("cache error: {0}")]
    Cache(String),
}

impl GateError {
    /// HTTP status code returned to the caller for this error.
    #[must_use]
    pub const fn status(&self) -> u16 {
        match self {
            Self::Unauthorized => 401,
            Self::Validation(_) => 400,
            Self::RateLimited { .. } => 429,
            Self::PayloadTooLarge { .. } => 413,
            Self::Serialization(_) | Self::Store(_) | Self::Cache(_) => 500,
        }
    }

    /// Response body text. Internal failures are reported generically.
    #[must_use]
    pub fn public_message(&self) -> String {
        match self {
            Self::RateLimited { .. } => "Rate limit exceeded".to_string(),
            Self::Serialization(_) | Self::Store(_) | Self::Cache(_) => {
                "Failed to process session info".to_string()
            }
            other => other.to_string(),
        }
    }
}

/// Result type alias for `GateError`.
pub type Result<T> = std::result::Result<T, GateError>;
