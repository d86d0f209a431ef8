//! Error types for LLM operations

use thiserror::Error;

pub type Result<T> = std::result::Result<T, LLMError>;

#[derive(Error, Debug)]
pub enum LLMError {
    /// API request failed
    #[error("API request failed: {0}")]
    RequestFailed(String),

    #[error("Invalid API key or authentication failed")]
    AuthenticationFailed,

    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Unexpected response format
    #[error("Unexpected response format: {0}")]
    UnexpectedResponse(String),

    /// No provider configured (missing API key)
    #[error("LLM provider not configured")]
    NotConfigured,

    #[error("Configuration error: {0}")]
    ConfigurationError(String),
}

impl LLMError {
    /// True when the assistant cannot be reached at all, as opposed to a
    /// request that reached the provider and failed.
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self,
            LLMError::NotConfigured | LLMError::ConfigurationError(_)
        )
    }
}
