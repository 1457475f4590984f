//! Client error types.

/// Errors that can occur when talking to a generation provider.
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    /// The provider refused the prompt or its output on content-safety grounds.
    #[error("content blocked: {0}")]
    ContentBlocked(String),

    /// Quota exhausted or billing problem on the provider account.
    #[error("quota exceeded: {0}")]
    Quota(String),

    /// The provider is temporarily unavailable.
    #[error("provider unavailable: {0}")]
    Transient(String),

    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Provider returned an error response.
    #[error("API error: {status} - {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Error message.
        message: String,
    },

    /// The response did not have the expected shape.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// The request itself is unusable, e.g. a malformed image URI.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid configuration.
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl GenerationError {
    /// Whether trying again later could succeed.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transient(_) => true,
            Self::Http(e) => e.is_timeout() || e.is_connect(),
            _ => false,
        }
    }

    /// Rank used to pick the error to report when every request failed.
    pub(crate) const fn severity(&self) -> u8 {
        match self {
            Self::ContentBlocked(_) => 4,
            Self::Quota(_) => 3,
            Self::Configuration(_) | Self::InvalidRequest(_) | Self::Api { .. } => 2,
            Self::InvalidResponse(_) | Self::Serialization(_) => 1,
            Self::Transient(_) | Self::Http(_) => 0,
        }
    }
}
