//! Error types for the provider layer.

use thiserror::Error;

/// Errors returned by AI vision providers.
#[derive(Error, Debug)]
pub enum ProviderError {
    /// No API key was configured for the selected provider.
    #[error("missing API key")]
    MissingApiKey,

    /// The provider endpoint could not be reached.
    #[error("failed to connect to {0}")]
    Connect(String),

    /// The request exceeded the configured timeout.
    #[error("request timed out after {0}s")]
    Timeout(u64),

    /// The provider answered with a non-success HTTP status.
    #[error("{provider} returned HTTP {status}: {body}")]
    Api {
        provider: &'static str,
        status: u16,
        body: String,
    },

    /// The response body did not have the expected shape.
    #[error("unexpected {provider} response: {reason}")]
    ResponseShape {
        provider: &'static str,
        reason: String,
    },

    /// Any other HTTP client failure.
    #[error("HTTP client error: {0}")]
    Http(String),
}

/// Result type for the provider layer.
pub type Result<T> = std::result::Result<T, ProviderError>;
