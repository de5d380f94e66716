//! Error types for the Brewline domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error enum. Only [`TurnError`]
//! ever reaches a caller of the turn pipeline; the retrieval and privacy
//! errors are absorbed into degraded results before they get that far.

use thiserror::Error;

// --- Bounded context errors ---

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),
}

impl ProviderError {
    /// Whether a retry has a chance of succeeding.
    ///
    /// Timeouts, connection failures, rate limits and 5xx responses are
    /// transient. Malformed requests, auth failures and other 4xx responses
    /// will fail the same way again.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Timeout(_) | Self::Network(_) | Self::RateLimited { .. } => true,
            Self::ApiError { status_code, .. } => *status_code >= 500,
            Self::AuthenticationFailed(_) | Self::InvalidRequest(_) | Self::NotConfigured(_) => {
                false
            }
        }
    }
}

#[derive(Debug, Clone, Error)]
pub enum RetrievalError {
    #[error("Knowledge store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Embedding generation failed: {0}")]
    EmbeddingFailed(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

#[derive(Debug, Clone, Error)]
pub enum PrivacyError {
    #[error("PII engine unreachable: {0}")]
    EngineUnavailable(String),

    #[error("PII analysis failed: {0}")]
    AnalysisFailed(String),

    #[error("Anonymization failed: {0}")]
    AnonymizationFailed(String),
}

/// Failures that abort a turn and are surfaced to the caller.
#[derive(Debug, Clone, Error)]
pub enum TurnError {
    /// User-correctable input problem. Never retried.
    #[error("{0}")]
    Validation(String),

    /// The completion service failed after retries or timed out.
    #[error("Completion failed: {0}")]
    Completion(#[from] ProviderError),
}

#[derive(Debug, Error)]
pub enum IndexError {
    #[error("Directory not found: {0}")]
    DirectoryNotFound(String),

    #[error("No .txt documents found in {0}")]
    NoDocuments(String),

    #[error("Failed to read {path}: {reason}")]
    ReadFailed { path: String, reason: String },

    #[error("Indexing failed: {0}")]
    Retrieval(#[from] RetrievalError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_error_displays_correctly() {
        let err = ProviderError::ApiError {
            status_code: 429,
            message: "Too many requests".into(),
        };
        assert!(err.to_string().contains("429"));
        assert!(err.to_string().contains("Too many requests"));
    }

    #[test]
    fn transient_provider_errors_are_retryable() {
        assert!(ProviderError::Timeout("30s".into()).is_retryable());
        assert!(ProviderError::Network("reset".into()).is_retryable());
        assert!(ProviderError::RateLimited { retry_after_secs: 1 }.is_retryable());
        assert!(
            ProviderError::ApiError {
                status_code: 503,
                message: "unavailable".into()
            }
            .is_retryable()
        );
    }

    #[test]
    fn validation_type_provider_errors_are_not_retryable() {
        assert!(!ProviderError::InvalidRequest("bad messages".into()).is_retryable());
        assert!(!ProviderError::AuthenticationFailed("bad key".into()).is_retryable());
        assert!(
            !ProviderError::ApiError {
                status_code: 400,
                message: "malformed".into()
            }
            .is_retryable()
        );
    }

    #[test]
    fn validation_error_shows_only_the_reason() {
        let err = TurnError::Validation("Message cannot be empty".into());
        assert_eq!(err.to_string(), "Message cannot be empty");
    }
}
