use thiserror::Error;

/// Failure of a single provider call.
///
/// `Network` and `RateLimited` are transient and retried by the executor
/// until attempts run out. Everything else is returned on first sight.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Transport-level failure (timeout, connection refused, reset).
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The provider kept answering 429 until the attempt budget ran out.
    #[error("rate limited after {attempts} attempts (next window in {retry_after_secs}s)")]
    RateLimited { attempts: u32, retry_after_secs: u64 },

    /// Credentials were rejected. The message is meant for the end user.
    #[error("{0}")]
    Auth(String),

    /// Non-transient rejection (bad query, malformed parameters, 5xx).
    #[error("API error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },
}

impl FetchError {
    /// `true` for the error kinds the executor retries.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Network(_) | Self::RateLimited { .. })
    }
}

/// Construction-time failure that makes the whole aggregator unusable.
#[derive(Debug, Error)]
pub enum AggregateError {
    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("invalid base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },
}
