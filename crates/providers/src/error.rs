//! Provider error types and failure classification.

use std::time::Duration;

use mascotly_core::failure::FailureKind;

/// Errors from upstream AI providers.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// The HTTP request itself failed (network, DNS, TLS, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The provider asked us to slow down (HTTP 429).
    #[error("provider throttled the request")]
    Throttled {
        /// Parsed `Retry-After` header, when the provider sent one.
        retry_after: Option<Duration>,
    },

    /// The provider had a server-side failure (HTTP 5xx).
    #[error("provider upstream error ({status}): {body}")]
    Upstream {
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },

    /// The provider rejected the request as unprocessable (HTTP 4xx
    /// other than 429). Retrying the same input cannot succeed.
    #[error("provider rejected the request ({status}): {body}")]
    Rejected { status: u16, body: String },

    /// The call exceeded its deadline.
    #[error("provider call timed out")]
    Timeout,

    /// The response arrived but could not be interpreted.
    #[error("unexpected provider response: {0}")]
    Decode(String),
}

impl ProviderError {
    /// Classify this error for retry and reporting decisions.
    ///
    /// Throttling maps to `Transient` rather than `RateLimited`:
    /// `RateLimited` is reserved for our own tenant-level limiter, while
    /// a provider 429 is just backpressure the retry loop absorbs. A
    /// single call running out of time is likewise `Transient`; the
    /// `Timeout` kind belongs to the phase-level wall-clock ceiling.
    pub fn kind(&self) -> FailureKind {
        match self {
            ProviderError::Request(_) => FailureKind::Transient,
            ProviderError::Throttled { .. } => FailureKind::Transient,
            ProviderError::Upstream { .. } => FailureKind::Transient,
            ProviderError::Rejected { .. } => FailureKind::Permanent,
            ProviderError::Timeout => FailureKind::Transient,
            ProviderError::Decode(_) => FailureKind::Permanent,
        }
    }

    /// Whether the retry loop should attempt this call again.
    pub fn is_retryable(&self) -> bool {
        self.kind().is_retryable()
    }

    /// Build the appropriate error from a non-success HTTP response.
    pub async fn from_response(response: reqwest::Response) -> Self {
        let status = response.status();
        let retry_after = response
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse::<u64>().ok())
            .map(Duration::from_secs);
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<unreadable body>".to_string());

        if status.as_u16() == 429 {
            ProviderError::Throttled { retry_after }
        } else if status.is_server_error() {
            ProviderError::Upstream {
                status: status.as_u16(),
                body,
            }
        } else {
            ProviderError::Rejected {
                status: status.as_u16(),
                body,
            }
        }
    }
}
