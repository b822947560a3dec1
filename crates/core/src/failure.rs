//! Failure classification shared by every stage of the pipeline.
//!
//! Errors are classified once, at their point of origin (request
//! validation, the rate limiter, or a provider adapter), and the kind is
//! carried unchanged up to the stored job record and the polling client.
//! The orchestrator never reclassifies a transient failure as permanent
//! or vice versa.

/// The five failure classes a generation job can surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Bad input caught before any provider call (missing image, empty
    /// product name, unknown animation state).
    Validation,
    /// Cost ceiling, cooldown, or concurrency ceiling exceeded. No
    /// provider call was made.
    RateLimited,
    /// Provider throttling, timeout, or 5xx-class failure. Retried with
    /// backoff; surfaced only after retry exhaustion.
    Transient,
    /// Content-policy rejection or input the provider itself refuses.
    /// Never retried.
    Permanent,
    /// The overall phase exceeded its wall-clock ceiling.
    Timeout,
}

impl FailureKind {
    /// String representation for database storage and API responses.
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::Validation => "validation",
            FailureKind::RateLimited => "rate_limited",
            FailureKind::Transient => "transient",
            FailureKind::Permanent => "permanent",
            FailureKind::Timeout => "timeout",
        }
    }

    /// Parse from a string, defaulting to `Transient` for unknown values.
    pub fn from_str(s: &str) -> Self {
        match s {
            "validation" => FailureKind::Validation,
            "rate_limited" => FailureKind::RateLimited,
            "permanent" => FailureKind::Permanent,
            "timeout" => FailureKind::Timeout,
            _ => FailureKind::Transient,
        }
    }

    /// Whether the retry decorator should attempt the call again.
    ///
    /// Only transient provider failures qualify. Rate limiting is
    /// rejected before the call is made, so there is nothing to retry.
    pub fn is_retryable(&self) -> bool {
        matches!(self, FailureKind::Transient)
    }

    /// Caller-facing suggestion for what to do next.
    pub fn suggested_action(&self) -> &'static str {
        match self {
            FailureKind::Validation => "Adjust the request input and resubmit",
            FailureKind::RateLimited => "Wait for the indicated period and retry",
            FailureKind::Transient => "Retry later; the provider was temporarily unavailable",
            FailureKind::Permanent => "Change the product image or description; the provider rejected this input",
            FailureKind::Timeout => "Retry later; the job exceeded its time budget",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_strings() {
        for kind in [
            FailureKind::Validation,
            FailureKind::RateLimited,
            FailureKind::Transient,
            FailureKind::Permanent,
            FailureKind::Timeout,
        ] {
            assert_eq!(FailureKind::from_str(kind.as_str()), kind);
        }
    }

    #[test]
    fn unknown_string_defaults_to_transient() {
        assert_eq!(FailureKind::from_str("mystery"), FailureKind::Transient);
    }

    #[test]
    fn only_transient_is_retryable() {
        assert!(FailureKind::Transient.is_retryable());
        assert!(!FailureKind::Validation.is_retryable());
        assert!(!FailureKind::RateLimited.is_retryable());
        assert!(!FailureKind::Permanent.is_retryable());
        assert!(!FailureKind::Timeout.is_retryable());
    }
}
