//! Pipeline error types.

use std::time::Duration;

use mascotly_core::failure::FailureKind;
use mascotly_core::limits::LimitReason;

/// Errors from the persistence port.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store backend error: {0}")]
    Backend(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        StoreError::Backend(e.to_string())
    }
}

/// Infrastructure-level pipeline errors.
///
/// Job-level failures (validation, rate limiting, provider exhaustion)
/// are recorded on the job row and reported through
/// [`crate::RunOutcome::Failed`]; this type only surfaces when even that
/// recording is impossible.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// A classified failure that terminates a job.
///
/// The kind is assigned at the point of origin and carried unchanged to
/// the stored job record; the orchestrator never reclassifies.
#[derive(Debug, Clone)]
pub struct JobFailure {
    pub kind: FailureKind,
    pub detail: String,
}

impl JobFailure {
    pub fn validation(detail: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::Validation,
            detail: detail.into(),
        }
    }

    pub fn rate_limited(reason: LimitReason, retry_after: Duration) -> Self {
        Self {
            kind: FailureKind::RateLimited,
            detail: format!(
                "{}; retry after {}s",
                reason.as_str(),
                retry_after.as_secs()
            ),
        }
    }

    pub fn timeout(detail: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::Timeout,
            detail: detail.into(),
        }
    }
}

impl From<StoreError> for JobFailure {
    fn from(e: StoreError) -> Self {
        Self {
            kind: FailureKind::Transient,
            detail: e.to_string(),
        }
    }
}
