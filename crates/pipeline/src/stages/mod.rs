//! Pipeline stages.
//!
//! Each stage takes its collaborators explicitly and returns either a
//! value or a classified failure; none of them mutate job status, which
//! is the orchestrator's job alone.

pub mod anatomy;
pub mod image;
pub mod prompt;
pub mod upload;
pub mod video;

use std::future::Future;
use std::time::Duration;

use mascotly_core::retry::{retry, RetryConfig};
use mascotly_providers::ProviderError;

/// Run a provider call under the retry decorator, bounding each attempt
/// with the per-call timeout.
pub(crate) async fn call_with_retry<T, F, Fut>(
    retry_config: &RetryConfig,
    call_timeout: Duration,
    mut op: F,
) -> Result<T, ProviderError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ProviderError>>,
{
    retry(retry_config, ProviderError::is_retryable, |_attempt| {
        let call = op();
        async move {
            match tokio::time::timeout(call_timeout, call).await {
                Ok(result) => result,
                Err(_) => Err(ProviderError::Timeout),
            }
        }
    })
    .await
}
