//! reqwest-backed provider implementations.

pub mod image;
pub mod video;
pub mod vision;

pub use image::HttpImageProvider;
pub use video::HttpVideoProvider;
pub use vision::HttpVisionProvider;

use crate::error::ProviderError;

/// Map a reqwest result into a provider error, distinguishing timeouts.
fn map_send_error(err: reqwest::Error) -> ProviderError {
    if err.is_timeout() {
        ProviderError::Timeout
    } else {
        ProviderError::Request(err)
    }
}

/// Ensure the response has a success status, or classify the failure.
async fn ensure_success(
    response: reqwest::Response,
) -> Result<reqwest::Response, ProviderError> {
    if response.status().is_success() {
        Ok(response)
    } else {
        let status = response.status().as_u16();
        let err = ProviderError::from_response(response).await;
        tracing::warn!(status, error = %err, "Provider call failed");
        Err(err)
    }
}
