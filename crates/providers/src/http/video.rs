//! HTTP video provider for animation clip generation.

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::Deserialize;

use crate::error::ProviderError;
use crate::ports::{GeneratedVideo, VideoGenerationRequest, VideoProvider};

use super::{ensure_success, map_send_error};

/// Video client speaking an image-to-video JSON API.
///
/// The source still is passed by URL rather than bytes; clips reference
/// an already-uploaded delivery asset.
pub struct HttpVideoProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

#[derive(Debug, Deserialize)]
struct VideoResponse {
    /// Base64-encoded video bytes.
    video: String,
    content_type: String,
}

impl HttpVideoProvider {
    pub fn new(client: reqwest::Client, base_url: String, api_key: String, model: String) -> Self {
        Self {
            client,
            base_url,
            api_key,
            model,
        }
    }
}

#[async_trait]
impl VideoProvider for HttpVideoProvider {
    async fn generate_clip(
        &self,
        request: &VideoGenerationRequest,
    ) -> Result<GeneratedVideo, ProviderError> {
        let body = serde_json::json!({
            "model": self.model,
            "source_image_url": request.source_still_url,
            "motion": request.motion_intent,
            "state": request.state_name,
            "seed": request.seed,
        });

        let response = self
            .client
            .post(format!("{}/v1/videos/generate", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(map_send_error)?;
        let response = ensure_success(response).await?;

        let parsed: VideoResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Decode(e.to_string()))?;
        let bytes = BASE64
            .decode(&parsed.video)
            .map_err(|e| ProviderError::Decode(format!("invalid video payload: {e}")))?;

        Ok(GeneratedVideo {
            bytes,
            content_type: parsed.content_type,
        })
    }
}
