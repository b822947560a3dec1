//! HTTP image provider for character still generation.

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::Deserialize;

use crate::error::ProviderError;
use crate::ports::{GeneratedImage, ImageGenerationRequest, ImageProvider};

use super::{ensure_success, map_send_error};

/// Image client speaking an image-to-image JSON API.
pub struct HttpImageProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

#[derive(Debug, Deserialize)]
struct ImageResponse {
    /// Base64-encoded image bytes.
    image: String,
    content_type: String,
}

impl HttpImageProvider {
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
impl ImageProvider for HttpImageProvider {
    async fn generate_image(
        &self,
        request: &ImageGenerationRequest,
    ) -> Result<GeneratedImage, ProviderError> {
        let body = serde_json::json!({
            "model": self.model,
            "prompt": request.prompt,
            "negative_prompt": request.negative_prompt,
            "seed": request.seed,
            "reference_image": {
                "content_type": request.reference_image.content_type,
                "data": BASE64.encode(&request.reference_image.bytes),
            },
        });

        let response = self
            .client
            .post(format!("{}/v1/images/generate", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(map_send_error)?;
        let response = ensure_success(response).await?;

        let parsed: ImageResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Decode(e.to_string()))?;
        let bytes = BASE64
            .decode(&parsed.image)
            .map_err(|e| ProviderError::Decode(format!("invalid image payload: {e}")))?;

        Ok(GeneratedImage {
            bytes,
            content_type: parsed.content_type,
        })
    }
}
