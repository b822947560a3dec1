//! HTTP vision provider for product anatomy analysis.

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::Deserialize;

use crate::error::ProviderError;
use crate::ports::{AnatomyRequest, VisionProvider};

use super::{ensure_success, map_send_error};

const ANALYSIS_INSTRUCTION: &str = "Identify the object in this product photo and describe where \
     a face and arms would naturally attach if it were a cartoon character. Respond as JSON with \
     keys objectName, shapeCategory, facePlacement, armPlacement.";

/// Vision client speaking a chat-completions style JSON API.
pub struct HttpVisionProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

#[derive(Debug, Deserialize)]
struct AnalysisResponse {
    analysis: serde_json::Value,
}

impl HttpVisionProvider {
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
impl VisionProvider for HttpVisionProvider {
    async fn analyze_product(
        &self,
        request: &AnatomyRequest,
    ) -> Result<serde_json::Value, ProviderError> {
        let body = serde_json::json!({
            "model": self.model,
            "instruction": ANALYSIS_INSTRUCTION,
            "product_name": request.product_name,
            "image": {
                "content_type": request.image.content_type,
                "data": BASE64.encode(&request.image.bytes),
            },
        });

        let response = self
            .client
            .post(format!("{}/v1/analyze", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(map_send_error)?;
        let response = ensure_success(response).await?;

        let parsed: AnalysisResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Decode(e.to_string()))?;
        Ok(parsed.analysis)
    }
}
