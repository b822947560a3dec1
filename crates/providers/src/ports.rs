//! Provider port traits and their request/response types.

use async_trait::async_trait;

use crate::error::ProviderError;

/// Raw image bytes plus their MIME type.
#[derive(Debug, Clone)]
pub struct ImagePayload {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

/// Request for a structural analysis of a product photo.
#[derive(Debug, Clone)]
pub struct AnatomyRequest {
    pub image: ImagePayload,
    pub product_name: String,
}

/// Request for one character still.
#[derive(Debug, Clone)]
pub struct ImageGenerationRequest {
    pub prompt: String,
    pub negative_prompt: String,
    /// Deterministic seed so a slot regenerates reproducibly.
    pub seed: i64,
    /// The merchant's product photo, used as the visual reference.
    pub reference_image: ImagePayload,
}

/// A generated character still.
#[derive(Debug, Clone)]
pub struct GeneratedImage {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

/// Request for one animation clip driven by an approved still.
#[derive(Debug, Clone)]
pub struct VideoGenerationRequest {
    pub source_still_url: String,
    pub state_name: String,
    /// Free-text motion description for the named state.
    pub motion_intent: String,
    pub seed: i64,
}

/// A generated looping clip.
#[derive(Debug, Clone)]
pub struct GeneratedVideo {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

/// Vision model that inspects a product photo and reports its anatomy.
///
/// The response is raw JSON; interpreting it (with per-field fallbacks)
/// is the pipeline's job, since the analysis is advisory.
#[async_trait]
pub trait VisionProvider: Send + Sync {
    async fn analyze_product(
        &self,
        request: &AnatomyRequest,
    ) -> Result<serde_json::Value, ProviderError>;
}

/// Image model that renders character stills from a prompt and reference.
#[async_trait]
pub trait ImageProvider: Send + Sync {
    async fn generate_image(
        &self,
        request: &ImageGenerationRequest,
    ) -> Result<GeneratedImage, ProviderError>;
}

/// Video model that animates a still into a short looping clip.
#[async_trait]
pub trait VideoProvider: Send + Sync {
    async fn generate_clip(
        &self,
        request: &VideoGenerationRequest,
    ) -> Result<GeneratedVideo, ProviderError>;
}
