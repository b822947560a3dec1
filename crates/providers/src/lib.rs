//! External AI provider integrations.
//!
//! Exposes narrow async ports for the three upstream capabilities the
//! pipeline consumes (vision analysis, image generation, video
//! generation) plus reqwest-backed implementations. The pipeline only
//! ever sees the port traits, so providers can be swapped or faked
//! without touching orchestration code.

pub mod error;
pub mod http;
pub mod ports;

pub use error::ProviderError;
pub use ports::{
    AnatomyRequest, GeneratedImage, GeneratedVideo, ImageGenerationRequest, ImagePayload,
    ImageProvider, VideoGenerationRequest, VideoProvider, VisionProvider,
};
