//! Inbound generation request types.

use mascotly_core::types::{DbId, JobId};
use serde::{Deserialize, Serialize};

/// Which pass of the pipeline a job runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// Product photo into candidate character stills.
    Image,
    /// Approved still into per-tier animation clips.
    Video,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Image => "image",
            Phase::Video => "video",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "image" => Some(Phase::Image),
            "video" => Some(Phase::Video),
            _ => None,
        }
    }
}

/// Caller-supplied styling for the generated character.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StyleConfig {
    pub character_type: String,
    #[serde(default)]
    pub vibe_tags: Vec<String>,
    pub product_name: String,
    /// Delivery URL of the approved still, for cross-checking only; the
    /// stored approval is authoritative.
    #[serde(default)]
    pub approved_still_ref: Option<String>,
    /// State names requested for the video phase.
    #[serde(default)]
    pub requested_states: Vec<String>,
    /// Number of candidate stills for the image phase.
    #[serde(default)]
    pub variation_count: Option<u32>,
}

/// The merchant's product photo, already resolved to bytes.
#[derive(Debug, Clone)]
pub struct InputImage {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

/// One job-phase request handed to the orchestrator.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    /// Caller-supplied idempotency key.
    pub job_id: JobId,
    pub tenant_id: DbId,
    pub persona_id: DbId,
    pub phase: Phase,
    pub input_image: Option<InputImage>,
    pub style: StyleConfig,
}

impl GenerationRequest {
    /// The JSON persisted on the job row so a worker can reconstruct the
    /// request later. Image bytes are never persisted inline; queued jobs
    /// carry a reference instead.
    pub fn parameters_json(&self, input_image_url: Option<&str>) -> serde_json::Value {
        serde_json::to_value(JobParameters {
            phase: self.phase,
            input_image_url: input_image_url.map(str::to_string),
            style: self.style.clone(),
        })
        .unwrap_or(serde_json::Value::Null)
    }
}

/// The persisted shape of a job's `parameters` column.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobParameters {
    pub phase: Phase,
    #[serde(default)]
    pub input_image_url: Option<String>,
    pub style: StyleConfig,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phase_round_trips() {
        assert_eq!(Phase::parse("image"), Some(Phase::Image));
        assert_eq!(Phase::parse("video"), Some(Phase::Video));
        assert_eq!(Phase::parse("audio"), None);
        assert_eq!(Phase::Image.as_str(), "image");
    }

    #[test]
    fn parameters_omit_image_bytes() {
        let request = GenerationRequest {
            job_id: "job-1".into(),
            tenant_id: 1,
            persona_id: 2,
            phase: Phase::Image,
            input_image: Some(InputImage {
                bytes: vec![0xFF; 1024],
                content_type: "image/png".into(),
            }),
            style: StyleConfig {
                character_type: "plush toy".into(),
                vibe_tags: vec!["cheerful".into()],
                product_name: "Fizzy Cola".into(),
                approved_still_ref: None,
                requested_states: vec![],
                variation_count: None,
            },
        };

        let value = request.parameters_json(Some("https://cdn.example/photo.png"));
        let parsed: JobParameters = serde_json::from_value(value).unwrap();
        assert_eq!(parsed.phase, Phase::Image);
        assert_eq!(
            parsed.input_image_url.as_deref(),
            Some("https://cdn.example/photo.png")
        );
        assert_eq!(parsed.style.product_name, "Fizzy Cola");
    }
}
