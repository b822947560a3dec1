//! The asynchronous character-generation pipeline.
//!
//! One inbound request turns a merchant's product photo into character
//! assets: candidate stills in the image phase, per-tier animation clips
//! in the video phase. The [`orchestrator::Orchestrator`] owns job
//! status transitions and sequences the stages; everything it touches
//! (persistence, providers, object storage) sits behind a port so any
//! piece can be substituted in tests.

pub mod error;
pub mod limiter;
pub mod manifest;
pub mod orchestrator;
pub mod progress;
pub mod request;
pub mod stages;
pub mod store;

pub use error::{JobFailure, PipelineError, StoreError};
pub use manifest::{AssetRecord, FailureRecord, ResultManifest, StageOutcome};
pub use orchestrator::{Orchestrator, PipelineConfig, RunOutcome};
pub use request::{GenerationRequest, InputImage, JobParameters, Phase, StyleConfig};
pub use store::{PgStore, PipelineStore};
