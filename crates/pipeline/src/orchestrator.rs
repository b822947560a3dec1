//! The job orchestrator.
//!
//! Owns every job status transition. Ownership under at-least-once
//! delivery is a conditional `queued -> processing` update rather than a
//! lock: exactly one caller wins the claim, so duplicate invocations of
//! the same job id never duplicate billable work. A job that is already
//! terminal replays its stored manifest without touching a provider.

use std::sync::Arc;
use std::time::Duration;

use mascotly_core::failure::FailureKind;
use mascotly_core::generation::{
    image_phase_steps, validate_image_phase, validate_variation_count, validate_video_phase,
    video_phase_steps, DEFAULT_VARIATION_COUNT,
};
use mascotly_core::limits::LimitConfig;
use mascotly_core::retry::RetryConfig;
use mascotly_core::tier::{filter_requested, AnimationState, SubscriptionTier};
use mascotly_db::models::job::NewGenerationJob;
use mascotly_db::models::persona::Persona;
use mascotly_db::models::status::JobStatus;
use mascotly_providers::{ImageProvider, VideoProvider, VisionProvider};
use mascotly_storage::ObjectStore;
use tokio_util::sync::CancellationToken;

use crate::error::{JobFailure, PipelineError};
use crate::limiter::Limiter;
use crate::manifest::{ResultManifest, StageFailure, StageOutcome};
use crate::progress::ProgressTracker;
use crate::request::{GenerationRequest, Phase};
use crate::stages::{anatomy, image::ImageStage, prompt, video::VideoStage};
use crate::store::PipelineStore;

/// Tunables for one orchestrator instance.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub limits: LimitConfig,
    pub retry: RetryConfig,
    /// Bound on each individual provider call.
    pub call_timeout: Duration,
    /// Wall-clock ceiling on a whole phase before the job is forced to
    /// `failed` with a timeout classification.
    pub phase_timeout: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            limits: LimitConfig::default(),
            retry: RetryConfig::default(),
            call_timeout: Duration::from_secs(120),
            phase_timeout: Duration::from_secs(15 * 60),
        }
    }
}

/// What happened to one `run` invocation.
#[derive(Debug)]
pub enum RunOutcome {
    /// This invocation executed the phase and completed the job.
    Completed(ResultManifest),
    /// The job was already terminal; its stored result is returned and
    /// no provider was called.
    ReplayedTerminal {
        status: JobStatus,
        manifest: Option<ResultManifest>,
    },
    /// Another worker owns the job; this invocation did nothing.
    OwnedElsewhere,
    /// This invocation executed the phase and the job failed.
    Failed { kind: FailureKind, detail: String },
}

pub struct Orchestrator {
    store: Arc<dyn PipelineStore>,
    vision: Arc<dyn VisionProvider>,
    images: Arc<dyn ImageProvider>,
    videos: Arc<dyn VideoProvider>,
    objects: Arc<dyn ObjectStore>,
    config: PipelineConfig,
}

impl Orchestrator {
    pub fn new(
        store: Arc<dyn PipelineStore>,
        vision: Arc<dyn VisionProvider>,
        images: Arc<dyn ImageProvider>,
        videos: Arc<dyn VideoProvider>,
        objects: Arc<dyn ObjectStore>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            store,
            vision,
            images,
            videos,
            objects,
            config,
        }
    }

    /// Process one job-phase request end to end.
    ///
    /// `Err` is reserved for persistence being unreachable; every
    /// job-level failure is recorded on the job row and reported through
    /// [`RunOutcome::Failed`].
    pub async fn run(
        &self,
        request: GenerationRequest,
        cancel: &CancellationToken,
    ) -> Result<RunOutcome, PipelineError> {
        let job = self
            .store
            .insert_job_if_absent(&NewGenerationJob {
                job_id: request.job_id.clone(),
                tenant_id: request.tenant_id,
                persona_id: request.persona_id,
                phase: request.phase.as_str().to_string(),
                parameters: request.parameters_json(None),
            })
            .await?;

        if let Some(replay) = self.replay_if_terminal(job.status_id, &job.result) {
            tracing::info!(job_id = %request.job_id, "Terminal job replayed without provider calls");
            return Ok(replay);
        }

        if !self.store.try_claim_job(&request.job_id).await? {
            // Lost the claim: either another worker owns the job or it
            // went terminal in between. Re-check so replays stay exact.
            if let Some(current) = self.store.find_job(&request.job_id).await? {
                if let Some(replay) = self.replay_if_terminal(current.status_id, &current.result)
                {
                    return Ok(replay);
                }
            }
            tracing::info!(job_id = %request.job_id, "Job owned by another worker, skipping");
            return Ok(RunOutcome::OwnedElsewhere);
        }

        tracing::info!(
            job_id = %request.job_id,
            tenant_id = request.tenant_id,
            persona_id = request.persona_id,
            phase = request.phase.as_str(),
            "Job claimed, starting phase"
        );

        let phase_result =
            match tokio::time::timeout(self.config.phase_timeout, self.execute(&request, cancel))
                .await
            {
                Ok(result) => result,
                Err(_) => Err(JobFailure::timeout(format!(
                    "phase exceeded its {}s ceiling",
                    self.config.phase_timeout.as_secs()
                ))),
            };

        match phase_result {
            Ok(manifest) => {
                self.store
                    .complete_job(&request.job_id, &manifest.to_value())
                    .await?;
                tracing::info!(
                    job_id = %request.job_id,
                    succeeded = manifest.succeeded.len(),
                    failed = manifest.failed.len(),
                    "Job completed"
                );
                Ok(RunOutcome::Completed(manifest))
            }
            Err(failure) => {
                self.store
                    .fail_job(&request.job_id, failure.kind, &failure.detail)
                    .await?;
                tracing::warn!(
                    job_id = %request.job_id,
                    kind = failure.kind.as_str(),
                    detail = %failure.detail,
                    "Job failed"
                );
                Ok(RunOutcome::Failed {
                    kind: failure.kind,
                    detail: failure.detail,
                })
            }
        }
    }

    fn replay_if_terminal(
        &self,
        status_id: i16,
        result: &Option<serde_json::Value>,
    ) -> Option<RunOutcome> {
        let status = JobStatus::from_id(status_id)?;
        if !status.is_terminal() {
            return None;
        }
        Some(RunOutcome::ReplayedTerminal {
            status,
            manifest: result.as_ref().and_then(ResultManifest::from_value),
        })
    }

    async fn execute(
        &self,
        request: &GenerationRequest,
        cancel: &CancellationToken,
    ) -> Result<ResultManifest, JobFailure> {
        let persona = self
            .store
            .find_persona(request.persona_id)
            .await?
            .ok_or_else(|| {
                JobFailure::validation(format!("persona {} not found", request.persona_id))
            })?;

        let limiter = Limiter::new(self.store.as_ref(), &self.config.limits);
        limiter.admit(&persona, request.phase).await?;

        match request.phase {
            Phase::Image => self.image_phase(request, &persona, &limiter, cancel).await,
            Phase::Video => self.video_phase(request, &persona, &limiter, cancel).await,
        }
    }

    async fn image_phase(
        &self,
        request: &GenerationRequest,
        persona: &Persona,
        limiter: &Limiter<'_>,
        cancel: &CancellationToken,
    ) -> Result<ResultManifest, JobFailure> {
        let count = request
            .style
            .variation_count
            .unwrap_or(DEFAULT_VARIATION_COUNT);
        validate_variation_count(count).map_err(|e| JobFailure::validation(e.to_string()))?;
        validate_image_phase(&request.style.product_name, request.input_image.is_some())
            .map_err(|e| JobFailure::validation(e.to_string()))?;
        let Some(input_image) = request.input_image.as_ref() else {
            return Err(JobFailure::validation(
                "image phase requires an input product image",
            ));
        };

        let mut tracker = ProgressTracker::start(
            self.store.as_ref(),
            request.job_id.clone(),
            image_phase_steps(count),
        )
        .await?;

        checkpoint(cancel)?;
        let hints = anatomy::analyze(
            self.vision.as_ref(),
            limiter,
            &self.config.retry,
            self.config.call_timeout,
            request.tenant_id,
            &request.job_id,
            input_image,
            &request.style.product_name,
        )
        .await?;
        tracker.advance("product analyzed").await?;

        checkpoint(cancel)?;
        let rendered =
            prompt::build_prompt(self.store.as_ref(), persona, &request.style, &hints).await?;
        tracker.advance("prompt prepared").await?;

        checkpoint(cancel)?;
        let stage = ImageStage {
            provider: self.images.as_ref(),
            objects: self.objects.as_ref(),
            store: self.store.as_ref(),
            limiter,
            retry: &self.config.retry,
            call_timeout: self.config.call_timeout,
            tenant_id: request.tenant_id,
            persona_id: request.persona_id,
            job_id: &request.job_id,
        };
        let outcome = stage.run(&mut tracker, &rendered, input_image, count).await?;
        require_any_success(&outcome, "no image variations could be produced")?;

        self.store.touch_persona_generation(persona.id).await?;
        tracker.advance("finalizing").await?;

        let mut manifest = ResultManifest::new(Phase::Image);
        manifest.succeeded = outcome.succeeded;
        for failure in &outcome.failed {
            manifest.record_failure(failure);
        }
        Ok(manifest)
    }

    async fn video_phase(
        &self,
        request: &GenerationRequest,
        persona: &Persona,
        limiter: &Limiter<'_>,
        cancel: &CancellationToken,
    ) -> Result<ResultManifest, JobFailure> {
        let approved = self
            .store
            .find_approved_variation(request.persona_id)
            .await?;
        validate_video_phase(approved.is_some(), request.style.requested_states.len())
            .map_err(|e| JobFailure::validation(e.to_string()))?;
        let Some(approved) = approved else {
            return Err(JobFailure::validation(
                "video phase requires an approved still as the seed frame",
            ));
        };

        let mut requested = Vec::with_capacity(request.style.requested_states.len());
        for name in &request.style.requested_states {
            let state = AnimationState::parse(name).ok_or_else(|| {
                JobFailure::validation(format!("unknown animation state '{name}'"))
            })?;
            requested.push(state);
        }

        let tier = SubscriptionTier::from_str(&persona.tier);
        let (allowed, skipped) = filter_requested(tier, &requested);
        if allowed.is_empty() {
            return Err(JobFailure::validation(format!(
                "none of the requested states are allowed on the '{}' tier; upgrade the tier or request different states",
                tier.as_str()
            )));
        }
        if !skipped.is_empty() {
            tracing::info!(
                job_id = %request.job_id,
                tier = tier.as_str(),
                skipped = ?skipped.iter().map(|s| s.as_str()).collect::<Vec<_>>(),
                "Requested states outside tier allowance will be skipped"
            );
        }

        let mut tracker = ProgressTracker::start(
            self.store.as_ref(),
            request.job_id.clone(),
            video_phase_steps(allowed.len() as u32),
        )
        .await?;

        checkpoint(cancel)?;
        let stage = VideoStage {
            provider: self.videos.as_ref(),
            objects: self.objects.as_ref(),
            store: self.store.as_ref(),
            limiter,
            retry: &self.config.retry,
            call_timeout: self.config.call_timeout,
            tenant_id: request.tenant_id,
            persona_id: request.persona_id,
            job_id: &request.job_id,
        };
        let outcome = stage
            .run(&mut tracker, &approved.delivery_url, &allowed)
            .await?;
        require_any_success(&outcome, "no animation states could be produced")?;

        tracker.advance("finalizing").await?;

        let mut manifest = ResultManifest::new(Phase::Video);
        manifest.succeeded = outcome.succeeded;
        for failure in &outcome.failed {
            manifest.record_failure(failure);
        }
        manifest.skipped_states = skipped.iter().map(|s| s.as_str().to_string()).collect();
        Ok(manifest)
    }
}

/// Cooperative cancellation: already-issued provider calls complete, but
/// the job stops advancing at the next checkpoint.
fn checkpoint(cancel: &CancellationToken) -> Result<(), JobFailure> {
    if cancel.is_cancelled() {
        Err(JobFailure {
            kind: FailureKind::Transient,
            detail: "cancelled before completion; resubmit the job to retry".to_string(),
        })
    } else {
        Ok(())
    }
}

/// Zero successes is a hard phase failure carrying the classification of
/// the first recorded failure.
fn require_any_success<T>(
    outcome: &StageOutcome<T>,
    context: &str,
) -> Result<(), JobFailure> {
    if !outcome.succeeded.is_empty() {
        return Ok(());
    }
    let (kind, message) = outcome
        .failed
        .first()
        .map(|f: &StageFailure| (f.kind, f.message.clone()))
        .unwrap_or((FailureKind::Permanent, "nothing was requested".to_string()));
    Err(JobFailure {
        kind,
        detail: format!("{context}: {message}"),
    })
}
