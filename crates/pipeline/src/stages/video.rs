//! Animation state stage.
//!
//! Animates the approved still into one clip per allowed state. States
//! fail independently; the stage reports which ones succeeded.

use std::time::Duration;

use futures::stream::{self, StreamExt};
use mascotly_core::generation::{derive_seed, COST_VIDEO_CENTS, STAGE_CONCURRENCY};
use mascotly_core::retry::RetryConfig;
use mascotly_core::tier::AnimationState;
use mascotly_core::types::{DbId, JobId};
use mascotly_db::models::animation_state::CreateAnimationState;
use mascotly_db::models::cost_ledger::CALL_TYPE_VIDEO;
use mascotly_providers::{VideoGenerationRequest, VideoProvider};
use mascotly_storage::key::extension_for;
use mascotly_storage::{AssetKey, ObjectStore};

use crate::error::StoreError;
use crate::limiter::{Charge, Limiter};
use crate::manifest::{AssetRecord, StageFailure, StageOutcome};
use crate::progress::ProgressTracker;
use crate::stages::{call_with_retry, upload};
use crate::store::PipelineStore;

pub struct VideoStage<'a> {
    pub provider: &'a dyn VideoProvider,
    pub objects: &'a dyn ObjectStore,
    pub store: &'a dyn PipelineStore,
    pub limiter: &'a Limiter<'a>,
    pub retry: &'a RetryConfig,
    pub call_timeout: Duration,
    pub tenant_id: DbId,
    pub persona_id: DbId,
    pub job_id: &'a JobId,
}

impl VideoStage<'_> {
    /// Generate one clip per state with bounded parallelism.
    pub async fn run(
        &self,
        tracker: &mut ProgressTracker<'_>,
        source_still_url: &str,
        states: &[AnimationState],
    ) -> Result<StageOutcome<AssetRecord>, StoreError> {
        let mut outcome = StageOutcome::default();
        let total = states.len();

        let mut clips = stream::iter(states.iter().enumerate())
            .map(|(position, state)| self.generate_state(source_still_url, *state, position))
            .buffer_unordered(STAGE_CONCURRENCY);

        let mut settled = 0usize;
        while let Some(result) = clips.next().await {
            settled += 1;
            match result {
                Ok(asset) => outcome.succeeded.push(asset),
                Err(failure) => {
                    tracing::warn!(
                        job_id = %self.job_id,
                        state = %failure.label,
                        kind = failure.kind.as_str(),
                        error = %failure.message,
                        "Animation state failed"
                    );
                    outcome.failed.push(failure);
                }
            }
            tracker
                .advance(&format!("animating states ({settled}/{total})"))
                .await?;
        }

        outcome.succeeded.sort_by(|a, b| a.label.cmp(&b.label));
        Ok(outcome)
    }

    async fn generate_state(
        &self,
        source_still_url: &str,
        state: AnimationState,
        position: usize,
    ) -> Result<AssetRecord, StageFailure> {
        let label = state.as_str().to_string();
        let fail = |kind, message: String| StageFailure {
            label: label.clone(),
            kind,
            message,
        };

        match self
            .limiter
            .charge(self.tenant_id, self.job_id, CALL_TYPE_VIDEO, COST_VIDEO_CENTS)
            .await
        {
            Ok(Charge::Accepted) => {}
            Ok(Charge::Rejected(f)) => return Err(fail(f.kind, f.detail)),
            Err(e) => {
                return Err(fail(
                    mascotly_core::failure::FailureKind::Transient,
                    e.to_string(),
                ))
            }
        }

        let request = VideoGenerationRequest {
            source_still_url: source_still_url.to_string(),
            state_name: label.clone(),
            motion_intent: state.motion_intent().to_string(),
            seed: derive_seed(self.persona_id, position as u32),
        };

        let clip = call_with_retry(self.retry, self.call_timeout, || {
            self.provider.generate_clip(&request)
        })
        .await
        .map_err(|e| fail(e.kind(), e.to_string()))?;

        let key = AssetKey::animation(
            self.tenant_id,
            self.persona_id,
            state.as_str(),
            extension_for(&clip.content_type),
        );
        let delivery_url = upload::upload_with_retry(
            self.objects,
            self.retry,
            &key,
            clip.bytes,
            &clip.content_type,
        )
        .await
        .map_err(|e| fail(e.kind(), e.to_string()))?;

        self.store
            .upsert_animation_state(&CreateAnimationState {
                persona_id: self.persona_id,
                state_name: label.clone(),
                delivery_url: delivery_url.clone(),
                source_still_url: source_still_url.to_string(),
            })
            .await
            .map_err(|e| fail(mascotly_core::failure::FailureKind::Transient, e.to_string()))?;

        Ok(AssetRecord {
            label,
            delivery_url,
            seed: None,
        })
    }
}
