//! Image variation stage.
//!
//! Generates N candidate stills with deterministic per-slot seeds, each
//! billed once, generated under retry, uploaded, and recorded. Slots
//! fail independently; the stage reports a tagged outcome rather than
//! aborting on the first failure.

use std::time::Duration;

use futures::stream::{self, StreamExt};
use mascotly_core::generation::{derive_seed, COST_IMAGE_CENTS, STAGE_CONCURRENCY};
use mascotly_core::prompt::RenderedPrompt;
use mascotly_core::retry::RetryConfig;
use mascotly_core::types::{DbId, JobId};
use mascotly_db::models::cost_ledger::CALL_TYPE_IMAGE;
use mascotly_db::models::image_variation::CreateImageVariation;
use mascotly_providers::{ImageGenerationRequest, ImagePayload, ImageProvider};
use mascotly_storage::key::extension_for;
use mascotly_storage::{AssetKey, ObjectStore};

use crate::error::StoreError;
use crate::limiter::{Charge, Limiter};
use crate::manifest::{AssetRecord, StageFailure, StageOutcome};
use crate::progress::ProgressTracker;
use crate::request::InputImage;
use crate::stages::{call_with_retry, upload};
use crate::store::PipelineStore;

pub struct ImageStage<'a> {
    pub provider: &'a dyn ImageProvider,
    pub objects: &'a dyn ObjectStore,
    pub store: &'a dyn PipelineStore,
    pub limiter: &'a Limiter<'a>,
    pub retry: &'a RetryConfig,
    pub call_timeout: Duration,
    pub tenant_id: DbId,
    pub persona_id: DbId,
    pub job_id: &'a JobId,
}

impl ImageStage<'_> {
    /// Generate `count` variations with bounded parallelism, advancing
    /// progress as each slot settles.
    pub async fn run(
        &self,
        tracker: &mut ProgressTracker<'_>,
        prompt: &RenderedPrompt,
        reference: &InputImage,
        count: u32,
    ) -> Result<StageOutcome<AssetRecord>, StoreError> {
        let mut outcome = StageOutcome::default();

        let mut slots = stream::iter(1..=count)
            .map(|index| self.generate_slot(prompt, reference, index))
            .buffer_unordered(STAGE_CONCURRENCY);

        let mut settled = 0u32;
        while let Some(result) = slots.next().await {
            settled += 1;
            match result {
                Ok(asset) => outcome.succeeded.push(asset),
                Err(failure) => {
                    tracing::warn!(
                        job_id = %self.job_id,
                        slot = %failure.label,
                        kind = failure.kind.as_str(),
                        error = %failure.message,
                        "Variation slot failed"
                    );
                    outcome.failed.push(failure);
                }
            }
            tracker
                .advance(&format!("generating variations ({settled}/{count})"))
                .await?;
        }

        // buffer_unordered settles out of order; restore slot order.
        outcome.succeeded.sort_by(|a, b| a.label.cmp(&b.label));
        Ok(outcome)
    }

    async fn generate_slot(
        &self,
        prompt: &RenderedPrompt,
        reference: &InputImage,
        index: u32,
    ) -> Result<AssetRecord, StageFailure> {
        let label = format!("variation-{index}");
        let seed = derive_seed(self.persona_id, index);
        let fail = |kind, message: String| StageFailure {
            label: label.clone(),
            kind,
            message,
        };

        // One charge per slot. Retries of the same slot are not re-billed.
        match self
            .limiter
            .charge(self.tenant_id, self.job_id, CALL_TYPE_IMAGE, COST_IMAGE_CENTS)
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

        let request = ImageGenerationRequest {
            prompt: prompt.prompt.clone(),
            negative_prompt: prompt.negative_prompt.clone(),
            seed,
            reference_image: ImagePayload {
                bytes: reference.bytes.clone(),
                content_type: reference.content_type.clone(),
            },
        };

        let image = call_with_retry(self.retry, self.call_timeout, || {
            self.provider.generate_image(&request)
        })
        .await
        .map_err(|e| fail(e.kind(), e.to_string()))?;

        let key = AssetKey::variation(
            self.tenant_id,
            self.persona_id,
            index as i32,
            extension_for(&image.content_type),
        );
        let delivery_url = upload::upload_with_retry(
            self.objects,
            self.retry,
            &key,
            image.bytes,
            &image.content_type,
        )
        .await
        .map_err(|e| fail(e.kind(), e.to_string()))?;

        self.store
            .upsert_variation(&CreateImageVariation {
                persona_id: self.persona_id,
                variation_index: index as i32,
                seed,
                delivery_url: delivery_url.clone(),
            })
            .await
            .map_err(|e| fail(mascotly_core::failure::FailureKind::Transient, e.to_string()))?;

        Ok(AssetRecord {
            label,
            delivery_url,
            seed: Some(seed),
        })
    }
}
