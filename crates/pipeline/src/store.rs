//! Persistence port for the pipeline.
//!
//! The orchestrator talks to storage only through [`PipelineStore`], so
//! orchestration logic can be exercised against an in-memory double.
//! [`PgStore`] is the production implementation, delegating to the
//! repositories in `mascotly-db`.

use async_trait::async_trait;
use mascotly_core::failure::FailureKind;
use mascotly_core::prompt::PromptTemplate;
use mascotly_core::types::{DbId, JobId};
use mascotly_db::models::animation_state::CreateAnimationState;
use mascotly_db::models::image_variation::{CreateImageVariation, ImageVariation};
use mascotly_db::models::job::{GenerationJob, NewGenerationJob};
use mascotly_db::models::persona::Persona;
use mascotly_db::repositories::{
    AnimationStateRepo, CostLedgerRepo, ImageVariationRepo, JobRepo, PersonaRepo,
    ProgressRepo, PromptTemplateRepo,
};
use mascotly_db::DbPool;

use crate::error::StoreError;

/// Everything the orchestrator needs from persistence.
#[async_trait]
pub trait PipelineStore: Send + Sync {
    // Jobs.
    async fn insert_job_if_absent(
        &self,
        job: &NewGenerationJob,
    ) -> Result<GenerationJob, StoreError>;
    async fn find_job(&self, job_id: &JobId) -> Result<Option<GenerationJob>, StoreError>;
    /// Conditional `queued -> processing` transition; succeeds for
    /// exactly one caller.
    async fn try_claim_job(&self, job_id: &JobId) -> Result<bool, StoreError>;
    async fn complete_job(
        &self,
        job_id: &JobId,
        result: &serde_json::Value,
    ) -> Result<(), StoreError>;
    async fn fail_job(
        &self,
        job_id: &JobId,
        kind: FailureKind,
        detail: &str,
    ) -> Result<(), StoreError>;
    async fn set_job_step(&self, job_id: &JobId, step: &str) -> Result<(), StoreError>;
    async fn count_processing_jobs(&self) -> Result<i64, StoreError>;

    // Personas.
    async fn find_persona(&self, id: DbId) -> Result<Option<Persona>, StoreError>;
    async fn touch_persona_generation(&self, id: DbId) -> Result<(), StoreError>;

    // Image variations.
    async fn upsert_variation(&self, variation: &CreateImageVariation)
        -> Result<(), StoreError>;
    async fn find_approved_variation(
        &self,
        persona_id: DbId,
    ) -> Result<Option<ImageVariation>, StoreError>;

    // Animation states.
    async fn upsert_animation_state(
        &self,
        state: &CreateAnimationState,
    ) -> Result<(), StoreError>;

    // Cost ledger. Returns whether the charge was accepted; a rejected
    // charge means the rolling spend ceiling would be exceeded.
    async fn try_charge(
        &self,
        tenant_id: DbId,
        job_id: &JobId,
        call_type: &str,
        unit_cost_cents: i64,
        window_secs: i64,
        ceiling_cents: i64,
    ) -> Result<bool, StoreError>;

    // Progress.
    async fn init_progress(&self, job_id: &JobId, steps_total: i32) -> Result<(), StoreError>;
    async fn advance_progress(
        &self,
        job_id: &JobId,
        step: &str,
        estimated_remaining_secs: Option<f64>,
    ) -> Result<(), StoreError>;

    // Prompt templates.
    async fn find_template(&self, archetype: &str)
        -> Result<Option<PromptTemplate>, StoreError>;
}

/// Postgres-backed store.
pub struct PgStore {
    pool: DbPool,
}

impl PgStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PipelineStore for PgStore {
    async fn insert_job_if_absent(
        &self,
        job: &NewGenerationJob,
    ) -> Result<GenerationJob, StoreError> {
        Ok(JobRepo::insert_if_absent(&self.pool, job).await?)
    }

    async fn find_job(&self, job_id: &JobId) -> Result<Option<GenerationJob>, StoreError> {
        Ok(JobRepo::find_by_id(&self.pool, job_id).await?)
    }

    async fn try_claim_job(&self, job_id: &JobId) -> Result<bool, StoreError> {
        Ok(JobRepo::try_claim(&self.pool, job_id).await?)
    }

    async fn complete_job(
        &self,
        job_id: &JobId,
        result: &serde_json::Value,
    ) -> Result<(), StoreError> {
        JobRepo::complete(&self.pool, job_id, result).await?;
        Ok(())
    }

    async fn fail_job(
        &self,
        job_id: &JobId,
        kind: FailureKind,
        detail: &str,
    ) -> Result<(), StoreError> {
        JobRepo::fail(&self.pool, job_id, kind.as_str(), detail).await?;
        Ok(())
    }

    async fn set_job_step(&self, job_id: &JobId, step: &str) -> Result<(), StoreError> {
        Ok(JobRepo::set_current_step(&self.pool, job_id, step).await?)
    }

    async fn count_processing_jobs(&self) -> Result<i64, StoreError> {
        Ok(JobRepo::count_processing(&self.pool).await?)
    }

    async fn find_persona(&self, id: DbId) -> Result<Option<Persona>, StoreError> {
        Ok(PersonaRepo::find_by_id(&self.pool, id).await?)
    }

    async fn touch_persona_generation(&self, id: DbId) -> Result<(), StoreError> {
        Ok(PersonaRepo::touch_generation_stamp(&self.pool, id).await?)
    }

    async fn upsert_variation(
        &self,
        variation: &CreateImageVariation,
    ) -> Result<(), StoreError> {
        ImageVariationRepo::upsert(&self.pool, variation).await?;
        Ok(())
    }

    async fn find_approved_variation(
        &self,
        persona_id: DbId,
    ) -> Result<Option<ImageVariation>, StoreError> {
        Ok(ImageVariationRepo::find_approved(&self.pool, persona_id).await?)
    }

    async fn upsert_animation_state(
        &self,
        state: &CreateAnimationState,
    ) -> Result<(), StoreError> {
        AnimationStateRepo::upsert(&self.pool, state).await?;
        Ok(())
    }

    async fn try_charge(
        &self,
        tenant_id: DbId,
        job_id: &JobId,
        call_type: &str,
        unit_cost_cents: i64,
        window_secs: i64,
        ceiling_cents: i64,
    ) -> Result<bool, StoreError> {
        let entry = CostLedgerRepo::try_charge(
            &self.pool,
            tenant_id,
            job_id,
            call_type,
            unit_cost_cents,
            window_secs,
            ceiling_cents,
        )
        .await?;
        Ok(entry.is_some())
    }

    async fn init_progress(&self, job_id: &JobId, steps_total: i32) -> Result<(), StoreError> {
        Ok(ProgressRepo::init(&self.pool, job_id, steps_total).await?)
    }

    async fn advance_progress(
        &self,
        job_id: &JobId,
        step: &str,
        estimated_remaining_secs: Option<f64>,
    ) -> Result<(), StoreError> {
        ProgressRepo::advance(&self.pool, job_id, step, estimated_remaining_secs).await?;
        Ok(())
    }

    async fn find_template(
        &self,
        archetype: &str,
    ) -> Result<Option<PromptTemplate>, StoreError> {
        let row = PromptTemplateRepo::find_for_archetype(&self.pool, archetype).await?;
        Ok(row.map(|r| PromptTemplate {
            body: r.body,
            negative_body: r.negative_body,
        }))
    }
}
