//! Admission checks and billing for paid provider calls.
//!
//! Admission (cooldown, in-flight ceiling) is decided once per job from
//! the pure functions in `mascotly_core::limits`. The spend ceiling is
//! different: it is enforced per billable call, atomically, by the
//! ledger's conditional insert, because concurrent workers race it.

use mascotly_core::limits::{
    check_cooldown, check_inflight, spend_retry_after, LimitConfig, LimitDecision, LimitReason,
};
use mascotly_core::types::{DbId, JobId};
use mascotly_db::models::persona::Persona;

use crate::error::{JobFailure, StoreError};
use crate::request::Phase;
use crate::store::PipelineStore;

pub struct Limiter<'a> {
    store: &'a dyn PipelineStore,
    config: &'a LimitConfig,
}

/// Outcome of one billable-call charge attempt.
pub enum Charge {
    Accepted,
    /// The rolling spend ceiling would be exceeded. No provider call may
    /// follow.
    Rejected(JobFailure),
}

impl<'a> Limiter<'a> {
    pub fn new(store: &'a dyn PipelineStore, config: &'a LimitConfig) -> Self {
        Self { store, config }
    }

    /// Run the per-job admission checks after the job has been claimed.
    ///
    /// The cooldown applies to image-phase regeneration only; the video
    /// phase operates on an already-approved still. The in-flight count
    /// includes the job being admitted, hence the subtraction.
    pub async fn admit(&self, persona: &Persona, phase: Phase) -> Result<(), JobFailure> {
        if phase == Phase::Image {
            let decision =
                check_cooldown(persona.last_generation_at, chrono::Utc::now(), self.config);
            if let LimitDecision::Rejected {
                reason,
                retry_after,
            } = decision
            {
                return Err(JobFailure::rate_limited(reason, retry_after));
            }
        }

        let processing = self.store.count_processing_jobs().await?;
        if let LimitDecision::Rejected {
            reason,
            retry_after,
        } = check_inflight(processing - 1, self.config)
        {
            return Err(JobFailure::rate_limited(reason, retry_after));
        }

        Ok(())
    }

    /// Charge one billable provider call against the tenant's ledger.
    ///
    /// Called exactly once per logical call, before the retry loop, so
    /// retried attempts are never billed twice.
    pub async fn charge(
        &self,
        tenant_id: DbId,
        job_id: &JobId,
        call_type: &str,
        unit_cost_cents: i64,
    ) -> Result<Charge, StoreError> {
        let accepted = self
            .store
            .try_charge(
                tenant_id,
                job_id,
                call_type,
                unit_cost_cents,
                self.config.spend_window.as_secs() as i64,
                self.config.spend_ceiling_cents,
            )
            .await?;

        if accepted {
            Ok(Charge::Accepted)
        } else {
            tracing::warn!(
                tenant_id,
                job_id = %job_id,
                call_type,
                "Spend ceiling reached, charge rejected"
            );
            Ok(Charge::Rejected(JobFailure::rate_limited(
                LimitReason::SpendCeiling,
                spend_retry_after(self.config),
            )))
        }
    }
}
