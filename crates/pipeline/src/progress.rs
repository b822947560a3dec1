//! Progress reporting for polling clients.

use std::time::{Duration, Instant};

use mascotly_core::types::JobId;

use crate::error::StoreError;
use crate::store::PipelineStore;

/// Single authoritative progress writer for one job.
///
/// The orchestrator owns the job, so the tracker is owned by one task
/// and advances are naturally serialized. The completed-step counter
/// only ever increases.
pub struct ProgressTracker<'a> {
    store: &'a dyn PipelineStore,
    job_id: JobId,
    steps_total: i32,
    steps_completed: i32,
    started: Instant,
}

impl<'a> ProgressTracker<'a> {
    /// Initialize progress for a job. Re-running a replayed job id keeps
    /// the existing record.
    pub async fn start(
        store: &'a dyn PipelineStore,
        job_id: JobId,
        steps_total: i32,
    ) -> Result<Self, StoreError> {
        store.init_progress(&job_id, steps_total).await?;
        Ok(Self {
            store,
            job_id,
            steps_total,
            steps_completed: 0,
            started: Instant::now(),
        })
    }

    /// Record one completed step and update the job's current-step label.
    pub async fn advance(&mut self, label: &str) -> Result<(), StoreError> {
        self.steps_completed = (self.steps_completed + 1).min(self.steps_total);
        let estimate =
            estimate_remaining_secs(self.started.elapsed(), self.steps_completed, self.steps_total);

        tracing::debug!(
            job_id = %self.job_id,
            step = label,
            completed = self.steps_completed,
            total = self.steps_total,
            "Progress advanced"
        );

        self.store
            .advance_progress(&self.job_id, label, estimate)
            .await?;
        self.store.set_job_step(&self.job_id, label).await
    }
}

/// Velocity-based remaining-time estimate: assume the remaining steps
/// take as long, on average, as the completed ones did.
pub fn estimate_remaining_secs(elapsed: Duration, completed: i32, total: i32) -> Option<f64> {
    if completed <= 0 || total <= completed {
        return if total <= completed { Some(0.0) } else { None };
    }
    let per_step = elapsed.as_secs_f64() / completed as f64;
    Some(per_step * (total - completed) as f64)
}
