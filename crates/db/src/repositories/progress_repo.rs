//! Repository for job progress records.

use crate::models::progress::ProgressRecord;
use crate::DbPool;
use mascotly_core::types::JobId;

const COLUMNS: &str = "job_id, current_step, steps_completed, steps_total, \
                       estimated_remaining_secs, started_at, updated_at";

pub struct ProgressRepo;

impl ProgressRepo {
    /// Create the progress record for a job, once.
    ///
    /// Re-running a replayed job must not reset an existing record, so a
    /// duplicate init is silently ignored.
    pub async fn init(
        pool: &DbPool,
        job_id: &JobId,
        steps_total: i32,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO job_progress (job_id, steps_total)
            VALUES ($1, $2)
            ON CONFLICT (job_id) DO NOTHING
            "#,
        )
        .bind(job_id)
        .bind(steps_total)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Advance progress by one step.
    ///
    /// `steps_completed` never decreases and never exceeds `steps_total`.
    pub async fn advance(
        pool: &DbPool,
        job_id: &JobId,
        current_step: &str,
        estimated_remaining_secs: Option<f64>,
    ) -> Result<Option<ProgressRecord>, sqlx::Error> {
        sqlx::query_as::<_, ProgressRecord>(&format!(
            r#"
            UPDATE job_progress
            SET steps_completed = LEAST(steps_total, steps_completed + 1),
                current_step = $2,
                estimated_remaining_secs = $3,
                updated_at = NOW()
            WHERE job_id = $1
            RETURNING {COLUMNS}
            "#
        ))
        .bind(job_id)
        .bind(current_step)
        .bind(estimated_remaining_secs)
        .fetch_optional(pool)
        .await
    }

    pub async fn get(
        pool: &DbPool,
        job_id: &JobId,
    ) -> Result<Option<ProgressRecord>, sqlx::Error> {
        sqlx::query_as::<_, ProgressRecord>(&format!(
            "SELECT {COLUMNS} FROM job_progress WHERE job_id = $1"
        ))
        .bind(job_id)
        .fetch_optional(pool)
        .await
    }
}
