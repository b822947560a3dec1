//! Repository for generation jobs.
//!
//! Job ownership is transferred with status-guarded UPDATEs so that two
//! workers polling the same queue can never both process one job.

use crate::models::job::{GenerationJob, NewGenerationJob};
use crate::models::status::JobStatus;
use crate::DbPool;
use mascotly_core::types::JobId;

const COLUMNS: &str = "job_id, tenant_id, persona_id, phase, status_id, current_step, \
                       error_kind, error_detail, parameters, result, created_at, updated_at";

pub struct JobRepo;

impl JobRepo {
    /// Insert a job if its id is not already present.
    ///
    /// Returns the stored row either way, so callers can distinguish a
    /// fresh accept from an idempotent replay by inspecting `status_id`.
    pub async fn insert_if_absent(
        pool: &DbPool,
        job: &NewGenerationJob,
    ) -> Result<GenerationJob, sqlx::Error> {
        let inserted = sqlx::query_as::<_, GenerationJob>(&format!(
            r#"
            INSERT INTO generation_jobs (job_id, tenant_id, persona_id, phase, parameters)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (job_id) DO NOTHING
            RETURNING {COLUMNS}
            "#
        ))
        .bind(&job.job_id)
        .bind(job.tenant_id)
        .bind(job.persona_id)
        .bind(&job.phase)
        .bind(&job.parameters)
        .fetch_optional(pool)
        .await?;

        match inserted {
            Some(row) => Ok(row),
            None => Self::find_by_id(pool, &job.job_id)
                .await?
                .ok_or(sqlx::Error::RowNotFound),
        }
    }

    pub async fn find_by_id(
        pool: &DbPool,
        job_id: &JobId,
    ) -> Result<Option<GenerationJob>, sqlx::Error> {
        sqlx::query_as::<_, GenerationJob>(&format!(
            "SELECT {COLUMNS} FROM generation_jobs WHERE job_id = $1"
        ))
        .bind(job_id)
        .fetch_optional(pool)
        .await
    }

    /// Atomically claim a queued job for processing.
    ///
    /// Returns `true` if this caller won ownership. A job that is already
    /// processing or terminal is left untouched and the claim fails.
    pub async fn try_claim(pool: &DbPool, job_id: &JobId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE generation_jobs
            SET status_id = $2, updated_at = NOW()
            WHERE job_id = $1 AND status_id = $3
            "#,
        )
        .bind(job_id)
        .bind(JobStatus::Processing.id())
        .bind(JobStatus::Queued.id())
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Mark a processing job completed and attach its result manifest.
    pub async fn complete(
        pool: &DbPool,
        job_id: &JobId,
        result: &serde_json::Value,
    ) -> Result<bool, sqlx::Error> {
        let res = sqlx::query(
            r#"
            UPDATE generation_jobs
            SET status_id = $2, result = $3, updated_at = NOW()
            WHERE job_id = $1 AND status_id = $4
            "#,
        )
        .bind(job_id)
        .bind(JobStatus::Completed.id())
        .bind(result)
        .bind(JobStatus::Processing.id())
        .execute(pool)
        .await?;

        Ok(res.rows_affected() > 0)
    }

    /// Mark a processing job failed with a classified error.
    pub async fn fail(
        pool: &DbPool,
        job_id: &JobId,
        error_kind: &str,
        error_detail: &str,
    ) -> Result<bool, sqlx::Error> {
        let res = sqlx::query(
            r#"
            UPDATE generation_jobs
            SET status_id = $2, error_kind = $3, error_detail = $4, updated_at = NOW()
            WHERE job_id = $1 AND status_id = $5
            "#,
        )
        .bind(job_id)
        .bind(JobStatus::Failed.id())
        .bind(error_kind)
        .bind(error_detail)
        .bind(JobStatus::Processing.id())
        .execute(pool)
        .await?;

        Ok(res.rows_affected() > 0)
    }

    /// Update the human-readable step label on a processing job.
    pub async fn set_current_step(
        pool: &DbPool,
        job_id: &JobId,
        step: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            UPDATE generation_jobs
            SET current_step = $2, updated_at = NOW()
            WHERE job_id = $1
            "#,
        )
        .bind(job_id)
        .bind(step)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Count in-flight jobs across all tenants.
    pub async fn count_processing(pool: &DbPool) -> Result<i64, sqlx::Error> {
        let count: (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM generation_jobs WHERE status_id = $1")
                .bind(JobStatus::Processing.id())
                .fetch_one(pool)
                .await?;
        Ok(count.0)
    }

    /// Find the oldest queued job without claiming it. Ownership is taken
    /// separately with [`JobRepo::try_claim`], which resolves races
    /// between polling workers.
    pub async fn find_next_queued(pool: &DbPool) -> Result<Option<GenerationJob>, sqlx::Error> {
        sqlx::query_as::<_, GenerationJob>(&format!(
            r#"
            SELECT {COLUMNS} FROM generation_jobs
            WHERE status_id = $1
            ORDER BY created_at
            LIMIT 1
            "#
        ))
        .bind(JobStatus::Queued.id())
        .fetch_optional(pool)
        .await
    }
}
