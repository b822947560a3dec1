//! Route definitions for the `/jobs` resource.
//!
//! Submission is idempotent on the caller-supplied job id: resubmitting
//! an accepted or finished job returns the stored row instead of
//! queueing duplicate work.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use mascotly_core::error::CoreError;
use mascotly_core::failure::FailureKind;
use mascotly_core::generation::validate_variation_count;
use mascotly_core::types::DbId;
use mascotly_db::models::job::{GenerationJob, NewGenerationJob};
use mascotly_db::models::status::JobStatus;
use mascotly_db::repositories::{JobRepo, PersonaRepo, ProgressRepo};
use mascotly_pipeline::{JobParameters, Phase, ResultManifest, StyleConfig};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

/// Routes mounted at `/jobs`.
///
/// ```text
/// POST   /                -> submit_job
/// GET    /{id}            -> get_job
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(submit_job))
        .route("/{id}", get(get_job))
}

#[derive(Debug, Deserialize)]
pub struct SubmitJobRequest {
    pub job_id: String,
    pub tenant_id: DbId,
    pub persona_id: DbId,
    pub phase: String,
    #[serde(default)]
    pub input_image_url: Option<String>,
    pub style: StyleConfig,
}

#[derive(Debug, Serialize)]
pub struct SubmitJobResponse {
    pub job_id: String,
    pub status: String,
    /// False when the job id was already known and the stored row was
    /// returned instead.
    pub accepted: bool,
}

/// POST /jobs -- accept a generation job for asynchronous processing.
async fn submit_job(
    State(state): State<AppState>,
    Json(body): Json<SubmitJobRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<SubmitJobResponse>>)> {
    let phase = Phase::parse(&body.phase).ok_or_else(|| {
        AppError::BadRequest(format!("phase must be 'image' or 'video', got '{}'", body.phase))
    })?;

    if body.job_id.trim().is_empty() {
        return Err(AppError::BadRequest("job_id must not be empty".into()));
    }
    if let Some(count) = body.style.variation_count {
        validate_variation_count(count).map_err(AppError::Core)?;
    }
    if phase == Phase::Image && body.input_image_url.is_none() {
        return Err(AppError::BadRequest(
            "image phase requires input_image_url".into(),
        ));
    }

    PersonaRepo::find_by_id(&state.pool, body.persona_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "persona",
            id: body.persona_id.to_string(),
        })?;

    let parameters = serde_json::to_value(JobParameters {
        phase,
        input_image_url: body.input_image_url.clone(),
        style: body.style.clone(),
    })
    .map_err(|e| AppError::InternalError(e.to_string()))?;

    let job = JobRepo::insert_if_absent(
        &state.pool,
        &NewGenerationJob {
            job_id: body.job_id.clone(),
            tenant_id: body.tenant_id,
            persona_id: body.persona_id,
            phase: phase.as_str().to_string(),
            parameters,
        },
    )
    .await?;

    // A row freshly inserted by this request is queued with no activity
    // yet; anything else was already known.
    let accepted = job.status_id == JobStatus::Queued.id() && job.current_step.is_none();
    let status = JobStatus::from_id(job.status_id)
        .map(|s| s.as_str().to_string())
        .unwrap_or_else(|| job.status_id.to_string());

    tracing::info!(
        job_id = %job.job_id,
        tenant_id = job.tenant_id,
        persona_id = job.persona_id,
        phase = %job.phase,
        accepted,
        "Job submission handled"
    );

    let code = if accepted {
        StatusCode::ACCEPTED
    } else {
        StatusCode::OK
    };
    Ok((
        code,
        Json(DataResponse {
            data: SubmitJobResponse {
                job_id: job.job_id,
                status,
                accepted,
            },
        }),
    ))
}

#[derive(Debug, Serialize)]
pub struct JobStatusResponse {
    pub job_id: String,
    pub status: String,
    pub phase: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_step: Option<String>,
    pub steps_completed: i32,
    pub steps_total: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_remaining_secs: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_detail: Option<String>,
    /// Caller-facing hint for failed jobs.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_action: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result_manifest: Option<ResultManifest>,
}

/// GET /jobs/{id} -- poll a job's status, progress, and manifest.
async fn get_job(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<DataResponse<JobStatusResponse>>> {
    let job = JobRepo::find_by_id(&state.pool, &id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "generation job",
            id: id.clone(),
        })?;
    let progress = ProgressRepo::get(&state.pool, &id).await?;

    Ok(Json(DataResponse {
        data: status_response(job, progress),
    }))
}

fn status_response(
    job: GenerationJob,
    progress: Option<mascotly_db::models::progress::ProgressRecord>,
) -> JobStatusResponse {
    let status = JobStatus::from_id(job.status_id)
        .map(|s| s.as_str().to_string())
        .unwrap_or_else(|| job.status_id.to_string());
    let suggested_action = job
        .error_kind
        .as_deref()
        .map(|kind| FailureKind::from_str(kind).suggested_action());
    let (steps_completed, steps_total, estimated_remaining_secs, current_step) = match progress {
        Some(p) => (
            p.steps_completed,
            p.steps_total,
            p.estimated_remaining_secs,
            Some(p.current_step),
        ),
        None => (0, 0, None, job.current_step.clone()),
    };

    JobStatusResponse {
        job_id: job.job_id,
        status,
        phase: job.phase,
        current_step,
        steps_completed,
        steps_total,
        estimated_remaining_secs,
        error_kind: job.error_kind,
        error_detail: job.error_detail,
        suggested_action,
        result_manifest: job.result.as_ref().and_then(ResultManifest::from_value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn job_row(status: JobStatus) -> GenerationJob {
        GenerationJob {
            job_id: "job-1".into(),
            tenant_id: 1,
            persona_id: 2,
            phase: "image".into(),
            status_id: status.id(),
            current_step: Some("queued".into()),
            error_kind: None,
            error_detail: None,
            parameters: serde_json::Value::Null,
            result: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn failed_job_carries_suggested_action() {
        let mut job = job_row(JobStatus::Failed);
        job.error_kind = Some("rate_limited".into());
        job.error_detail = Some("spend ceiling exceeded; retry after 21600s".into());

        let response = status_response(job, None);
        assert_eq!(response.status, "failed");
        assert_eq!(
            response.suggested_action,
            Some(FailureKind::RateLimited.suggested_action())
        );
    }

    #[test]
    fn progress_fields_fall_back_when_missing() {
        let response = status_response(job_row(JobStatus::Queued), None);
        assert_eq!(response.steps_total, 0);
        assert_eq!(response.current_step.as_deref(), Some("queued"));
        assert!(response.result_manifest.is_none());
    }
}
