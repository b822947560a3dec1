//! Generation job entity models and DTOs.

use mascotly_core::types::{DbId, JobId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::status::StatusId;

/// A row from the `generation_jobs` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct GenerationJob {
    pub job_id: JobId,
    pub tenant_id: DbId,
    pub persona_id: DbId,
    pub phase: String,
    pub status_id: StatusId,
    pub current_step: Option<String>,
    pub error_kind: Option<String>,
    pub error_detail: Option<String>,
    pub parameters: serde_json::Value,
    pub result: Option<serde_json::Value>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for accepting a new generation job.
///
/// `job_id` is the caller-supplied idempotency key; submitting the same
/// id twice never creates a second row.
#[derive(Debug, Clone, Deserialize)]
pub struct NewGenerationJob {
    pub job_id: JobId,
    pub tenant_id: DbId,
    pub persona_id: DbId,
    pub phase: String,
    pub parameters: serde_json::Value,
}
