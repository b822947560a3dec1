//! Job progress entity models.

use mascotly_core::types::{JobId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `job_progress` table, one-to-one with a generation job.
///
/// `steps_completed` is monotonically non-decreasing for the lifetime of
/// a job id; the repository enforces this at the SQL level.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ProgressRecord {
    pub job_id: JobId,
    pub current_step: String,
    pub steps_completed: i32,
    pub steps_total: i32,
    pub estimated_remaining_secs: Option<f64>,
    pub started_at: Timestamp,
    pub updated_at: Timestamp,
}
