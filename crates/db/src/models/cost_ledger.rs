//! Cost ledger entity models.

use mascotly_core::types::{DbId, JobId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// Billable call types recorded in the ledger.
pub const CALL_TYPE_ANATOMY: &str = "anatomy";
pub const CALL_TYPE_IMAGE: &str = "image";
pub const CALL_TYPE_VIDEO: &str = "video";

/// A row from the append-only `cost_ledger` table.
///
/// One billable provider call. Rows are never mutated; they exist only
/// to compute rolling spend for rate-limit decisions.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct CostLedgerEntry {
    pub id: DbId,
    pub tenant_id: DbId,
    pub job_id: JobId,
    pub call_type: String,
    pub unit_cost_cents: i64,
    pub created_at: Timestamp,
}
