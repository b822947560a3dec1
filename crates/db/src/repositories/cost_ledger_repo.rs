//! Repository for the cost ledger.
//!
//! The check-and-charge path is a single conditional INSERT so that two
//! concurrent workers racing the same ceiling cannot both slip under it
//! with separate read-then-write statements.

use crate::models::cost_ledger::CostLedgerEntry;
use crate::DbPool;
use mascotly_core::types::{DbId, JobId};

const COLUMNS: &str = "id, tenant_id, job_id, call_type, unit_cost_cents, created_at";

pub struct CostLedgerRepo;

impl CostLedgerRepo {
    /// Record a billable call if the tenant's rolling spend allows it.
    ///
    /// Returns the ledger entry when the charge was accepted, or `None`
    /// when adding `unit_cost_cents` would exceed `ceiling_cents` over the
    /// trailing `window_secs`.
    pub async fn try_charge(
        pool: &DbPool,
        tenant_id: DbId,
        job_id: &JobId,
        call_type: &str,
        unit_cost_cents: i64,
        window_secs: i64,
        ceiling_cents: i64,
    ) -> Result<Option<CostLedgerEntry>, sqlx::Error> {
        sqlx::query_as::<_, CostLedgerEntry>(&format!(
            r#"
            INSERT INTO cost_ledger (tenant_id, job_id, call_type, unit_cost_cents)
            SELECT $1, $2, $3, $4
            WHERE (
                SELECT COALESCE(SUM(unit_cost_cents), 0)
                FROM cost_ledger
                WHERE tenant_id = $1
                  AND created_at > NOW() - make_interval(secs => $5::double precision)
            ) + $4 <= $6
            RETURNING {COLUMNS}
            "#
        ))
        .bind(tenant_id)
        .bind(job_id)
        .bind(call_type)
        .bind(unit_cost_cents)
        .bind(window_secs)
        .bind(ceiling_cents)
        .fetch_optional(pool)
        .await
    }

    /// Total spend for a tenant over the trailing window.
    pub async fn rolling_spend(
        pool: &DbPool,
        tenant_id: DbId,
        window_secs: i64,
    ) -> Result<i64, sqlx::Error> {
        let total: (i64,) = sqlx::query_as(
            r#"
            SELECT COALESCE(SUM(unit_cost_cents), 0)
            FROM cost_ledger
            WHERE tenant_id = $1
              AND created_at > NOW() - make_interval(secs => $2::double precision)
            "#,
        )
        .bind(tenant_id)
        .bind(window_secs)
        .fetch_one(pool)
        .await?;
        Ok(total.0)
    }

    pub async fn entries_for_job(
        pool: &DbPool,
        job_id: &JobId,
    ) -> Result<Vec<CostLedgerEntry>, sqlx::Error> {
        sqlx::query_as::<_, CostLedgerEntry>(&format!(
            "SELECT {COLUMNS} FROM cost_ledger WHERE job_id = $1 ORDER BY created_at"
        ))
        .bind(job_id)
        .fetch_all(pool)
        .await
    }
}
