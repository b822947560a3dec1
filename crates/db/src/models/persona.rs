//! Persona entity models and DTOs.

use mascotly_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `personas` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Persona {
    pub id: DbId,
    pub tenant_id: DbId,
    pub name: String,
    pub product_name: String,
    pub archetype: String,
    pub tier: String,
    /// Cooldown stamp: when this persona last completed a generation run.
    pub last_generation_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a new persona.
#[derive(Debug, Clone, Deserialize)]
pub struct CreatePersona {
    pub tenant_id: DbId,
    pub name: String,
    pub product_name: String,
    pub archetype: Option<String>,
    pub tier: Option<String>,
}
