//! Prompt template entity models.
//!
//! Templates are owned by an external authoring tool; the pipeline only
//! reads them.

use mascotly_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `prompt_templates` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct PromptTemplateRow {
    pub id: DbId,
    pub archetype: String,
    pub body: String,
    pub negative_body: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}
