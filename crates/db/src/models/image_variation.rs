//! Image variation entity models and DTOs.

use mascotly_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `image_variations` table.
///
/// One candidate still produced during the image phase. The `approved`
/// flag is set by the merchant's approval action, never by the pipeline;
/// a partial unique index keeps at most one approved row per persona.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ImageVariation {
    pub id: DbId,
    pub persona_id: DbId,
    pub variation_index: i32,
    pub seed: i64,
    pub delivery_url: String,
    pub approved: bool,
    pub generated_at: Timestamp,
}

/// DTO for recording a freshly generated variation.
#[derive(Debug, Clone)]
pub struct CreateImageVariation {
    pub persona_id: DbId,
    pub variation_index: i32,
    pub seed: i64,
    pub delivery_url: String,
}
