//! Animation state asset entity models and DTOs.

use mascotly_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `animation_states` table.
///
/// One short looping clip for a named behavioral state. The set of rows
/// for a persona is always a subset of what its tier allows.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct AnimationStateAsset {
    pub id: DbId,
    pub persona_id: DbId,
    pub state_name: String,
    pub delivery_url: String,
    pub source_still_url: String,
    pub generated_at: Timestamp,
}

/// DTO for recording a freshly generated state clip.
#[derive(Debug, Clone)]
pub struct CreateAnimationState {
    pub persona_id: DbId,
    pub state_name: String,
    pub delivery_url: String,
    pub source_still_url: String,
}
