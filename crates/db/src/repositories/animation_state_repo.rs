//! Repository for animation state assets.

use crate::models::animation_state::{AnimationStateAsset, CreateAnimationState};
use crate::DbPool;
use mascotly_core::types::DbId;

const COLUMNS: &str = "id, persona_id, state_name, delivery_url, source_still_url, generated_at";

pub struct AnimationStateRepo;

impl AnimationStateRepo {
    /// Insert or replace the clip for a persona's named state.
    pub async fn upsert(
        pool: &DbPool,
        state: &CreateAnimationState,
    ) -> Result<AnimationStateAsset, sqlx::Error> {
        sqlx::query_as::<_, AnimationStateAsset>(&format!(
            r#"
            INSERT INTO animation_states (persona_id, state_name, delivery_url, source_still_url)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (persona_id, state_name) DO UPDATE
            SET delivery_url = EXCLUDED.delivery_url,
                source_still_url = EXCLUDED.source_still_url,
                generated_at = NOW()
            RETURNING {COLUMNS}
            "#
        ))
        .bind(state.persona_id)
        .bind(&state.state_name)
        .bind(&state.delivery_url)
        .bind(&state.source_still_url)
        .fetch_one(pool)
        .await
    }

    pub async fn list_for_persona(
        pool: &DbPool,
        persona_id: DbId,
    ) -> Result<Vec<AnimationStateAsset>, sqlx::Error> {
        sqlx::query_as::<_, AnimationStateAsset>(&format!(
            "SELECT {COLUMNS} FROM animation_states WHERE persona_id = $1 ORDER BY state_name"
        ))
        .bind(persona_id)
        .fetch_all(pool)
        .await
    }
}
