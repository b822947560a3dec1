//! Repository for image variations.

use crate::models::image_variation::{CreateImageVariation, ImageVariation};
use crate::DbPool;
use mascotly_core::types::DbId;

const COLUMNS: &str = "id, persona_id, variation_index, seed, delivery_url, approved, generated_at";

pub struct ImageVariationRepo;

impl ImageVariationRepo {
    /// Insert or replace the variation at a persona's slot.
    ///
    /// Regenerating a slot replaces the previous candidate and clears any
    /// approval it carried, since the merchant has not seen the new image.
    pub async fn upsert(
        pool: &DbPool,
        variation: &CreateImageVariation,
    ) -> Result<ImageVariation, sqlx::Error> {
        sqlx::query_as::<_, ImageVariation>(&format!(
            r#"
            INSERT INTO image_variations (persona_id, variation_index, seed, delivery_url)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT ON CONSTRAINT uq_image_variations_slot DO UPDATE
            SET seed = EXCLUDED.seed,
                delivery_url = EXCLUDED.delivery_url,
                approved = FALSE,
                generated_at = NOW()
            RETURNING {COLUMNS}
            "#
        ))
        .bind(variation.persona_id)
        .bind(variation.variation_index)
        .bind(variation.seed)
        .bind(&variation.delivery_url)
        .fetch_one(pool)
        .await
    }

    pub async fn list_for_persona(
        pool: &DbPool,
        persona_id: DbId,
    ) -> Result<Vec<ImageVariation>, sqlx::Error> {
        sqlx::query_as::<_, ImageVariation>(&format!(
            "SELECT {COLUMNS} FROM image_variations WHERE persona_id = $1 ORDER BY variation_index"
        ))
        .bind(persona_id)
        .fetch_all(pool)
        .await
    }

    pub async fn find_approved(
        pool: &DbPool,
        persona_id: DbId,
    ) -> Result<Option<ImageVariation>, sqlx::Error> {
        sqlx::query_as::<_, ImageVariation>(&format!(
            "SELECT {COLUMNS} FROM image_variations WHERE persona_id = $1 AND approved"
        ))
        .bind(persona_id)
        .fetch_optional(pool)
        .await
    }

    /// Approve one variation, demoting any previously approved sibling.
    ///
    /// Returns the approved row, or `None` if the variation does not exist
    /// or belongs to a different persona.
    pub async fn approve(
        pool: &DbPool,
        persona_id: DbId,
        variation_id: DbId,
    ) -> Result<Option<ImageVariation>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        sqlx::query("UPDATE image_variations SET approved = FALSE WHERE persona_id = $1 AND approved")
            .bind(persona_id)
            .execute(&mut *tx)
            .await?;

        let approved = sqlx::query_as::<_, ImageVariation>(&format!(
            r#"
            UPDATE image_variations
            SET approved = TRUE
            WHERE id = $1 AND persona_id = $2
            RETURNING {COLUMNS}
            "#
        ))
        .bind(variation_id)
        .bind(persona_id)
        .fetch_optional(&mut *tx)
        .await?;

        if approved.is_some() {
            tx.commit().await?;
        } else {
            tx.rollback().await?;
        }
        Ok(approved)
    }
}
