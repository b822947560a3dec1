//! Repository for personas.

use crate::models::persona::{CreatePersona, Persona};
use crate::DbPool;
use mascotly_core::types::DbId;

const COLUMNS: &str = "id, tenant_id, name, product_name, archetype, tier, \
                       last_generation_at, created_at, updated_at";

pub struct PersonaRepo;

impl PersonaRepo {
    pub async fn create(pool: &DbPool, persona: &CreatePersona) -> Result<Persona, sqlx::Error> {
        sqlx::query_as::<_, Persona>(&format!(
            r#"
            INSERT INTO personas (tenant_id, name, product_name, archetype, tier)
            VALUES ($1, $2, $3, COALESCE($4, 'mascot'), COALESCE($5, 'starter'))
            RETURNING {COLUMNS}
            "#
        ))
        .bind(persona.tenant_id)
        .bind(&persona.name)
        .bind(&persona.product_name)
        .bind(persona.archetype.as_deref())
        .bind(persona.tier.as_deref())
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_id(pool: &DbPool, id: DbId) -> Result<Option<Persona>, sqlx::Error> {
        sqlx::query_as::<_, Persona>(&format!("SELECT {COLUMNS} FROM personas WHERE id = $1"))
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Record the completion time of a generation run for cooldown checks.
    pub async fn touch_generation_stamp(pool: &DbPool, id: DbId) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE personas SET last_generation_at = NOW(), updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .execute(pool)
        .await?;
        Ok(())
    }
}
