//! Repository for prompt templates.

use crate::models::template::PromptTemplateRow;
use crate::DbPool;

const COLUMNS: &str = "id, archetype, body, negative_body, created_at, updated_at";

pub struct PromptTemplateRepo;

impl PromptTemplateRepo {
    /// Fetch the template for an archetype, falling back to `default`.
    pub async fn find_for_archetype(
        pool: &DbPool,
        archetype: &str,
    ) -> Result<Option<PromptTemplateRow>, sqlx::Error> {
        sqlx::query_as::<_, PromptTemplateRow>(&format!(
            r#"
            SELECT {COLUMNS} FROM prompt_templates
            WHERE archetype = $1 OR archetype = 'default'
            ORDER BY (archetype = $1) DESC
            LIMIT 1
            "#
        ))
        .bind(archetype)
        .fetch_optional(pool)
        .await
    }
}
