//! Prompt construction stage.

use mascotly_core::anatomy::AnatomyHints;
use mascotly_core::error::CoreError;
use mascotly_core::prompt::{render, PromptVars, RenderedPrompt};
use mascotly_db::models::persona::Persona;

use crate::error::JobFailure;
use crate::request::StyleConfig;
use crate::store::PipelineStore;

/// Resolve the persona's template against request and anatomy variables.
pub async fn build_prompt(
    store: &dyn PipelineStore,
    persona: &Persona,
    style: &StyleConfig,
    hints: &AnatomyHints,
) -> Result<RenderedPrompt, JobFailure> {
    let template = store
        .find_template(&persona.archetype)
        .await?
        .ok_or_else(|| {
            JobFailure::validation(format!(
                "no prompt template available for archetype '{}'",
                persona.archetype
            ))
        })?;

    let mut vars = PromptVars::new();
    vars.insert("product_name".into(), style.product_name.clone());
    vars.insert("character_type".into(), style.character_type.clone());
    vars.insert("vibe".into(), vibe_text(&style.vibe_tags));
    vars.insert("object_name".into(), hints.object_name.clone());
    vars.insert("shape_category".into(), hints.shape_category.clone());
    vars.insert("face_placement".into(), hints.face_placement.clone());
    vars.insert("arm_placement".into(), hints.arm_placement.clone());

    render(&template, &vars).map_err(|e| match e {
        CoreError::Validation(msg) => JobFailure::validation(msg),
        other => JobFailure::validation(other.to_string()),
    })
}

fn vibe_text(tags: &[String]) -> String {
    if tags.is_empty() {
        "friendly".to_string()
    } else {
        tags.join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_vibe_tags_get_a_default() {
        assert_eq!(vibe_text(&[]), "friendly");
        assert_eq!(
            vibe_text(&["quirky".to_string(), "retro".to_string()]),
            "quirky, retro"
        );
    }
}
