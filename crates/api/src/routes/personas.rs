//! Route definitions for the `/personas` resource.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use mascotly_core::error::CoreError;
use mascotly_core::tier::{states_for_tier, SubscriptionTier};
use mascotly_core::types::DbId;
use mascotly_db::models::animation_state::AnimationStateAsset;
use mascotly_db::models::image_variation::ImageVariation;
use mascotly_db::models::persona::{CreatePersona, Persona};
use mascotly_db::repositories::{AnimationStateRepo, ImageVariationRepo, PersonaRepo};
use serde::Serialize;

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

/// Routes mounted at `/personas`.
///
/// ```text
/// POST   /                                      -> create_persona
/// GET    /{id}                                  -> get_persona
/// GET    /{id}/variations                       -> list_variations
/// POST   /{id}/variations/{variation_id}/approve -> approve_variation
/// GET    /{id}/states                           -> list_states
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_persona))
        .route("/{id}", get(get_persona))
        .route("/{id}/variations", get(list_variations))
        .route(
            "/{id}/variations/{variation_id}/approve",
            post(approve_variation),
        )
        .route("/{id}/states", get(list_states))
}

/// POST /personas -- create a persona for a merchant's product.
async fn create_persona(
    State(state): State<AppState>,
    Json(body): Json<CreatePersona>,
) -> AppResult<(StatusCode, Json<DataResponse<Persona>>)> {
    let persona = PersonaRepo::create(&state.pool, &body).await?;
    tracing::info!(persona_id = persona.id, tenant_id = persona.tenant_id, "Persona created");
    Ok((StatusCode::CREATED, Json(DataResponse { data: persona })))
}

#[derive(Debug, Serialize)]
pub struct PersonaResponse {
    #[serde(flatten)]
    pub persona: Persona,
    /// Animation states this persona's tier is entitled to.
    pub allowed_states: Vec<&'static str>,
}

/// GET /personas/{id}
async fn get_persona(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<PersonaResponse>>> {
    let persona = find_persona(&state, id).await?;
    let tier = SubscriptionTier::from_str(&persona.tier);
    let allowed_states = states_for_tier(tier).iter().map(|s| s.as_str()).collect();

    Ok(Json(DataResponse {
        data: PersonaResponse {
            persona,
            allowed_states,
        },
    }))
}

/// GET /personas/{id}/variations
async fn list_variations(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vec<ImageVariation>>>> {
    find_persona(&state, id).await?;
    let variations = ImageVariationRepo::list_for_persona(&state.pool, id).await?;
    Ok(Json(DataResponse { data: variations }))
}

/// POST /personas/{id}/variations/{variation_id}/approve
///
/// Marks one candidate still as the approved seed frame for the video
/// phase, demoting any previously approved sibling.
async fn approve_variation(
    State(state): State<AppState>,
    Path((id, variation_id)): Path<(DbId, DbId)>,
) -> AppResult<Json<DataResponse<ImageVariation>>> {
    find_persona(&state, id).await?;
    let approved = ImageVariationRepo::approve(&state.pool, id, variation_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "image variation",
            id: variation_id.to_string(),
        })?;

    tracing::info!(
        persona_id = id,
        variation_id,
        "Variation approved as seed frame"
    );
    Ok(Json(DataResponse { data: approved }))
}

/// GET /personas/{id}/states
async fn list_states(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vec<AnimationStateAsset>>>> {
    find_persona(&state, id).await?;
    let states = AnimationStateRepo::list_for_persona(&state.pool, id).await?;
    Ok(Json(DataResponse { data: states }))
}

async fn find_persona(state: &AppState, id: DbId) -> Result<Persona, crate::error::AppError> {
    Ok(PersonaRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "persona",
            id: id.to_string(),
        })?)
}
