//! Route definitions.

pub mod health;
pub mod jobs;
pub mod personas;

use axum::Router;

use crate::state::AppState;

/// All routes mounted under `/api/v1`.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/jobs", jobs::router())
        .nest("/personas", personas::router())
}
