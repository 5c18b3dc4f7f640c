//! Router for the personas API

use std::sync::Arc;

use axum::{Json, Router, routing::get};

use super::public;
use crate::ai::Persona;
use crate::api::state::AppState;

type SharedState = Arc<AppState>;

/// List the consultants the chat widget can open with
async fn persona_list() -> Json<public::PersonasResponse> {
    Json(public::PersonasResponse {
        personas: Persona::ALL.into_iter().map(Into::into).collect(),
    })
}

/// Create the personas router
pub fn router() -> Router<SharedState> {
    Router::new().route("/", get(persona_list))
}
