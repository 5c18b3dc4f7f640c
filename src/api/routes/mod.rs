//! API routes module

pub mod chat;
pub mod personas;

use std::sync::Arc;

use crate::api::state::AppState;
use axum::Router;

type SharedState = Arc<AppState>;

/// Create the combined API router
pub fn router() -> Router<SharedState> {
    Router::new()
        // Chat relay
        .nest("/chat", chat::router())
        // Consultant profiles for the chat widget
        .nest("/personas", personas::router())
}
