//! Router for the chat API

use std::convert::Infallible;
use std::sync::Arc;

use anyhow::anyhow;
use axum::{
    Json, Router,
    body::Body,
    extract::{State, rejection::JsonRejection},
    response::Response,
    routing::post,
};
use http::{HeaderValue, header};
use tokio::sync::mpsc;
use tokio_stream::StreamExt as _;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tokio_util::sync::CancellationToken;

use super::public;
use crate::ai::Persona;
use crate::api::public::{ApiError, CHAT_ERROR_MESSAGE};
use crate::api::state::AppState;
use crate::api::utils::DetectDisconnect;
use crate::chat::{build_transcript, relay};

type SharedState = Arc<AppState>;

/// Relay a conversation to the upstream provider and stream the
/// reply back as `data: ` records terminated by `data: [DONE]`
async fn chat_handler(
    State(state): State<SharedState>,
    payload: Result<Json<public::ChatRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(payload) = payload.map_err(|e| anyhow!("Invalid chat request: {}", e))?;

    let persona = Persona::from_selector(payload.selector());
    tracing::info!("[{}] Chat started", persona);

    let transcript = build_transcript(&state.prompts, persona, payload.messages);

    // Upstream setup failures return the JSON error response since
    // nothing has been streamed yet
    let cancel = CancellationToken::new();
    let upstream = state
        .provider
        .completion_stream(&transcript, cancel.clone())
        .await?;

    let (tx, rx) = mpsc::unbounded_channel::<String>();
    let body_stream = UnboundedReceiverStream::new(rx).map(Ok::<String, Infallible>);
    let wrapped_body_stream = DetectDisconnect::new(body_stream, cancel.clone());

    tokio::spawn(async move {
        match relay(upstream, tx, cancel, CHAT_ERROR_MESSAGE).await {
            Ok(forwarded) => {
                tracing::debug!("[{}] Chat finished after {} chunks", persona, forwarded)
            }
            Err(e) => tracing::warn!("[{}] Chat ended with an error: {}", persona, e),
        }
    });

    let resp = http::Response::builder()
        .header(
            header::CONTENT_TYPE,
            HeaderValue::from_static("text/plain; charset=utf-8"),
        )
        .header(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"))
        .header(header::CONNECTION, HeaderValue::from_static("keep-alive"))
        .body(Body::from_stream(wrapped_body_stream))?;

    Ok(resp)
}

/// Create the chat router
pub fn router() -> Router<SharedState> {
    Router::new().route("/", post(chat_handler))
}
