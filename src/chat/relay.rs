//! Re-frames an upstream completion stream for the browser.

use anyhow::{Error, Result};
use futures_util::StreamExt;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::ai::{Persona, PromptBook};
use crate::openai::{ChunkStream, Message, Role, delta_content};
use crate::sse::{DONE_RECORD, encode_data, encode_error};

/// Prepend the persona's system prompt to the visitor's messages.
/// The same inputs always produce the same transcript.
pub fn build_transcript(
    prompts: &PromptBook,
    persona: Persona,
    messages: Vec<Message>,
) -> Vec<Message> {
    let mut transcript = Vec::with_capacity(messages.len() + 1);
    transcript.push(Message::new(Role::System, prompts.system_prompt(persona)));
    transcript.extend(messages);
    transcript
}

/// Forward upstream chunks to `tx` as `data: ` records until the
/// upstream ends, fails, or `cancel` fires. The `[DONE]` record is
/// always sent last. A failure is reported to the caller as an error
/// record carrying `error_message` before `[DONE]`.
///
/// Returns the number of chunks forwarded.
pub async fn relay(
    upstream: ChunkStream,
    tx: mpsc::UnboundedSender<String>,
    cancel: CancellationToken,
    error_message: &str,
) -> Result<usize, Error> {
    let result = forward_chunks(upstream, &tx, &cancel).await;

    if let Err(e) = &result {
        tracing::error!("Streaming error: {:#}", e);
        let _ = tx.send(encode_error(error_message));
    }

    // The receiver may already be gone if the client disconnected
    let _ = tx.send(DONE_RECORD.to_string());

    result
}

async fn forward_chunks(
    mut upstream: ChunkStream,
    tx: &mpsc::UnboundedSender<String>,
    cancel: &CancellationToken,
) -> Result<usize, Error> {
    let mut forwarded = 0;

    loop {
        let next = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::debug!("Relay cancelled after {} chunks", forwarded);
                break;
            }
            next = upstream.next() => next,
        };

        let Some(chunk) = next else {
            break;
        };
        let chunk = chunk?;

        // Role-only and finish chunks carry no text for the client
        if !delta_content(&chunk).is_some_and(|c| !c.is_empty()) {
            continue;
        }

        if tx.send(encode_data(&chunk)).is_err() {
            tracing::debug!("Relay receiver dropped after {} chunks", forwarded);
            cancel.cancel();
            break;
        }
        forwarded += 1;
    }

    Ok(forwarded)
}
