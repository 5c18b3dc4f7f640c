//! A chat widget's connection to the relay.
//!
//! One `ChatClient` backs one widget. Handles are cheap to clone and
//! share the same conversation, and at most one turn is in flight at
//! a time: a submit while a reply is still being sent or streamed is
//! rejected with `ClientError::Busy`.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use anyhow::{Error, Result, anyhow, bail};
use futures_util::StreamExt;
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use super::conversation::{APOLOGY_MESSAGE, ChatState, ClientMessage, Conversation};
use super::decoder::{StreamDecoder, StreamEvent};
use crate::ai::Persona;
use crate::openai::{Message, Role};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ClientError {
    #[error("a reply is still in progress")]
    Busy,
    #[error("message is empty")]
    EmptyInput,
}

/// How a submitted turn ended.
#[derive(Debug, Clone, PartialEq)]
pub enum TurnOutcome {
    /// The reply finished streaming into the message with this id.
    Completed(Uuid),
    /// The turn failed and the apology was appended.
    Failed(String),
}

/// Reported to the caller as the turn progresses so the UI can
/// re-render.
#[derive(Debug, Clone, PartialEq)]
pub enum ChatUpdate<'a> {
    State(ChatState),
    Delta(&'a str),
}

#[derive(Serialize)]
struct ChatPayload {
    messages: Vec<Message>,
    #[serde(rename = "consultantType")]
    consultant_type: Persona,
}

#[derive(Debug)]
struct Inner {
    state: ChatState,
    conversation: Conversation,
}

fn lock(inner: &Mutex<Inner>) -> MutexGuard<'_, Inner> {
    inner.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Puts the widget back to `Idle` if a turn is abandoned midway, e.g.
/// the submit future was dropped.
struct TurnGuard {
    inner: Arc<Mutex<Inner>>,
    armed: bool,
}

impl TurnGuard {
    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for TurnGuard {
    fn drop(&mut self) {
        if self.armed {
            tracing::debug!("Turn abandoned, resetting to idle");
            lock(&self.inner).state = ChatState::Idle;
        }
    }
}

#[derive(Clone, Debug)]
pub struct ChatClient {
    http: reqwest::Client,
    endpoint: String,
    persona: Persona,
    inner: Arc<Mutex<Inner>>,
}

impl ChatClient {
    /// `base_url` is the site root, e.g. `http://127.0.0.1:3000`.
    pub fn new(base_url: &str, persona: Persona) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: format!("{}/api/chat", base_url.trim_end_matches('/')),
            persona,
            inner: Arc::new(Mutex::new(Inner {
                state: ChatState::Idle,
                conversation: Conversation::with_greeting(persona),
            })),
        }
    }

    pub fn persona(&self) -> Persona {
        self.persona
    }

    pub fn state(&self) -> ChatState {
        lock(&self.inner).state
    }

    /// Snapshot of the conversation so far.
    pub fn conversation(&self) -> Conversation {
        lock(&self.inner).conversation.clone()
    }

    /// Send `input` as the next user message and stream the reply
    /// into the conversation. Network and relay failures don't
    /// surface as errors: they end the turn with the apology message
    /// appended and `TurnOutcome::Failed`.
    pub async fn submit<F>(&self, input: &str, mut on_update: F) -> Result<TurnOutcome, ClientError>
    where
        F: FnMut(ChatUpdate<'_>),
    {
        let payload = self.begin_turn(input)?;
        let mut guard = TurnGuard {
            inner: Arc::clone(&self.inner),
            armed: true,
        };
        on_update(ChatUpdate::State(ChatState::Sending));

        let result = self.stream_reply(&payload, &mut on_update).await;
        guard.disarm();

        match result {
            Ok(id) => {
                lock(&self.inner).state = ChatState::Idle;
                on_update(ChatUpdate::State(ChatState::Idle));
                Ok(TurnOutcome::Completed(id))
            }
            Err(e) => {
                self.fail(&e, &mut on_update);
                Ok(TurnOutcome::Failed(e.to_string()))
            }
        }
    }

    fn begin_turn(&self, input: &str) -> Result<ChatPayload, ClientError> {
        let content = input.trim();
        if content.is_empty() {
            return Err(ClientError::EmptyInput);
        }

        let mut inner = lock(&self.inner);
        if inner.state != ChatState::Idle {
            return Err(ClientError::Busy);
        }
        inner
            .conversation
            .push(ClientMessage::new(Role::User, content));
        inner.state = ChatState::Sending;

        Ok(ChatPayload {
            messages: inner.conversation.to_wire(),
            consultant_type: self.persona,
        })
    }

    async fn stream_reply<F>(&self, payload: &ChatPayload, on_update: &mut F) -> Result<Uuid, Error>
    where
        F: FnMut(ChatUpdate<'_>),
    {
        let response = self.http.post(&self.endpoint).json(payload).send().await?;

        let status = response.status();
        if !status.is_success() {
            bail!("Relay responded with status {}", status);
        }

        let placeholder = ClientMessage::new(Role::Assistant, "");
        let id = placeholder.id;
        {
            let mut inner = lock(&self.inner);
            inner.conversation.push(placeholder);
            inner.state = ChatState::Streaming;
        }
        on_update(ChatUpdate::State(ChatState::Streaming));

        let mut decoder = StreamDecoder::new();
        let mut body = response.bytes_stream();

        while let Some(chunk) = body.next().await {
            for event in decoder.push(&chunk?) {
                if self.apply(id, event, on_update)? {
                    return Ok(id);
                }
            }
        }

        // The body ended without the sentinel
        if let Some(event) = decoder.finish() {
            self.apply(id, event, on_update)?;
        }

        Ok(id)
    }

    // Returns true once the sentinel arrives
    fn apply<F>(&self, id: Uuid, event: StreamEvent, on_update: &mut F) -> Result<bool, Error>
    where
        F: FnMut(ChatUpdate<'_>),
    {
        match event {
            StreamEvent::Delta(text) => {
                lock(&self.inner).conversation.append_to(id, &text);
                on_update(ChatUpdate::Delta(&text));
                Ok(false)
            }
            StreamEvent::Done => Ok(true),
            StreamEvent::Error(message) => Err(anyhow!("Relay reported an error: {}", message)),
        }
    }

    // Partial content already streamed stays in the conversation
    fn fail<F>(&self, err: &Error, on_update: &mut F)
    where
        F: FnMut(ChatUpdate<'_>),
    {
        tracing::error!("Chat error: {:#}", err);

        lock(&self.inner).state = ChatState::Error;
        on_update(ChatUpdate::State(ChatState::Error));

        {
            let mut inner = lock(&self.inner);
            inner
                .conversation
                .push(ClientMessage::new(Role::Assistant, APOLOGY_MESSAGE));
            inner.state = ChatState::Idle;
        }
        on_update(ChatUpdate::State(ChatState::Idle));
    }
}
