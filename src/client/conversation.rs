//! Conversation state owned by a single chat widget.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::ai::Persona;
use crate::openai::{Message, Role};

/// Appended to the conversation when a turn fails for any reason.
pub const APOLOGY_MESSAGE: &str =
    "죄송합니다. 일시적인 오류가 발생했습니다. 잠시 후 다시 시도해주세요.";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatState {
    /// Waiting for input
    Idle,
    /// Request sent, no reply yet
    Sending,
    /// Reply placeholder exists and is being filled in
    Streaming,
    /// The turn failed. Only held while the apology is appended.
    Error,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ClientMessage {
    pub id: Uuid,
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl ClientMessage {
    pub fn new(role: Role, content: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            role,
            content: content.to_string(),
            timestamp: Utc::now(),
        }
    }

    /// Strip the local id and timestamp for sending to the relay.
    pub fn to_wire(&self) -> Message {
        Message::new(self.role, &self.content)
    }
}

#[derive(Clone, Debug, Default)]
pub struct Conversation(Vec<ClientMessage>);

impl Conversation {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Start a conversation with the persona's opening line.
    pub fn with_greeting(persona: Persona) -> Self {
        Self(vec![ClientMessage::new(
            Role::Assistant,
            persona.profile().greeting,
        )])
    }

    pub fn push(&mut self, msg: ClientMessage) {
        self.0.push(msg)
    }

    /// Append a fragment to the message with `id`. Returns `false` if
    /// no such message exists.
    pub fn append_to(&mut self, id: Uuid, fragment: &str) -> bool {
        match self.0.iter_mut().find(|m| m.id == id) {
            Some(msg) => {
                msg.content.push_str(fragment);
                true
            }
            None => false,
        }
    }

    pub fn get(&self, id: Uuid) -> Option<&ClientMessage> {
        self.0.iter().find(|m| m.id == id)
    }

    pub fn messages(&self) -> &[ClientMessage] {
        &self.0
    }

    pub fn last(&self) -> Option<&ClientMessage> {
        self.0.last()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn to_wire(&self) -> Vec<Message> {
        self.0.iter().map(ClientMessage::to_wire).collect()
    }
}
