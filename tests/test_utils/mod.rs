//! Test utilities for integration tests
#![allow(dead_code)]

use std::path::Path;
use std::sync::{Arc, Mutex};

use anyhow::{Error, Result, anyhow};
use async_trait::async_trait;
use axum::{Router, body::Body};
use futures::StreamExt;
use serde_json::{Value, json};
use tokio_util::sync::CancellationToken;

use dazzling::ai::PromptBook;
use dazzling::api::{AppState, app};
use dazzling::core::AppConfig;
use dazzling::openai::{ChunkStream, CompletionProvider, Message};

pub const STUDIO_NAME: &str = "DAZZLING STUDIO";

/// What the fake upstream does once a stream is requested.
#[derive(Clone, Debug)]
pub enum Script {
    /// Emit each fragment then end normally
    Reply(Vec<&'static str>),
    /// Emit each fragment then fail mid-stream
    FailAfter(Vec<&'static str>),
    /// Reject the request before streaming starts
    FailSetup,
    /// Emit each fragment then never finish
    Hang(Vec<&'static str>),
}

/// In-process stand-in for the hosted completion provider. Records
/// every transcript it receives and the cancellation token for it.
pub struct FakeProvider {
    script: Script,
    pub requests: Mutex<Vec<Vec<Message>>>,
    pub tokens: Mutex<Vec<CancellationToken>>,
}

impl FakeProvider {
    pub fn new(script: Script) -> Arc<Self> {
        Arc::new(Self {
            script,
            requests: Mutex::new(Vec::new()),
            tokens: Mutex::new(Vec::new()),
        })
    }

    pub fn requests(&self) -> Vec<Vec<Message>> {
        self.requests.lock().unwrap().clone()
    }

    pub fn last_token(&self) -> CancellationToken {
        self.tokens.lock().unwrap().last().cloned().unwrap()
    }
}

/// A streamed chunk in the upstream's envelope format
pub fn chunk(content: &str) -> Value {
    json!({
        "id": "chatcmpl-test",
        "object": "chat.completion.chunk",
        "created": 1694268190,
        "model": "gpt-4o",
        "choices": [{"index": 0, "delta": {"content": content}, "finish_reason": null}]
    })
}

fn chunks(fragments: &[&str]) -> Vec<Result<Value, Error>> {
    fragments.iter().map(|f| Ok(chunk(f))).collect()
}

#[async_trait]
impl CompletionProvider for FakeProvider {
    async fn completion(&self, messages: &[Message]) -> Result<Value, Error> {
        self.requests.lock().unwrap().push(messages.to_vec());
        Ok(json!({"choices": [{"message": {"role": "assistant", "content": "Hello!"}}]}))
    }

    async fn completion_stream(
        &self,
        messages: &[Message],
        cancel: CancellationToken,
    ) -> Result<ChunkStream, Error> {
        self.requests.lock().unwrap().push(messages.to_vec());
        self.tokens.lock().unwrap().push(cancel);

        let stream: ChunkStream = match &self.script {
            Script::Reply(fragments) => Box::pin(futures::stream::iter(chunks(fragments))),
            Script::FailAfter(fragments) => {
                let mut items = chunks(fragments);
                items.push(Err(anyhow!("connection reset by upstream")));
                Box::pin(futures::stream::iter(items))
            }
            Script::FailSetup => return Err(anyhow!("401 Unauthorized")),
            Script::Hang(fragments) => Box::pin(
                futures::stream::iter(chunks(fragments)).chain(futures::stream::pending()),
            ),
        };
        Ok(stream)
    }
}

pub fn test_config(static_path: &str) -> AppConfig {
    AppConfig {
        static_path: static_path.to_string(),
        studio_name: STUDIO_NAME.to_string(),
        openai_model: String::from("gpt-4o"),
        openai_api_hostname: String::from("https://api.openai.com"),
        openai_api_key: String::from("test-api-key"),
    }
}

pub fn test_prompts() -> PromptBook {
    PromptBook::new(STUDIO_NAME).unwrap()
}

/// Creates a test application router backed by `provider`
pub fn test_app(provider: Arc<dyn CompletionProvider>) -> Router {
    test_app_with_static(provider, Path::new("./web"))
}

pub fn test_app_with_static(provider: Arc<dyn CompletionProvider>, static_path: &Path) -> Router {
    let config = test_config(&static_path.display().to_string());
    let app_state = AppState::new(config, test_prompts(), provider);
    app(Arc::new(app_state))
}

pub async fn body_to_string(body: Body) -> String {
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// Split a relay body into its records
pub fn records(body: &str) -> Vec<String> {
    body.split_terminator("\n\n")
        .map(|r| format!("{}\n\n", r))
        .collect()
}

pub fn chat_body(messages: Value, consultant_type: Option<&str>) -> Body {
    let mut payload = json!({ "messages": messages });
    if let Some(t) = consultant_type {
        payload["consultantType"] = json!(t);
    }
    Body::from(payload.to_string())
}
