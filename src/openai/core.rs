use std::time::Duration;

use anyhow::{Error, Result, anyhow, bail};
use async_trait::async_trait;
use futures::stream::BoxStream;
use futures_util::StreamExt;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tokio_util::sync::CancellationToken;

use crate::sse::{Frame, RecordBuffer};

#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub enum Role {
    #[serde(rename = "system")]
    System,
    #[serde(rename = "assistant")]
    Assistant,
    #[serde(rename = "user")]
    User,
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn new(role: Role, content: &str) -> Self {
        Message {
            role,
            content: content.to_string(),
        }
    }
}

/// Sampling parameters sent with every completion request.
#[derive(Clone, Debug, PartialEq)]
pub struct CompletionOptions {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub presence_penalty: f32,
    pub frequency_penalty: f32,
}

impl CompletionOptions {
    pub fn new(model: &str) -> Self {
        Self {
            model: model.to_string(),
            temperature: 0.7,
            max_tokens: 1000,
            presence_penalty: 0.1,
            frequency_penalty: 0.1,
        }
    }

    fn payload(&self, messages: &[Message], stream: bool) -> Value {
        json!({
            "model": self.model,
            "messages": messages,
            "temperature": self.temperature,
            "max_tokens": self.max_tokens,
            "presence_penalty": self.presence_penalty,
            "frequency_penalty": self.frequency_penalty,
            "stream": stream,
        })
    }
}

impl Default for CompletionOptions {
    fn default() -> Self {
        Self::new("gpt-4o")
    }
}

/// Upstream chunks in the order they were received. Each item is the
/// provider's envelope untouched.
pub type ChunkStream = BoxStream<'static, Result<Value, Error>>;

/// A hosted chat completion provider. Implemented by `OpenAiClient`
/// and by fakes in tests.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Single non-streamed completion.
    async fn completion(&self, messages: &[Message]) -> Result<Value, Error>;

    /// Opens a streamed completion. Resolves once the upstream has
    /// accepted the request so setup failures surface here rather
    /// than on the stream. The stream ends early when `cancel` fires.
    async fn completion_stream(
        &self,
        messages: &[Message],
        cancel: CancellationToken,
    ) -> Result<ChunkStream, Error>;
}

/// Read the incremental text out of a streamed chunk.
pub fn delta_content(chunk: &Value) -> Option<&str> {
    chunk["choices"][0]["delta"]["content"].as_str()
}

/// Client for an OpenAI compatible `/v1/chat/completions` endpoint.
#[derive(Clone, Debug)]
pub struct OpenAiClient {
    http: reqwest::Client,
    api_hostname: String,
    api_key: String,
    options: CompletionOptions,
}

impl OpenAiClient {
    pub fn new(api_hostname: &str, api_key: &str, options: CompletionOptions) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_hostname: api_hostname.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            options,
        }
    }

    fn url(&self) -> String {
        format!("{}/v1/chat/completions", self.api_hostname)
    }

    async fn send(&self, payload: &Value, timeout: Duration) -> Result<reqwest::Response, Error> {
        let response = self
            .http
            .post(self.url())
            .bearer_auth(&self.api_key)
            .header("Content-Type", "application/json")
            .timeout(timeout)
            .json(payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!("Completion request failed with status {}: {}", status, body);
        }

        Ok(response)
    }
}

#[async_trait]
impl CompletionProvider for OpenAiClient {
    async fn completion(&self, messages: &[Message]) -> Result<Value, Error> {
        let payload = self.options.payload(messages, false);
        let response = self
            .send(&payload, Duration::from_secs(60 * 2))
            .await?
            .json()
            .await?;
        Ok(response)
    }

    async fn completion_stream(
        &self,
        messages: &[Message],
        cancel: CancellationToken,
    ) -> Result<ChunkStream, Error> {
        let payload = self.options.payload(messages, true);
        let response = tokio::select! {
            _ = cancel.cancelled() => bail!("Completion request cancelled"),
            resp = self.send(&payload, Duration::from_secs(60 * 5)) => resp?,
        };

        let mut bytes = response.bytes_stream();

        let stream: ChunkStream = Box::pin(async_stream::try_stream! {
            let mut buffer = RecordBuffer::new();

            'outer: loop {
                let chunk = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => {
                        tracing::debug!("Upstream read cancelled");
                        break 'outer;
                    }
                    next = bytes.next() => next,
                };

                // Append new data to the buffer. Records can be
                // fragmented across HTTP frames.
                let Some(chunk) = chunk else {
                    if let Some(tail) = buffer.finish()? {
                        if let Some(value) = decode_record(&tail)? {
                            yield value;
                        }
                    }
                    break 'outer;
                };
                buffer.push(&chunk?);

                for record in buffer.drain_records()? {
                    match Frame::parse(&record) {
                        Some(Frame::Done) => break 'outer,
                        Some(frame) => {
                            if let Some(value) = frame.json().inspect_err(|e| {
                                tracing::error!("Parsing completion chunk failed: {}", e)
                            })? {
                                yield value;
                            }
                        }
                        None => continue,
                    }
                }
            }
        });

        Ok(stream)
    }
}

// Decode a trailing record left without a separator
fn decode_record(record: &str) -> Result<Option<Value>, Error> {
    match Frame::parse(record) {
        Some(frame) => frame.json(),
        None => Ok(None),
    }
}

/// Pull the assistant text out of a non-streamed completion.
pub fn completion_content(response: &Value) -> Result<String, Error> {
    response["choices"][0]["message"]["content"]
        .as_str()
        .map(String::from)
        .ok_or(anyhow!("No message received. Resp:\n\n {}", response))
}
