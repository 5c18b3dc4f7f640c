//! Incremental decoder for the relay's response body.

use anyhow::Result;

use crate::openai::delta_content;
use crate::sse::{Frame, RecordBuffer};

#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    Delta(String),
    Error(String),
    Done,
}

/// Feeds raw body bytes in and gets events out. Nothing is decoded
/// until its whole record has arrived, so a fragment split across
/// reads is never lost.
#[derive(Debug, Default)]
pub struct StreamDecoder {
    buffer: RecordBuffer,
}

impl StreamDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode every record completed by `bytes`. A complete record
    /// that can't be decoded becomes an `Error` event in its place so
    /// the events before it are kept.
    pub fn push(&mut self, bytes: &[u8]) -> Vec<StreamEvent> {
        self.buffer.push(bytes);
        let mut events = Vec::new();
        loop {
            match self.buffer.next_record() {
                Ok(Some(record)) => events.extend(decode_or_error(&record)),
                Ok(None) => break,
                Err(e) => events.push(StreamEvent::Error(e.to_string())),
            }
        }
        events
    }

    /// Decode a trailing record once the body has ended.
    pub fn finish(&mut self) -> Option<StreamEvent> {
        match self.buffer.finish() {
            Ok(Some(record)) => decode_or_error(&record),
            Ok(None) => None,
            Err(e) => Some(StreamEvent::Error(e.to_string())),
        }
    }
}

fn decode_or_error(record: &str) -> Option<StreamEvent> {
    decode(record).unwrap_or_else(|e| {
        tracing::warn!("Undecodable record in chat stream: {}", e);
        Some(StreamEvent::Error(e.to_string()))
    })
}

fn decode(record: &str) -> Result<Option<StreamEvent>> {
    let Some(frame) = Frame::parse(record) else {
        return Ok(None);
    };
    let Some(value) = frame.json()? else {
        return Ok(Some(StreamEvent::Done));
    };

    if let Some(error) = value.get("error") {
        let message = error["message"]
            .as_str()
            .map(String::from)
            .unwrap_or_else(|| error.to_string());
        return Ok(Some(StreamEvent::Error(message)));
    }

    Ok(delta_content(&value)
        .filter(|c| !c.is_empty())
        .map(|c| StreamEvent::Delta(c.to_string())))
}

// Used by tests across the crate to build relay output
#[cfg(test)]
pub(crate) fn delta_record(content: &str) -> String {
    crate::sse::encode_data(&serde_json::json!({
        "choices": [{"index": 0, "delta": {"content": content}}]
    }))
}
