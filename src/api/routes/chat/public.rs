//! Public types for the chat API
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::openai::Message;

#[derive(Deserialize, Serialize, Debug)]
pub struct ChatRequest {
    pub messages: Vec<Message>,
    // Left loose so that a non-string selector falls back to the
    // general persona instead of rejecting the request
    #[serde(rename = "consultantType", default)]
    pub consultant_type: Option<Value>,
}

impl ChatRequest {
    pub fn selector(&self) -> Option<&str> {
        self.consultant_type.as_ref().and_then(Value::as_str)
    }
}
