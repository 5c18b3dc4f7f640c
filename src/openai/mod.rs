//! OpenAI compatible chat completion provider

mod core;
pub use core::{
    ChunkStream, CompletionOptions, CompletionProvider, Message, OpenAiClient, Role,
    completion_content, delta_content,
};
