use std::sync::Arc;

use crate::ai::PromptBook;
use crate::core::AppConfig;
use crate::openai::CompletionProvider;

/// Read-only state shared by every request. Nothing in here is
/// mutated after startup so requests never contend on it.
pub struct AppState {
    pub config: AppConfig,
    pub prompts: PromptBook,
    pub provider: Arc<dyn CompletionProvider>,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        prompts: PromptBook,
        provider: Arc<dyn CompletionProvider>,
    ) -> Self {
        Self {
            config,
            prompts,
            provider,
        }
    }
}
