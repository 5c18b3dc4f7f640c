use anyhow::{Result, bail};

use crate::ai::{Persona, PromptBook};
use crate::chat::build_transcript;
use crate::core::AppConfig;
use crate::openai::{
    CompletionOptions, CompletionProvider, Message, OpenAiClient, Role, completion_content,
};

/// Ask a consultant a single question without going through the
/// relay. The reply is returned whole rather than streamed.
pub async fn answer(
    provider: &dyn CompletionProvider,
    prompts: &PromptBook,
    persona: Persona,
    question: &str,
) -> Result<String> {
    let question = question.trim();
    if question.is_empty() {
        bail!("Question is empty");
    }

    let transcript = build_transcript(prompts, persona, vec![Message::new(Role::User, question)]);
    let response = provider.completion(&transcript).await?;
    completion_content(&response)
}

pub async fn run(persona: Persona, question: &str) -> Result<()> {
    let config = AppConfig::default();
    let prompts = PromptBook::new(&config.studio_name)?;
    let provider = OpenAiClient::new(
        &config.openai_api_hostname,
        &config.openai_api_key,
        CompletionOptions::new(&config.openai_model),
    );

    let reply = answer(&provider, &prompts, persona, question).await?;
    println!("{}", reply);

    Ok(())
}
