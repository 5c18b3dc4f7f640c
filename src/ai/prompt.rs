//! System prompts for each persona, rendered once with Handlebars.
//! Strict mode means a template referencing a variable that isn't
//! provided fails at startup instead of sending a half-rendered
//! prompt upstream.

use std::collections::HashMap;

use anyhow::{Context, Result};
use handlebars::Handlebars;
use serde_json::json;

use super::persona::Persona;

fn templates<'a>() -> Result<Handlebars<'a>> {
    let mut registry = Handlebars::new();
    registry.set_strict_mode(true);
    // Prompts are plain text, not HTML
    registry.register_escape_fn(handlebars::no_escape);
    for persona in Persona::ALL {
        registry
            .register_template_string(persona.id(), persona.profile().prompt_template)
            .with_context(|| format!("Failed to register template {}", persona))?;
    }
    Ok(registry)
}

/// Rendered system prompt for every persona. Built at startup and
/// shared read-only for the life of the process.
#[derive(Debug, Clone)]
pub struct PromptBook {
    prompts: HashMap<Persona, String>,
}

impl PromptBook {
    pub fn new(studio_name: &str) -> Result<Self> {
        let registry = templates()?;
        let mut prompts = HashMap::new();

        for persona in Persona::ALL {
            let data = json!({
                "name": persona.profile().name,
                "studio": studio_name,
            });
            let rendered = registry
                .render(persona.id(), &data)
                .with_context(|| format!("Failed to render prompt for {}", persona))?;
            prompts.insert(persona, rendered.trim().to_string());
        }

        Ok(Self { prompts })
    }

    pub fn system_prompt(&self, persona: Persona) -> &str {
        // Every persona is rendered in `new`
        self.prompts
            .get(&persona)
            .map(String::as_str)
            .unwrap_or_default()
    }
}
