//! Public types for the personas API
use serde::{Deserialize, Serialize};

use crate::ai::Persona;

#[derive(Serialize, Deserialize, Debug, PartialEq)]
pub struct PersonaSummary {
    pub id: Persona,
    pub name: String,
    pub subtitle: String,
    pub greeting: String,
}

impl From<Persona> for PersonaSummary {
    fn from(persona: Persona) -> Self {
        let profile = persona.profile();
        Self {
            id: persona,
            name: profile.name.to_string(),
            subtitle: profile.subtitle.to_string(),
            greeting: profile.greeting.to_string(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug)]
pub struct PersonasResponse {
    pub personas: Vec<PersonaSummary>,
}
