pub mod persona;
pub use persona::{Persona, PersonaProfile};

pub mod prompt;
pub use prompt::PromptBook;
