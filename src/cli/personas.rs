use crate::ai::Persona;

pub fn run() {
    for persona in Persona::ALL {
        let profile = persona.profile();
        println!("{:<8} {} ({})", profile.id, profile.name, profile.subtitle);
    }
}
