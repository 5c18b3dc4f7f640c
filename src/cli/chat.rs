use std::io::{self, Write};

use anyhow::Result;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

use crate::ai::Persona;
use crate::client::{ChatClient, ChatUpdate, ClientError, TurnOutcome};

pub async fn run(url: &str, persona: Persona) -> Result<()> {
    let mut rl = DefaultEditor::new()?;
    let client = ChatClient::new(url, persona);
    let profile = persona.profile();

    println!("{} ({})", profile.name, profile.subtitle);
    println!("{}\n", profile.greeting);

    loop {
        let readline = rl.readline(">>> ");
        match readline {
            Ok(line) => {
                let outcome = client
                    .submit(&line, |update| {
                        if let ChatUpdate::Delta(text) = update {
                            print!("{}", text);
                            let _ = io::stdout().flush();
                        }
                    })
                    .await;

                match outcome {
                    Ok(TurnOutcome::Completed(_)) => println!("\n"),
                    Ok(TurnOutcome::Failed(_)) => {
                        // The apology is the last message in the conversation
                        if let Some(msg) = client.conversation().last() {
                            println!("\n{}\n", msg.content);
                        }
                    }
                    Err(ClientError::EmptyInput) => continue,
                    Err(e) => println!("Error: {}", e),
                }
                let _ = rl.add_history_entry(line.as_str());
            }
            Err(ReadlineError::Interrupted) => break,
            Err(ReadlineError::Eof) => break,
            Err(err) => {
                println!("Error: {:?}", err);
                break;
            }
        }
    }

    Ok(())
}
