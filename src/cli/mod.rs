use anyhow::Result;
use clap::{Parser, Subcommand};

pub mod ask;
pub mod chat;
pub mod personas;
pub mod serve;

use crate::ai::Persona;

#[derive(Subcommand)]
enum Command {
    /// Run the site and chat relay server
    Serve {
        /// Set the server host address
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Set the server port
        #[arg(long, default_value = "3000")]
        port: String,
    },
    /// Chat with a consultant through a running relay
    Chat {
        /// Base URL of the running server
        #[arg(long, default_value = "http://127.0.0.1:3000")]
        url: String,

        #[arg(long, value_enum, default_value = "general")]
        consultant: Persona,
    },
    /// Ask a consultant one question directly, without the relay
    Ask {
        #[arg(long, value_enum, default_value = "general")]
        consultant: Persona,

        /// The question to ask
        question: String,
    },
    /// List the available consultants
    Personas {},
}

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

pub async fn run() -> Result<()> {
    let args = Cli::parse();

    // Handle each sub command
    match args.command {
        Some(Command::Serve { host, port }) => {
            serve::run(host, port).await?;
        }
        Some(Command::Chat { url, consultant }) => {
            chat::run(&url, consultant).await?;
        }
        Some(Command::Ask {
            consultant,
            question,
        }) => {
            ask::run(consultant, &question).await?;
        }
        Some(Command::Personas {}) => {
            personas::run();
        }
        None => {}
    }

    Ok(())
}
