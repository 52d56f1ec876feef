//! chatctl CLI
//!
//! Command-line front end over the chatctl library: ask the desktop chat
//! applications, read back responses, and poke at their accessibility trees.
//!
//! Usage:
//!   chatctl ask claude "What is 2 + 2?"
//!   chatctl ask claude "And times 3?" --conversation "Arithmetic"
//!   chatctl status chatgpt
//!   chatctl tree exists claude 'button 1 of group 4 of window 1'

use crate::cli::{Cli, Commands};
use crate::command::{
    build_automator, handle_ask, handle_clipboard, handle_conversations, handle_response,
    handle_status, handle_tree,
};
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod command;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let automator = build_automator(&cli);

    let result = match cli.command {
        Commands::Ask(args) => handle_ask(&automator, args).await,
        Commands::Response(args) => handle_response(&automator, args).await,
        Commands::Conversations(args) => handle_conversations(&automator, args).await,
        Commands::Status(args) => handle_status(&automator, args).await,
        Commands::Tree(command) => handle_tree(&automator, command).await,
        Commands::Clipboard(command) => handle_clipboard(&automator, command).await,
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
