//! Interactive chat against a local model behind the chat intermediary.
//!
//! # Usage
//!
//! ```bash
//! # Basic usage with default settings
//! chatstream
//!
//! # Point at another intermediary and model
//! chatstream --api-url http://10.0.0.2:3000/api/ai/chat --model llama3
//!
//! # Disable colors (useful for piping output)
//! chatstream --no-color
//! ```
//!
//! Set `RUST_LOG=chatstream=debug` to see request and stream diagnostics on
//! stderr.

use std::sync::{Arc, Mutex};

use arrrg::CommandLine;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use chatstream::chat::{
    ChatArgs, ChatCommand, ChatConfig, ConversationController, PlainTextRenderer, SendOutcome,
    help_text, parse_command,
};
use chatstream::{ExchangeStore, FileStore, MemoryStore, SessionStatus};

/// Main entry point for the chatstream application.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let (args, _) = ChatArgs::from_command_line_relaxed("chatstream [OPTIONS]");
    let config = ChatConfig::from(args);

    match config.store_path.clone().or_else(FileStore::default_path) {
        Some(path) => run(config, FileStore::new(path)).await,
        None => {
            tracing::warn!("no data directory; the last exchange will not be kept");
            run(config, MemoryStore::new()).await
        }
    }
}

async fn run<S: ExchangeStore>(
    config: ChatConfig,
    store: S,
) -> Result<(), Box<dyn std::error::Error>> {
    let use_color = config.use_color;
    let mut controller = ConversationController::new(config, store)?;
    let mut renderer = PlainTextRenderer::with_color(use_color);
    let mut rl = DefaultEditor::new()?;

    // Token for the turn in flight; Ctrl+C cancels it.
    let current = Arc::new(Mutex::new(CancellationToken::new()));
    let current_clone = Arc::clone(&current);
    ctrlc::set_handler(move || {
        if let Ok(token) = current_clone.lock() {
            token.cancel();
        }
    })?;

    println!(
        "chatstream ({} @ {})",
        controller.config().effective_model(),
        controller.config().api_url
    );
    println!("Type /help for commands, /quit to exit\n");
    for entry in controller.transcript() {
        renderer.print_entry(entry);
    }
    controller.subscribe(Box::new(PlainTextRenderer::with_color(use_color)));

    loop {
        let prompt = match controller.status() {
            SessionStatus::Error => "You (last turn failed): ",
            _ => "You: ",
        };

        match rl.readline(prompt) {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }

                let _ = rl.add_history_entry(line);

                if let Some(cmd) = parse_command(line) {
                    match cmd {
                        ChatCommand::Quit => {
                            println!("Goodbye!");
                            break;
                        }
                        ChatCommand::Help => {
                            for line in help_text().lines() {
                                println!("    {line}");
                            }
                        }
                        ChatCommand::Url(url) => {
                            renderer.print_info(&format!("Endpoint changed to: {url}"));
                            controller.set_api_url(url);
                        }
                        ChatCommand::Model(model) => {
                            renderer.print_info(&format!("Model changed to: {model}"));
                            controller.set_model(model);
                        }
                        ChatCommand::Status => {
                            println!("    Status: {}", controller.status());
                            println!("    Mode: {}", controller.ui_mode());
                            println!("    Context messages: {}", controller.context().len());
                        }
                        ChatCommand::ShowConfig => print_config(controller.config()),
                        ChatCommand::Transcript => {
                            for entry in controller.transcript() {
                                renderer.print_entry(entry);
                            }
                        }
                        ChatCommand::Invalid(message) => {
                            renderer.print_error(&message);
                        }
                    }
                    continue;
                }

                let cancel = CancellationToken::new();
                if let Ok(mut token) = current.lock() {
                    *token = cancel.clone();
                }
                if let SendOutcome::Failed { reason } =
                    controller.send_with_cancel(line, &cancel).await
                {
                    tracing::debug!(%reason, "turn failed");
                }
            }
            Err(ReadlineError::Interrupted) => {
                // Ctrl+C at prompt - soft interrupt
                println!();
                continue;
            }
            Err(ReadlineError::Eof) => {
                println!("\nGoodbye!");
                break;
            }
            Err(err) => {
                renderer.print_error(&format!("Input error: {err}"));
                break;
            }
        }
    }

    Ok(())
}

fn print_config(config: &ChatConfig) {
    println!("    Current Configuration:");
    println!("      Endpoint: {}", config.api_url);
    println!("      Model: {}", config.effective_model());
    println!("      Classification timeout: {:?}", config.classify_timeout);
    println!("      Connect timeout: {:?}", config.connect_timeout);
    match config.store_path {
        Some(ref path) => println!("      Store: {}", path.display()),
        None => println!("      Store: (default)"),
    }
}
