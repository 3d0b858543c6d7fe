//! Slash command parsing for the chat application.
//!
//! This module handles parsing of special commands that start with `/`,
//! allowing users to control the chat session without sending messages
//! to the API.

/// A parsed chat command.
///
/// These commands control the chat session and are not sent to the API.
#[derive(Debug, Clone, PartialEq)]
pub enum ChatCommand {
    /// Change the endpoint.
    Url(String),

    /// Change the model.
    Model(String),

    /// Display help information.
    Help,

    /// Exit the chat application.
    Quit,

    /// Show the session status and presentation mode.
    Status,

    /// Show the current configuration.
    ShowConfig,

    /// Print the whole transcript.
    Transcript,

    /// Report a parsing error back to the caller.
    Invalid(String),
}

/// Parses user input for slash commands.
///
/// Returns `Some(ChatCommand)` if the input is a valid command,
/// or `None` if it should be treated as a regular message.
///
/// # Examples
///
/// ```
/// # use chatstream::chat::parse_command;
/// assert!(parse_command("/quit").is_some());
/// assert!(parse_command("/model llama3").is_some());
/// assert!(parse_command("How do I reverse a list?").is_none());
/// ```
pub fn parse_command(input: &str) -> Option<ChatCommand> {
    let input = input.trim();

    let rest = input.strip_prefix('/')?;
    let mut parts = rest.splitn(2, ' ');
    let command = parts.next()?.to_lowercase();
    let argument = parts.next().map(|s| s.trim()).filter(|s| !s.is_empty());

    let result = match command.as_str() {
        "url" => match argument {
            Some(url) => ChatCommand::Url(url.to_string()),
            None => ChatCommand::Invalid("/url requires an endpoint URL".to_string()),
        },
        "model" => match argument {
            Some(model) => ChatCommand::Model(model.to_string()),
            None => ChatCommand::Invalid("/model requires a model name".to_string()),
        },
        "help" | "?" => ChatCommand::Help,
        "quit" | "exit" | "q" => ChatCommand::Quit,
        "status" => ChatCommand::Status,
        "config" => ChatCommand::ShowConfig,
        "transcript" | "history" => ChatCommand::Transcript,
        _ => ChatCommand::Invalid(format!("Unknown command: /{command}")),
    };

    Some(result)
}

/// Returns help text describing available commands.
pub fn help_text() -> &'static str {
    r#"Available commands:
  /url <url>             Change the chat endpoint
  /model <name>          Change the model (e.g., /model llama3)
  /status                Show the session status and mode
  /config                Show current configuration
  /transcript            Print the conversation so far
  /help                  Show this help message
  /quit                  Exit the chat

Press Ctrl+C while a reply is streaming to cancel it."#
}
