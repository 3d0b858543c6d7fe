//! Chat application module for interactive conversations with a local model.
//!
//! This module provides the conversation controller and the pieces of the
//! `chatstream` REPL built on top of it:
//!
//! - Classification of each question before it is answered
//! - Streaming replies that grow a transcript entry in place
//! - Slash commands for session control
//! - Restoring the last exchange at startup
//!
//! # Architecture
//!
//! - [`config`]: CLI argument parsing and configuration
//! - [`controller`]: The per-conversation state machine
//! - [`commands`]: Slash command parsing

mod commands;
mod config;
mod controller;

pub use crate::render::{PlainTextRenderer, TranscriptObserver};
pub use commands::{ChatCommand, help_text, parse_command};
pub use config::{ChatArgs, ChatConfig, DEFAULT_API_URL, DEFAULT_MODEL};
pub use controller::{
    CODING_SUFFIX, ConversationController, GREETING, SYSTEM_PROMPT, SendOutcome,
};
