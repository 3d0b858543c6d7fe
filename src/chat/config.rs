//! Configuration types for the chat application.
//!
//! This module provides CLI argument parsing via `arrrg` and configuration
//! structures for controlling chat behavior.  Nothing here is persisted: the
//! endpoint and model live in process memory and can be changed at runtime.

use std::path::PathBuf;
use std::time::Duration;

use arrrg_derive::CommandLine;

use crate::client::HttpOptions;

/// Default endpoint of the chat intermediary.
pub const DEFAULT_API_URL: &str = "http://localhost:3000/api/ai/chat";

/// Default model identifier.
pub const DEFAULT_MODEL: &str = "dolphin-llama3";

/// Default timeout for the classification round trip.
const DEFAULT_CLASSIFY_TIMEOUT: Duration = Duration::from_secs(30);

/// Default timeout for establishing connections.
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Command-line arguments for the chatstream tool.
#[derive(CommandLine, Debug, Default, PartialEq, Eq)]
pub struct ChatArgs {
    /// Endpoint of the chat intermediary.
    #[arrrg(
        optional,
        "Chat endpoint (default: http://localhost:3000/api/ai/chat)",
        "URL"
    )]
    pub api_url: Option<String>,

    /// Model to use for chat.
    #[arrrg(optional, "Model to use (default: dolphin-llama3)", "MODEL")]
    pub model: Option<String>,

    /// Where to keep the last exchange.
    #[arrrg(optional, "File holding the last exchange", "PATH")]
    pub store: Option<String>,

    /// Disable ANSI colors and styles.
    #[arrrg(flag, "Disable ANSI colors/styles")]
    pub no_color: bool,
}

/// Configuration for a chat session.
///
/// This struct holds the resolved configuration values after processing
/// command-line arguments with appropriate defaults.
#[derive(Debug, Clone)]
pub struct ChatConfig {
    /// Endpoint of the chat intermediary, in either its `/chat` or
    /// `/chat-stream` form.
    pub api_url: String,

    /// The model to use for generating responses.
    pub model: String,

    /// Whether to use ANSI colors and styles in output.
    pub use_color: bool,

    /// Where the last exchange is stored; `None` selects the default location.
    pub store_path: Option<PathBuf>,

    /// Timeout for the classification round trip.
    pub classify_timeout: Duration,

    /// Timeout for establishing a connection.
    pub connect_timeout: Duration,

    /// Whether to honor proxy settings from the environment.
    pub system_proxy: bool,
}

impl ChatConfig {
    /// Creates a new ChatConfig with default values.
    ///
    /// Defaults:
    /// - API URL: http://localhost:3000/api/ai/chat
    /// - Model: dolphin-llama3
    /// - Color: enabled
    /// - Classification timeout: 30 seconds
    /// - Connect timeout: 10 seconds
    pub fn new() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            use_color: true,
            store_path: None,
            classify_timeout: DEFAULT_CLASSIFY_TIMEOUT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            system_proxy: true,
        }
    }

    /// Sets the endpoint.
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    /// Sets the model to use.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Disables ANSI color output.
    pub fn without_color(mut self) -> Self {
        self.use_color = false;
        self
    }

    /// Sets the last-exchange file.
    pub fn with_store_path(mut self, path: Option<PathBuf>) -> Self {
        self.store_path = path;
        self
    }

    /// Sets the classification timeout.
    pub fn with_classify_timeout(mut self, timeout: Duration) -> Self {
        self.classify_timeout = timeout;
        self
    }

    /// Sets the connect timeout.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Sets whether environment proxy settings are honored.
    pub fn with_system_proxy(mut self, enabled: bool) -> Self {
        self.system_proxy = enabled;
        self
    }

    /// The model to put on the wire; a blank model falls back to the default.
    pub fn effective_model(&self) -> &str {
        let model = self.model.trim();
        if model.is_empty() { DEFAULT_MODEL } else { model }
    }

    /// Options for the shared HTTP client.
    pub fn http_options(&self) -> HttpOptions {
        HttpOptions {
            connect_timeout: self.connect_timeout,
            system_proxy: self.system_proxy,
        }
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl From<ChatArgs> for ChatConfig {
    fn from(args: ChatArgs) -> Self {
        ChatConfig {
            api_url: args.api_url.unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            model: args.model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            use_color: !args.no_color,
            store_path: args.store.map(PathBuf::from),
            ..ChatConfig::new()
        }
    }
}
