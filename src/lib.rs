// Public modules
pub mod chat;
pub mod classifier;
pub mod client;
pub mod client_logger;
pub mod endpoint;
pub mod error;
pub mod observability;
pub mod render;
pub mod sse;
pub mod store;
pub mod types;

// Re-exports
pub use classifier::{ClassifierClient, parse_is_coding};
pub use client::{HttpOptions, StreamHandler, StreamingChatClient, build_http_client};
pub use client_logger::ClientLogger;
pub use endpoint::{chat_url, stream_url};
pub use error::{Error, Result};
pub use observability::register_biometrics;
pub use render::{PlainTextRenderer, TranscriptObserver};
pub use sse::FrameDecoder;
pub use store::{ExchangeStore, FileStore, MemoryStore};
pub use types::*;
