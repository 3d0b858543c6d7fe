// Public modules
pub mod chat_request;
pub mod key_press;
pub mod last_exchange;
pub mod message;
pub mod session_status;
pub mod stream_frame;
pub mod transcript_entry;
pub mod ui_mode;

// Re-exports
pub use chat_request::ChatRequest;
pub use key_press::{Key, KeyPress};
pub use last_exchange::LastExchange;
pub use message::{Message, MessageRole};
pub use session_status::SessionStatus;
pub use stream_frame::StreamFrame;
pub use transcript_entry::TranscriptEntry;
pub use ui_mode::UiMode;
