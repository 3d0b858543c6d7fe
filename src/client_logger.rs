//! Logging trait for chat client operations.
//!
//! This module provides the [`ClientLogger`] trait that allows users to capture
//! every interaction passing through [`ClassifierClient`](crate::ClassifierClient)
//! and [`StreamingChatClient`](crate::StreamingChatClient).

use crate::types::StreamFrame;

/// A trait for logging chat client operations.
///
/// # Example
///
/// ```rust,ignore
/// use chatstream::{ClientLogger, StreamFrame};
/// use std::sync::Mutex;
///
/// struct FileLogger {
///     file: Mutex<std::fs::File>,
/// }
///
/// impl ClientLogger for FileLogger {
///     fn log_request(&self, url: &str, body: &serde_json::Value) {
///         let mut file = self.file.lock().unwrap();
///         writeln!(file, "POST {url} {body}").unwrap();
///     }
///
///     fn log_stream_frame(&self, frame: &StreamFrame) {
///         let mut file = self.file.lock().unwrap();
///         writeln!(file, "frame: {frame:?}").unwrap();
///     }
///
///     fn log_classification(&self, reply: &str, is_coding: bool) {
///         let mut file = self.file.lock().unwrap();
///         writeln!(file, "classified {is_coding} from {reply:?}").unwrap();
///     }
/// }
/// ```
pub trait ClientLogger: Send + Sync {
    /// Log an outgoing request body just before it is sent.
    fn log_request(&self, url: &str, body: &serde_json::Value);

    /// Log one decoded frame of a streamed reply.
    fn log_stream_frame(&self, frame: &StreamFrame);

    /// Log the classifier's raw reply text and the verdict drawn from it.
    fn log_classification(&self, reply: &str, is_coding: bool);
}
