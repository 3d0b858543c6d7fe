//! Output rendering for the conversation transcript.
//!
//! The conversation controller reports every change to its observable state
//! through [`TranscriptObserver`].  [`PlainTextRenderer`] is the terminal
//! implementation used by the `chatstream` binary: it prints streamed replies
//! incrementally even though updates arrive as the cumulative text.

use std::collections::HashMap;
use std::io::{self, Stdout, Write};

use uuid::Uuid;

use crate::types::{MessageRole, SessionStatus, TranscriptEntry, UiMode};

/// ANSI escape code for dim text (used for informational lines).
const ANSI_DIM: &str = "\x1b[2m";

/// ANSI escape code to reset all styling.
const ANSI_RESET: &str = "\x1b[0m";

/// ANSI escape code for cyan text (used for the assistant label).
const ANSI_CYAN: &str = "\x1b[36m";

/// ANSI escape code for green text (used for the user label).
const ANSI_GREEN: &str = "\x1b[32m";

/// ANSI escape code for red text (used for errors).
const ANSI_RED: &str = "\x1b[31m";

/// Receives changes to a conversation's observable state.
///
/// All methods have empty defaults so observers only implement what they
/// display.
pub trait TranscriptObserver: Send {
    /// A new entry was appended to the transcript.
    fn entry_appended(&mut self, entry: &TranscriptEntry) {
        _ = entry;
    }

    /// An existing entry, identified by its id, has new content.
    fn entry_updated(&mut self, entry: &TranscriptEntry) {
        _ = entry;
    }

    /// The session moved to a new status.
    fn status_changed(&mut self, status: SessionStatus) {
        _ = status;
    }

    /// The presentation hint changed.
    fn mode_changed(&mut self, mode: UiMode) {
        _ = mode;
    }
}

/// Plain text renderer with optional ANSI styling.
///
/// User entries are not echoed (the user just typed them).  Assistant entries
/// are printed as they grow; when an entry's new content no longer extends
/// what was already printed (an error replacing a partial reply), the new
/// content is printed on a line of its own.
pub struct PlainTextRenderer<W: Write + Send = Stdout> {
    out: W,
    use_color: bool,
    printed: HashMap<Uuid, String>,
    line_start: bool,
}

impl PlainTextRenderer<Stdout> {
    /// Creates a new PlainTextRenderer on stdout with ANSI colors enabled.
    pub fn new() -> Self {
        Self::with_color(true)
    }

    /// Creates a new PlainTextRenderer on stdout with specified color setting.
    pub fn with_color(use_color: bool) -> Self {
        Self::with_writer(io::stdout(), use_color)
    }
}

impl Default for PlainTextRenderer<Stdout> {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: Write + Send> PlainTextRenderer<W> {
    /// Creates a renderer writing to `out`.
    pub fn with_writer(out: W, use_color: bool) -> Self {
        Self {
            out,
            use_color,
            printed: HashMap::new(),
            line_start: true,
        }
    }

    /// Print a complete entry, e.g. when replaying a restored transcript.
    pub fn print_entry(&mut self, entry: &TranscriptEntry) {
        self.print_label(entry.role);
        self.write(&entry.content);
        self.end_line();
    }

    /// Print an error message.
    pub fn print_error(&mut self, error: &str) {
        self.end_line();
        if self.use_color {
            self.write(&format!("{ANSI_RED}Error: {error}{ANSI_RESET}\n"));
        } else {
            self.write(&format!("Error: {error}\n"));
        }
    }

    /// Print an informational message.
    pub fn print_info(&mut self, info: &str) {
        self.end_line();
        if self.use_color {
            self.write(&format!("{ANSI_DIM}{info}{ANSI_RESET}\n"));
        } else {
            self.write(&format!("{info}\n"));
        }
    }

    fn print_label(&mut self, role: MessageRole) {
        self.end_line();
        let (color, label) = match role {
            MessageRole::User => (ANSI_GREEN, "You"),
            MessageRole::Assistant => (ANSI_CYAN, "Assistant"),
            MessageRole::System => (ANSI_DIM, "System"),
        };
        if self.use_color {
            self.write(&format!("{color}{label}:{ANSI_RESET} "));
        } else {
            self.write(&format!("{label}: "));
        }
    }

    fn write(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        let _ = self.out.write_all(text.as_bytes());
        let _ = self.out.flush();
        self.line_start = text.ends_with('\n');
    }

    fn end_line(&mut self) {
        if !self.line_start {
            self.write("\n");
        }
    }
}

impl<W: Write + Send> TranscriptObserver for PlainTextRenderer<W> {
    fn entry_appended(&mut self, entry: &TranscriptEntry) {
        if entry.role != MessageRole::Assistant {
            return;
        }
        self.print_label(entry.role);
        self.write(&entry.content);
        self.printed.insert(entry.id, entry.content.clone());
    }

    fn entry_updated(&mut self, entry: &TranscriptEntry) {
        let previous = self.printed.remove(&entry.id).unwrap_or_default();
        match entry.content.strip_prefix(previous.as_str()) {
            Some(suffix) => self.write(suffix),
            None => {
                self.end_line();
                if self.use_color && entry.content.starts_with("Error:") {
                    self.write(&format!("{ANSI_RED}{}{ANSI_RESET}", entry.content));
                } else {
                    self.write(&entry.content);
                }
            }
        }
        self.printed.insert(entry.id, entry.content.clone());
    }

    fn status_changed(&mut self, status: SessionStatus) {
        if !status.is_thinking() {
            self.end_line();
        }
    }
}
