/// One decoded unit of a streamed reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamFrame {
    /// A fragment of assistant text.
    Delta(String),

    /// The server flagged the reply as complete.
    Done,
}

impl StreamFrame {
    /// The text carried by a delta frame.
    pub fn text(&self) -> Option<&str> {
        match self {
            StreamFrame::Delta(text) => Some(text),
            StreamFrame::Done => None,
        }
    }
}
