/// Status of a conversation session.
///
/// `Idle` is the initial state.  A turn moves the session to `Thinking` and
/// ends in `Idle` on success or `Error` on failure.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub enum SessionStatus {
    /// Waiting for input.
    #[default]
    Idle,

    /// A turn is in flight.
    Thinking,

    /// The last turn failed.
    Error,
}

impl SessionStatus {
    /// Returns true while a turn is in flight.
    pub fn is_thinking(self) -> bool {
        self == SessionStatus::Thinking
    }
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionStatus::Idle => write!(f, "idle"),
            SessionStatus::Thinking => write!(f, "thinking…"),
            SessionStatus::Error => write!(f, "error"),
        }
    }
}
