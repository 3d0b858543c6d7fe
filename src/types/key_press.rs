/// A key the shell forwards to the conversation controller.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Key {
    /// Return/Enter.
    Enter,

    /// Delete the last character of the draft.
    Backspace,

    /// A printable character.
    Char(char),
}

/// A key together with the shift modifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct KeyPress {
    /// The key.
    pub key: Key,

    /// Whether shift was held.
    pub shift: bool,
}

impl KeyPress {
    /// A key without modifiers.
    pub fn new(key: Key) -> Self {
        Self { key, shift: false }
    }

    /// A key with shift held.
    pub fn shifted(key: Key) -> Self {
        Self { key, shift: true }
    }

    /// Enter without shift submits the draft.
    pub fn is_submit(&self) -> bool {
        self.key == Key::Enter && !self.shift
    }
}
