/// Presentation hint derived from the latest classification.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub enum UiMode {
    /// The question was about code; expect fenced code blocks.
    #[default]
    Code,

    /// Anything else; render as prose.
    Article,
}

impl UiMode {
    /// Map a classification verdict to a mode.
    pub fn from_classification(is_coding: bool) -> Self {
        if is_coding { UiMode::Code } else { UiMode::Article }
    }
}

impl std::fmt::Display for UiMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UiMode::Code => write!(f, "code"),
            UiMode::Article => write!(f, "article"),
        }
    }
}
