//! The conversation controller.
//!
//! [`ConversationController`] owns everything a chat shell displays: the
//! session status, the visible transcript, the model-facing context, the
//! presentation hint and the input draft.  Shells register a
//! [`TranscriptObserver`] to hear about changes instead of polling.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::chat::config::ChatConfig;
use crate::classifier::ClassifierClient;
use crate::client::{STREAM_FAILED_FALLBACK, StreamHandler, StreamingChatClient, build_http_client};
use crate::client_logger::ClientLogger;
use crate::endpoint::{chat_url, stream_url};
use crate::error::{Error, Result};
use crate::observability::{TURN_DURATION, TURNS_COMPLETED, TURNS_FAILED};
use crate::render::TranscriptObserver;
use crate::store::ExchangeStore;
use crate::types::{
    Key, KeyPress, LastExchange, Message, SessionStatus, TranscriptEntry, UiMode,
};

/// First message of every context.
pub const SYSTEM_PROMPT: &str = "You are a helpful assistant. When you include code, ALWAYS wrap it in markdown code fences like ```js ... ``` so the UI can render it nicely.";

/// Shown when there is no previous exchange to restore.
pub const GREETING: &str = "Hi! Ask me anything. If it’s coding-related, code blocks will appear in a code card with a Copy button.";

/// Appended to coding questions before they reach the model.
pub const CODING_SUFFIX: &str = "Explain like you’re teaching a beginner developer, but keep it technically correct in 300 words. Requirements: Start with a simple definition in 1–2 lines. Use an analogy. Give 3 code examples. Include var-for-loop setTimeout gotcha and fix using let. After each code block, explain in bullets. End with a one-line definition to memorize. Use headings.";

/// How a call to [`ConversationController::send`] ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    /// The text was blank; nothing happened.
    Ignored,

    /// The reply streamed to completion.
    Completed {
        /// The complete assistant reply.
        text: String,
    },

    /// The turn failed; the placeholder now reads `Error: <reason>`.
    Failed {
        /// Why the turn failed.
        reason: String,
    },
}

/// Drives one conversation against the chat intermediary.
///
/// Turns are strictly sequential: [`send`](Self::send) borrows the controller
/// mutably for the whole turn.  Shells that accept input concurrently with a
/// turn should consult [`accepts_input`](Self::accepts_input).
pub struct ConversationController<S: ExchangeStore> {
    config: ChatConfig,
    classifier: ClassifierClient,
    streamer: StreamingChatClient,
    store: S,
    status: SessionStatus,
    transcript: Vec<TranscriptEntry>,
    context: Vec<Message>,
    ui_mode: UiMode,
    draft: String,
    observers: Vec<Box<dyn TranscriptObserver>>,
}

impl<S: ExchangeStore> ConversationController<S> {
    /// Create a controller, restoring the last exchange from `store` if it
    /// holds one.
    pub fn new(config: ChatConfig, store: S) -> Result<Self> {
        let http = build_http_client(&config.http_options())?;
        let classifier = ClassifierClient::new(http.clone()).with_timeout(config.classify_timeout);
        let streamer = StreamingChatClient::new(http);
        Ok(Self::with_clients(config, store, classifier, streamer))
    }

    /// Create a controller from already configured clients.
    pub fn with_clients(
        config: ChatConfig,
        store: S,
        classifier: ClassifierClient,
        streamer: StreamingChatClient,
    ) -> Self {
        let transcript = match store.load().filter(LastExchange::is_complete) {
            Some(last) => vec![
                TranscriptEntry::user(last.user_text),
                TranscriptEntry::assistant(last.assistant_text),
            ],
            None => vec![TranscriptEntry::assistant(GREETING)],
        };
        Self {
            config,
            classifier,
            streamer,
            store,
            status: SessionStatus::Idle,
            transcript,
            context: vec![Message::system(SYSTEM_PROMPT)],
            ui_mode: UiMode::default(),
            draft: String::new(),
            observers: Vec::new(),
        }
    }

    /// Attach a logger to both the classifier and the streaming client.
    pub fn with_logger(mut self, logger: Arc<dyn ClientLogger>) -> Self {
        self.classifier = self.classifier.with_logger(Arc::clone(&logger));
        self.streamer = self.streamer.with_logger(logger);
        self
    }

    /// Register an observer for transcript, status and mode changes.
    pub fn subscribe(&mut self, observer: Box<dyn TranscriptObserver>) {
        self.observers.push(observer);
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn transcript(&self) -> &[TranscriptEntry] {
        &self.transcript
    }

    /// The messages the model sees on the next turn.
    pub fn context(&self) -> &[Message] {
        &self.context
    }

    pub fn ui_mode(&self) -> UiMode {
        self.ui_mode
    }

    pub fn config(&self) -> &ChatConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// False while a turn is in flight.
    pub fn accepts_input(&self) -> bool {
        !self.status.is_thinking()
    }

    pub fn set_api_url(&mut self, api_url: impl Into<String>) {
        self.config.api_url = api_url.into();
    }

    pub fn set_model(&mut self, model: impl Into<String>) {
        self.config.model = model.into();
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn set_draft(&mut self, draft: impl Into<String>) {
        self.draft = draft.into();
    }

    /// Apply a keystroke to the draft.
    ///
    /// Enter submits the draft and returns the outcome; Shift+Enter inserts a
    /// newline.  Every other key edits the draft and returns `None`.
    pub async fn handle_key(&mut self, press: KeyPress) -> Option<SendOutcome> {
        if press.is_submit() {
            return Some(self.submit().await);
        }
        match press.key {
            Key::Enter => self.draft.push('\n'),
            Key::Backspace => {
                self.draft.pop();
            }
            Key::Char(c) => self.draft.push(c),
        }
        None
    }

    /// Send the current draft.
    pub async fn submit(&mut self) -> SendOutcome {
        let draft = self.draft.clone();
        self.send(&draft).await
    }

    /// Run one turn for `user_text`.
    pub async fn send(&mut self, user_text: &str) -> SendOutcome {
        self.send_with_cancel(user_text, &CancellationToken::new())
            .await
    }

    /// Run one turn for `user_text`, abandoning it if `cancel` fires.
    ///
    /// A cancelled turn ends like any other failure: the placeholder shows the
    /// reason and the status becomes [`SessionStatus::Error`].
    pub async fn send_with_cancel(
        &mut self,
        user_text: &str,
        cancel: &CancellationToken,
    ) -> SendOutcome {
        let user_text = user_text.trim();
        if user_text.is_empty() {
            return SendOutcome::Ignored;
        }

        let started = Instant::now();
        self.set_status(SessionStatus::Thinking);
        self.draft.clear();
        self.append_entry(TranscriptEntry::user(user_text));
        let placeholder = TranscriptEntry::placeholder();
        let placeholder_id = placeholder.id;
        self.append_entry(placeholder);

        let outcome = match self.run_turn(user_text, placeholder_id, cancel).await {
            Ok(reply) => {
                self.context.push(Message::assistant(reply.as_str()));
                let exchange = LastExchange::now(user_text, reply.as_str());
                if let Err(err) = self.store.save(&exchange) {
                    tracing::warn!(error = %err, "could not persist the last exchange");
                }
                self.set_status(SessionStatus::Idle);
                TURNS_COMPLETED.click();
                tracing::info!(chars = reply.chars().count(), "turn completed");
                SendOutcome::Completed { text: reply }
            }
            Err(err) => {
                let reason = err.to_string();
                self.update_entry(placeholder_id, format!("Error: {reason}"));
                self.set_status(SessionStatus::Error);
                TURNS_FAILED.click();
                tracing::warn!(%reason, "turn failed");
                SendOutcome::Failed { reason }
            }
        };
        TURN_DURATION.add(started.elapsed().as_secs_f64());
        outcome
    }

    async fn run_turn(
        &mut self,
        user_text: &str,
        placeholder_id: Uuid,
        cancel: &CancellationToken,
    ) -> std::result::Result<String, TurnError> {
        let model = self.config.effective_model().to_string();

        let classify_url = chat_url(&self.config.api_url)?;
        let is_coding = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                return Err(Error::abort("turn cancelled during classification").into());
            }
            is_coding = self.classifier.classify(user_text, &classify_url, &model) => is_coding,
        };
        self.set_ui_mode(UiMode::from_classification(is_coding));

        let prompt = if is_coding {
            format!("{user_text}\n\n{CODING_SUFFIX}")
        } else {
            user_text.to_string()
        };
        self.context.push(Message::user(prompt));

        let url = stream_url(&self.config.api_url)?;
        let mut handler = TurnHandler {
            placeholder_id,
            transcript: &mut self.transcript,
            observers: &mut self.observers,
            end: None,
        };
        self.streamer
            .stream(&self.context, &url, &model, &mut handler, cancel)
            .await?;
        match handler.end {
            Some(StreamEnd::Done(reply)) => Ok(reply),
            Some(StreamEnd::Rejected(message)) => Err(TurnError::Rejected(message)),
            None => Err(TurnError::Rejected(STREAM_FAILED_FALLBACK.to_string())),
        }
    }

    fn set_status(&mut self, status: SessionStatus) {
        self.status = status;
        for observer in self.observers.iter_mut() {
            observer.status_changed(status);
        }
    }

    fn set_ui_mode(&mut self, mode: UiMode) {
        if self.ui_mode == mode {
            return;
        }
        self.ui_mode = mode;
        for observer in self.observers.iter_mut() {
            observer.mode_changed(mode);
        }
    }

    fn append_entry(&mut self, entry: TranscriptEntry) {
        for observer in self.observers.iter_mut() {
            observer.entry_appended(&entry);
        }
        self.transcript.push(entry);
    }

    fn update_entry(&mut self, id: Uuid, content: String) {
        replace_content(&mut self.transcript, &mut self.observers, id, content);
    }
}

impl<S: ExchangeStore> fmt::Debug for ConversationController<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversationController")
            .field("config", &self.config)
            .field("status", &self.status)
            .field("transcript", &self.transcript.len())
            .field("context", &self.context.len())
            .field("ui_mode", &self.ui_mode)
            .field("observers", &self.observers.len())
            .finish()
    }
}

fn replace_content(
    transcript: &mut [TranscriptEntry],
    observers: &mut [Box<dyn TranscriptObserver>],
    id: Uuid,
    content: String,
) {
    let Some(entry) = transcript.iter_mut().find(|entry| entry.id == id) else {
        return;
    };
    entry.content = content;
    for observer in observers.iter_mut() {
        observer.entry_updated(entry);
    }
}

enum TurnError {
    /// The server refused the stream; shown verbatim.
    Rejected(String),
    Failed(Error),
}

impl From<Error> for TurnError {
    fn from(err: Error) -> Self {
        TurnError::Failed(err)
    }
}

impl fmt::Display for TurnError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TurnError::Rejected(message) => f.write_str(message),
            TurnError::Failed(err) => write!(f, "{err}"),
        }
    }
}

enum StreamEnd {
    Done(String),
    Rejected(String),
}

struct TurnHandler<'a> {
    placeholder_id: Uuid,
    transcript: &'a mut Vec<TranscriptEntry>,
    observers: &'a mut Vec<Box<dyn TranscriptObserver>>,
    end: Option<StreamEnd>,
}

impl StreamHandler for TurnHandler<'_> {
    fn on_delta(&mut self, text: &str) {
        replace_content(
            self.transcript,
            self.observers,
            self.placeholder_id,
            text.to_string(),
        );
    }

    fn on_done(&mut self, text: &str) {
        self.end = Some(StreamEnd::Done(text.to_string()));
    }

    fn on_error(&mut self, message: &str) {
        self.end = Some(StreamEnd::Rejected(message.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::store::MemoryStore;
    use crate::types::MessageRole;

    fn controller(store: MemoryStore) -> ConversationController<MemoryStore> {
        let config = ChatConfig::new().with_system_proxy(false);
        ConversationController::new(config, store).unwrap()
    }

    #[derive(Clone, Default)]
    struct Events(Arc<Mutex<Vec<String>>>);

    impl TranscriptObserver for Events {
        fn entry_appended(&mut self, entry: &TranscriptEntry) {
            self.0
                .lock()
                .unwrap()
                .push(format!("append {}: {}", entry.role, entry.content));
        }

        fn entry_updated(&mut self, entry: &TranscriptEntry) {
            self.0.lock().unwrap().push(format!("update {}", entry.content));
        }

        fn status_changed(&mut self, status: SessionStatus) {
            self.0.lock().unwrap().push(format!("status {status}"));
        }
    }

    #[test]
    fn fresh_controller_greets() {
        let ctl = controller(MemoryStore::new());
        assert_eq!(ctl.status(), SessionStatus::Idle);
        assert_eq!(ctl.transcript().len(), 1);
        assert_eq!(ctl.transcript()[0].role, MessageRole::Assistant);
        assert_eq!(ctl.transcript()[0].content, GREETING);
        assert_eq!(ctl.context(), &[Message::system(SYSTEM_PROMPT)]);
        assert_eq!(ctl.ui_mode(), UiMode::Code);
        assert!(ctl.accepts_input());
    }

    #[test]
    fn restores_last_exchange() {
        let ctl = controller(MemoryStore::with_exchange(LastExchange::now("2+2?", "4")));
        let transcript = ctl.transcript();
        assert_eq!(transcript.len(), 2);
        assert_eq!(transcript[0].role, MessageRole::User);
        assert_eq!(transcript[0].content, "2+2?");
        assert_eq!(transcript[1].content, "4");
        // Restored entries are display only.
        assert_eq!(ctl.context().len(), 1);
    }

    #[test]
    fn incomplete_exchange_is_not_restored() {
        let ctl = controller(MemoryStore::with_exchange(LastExchange::now("2+2?", "")));
        assert_eq!(ctl.transcript().len(), 1);
        assert_eq!(ctl.transcript()[0].content, GREETING);
    }

    #[tokio::test]
    async fn blank_prompt_is_ignored() {
        let events = Events::default();
        let mut ctl = controller(MemoryStore::new());
        ctl.subscribe(Box::new(events.clone()));
        ctl.set_draft("   \n ");

        assert_eq!(ctl.send("").await, SendOutcome::Ignored);
        assert_eq!(ctl.submit().await, SendOutcome::Ignored);
        assert_eq!(ctl.status(), SessionStatus::Idle);
        assert_eq!(ctl.transcript().len(), 1);
        assert_eq!(ctl.draft(), "   \n ");
        assert!(events.0.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn keys_edit_the_draft() {
        let mut ctl = controller(MemoryStore::new());
        for c in "ab".chars() {
            assert!(ctl.handle_key(KeyPress::new(Key::Char(c))).await.is_none());
        }
        assert!(ctl.handle_key(KeyPress::shifted(Key::Enter)).await.is_none());
        assert!(ctl.handle_key(KeyPress::new(Key::Char('c'))).await.is_none());
        assert!(ctl.handle_key(KeyPress::new(Key::Char('d'))).await.is_none());
        assert!(ctl.handle_key(KeyPress::new(Key::Backspace)).await.is_none());
        assert_eq!(ctl.draft(), "ab\nc");
    }

    #[tokio::test]
    async fn unusable_endpoint_fails_the_turn() {
        let events = Events::default();
        let mut ctl = controller(MemoryStore::new());
        ctl.subscribe(Box::new(events.clone()));
        ctl.set_api_url("not a url");
        ctl.set_draft("hello");

        let outcome = ctl.handle_key(KeyPress::new(Key::Enter)).await;
        let Some(SendOutcome::Failed { reason }) = outcome else {
            panic!("expected a failed turn, got {outcome:?}");
        };
        assert!(reason.starts_with("URL error:"), "{reason}");
        assert_eq!(ctl.status(), SessionStatus::Error);
        assert_eq!(ctl.draft(), "");

        let transcript = ctl.transcript();
        assert_eq!(transcript.len(), 3);
        assert_eq!(transcript[1].content, "hello");
        assert_eq!(transcript[2].content, format!("Error: {reason}"));
        assert_eq!(ctl.context().len(), 1);
        assert!(ctl.store().load().is_none());

        let events = events.0.lock().unwrap();
        assert_eq!(events[0], "status thinking…");
        assert_eq!(events[1], "append user: hello");
        assert_eq!(events[2], "append assistant: ");
        assert!(events[3].starts_with("update Error: URL error:"));
        assert_eq!(events[4], "status error");
    }

    #[tokio::test]
    async fn cancelled_turn_reports_abort() {
        let mut ctl = controller(MemoryStore::new());
        ctl.set_api_url("http://127.0.0.1:9/api/ai/chat");
        let cancel = CancellationToken::new();
        cancel.cancel();

        let outcome = ctl.send_with_cancel("what is rust?", &cancel).await;
        assert!(
            matches!(&outcome, SendOutcome::Failed { reason } if reason.starts_with("Request aborted:")),
            "{outcome:?}"
        );
        assert_eq!(ctl.status(), SessionStatus::Error);
        assert!(ctl.accepts_input());
        assert!(ctl.transcript()[2].content.starts_with("Error: Request aborted:"));
    }

    #[test]
    fn fixed_prompts_keep_their_punctuation() {
        assert!(GREETING.contains("If it’s coding-related"));
        assert!(CODING_SUFFIX.starts_with("Explain like you’re teaching"));
        assert!(CODING_SUFFIX.contains("definition in 1–2 lines."));
    }

    #[test]
    fn runtime_configuration() {
        let mut ctl = controller(MemoryStore::new());
        ctl.set_model("llama3");
        ctl.set_api_url("http://10.0.0.2:3000/api/ai/chat");
        assert_eq!(ctl.config().model, "llama3");
        assert_eq!(ctl.config().api_url, "http://10.0.0.2:3000/api/ai/chat");
    }
}
