//! Query classification.
//!
//! Before a reply is streamed, the question is sent once to the non-streaming
//! `/chat` endpoint with an instruction to answer `{"isCoding": true|false}`.
//! The upstream model does not always comply, so the verdict is recovered
//! through a chain of increasingly lenient parsers, and every failure along the
//! way falls back to `false`.

use std::sync::{Arc, LazyLock};
use std::time::Duration;

use regex::Regex;
use serde_json::Value;

use crate::client_logger::ClientLogger;
use crate::error::{Error, Result};
use crate::observability::{CLASSIFY_CODING, CLASSIFY_FAILURES, CLASSIFY_REQUESTS};
use crate::types::{ChatRequest, Message};

/// System instruction sent with every classification request.
pub const CLASSIFIER_INSTRUCTION: &str = "You are a strict classifier. Decide if the user's question is coding/software-development related. Return ONLY valid JSON with exactly: {\"isCoding\": true|false}. No extra keys, no commentary.";

const DEFAULT_CLASSIFY_TIMEOUT: Duration = Duration::from_secs(30);

static BRACED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\{.*\}").expect("static regex is valid"));

/// Client for the classification round trip.
#[derive(Clone)]
pub struct ClassifierClient {
    http: reqwest::Client,
    timeout: Duration,
    logger: Option<Arc<dyn ClientLogger>>,
}

impl ClassifierClient {
    /// Create a client on top of a shared reqwest client.
    pub fn new(http: reqwest::Client) -> Self {
        Self {
            http,
            timeout: DEFAULT_CLASSIFY_TIMEOUT,
            logger: None,
        }
    }

    /// Sets the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Attach a logger that sees every request and verdict.
    pub fn with_logger(mut self, logger: Arc<dyn ClientLogger>) -> Self {
        self.logger = Some(logger);
        self
    }

    /// Decide whether `user_text` is a coding question.
    ///
    /// Never fails: an unreachable server, a non-success status or an
    /// unreadable reply all yield `false`.
    pub async fn classify(&self, user_text: &str, api_url: &str, model: &str) -> bool {
        CLASSIFY_REQUESTS.click();
        match self.try_classify(user_text, api_url, model).await {
            Ok(is_coding) => {
                if is_coding {
                    CLASSIFY_CODING.click();
                }
                is_coding
            }
            Err(err) => {
                CLASSIFY_FAILURES.click();
                tracing::warn!(url = api_url, error = %err, "classification unavailable; assuming non-coding");
                false
            }
        }
    }

    async fn try_classify(&self, user_text: &str, api_url: &str, model: &str) -> Result<bool> {
        let messages = classifier_messages(user_text);
        let request = ChatRequest::new(&messages, model);
        if let Some(logger) = &self.logger {
            logger.log_request(api_url, &serde_json::to_value(&request)?);
        }

        let response = self
            .http
            .post(api_url)
            .timeout(self.timeout)
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::from_transport(e, Some(self.timeout)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::api(status.as_u16(), body));
        }

        let body = response
            .text()
            .await
            .map_err(|e| Error::from_transport(e, Some(self.timeout)))?;
        let reply = reply_text(&body);
        let is_coding = parse_is_coding(&reply);
        if let Some(logger) = &self.logger {
            logger.log_classification(&reply, is_coding);
        }
        Ok(is_coding)
    }
}

impl std::fmt::Debug for ClassifierClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClassifierClient")
            .field("timeout", &self.timeout)
            .field("logger", &self.logger.is_some())
            .finish()
    }
}

/// The two-message payload for classifying `user_text`.
pub fn classifier_messages(user_text: &str) -> Vec<Message> {
    vec![
        Message::system(CLASSIFIER_INSTRUCTION),
        Message::user(user_text),
    ]
}

/// Pull the model's reply text out of a response body.
///
/// Accepts `{"content": ...}`, `{"message": {"content": ...}}` and a bare JSON
/// string.  A body that is not JSON at all is taken verbatim.
pub fn reply_text(body: &str) -> String {
    let Ok(value) = serde_json::from_str::<Value>(body) else {
        return body.to_string();
    };
    let field = value
        .get("content")
        .filter(|v| !v.is_null())
        .or_else(|| value.pointer("/message/content").filter(|v| !v.is_null()));
    match (field, &value) {
        (Some(Value::String(text)), _) => text.clone(),
        (Some(other), _) => other.to_string(),
        (None, Value::String(text)) => text.clone(),
        (None, _) => String::new(),
    }
}

/// Recover the verdict from the classifier's reply text.
///
/// Tries, in order, [`parse_strict`], [`parse_embedded`] and
/// [`parse_keywords`], defaulting to `false`.
pub fn parse_is_coding(text: &str) -> bool {
    parse_strict(text)
        .or_else(|| parse_embedded(text))
        .or_else(|| parse_keywords(text))
        .unwrap_or(false)
}

/// The whole text is a JSON object with a boolean `isCoding`.
pub fn parse_strict(text: &str) -> Option<bool> {
    serde_json::from_str::<Value>(text)
        .ok()?
        .get("isCoding")?
        .as_bool()
}

/// The text contains a brace-delimited JSON object with a boolean `isCoding`.
///
/// The match runs from the first `{` to the last `}`.
pub fn parse_embedded(text: &str) -> Option<bool> {
    let object = BRACED.find(text)?;
    parse_strict(object.as_str())
}

/// The text mentions `true` or `false`, in any case; `true` wins.
pub fn parse_keywords(text: &str) -> Option<bool> {
    let lower = text.to_lowercase();
    if lower.contains("true") {
        Some(true)
    } else if lower.contains("false") {
        Some(false)
    } else {
        None
    }
}
