//! Streaming chat client.
//!
//! [`StreamingChatClient`] posts the conversation to the `/chat-stream`
//! endpoint and reports the reply to a [`StreamHandler`] as it arrives.

use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::StreamExt;
use reqwest::header::{self, HeaderValue};
use tokio_util::sync::CancellationToken;

use crate::client_logger::ClientLogger;
use crate::error::{Error, Result};
use crate::observability::{
    STREAM_BYTES, STREAM_DURATION, STREAM_ERRORS, STREAM_REJECTED, STREAM_REQUESTS, STREAM_TTFB,
};
use crate::sse::FrameDecoder;
use crate::types::{ChatRequest, Message, StreamFrame};

/// Reported to the handler when a rejected stream has no body to show.
pub const STREAM_FAILED_FALLBACK: &str = "Streaming failed";

const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Options for the underlying HTTP client.
#[derive(Debug, Clone)]
pub struct HttpOptions {
    /// Maximum time to establish a connection.
    pub connect_timeout: Duration,
    /// Whether to honor proxy settings from the environment.
    pub system_proxy: bool,
}

impl Default for HttpOptions {
    fn default() -> Self {
        Self {
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            system_proxy: true,
        }
    }
}

/// Build the shared reqwest client.
///
/// No total request timeout is set: a streamed reply may legitimately take
/// minutes.  Per-request timeouts are applied where they make sense.
pub fn build_http_client(options: &HttpOptions) -> Result<reqwest::Client> {
    let mut builder = reqwest::Client::builder().connect_timeout(options.connect_timeout);
    if !options.system_proxy {
        builder = builder.no_proxy();
    }
    builder.build().map_err(|e| {
        Error::http_client(
            format!("Failed to build HTTP client: {e}"),
            Some(Box::new(e)),
        )
    })
}

/// Receives the progress of one streamed reply.
///
/// Exactly one of [`on_done`](StreamHandler::on_done) or
/// [`on_error`](StreamHandler::on_error) is called for a stream that the
/// server accepted or rejected; neither is called when the transport fails,
/// in which case [`StreamingChatClient::stream`] returns the error instead.
pub trait StreamHandler: Send {
    /// Called for every text fragment with the cumulative reply so far.
    fn on_delta(&mut self, text: &str);

    /// Called once the body is exhausted, with the complete reply.
    fn on_done(&mut self, text: &str);

    /// Called when the server rejects the request.
    fn on_error(&mut self, message: &str);
}

/// Client for the streaming chat endpoint.
#[derive(Clone)]
pub struct StreamingChatClient {
    http: reqwest::Client,
    logger: Option<Arc<dyn ClientLogger>>,
}

impl StreamingChatClient {
    /// Create a client on top of a shared reqwest client.
    pub fn new(http: reqwest::Client) -> Self {
        Self { http, logger: None }
    }

    /// Attach a logger that sees every request and frame.
    pub fn with_logger(mut self, logger: Arc<dyn ClientLogger>) -> Self {
        self.logger = Some(logger);
        self
    }

    /// Stream a reply for `messages` from `api_url`.
    ///
    /// The handler receives cumulative text, not individual fragments; a
    /// consumer should replace its copy rather than append to it.
    ///
    /// # Errors
    ///
    /// Returns an error if the request cannot be sent, the body fails while it
    /// is being read, or `cancel` fires before the body is exhausted.
    pub async fn stream(
        &self,
        messages: &[Message],
        api_url: &str,
        model: &str,
        handler: &mut dyn StreamHandler,
        cancel: &CancellationToken,
    ) -> Result<()> {
        let request = ChatRequest::new(messages, model);
        if let Some(logger) = &self.logger {
            logger.log_request(api_url, &serde_json::to_value(&request)?);
        }

        STREAM_REQUESTS.click();
        let started = Instant::now();
        tracing::debug!(url = api_url, model, messages = messages.len(), "opening stream");

        let send = self
            .http
            .post(api_url)
            .header(header::ACCEPT, HeaderValue::from_static("text/event-stream"))
            .json(&request)
            .send();
        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                return Err(Error::abort("stream cancelled before the server answered"));
            }
            response = send => response.map_err(|e| {
                STREAM_ERRORS.click();
                Error::from_transport(e, None)
            })?,
        };

        if !response.status().is_success() {
            STREAM_REJECTED.click();
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(url = api_url, %status, "stream rejected");
            let message = if body.trim().is_empty() {
                STREAM_FAILED_FALLBACK
            } else {
                body.as_str()
            };
            handler.on_error(message);
            return Ok(());
        }

        let mut body = response.bytes_stream();
        let mut decoder = FrameDecoder::new();
        let mut reply = String::new();
        let mut first_byte = true;
        loop {
            let chunk = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    tracing::debug!(received = reply.len(), "stream cancelled");
                    return Err(Error::abort("stream cancelled"));
                }
                chunk = body.next() => chunk,
            };
            let Some(chunk) = chunk else {
                break;
            };
            let chunk = chunk.map_err(|e| {
                STREAM_ERRORS.click();
                Error::streaming(format!("Error in HTTP stream: {e}"), Some(Box::new(e)))
            })?;
            if first_byte {
                STREAM_TTFB.add(started.elapsed().as_secs_f64());
                first_byte = false;
            }
            STREAM_BYTES.count(chunk.len() as u64);
            for frame in decoder.decode(&chunk) {
                self.apply(frame, &mut reply, handler);
            }
        }
        for frame in decoder.finish() {
            self.apply(frame, &mut reply, handler);
        }

        STREAM_DURATION.add(started.elapsed().as_secs_f64());
        tracing::debug!(chars = reply.chars().count(), "stream finished");
        handler.on_done(&reply);
        Ok(())
    }

    fn apply(&self, frame: StreamFrame, reply: &mut String, handler: &mut dyn StreamHandler) {
        if let Some(logger) = &self.logger {
            logger.log_stream_frame(&frame);
        }
        // A done frame does not end the read; the body is drained to EOF.
        if let StreamFrame::Delta(text) = frame {
            reply.push_str(&text);
            handler.on_delta(reply);
        }
    }
}

impl std::fmt::Debug for StreamingChatClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamingChatClient")
            .field("logger", &self.logger.is_some())
            .finish()
    }
}
