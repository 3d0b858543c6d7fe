//! Endpoint URL variants.
//!
//! Users configure one base URL.  Classification goes to the non-streaming
//! `/chat` endpoint and replies are streamed from `/chat-stream`.  Both
//! transforms are text substitutions on the last path segment; the query
//! string, fragment and the rest of the URL are kept byte for byte.

use url::Url;

use crate::error::Result;

const CHAT_SEGMENT: &str = "chat";
const STREAM_SEGMENT: &str = "chat-stream";

/// The streaming variant of `api_url`: a trailing `/chat` becomes `/chat-stream`.
///
/// URLs that already end in `/chat-stream`, or that end in neither, are
/// returned unchanged.
pub fn stream_url(api_url: &str) -> Result<String> {
    replace_last_segment(api_url, CHAT_SEGMENT, STREAM_SEGMENT)
}

/// The non-streaming variant of `api_url`: a trailing `/chat-stream` becomes `/chat`.
pub fn chat_url(api_url: &str) -> Result<String> {
    replace_last_segment(api_url, STREAM_SEGMENT, CHAT_SEGMENT)
}

fn replace_last_segment(api_url: &str, from: &str, to: &str) -> Result<String> {
    let api_url = api_url.trim();
    Url::parse(api_url)?;
    let (base, suffix) = api_url.split_at(api_url.find(['?', '#']).unwrap_or(api_url.len()));
    match base
        .strip_suffix(from)
        .filter(|parent| parent.ends_with('/') && !parent.ends_with("//"))
    {
        Some(parent) => Ok(format!("{parent}{to}{suffix}")),
        None => Ok(api_url.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "http://localhost:3000/api/ai/chat";

    #[test]
    fn chat_to_stream() {
        assert_eq!(
            stream_url(BASE).unwrap(),
            "http://localhost:3000/api/ai/chat-stream"
        );
    }

    #[test]
    fn stream_to_chat() {
        assert_eq!(
            chat_url("http://localhost:3000/api/ai/chat-stream").unwrap(),
            BASE
        );
    }

    #[test]
    fn transforms_are_idempotent() {
        let stream = stream_url(BASE).unwrap();
        assert_eq!(stream_url(&stream).unwrap(), stream);
        assert_eq!(chat_url(BASE).unwrap(), BASE);
    }

    #[test]
    fn transforms_are_inverses() {
        for base in [
            BASE,
            "http://127.0.0.1:8080/chat",
            "https://example.com/v1/proxy/chat?key=abc&model=x",
            "http://localhost:3000/api/ai/chat#frag",
        ] {
            let stream = stream_url(base).unwrap();
            assert_ne!(stream, base);
            assert_eq!(chat_url(&stream).unwrap(), base);
        }
    }

    #[test]
    fn query_string_is_preserved() {
        assert_eq!(
            stream_url("https://example.com/chat?stream=chat").unwrap(),
            "https://example.com/chat-stream?stream=chat"
        );
    }

    #[test]
    fn only_trailing_segment_changes() {
        assert_eq!(
            stream_url("http://localhost/chat/other").unwrap(),
            "http://localhost/chat/other"
        );
        assert_eq!(
            chat_url("http://localhost/chat-stream/chat").unwrap(),
            "http://localhost/chat-stream/chat"
        );
        assert_eq!(
            stream_url("http://localhost/mychat").unwrap(),
            "http://localhost/mychat"
        );
    }

    #[test]
    fn surrounding_whitespace_is_ignored() {
        assert_eq!(
            stream_url("  http://localhost:3000/chat \n").unwrap(),
            "http://localhost:3000/chat-stream"
        );
    }

    #[test]
    fn url_is_not_normalized() {
        for base in [
            "http://LocalHost:3000/api/ai/chat",
            "http://localhost:80/api/chat",
            "http://localhost:3000/a b/chat",
            "http://localhost:3000/my%7Eapi/../v1/chat",
        ] {
            let stream = stream_url(base).unwrap();
            assert_eq!(stream, format!("{base}-stream"));
            assert_eq!(chat_url(&stream).unwrap(), base);
        }
    }

    #[test]
    fn host_named_chat_is_left_alone() {
        assert_eq!(stream_url("http://chat").unwrap(), "http://chat");
        assert_eq!(
            stream_url("http://chat/?q=chat").unwrap(),
            "http://chat/?q=chat"
        );
    }

    #[test]
    fn invalid_url_is_an_error() {
        assert!(stream_url("not a url").is_err());
        assert!(chat_url("").is_err());
    }
}
