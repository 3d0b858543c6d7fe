//! Server-sent event decoding for streamed chat replies.
//!
//! The intermediary frames its reply as events separated by a blank line, each
//! carrying one or more `data:` lines whose payload is a JSON object of the form
//! `{"message": {"content": "..."}, "done": false}`.  [`FrameDecoder`] turns
//! the raw byte chunks of such a body into [`StreamFrame`]s.

use bytes::{Buf, BytesMut};
use serde_json::Value;

use crate::observability::{STREAM_FRAMES, STREAM_MALFORMED_FRAMES};
use crate::types::StreamFrame;

const EVENT_SEPARATOR: &[u8] = b"\n\n";
const DATA_PREFIX: &str = "data:";

/// Incremental decoder for one event-stream body.
///
/// Bytes are buffered until a complete event (terminated by a blank line) is
/// available.  Events are split on raw bytes before they are decoded as UTF-8,
/// so a character whose encoding straddles two chunks is reassembled before it
/// is ever looked at.  A decoder belongs to exactly one stream.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    buffer: BytesMut,
}

impl FrameDecoder {
    /// Creates a decoder with an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed the next chunk of the body and return every frame it completes.
    ///
    /// Frames are returned in wire order.  A trailing partial event stays
    /// buffered for the next call.
    pub fn decode(&mut self, chunk: &[u8]) -> Vec<StreamFrame> {
        self.buffer.extend_from_slice(chunk);
        let mut frames = Vec::new();
        while let Some(end) = find_separator(&self.buffer) {
            let event = self.buffer.split_to(end);
            self.buffer.advance(EVENT_SEPARATOR.len());
            decode_event(&event, &mut frames);
        }
        frames
    }

    /// Consume the decoder at end-of-stream.
    ///
    /// Whatever is left in the buffer is treated as one final event, which
    /// recovers the last frame of servers that omit the closing blank line.
    pub fn finish(self) -> Vec<StreamFrame> {
        let mut frames = Vec::new();
        if !self.buffer.is_empty() {
            decode_event(&self.buffer, &mut frames);
        }
        frames
    }

    /// Number of buffered bytes that do not yet form a complete event.
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }
}

fn find_separator(buffer: &[u8]) -> Option<usize> {
    buffer
        .windows(EVENT_SEPARATOR.len())
        .position(|window| window == EVENT_SEPARATOR)
}

/// Decode a single complete event into frames.
fn decode_event(event: &[u8], frames: &mut Vec<StreamFrame>) {
    let text = String::from_utf8_lossy(event);
    for line in text.split('\n') {
        let Some(payload) = line.strip_prefix(DATA_PREFIX).map(str::trim) else {
            continue;
        };
        if payload.is_empty() {
            continue;
        }
        let object = match serde_json::from_str::<Value>(payload) {
            Ok(value @ Value::Object(_)) => value,
            Ok(_) => {
                tracing::debug!(payload, "dropping non-object stream frame");
                STREAM_MALFORMED_FRAMES.click();
                continue;
            }
            Err(err) => {
                tracing::debug!(payload, error = %err, "dropping malformed stream frame");
                STREAM_MALFORMED_FRAMES.click();
                continue;
            }
        };
        STREAM_FRAMES.click();

        let content = object.pointer("/message/content");
        if is_truthy(content) {
            frames.push(StreamFrame::Delta(content_text(content)));
        }

        // The rest of this event is ignored once the server says it is done.
        if is_truthy(object.get("done")) {
            frames.push(StreamFrame::Done);
            break;
        }
    }
}

/// Loose truthiness: absent, `null`, `false`, `0` and `""` are false.
fn is_truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(_) | Value::Object(_)) => true,
    }
}

/// Text of a content field; non-string values are rendered as JSON.
fn content_text(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(text)) => text.clone(),
        Some(other) => other.to_string(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BODY: &str = concat!(
        "data: {\"message\":{\"content\":\"Hé\"}}\n\n",
        "event: message\ndata: {\"message\":{\"content\":\"llo, \"}}\n\n",
        "data: {\"message\":{\"content\":\"wörld 🌍\"}}\n\n",
        "data: {\"message\":{\"content\":\"!\"},\"done\":true}\n\n",
    );

    fn deltas(frames: &[StreamFrame]) -> Vec<String> {
        frames
            .iter()
            .filter_map(|frame| frame.text().map(str::to_string))
            .collect()
    }

    fn decode_in_chunks(body: &[u8], boundaries: &[usize]) -> Vec<StreamFrame> {
        let mut decoder = FrameDecoder::new();
        let mut frames = Vec::new();
        let mut start = 0;
        for &end in boundaries {
            frames.extend(decoder.decode(&body[start..end]));
            start = end;
        }
        frames.extend(decoder.decode(&body[start..]));
        frames.extend(decoder.finish());
        frames
    }

    #[test]
    fn decodes_whole_body() {
        let frames = decode_in_chunks(BODY.as_bytes(), &[]);
        assert_eq!(
            frames,
            vec![
                StreamFrame::Delta("Hé".to_string()),
                StreamFrame::Delta("llo, ".to_string()),
                StreamFrame::Delta("wörld 🌍".to_string()),
                StreamFrame::Delta("!".to_string()),
                StreamFrame::Done,
            ]
        );
    }

    #[test]
    fn chunk_boundaries_do_not_change_output() {
        let body = BODY.as_bytes();
        let expected = decode_in_chunks(body, &[]);
        // Every single split point, which covers splits inside the multi-byte
        // characters, inside `data:`, and exactly on event boundaries.
        for split in 1..body.len() {
            assert_eq!(
                decode_in_chunks(body, &[split]),
                expected,
                "split at byte {split}"
            );
        }
        // And one byte at a time.
        let every_byte: Vec<usize> = (1..body.len()).collect();
        assert_eq!(decode_in_chunks(body, &every_byte), expected);
    }

    #[test]
    fn split_inside_multibyte_character() {
        let body = "data: {\"message\":{\"content\":\"🌍\"}}\n\n".as_bytes();
        let emoji_start = body.iter().position(|b| *b == 0xF0).unwrap();
        let mut decoder = FrameDecoder::new();
        assert!(decoder.decode(&body[..emoji_start + 2]).is_empty());
        let frames = decoder.decode(&body[emoji_start + 2..]);
        assert_eq!(frames, vec![StreamFrame::Delta("🌍".to_string())]);
        assert_eq!(decoder.pending(), 0);
    }

    #[test]
    fn partial_event_is_buffered() {
        let mut decoder = FrameDecoder::new();
        assert!(decoder.decode(b"data: {\"message\":{\"con").is_empty());
        assert!(decoder.pending() > 0);
        let frames = decoder.decode(b"tent\":\"Hi\"}}\n\n");
        assert_eq!(deltas(&frames), vec!["Hi"]);
    }

    #[test]
    fn malformed_line_is_dropped() {
        let mut decoder = FrameDecoder::new();
        let frames = decoder.decode(
            b"data: {not json\n\ndata: [1,2]\n\ndata: {\"message\":{\"content\":\"ok\"}}\n\n",
        );
        assert_eq!(frames, vec![StreamFrame::Delta("ok".to_string())]);
    }

    #[test]
    fn empty_and_foreign_lines_are_skipped() {
        let mut decoder = FrameDecoder::new();
        let frames = decoder.decode(
            b": keep-alive\n\ndata:\n\nid: 7\ndata:   \n\ndata: {\"message\":{\"content\":\"\"}}\n\n",
        );
        assert!(frames.is_empty());
    }

    #[test]
    fn done_stops_the_rest_of_the_event() {
        let mut decoder = FrameDecoder::new();
        let frames = decoder.decode(concat!(
            "data: {\"message\":{\"content\":\"a\"},\"done\":true}\n",
            "data: {\"message\":{\"content\":\"ignored\"}}\n\n",
            "data: {\"message\":{\"content\":\"b\"}}\n\n",
        )
        .as_bytes());
        // The decoder does not end the stream; later events still decode.
        assert_eq!(
            frames,
            vec![
                StreamFrame::Delta("a".to_string()),
                StreamFrame::Done,
                StreamFrame::Delta("b".to_string()),
            ]
        );
    }

    #[test]
    fn non_boolean_done_is_honored() {
        let mut decoder = FrameDecoder::new();
        let frames = decoder.decode(
            b"data: {\"message\":{\"content\":\"a\"},\"done\":1}\ndata: {\"message\":{\"content\":\"late\"}}\n\n",
        );
        assert_eq!(
            frames,
            vec![StreamFrame::Delta("a".to_string()), StreamFrame::Done]
        );

        let frames = decoder.decode(
            b"data: {\"message\":{\"content\":\"b\"},\"done\":\"true\"}\ndata: {\"message\":{\"content\":\"late\"}}\n\n",
        );
        assert_eq!(
            frames,
            vec![StreamFrame::Delta("b".to_string()), StreamFrame::Done]
        );
    }

    #[test]
    fn falsy_done_keeps_reading_the_event() {
        let mut decoder = FrameDecoder::new();
        let frames = decoder.decode(concat!(
            "data: {\"message\":{\"content\":\"a\"},\"done\":0}\n",
            "data: {\"message\":{\"content\":\"b\"},\"done\":\"\"}\n",
            "data: {\"message\":{\"content\":\"c\"},\"done\":null}\n",
            "data: {\"message\":{\"content\":\"d\"},\"done\":false}\n\n",
        )
        .as_bytes());
        assert_eq!(deltas(&frames), vec!["a", "b", "c", "d"]);
        assert!(!frames.contains(&StreamFrame::Done));
    }

    #[test]
    fn non_string_content_is_stringified() {
        let mut decoder = FrameDecoder::new();
        let frames = decoder.decode(concat!(
            "data: {\"message\":{\"content\":42}}\n\n",
            "data: {\"message\":{\"content\":1.5}}\n\n",
            "data: {\"message\":{\"content\":true}}\n\n",
            "data: {\"message\":{\"content\":0}}\n\n",
            "data: {\"message\":{\"content\":null}}\n\n",
            "data: {\"message\":{\"content\":false}}\n\n",
        )
        .as_bytes());
        assert_eq!(deltas(&frames), vec!["42", "1.5", "true"]);
    }

    #[test]
    fn done_without_content() {
        let mut decoder = FrameDecoder::new();
        let frames = decoder.decode(b"data: {\"done\":true}\n\n");
        assert_eq!(frames, vec![StreamFrame::Done]);
    }

    #[test]
    fn multiple_data_lines_in_one_event() {
        let mut decoder = FrameDecoder::new();
        let frames = decoder.decode(
            b"data: {\"message\":{\"content\":\"a\"}}\ndata: {\"message\":{\"content\":\"b\"}}\n\n",
        );
        assert_eq!(deltas(&frames), vec!["a", "b"]);
    }

    #[test]
    fn carriage_returns_are_tolerated() {
        let mut decoder = FrameDecoder::new();
        let frames = decoder.decode(b"data: {\"message\":{\"content\":\"x\"}}\r\n\n");
        assert_eq!(deltas(&frames), vec!["x"]);
    }

    #[test]
    fn finish_flushes_unterminated_event() {
        let mut decoder = FrameDecoder::new();
        assert!(decoder
            .decode(b"data: {\"message\":{\"content\":\"tail\"},\"done\":true}")
            .is_empty());
        assert_eq!(
            decoder.finish(),
            vec![StreamFrame::Delta("tail".to_string()), StreamFrame::Done]
        );
    }

    #[test]
    fn finish_on_empty_buffer() {
        assert!(FrameDecoder::new().finish().is_empty());
    }
}
