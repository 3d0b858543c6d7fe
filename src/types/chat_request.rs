use serde::Serialize;

use crate::types::Message;

/// Request body accepted by both the `/chat` and `/chat-stream` endpoints.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ChatRequest<'a> {
    /// The full message sequence the model should see.
    pub messages: &'a [Message],

    /// The model identifier.
    pub model: &'a str,
}

impl<'a> ChatRequest<'a> {
    /// Create a request for `model` over `messages`.
    pub fn new(messages: &'a [Message], model: &'a str) -> Self {
        Self { messages, model }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, to_value};

    #[test]
    fn request_shape() {
        let messages = vec![Message::system("sys"), Message::user("hi")];
        let request = ChatRequest::new(&messages, "dolphin-llama3");
        assert_eq!(
            to_value(&request).unwrap(),
            json!({
                "messages": [
                    {"role": "system", "content": "sys"},
                    {"role": "user", "content": "hi"}
                ],
                "model": "dolphin-llama3"
            })
        );
    }
}
