use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// The most recent successful exchange, as persisted between runs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LastExchange {
    /// What the user typed (before any prompt augmentation).
    pub user_text: String,

    /// The complete assistant reply.
    pub assistant_text: String,

    /// When the exchange completed, in milliseconds since the Unix epoch.
    pub ts: i64,
}

impl LastExchange {
    /// Record an exchange stamped with the current time.
    pub fn now(user_text: impl Into<String>, assistant_text: impl Into<String>) -> Self {
        let millis = OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000;
        Self {
            user_text: user_text.into(),
            assistant_text: assistant_text.into(),
            ts: millis as i64,
        }
    }

    /// Whether both halves carry text and can seed a transcript.
    pub fn is_complete(&self) -> bool {
        !self.user_text.is_empty() && !self.assistant_text.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, to_value};

    #[test]
    fn serializes_camel_case() {
        let exchange = LastExchange {
            user_text: "2+2?".to_string(),
            assistant_text: "4".to_string(),
            ts: 1_700_000_000_000,
        };
        assert_eq!(
            to_value(&exchange).unwrap(),
            json!({"userText": "2+2?", "assistantText": "4", "ts": 1_700_000_000_000i64})
        );
    }

    #[test]
    fn now_uses_epoch_millis() {
        let exchange = LastExchange::now("q", "a");
        // Any time after 2020-01-01 expressed in milliseconds.
        assert!(exchange.ts > 1_577_836_800_000);
        assert!(exchange.is_complete());
    }

    #[test]
    fn incomplete_without_reply() {
        let exchange = LastExchange::now("q", "");
        assert!(!exchange.is_complete());
    }
}
