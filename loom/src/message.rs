//! Chat message shape shared by the LLM contract and the decision core.

use serde::{Deserialize, Serialize};

/// A single turn in the conversation sent to the model.
///
/// `Tool` messages must carry a `tool_call_id` matching one of the ids emitted by the
/// preceding `Assistant` message's tool calls.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum Message {
    System(String),
    User(String),
    Assistant(String),
    Tool { content: String, tool_call_id: String },
}

impl Message {
    pub fn content(&self) -> &str {
        match self {
            Message::System(s) | Message::User(s) | Message::Assistant(s) => s,
            Message::Tool { content, .. } => content,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_accessor_covers_all_variants() {
        assert_eq!(Message::System("a".into()).content(), "a");
        assert_eq!(Message::User("b".into()).content(), "b");
        assert_eq!(Message::Assistant("c".into()).content(), "c");
        assert_eq!(
            Message::Tool { content: "d".into(), tool_call_id: "1".into() }.content(),
            "d"
        );
    }
}
