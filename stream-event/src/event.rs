//! Event vocabulary for the agent decision core's external stream surface.
//!
//! Envelope (session_id, node_id, event_id) is applied separately by [`crate::envelope`].

use serde::Serialize;
use serde_json::Value;

/// One event on the agent's stream: opaque status updates, decide/think steps, tool
/// steps, streamed answer chunks, plan updates, the terminal solution, and errors.
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProtocolEvent {
    /// Opaque progress message, not tied to a specific step.
    Status { message: String },
    /// A decide or think step completed.
    Step {
        step_number: u32,
        kind: String,
        reason: String,
    },
    /// A tool step completed.
    Tool {
        step_number: u32,
        tool_name: String,
        is_error: bool,
        duration_ms: u64,
    },
    /// One chunk of the streamed final answer.
    Chunk { content: String },
    /// The plan changed.
    Plan { steps: Vec<Value> },
    /// Terminal event: the final solution plus run statistics.
    Done {
        solution: String,
        total_steps: u32,
        prompt_tokens: u32,
        completion_tokens: u32,
    },
    /// Terminal event: the run could not produce a solution.
    Error { message: String },
}

impl ProtocolEvent {
    /// Serializes this event to a JSON object (type + payload only; no envelope).
    pub fn to_value(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tagged_serialization_uses_snake_case_type() {
        let event = ProtocolEvent::Tool {
            step_number: 2,
            tool_name: "file_read".into(),
            is_error: false,
            duration_ms: 12,
        };
        let v = event.to_value().unwrap();
        assert_eq!(v["type"], "tool");
        assert_eq!(v["tool_name"], "file_read");
    }
}
