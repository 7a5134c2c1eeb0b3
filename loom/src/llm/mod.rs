//! LLM provider contract used by the decide/think/answer nodes and session compaction.
//!
//! This crate ships the trait and a deterministic test double ([`MockLlm`]); a concrete
//! vendor client is an external collaborator and is not implemented here.

use async_trait::async_trait;
use tokio::sync::{mpsc, Mutex};

use crate::error::AgentError;
use crate::message::Message;

/// Tool choice mode for chat completions: when tools are present, controls whether
/// the model may choose (auto), must not use (none), or must use (required).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ToolChoiceMode {
    #[default]
    Auto,
    None,
    Required,
}

impl std::str::FromStr for ToolChoiceMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "none" => Ok(Self::None),
            "required" => Ok(Self::Required),
            _ => Err(format!(
                "unknown tool_choice: {s} (use auto, none, or required)"
            )),
        }
    }
}

/// A structured tool-call request produced by the model (the `fc` decode path).
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct ToolCallRequest {
    pub id: Option<String>,
    pub name: String,
    /// Raw JSON-object arguments as returned by the model.
    pub arguments: serde_json::Value,
}

/// Delta for one tool call from LLM streaming (for tool_call_chunk events).
#[derive(Clone, Debug)]
pub struct ToolCallDelta {
    pub call_id: Option<String>,
    pub name: Option<String>,
    pub arguments_delta: String,
}

/// Token usage for one LLM call (prompt + completion).
#[derive(Clone, Copy, Debug, Default, serde::Serialize, serde::Deserialize)]
pub struct LlmUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

impl std::ops::Add for LlmUsage {
    type Output = LlmUsage;

    fn add(self, rhs: LlmUsage) -> LlmUsage {
        LlmUsage {
            prompt_tokens: self.prompt_tokens + rhs.prompt_tokens,
            completion_tokens: self.completion_tokens + rhs.completion_tokens,
            total_tokens: self.total_tokens + rhs.total_tokens,
        }
    }
}

/// Response from an LLM completion: assistant text and/or structured tool calls.
#[derive(Clone, Debug, Default)]
pub struct LlmResponse {
    pub content: String,
    pub tool_calls: Vec<ToolCallRequest>,
    pub usage: Option<LlmUsage>,
}

/// One streamed token of assistant content.
#[derive(Clone, Debug)]
pub struct MessageChunk {
    pub content: String,
}

/// LLM client: given messages, returns assistant text and/or structured tool calls.
///
/// Implementations: [`MockLlm`] (fixed/scripted response, for tests and the `cli` demo).
/// Default method bodies let a minimal implementation only provide [`LlmClient::invoke`].
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Plain chat completion: no tool definitions offered.
    async fn invoke(&self, messages: &[Message]) -> Result<LlmResponse, AgentError>;

    /// Streaming variant. Default: call `invoke` and forward the full content as one chunk.
    async fn invoke_stream(
        &self,
        messages: &[Message],
        chunk_tx: Option<mpsc::Sender<MessageChunk>>,
    ) -> Result<LlmResponse, AgentError> {
        let response = self.invoke(messages).await?;
        if let Some(tx) = chunk_tx {
            if !response.content.is_empty() {
                let _ = tx
                    .send(MessageChunk {
                        content: response.content.clone(),
                    })
                    .await;
            }
        }
        Ok(response)
    }

    /// Streaming variant with tool-call-argument deltas. Default: delegates to `invoke_stream`.
    async fn invoke_stream_with_tool_delta(
        &self,
        messages: &[Message],
        chunk_tx: Option<mpsc::Sender<MessageChunk>>,
        _tool_delta_tx: Option<mpsc::Sender<ToolCallDelta>>,
    ) -> Result<LlmResponse, AgentError> {
        self.invoke_stream(messages, chunk_tx).await
    }

    /// Structured tool-call completion: the model is offered `tool_defs` (each a
    /// `{name, description, parameters}` JSON object) and may respond with
    /// `LlmResponse::tool_calls` instead of, or alongside, text.
    ///
    /// Default implementation ignores `tool_defs` and delegates to `invoke` — correct for
    /// a provider that cannot do structured calls, wrong for one that can; a capable
    /// implementation should override this.
    async fn invoke_with_tools(
        &self,
        messages: &[Message],
        _tool_defs: &[serde_json::Value],
    ) -> Result<LlmResponse, AgentError> {
        self.invoke(messages).await
    }

    /// Whether this provider can be asked for structured tool calls via
    /// [`LlmClient::invoke_with_tools`]. Gates the `auto` tool-call-mode's initial choice
    /// of decode path.
    fn is_tool_calling_enabled(&self) -> bool {
        false
    }
}

/// A scripted, deterministic [`LlmClient`] for tests and the `cli` demo binary.
///
/// Holds a queue of responses; each call to `invoke`/`invoke_with_tools` pops the next
/// one. When the queue is empty, returns a fixed fallback response so a misconfigured
/// test fails loudly rather than hanging.
pub struct MockLlm {
    responses: Mutex<Vec<LlmResponse>>,
    tool_calling_enabled: bool,
}

impl MockLlm {
    pub fn new(responses: Vec<LlmResponse>) -> Self {
        Self {
            responses: Mutex::new(responses),
            tool_calling_enabled: true,
        }
    }

    pub fn with_tool_calling_enabled(mut self, enabled: bool) -> Self {
        self.tool_calling_enabled = enabled;
        self
    }

    pub fn text(content: impl Into<String>) -> LlmResponse {
        LlmResponse {
            content: content.into(),
            tool_calls: vec![],
            usage: None,
        }
    }

    pub fn tool_call(name: impl Into<String>, arguments: serde_json::Value) -> LlmResponse {
        LlmResponse {
            content: String::new(),
            tool_calls: vec![ToolCallRequest {
                id: Some(uuid::Uuid::new_v4().to_string()),
                name: name.into(),
                arguments,
            }],
            usage: None,
        }
    }
}

#[async_trait]
impl LlmClient for MockLlm {
    async fn invoke(&self, _messages: &[Message]) -> Result<LlmResponse, AgentError> {
        let mut responses = self.responses.lock().await;
        if responses.is_empty() {
            return Ok(LlmResponse {
                content: "MockLlm: no scripted response left".to_string(),
                tool_calls: vec![],
                usage: None,
            });
        }
        Ok(responses.remove(0))
    }

    async fn invoke_with_tools(
        &self,
        messages: &[Message],
        _tool_defs: &[serde_json::Value],
    ) -> Result<LlmResponse, AgentError> {
        self.invoke(messages).await
    }

    fn is_tool_calling_enabled(&self) -> bool {
        self.tool_calling_enabled
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tool_choice_mode_from_str_parses_known_values() {
        assert_eq!("auto".parse::<ToolChoiceMode>().unwrap(), ToolChoiceMode::Auto);
        assert_eq!("none".parse::<ToolChoiceMode>().unwrap(), ToolChoiceMode::None);
        assert_eq!(
            "required".parse::<ToolChoiceMode>().unwrap(),
            ToolChoiceMode::Required
        );
    }

    #[test]
    fn tool_choice_mode_from_str_rejects_unknown_value() {
        let err = "unexpected".parse::<ToolChoiceMode>().unwrap_err();
        assert!(err.contains("unknown tool_choice"));
    }

    #[tokio::test]
    async fn mock_llm_pops_responses_in_order() {
        let llm = MockLlm::new(vec![MockLlm::text("first"), MockLlm::text("second")]);
        assert_eq!(llm.invoke(&[]).await.unwrap().content, "first");
        assert_eq!(llm.invoke(&[]).await.unwrap().content, "second");
        assert!(llm.invoke(&[]).await.unwrap().content.contains("no scripted response"));
    }

    #[tokio::test]
    async fn default_invoke_stream_sends_single_chunk_when_enabled() {
        let llm = MockLlm::new(vec![MockLlm::text("hello")]);
        let (tx, mut rx) = mpsc::channel(2);
        let resp = llm.invoke_stream(&[], Some(tx)).await.unwrap();
        assert_eq!(resp.content, "hello");
        let chunk = rx.recv().await.expect("one chunk");
        assert_eq!(chunk.content, "hello");
    }
}
