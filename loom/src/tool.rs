//! The tool contract: what a callable capability looks like to the tool node.

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::message::Message;
use crate::stream::ToolStreamWriter;

/// A tool's declared shape: human prose for prompt assembly and a JSON Schema for the
/// structured decode path's tool definitions.
#[derive(Clone, Debug)]
pub struct ToolSpec {
    pub description: String,
    pub input_schema: Value,
}

/// Context made available to a tool call: recent conversation, a stream writer for
/// progress events, and session identifiers. None of these are required — a tool that
/// ignores `ctx` entirely is valid.
#[derive(Clone, Default)]
pub struct ToolCallContext {
    pub recent_messages: Vec<Message>,
    pub stream_writer: Option<ToolStreamWriter>,
    pub thread_id: Option<String>,
    pub user_id: Option<String>,
}

/// A tool's successful output.
#[derive(Clone, Debug, Default)]
pub struct ToolCallContent {
    pub output: String,
}

impl From<String> for ToolCallContent {
    fn from(output: String) -> Self {
        ToolCallContent { output }
    }
}

impl From<&str> for ToolCallContent {
    fn from(output: &str) -> Self {
        ToolCallContent { output: output.to_string() }
    }
}

#[derive(Error, Debug, Clone)]
pub enum ToolSourceError {
    #[error("tool not found: {0}")]
    NotFound(String),
    #[error("invalid arguments: {0}")]
    InvalidArguments(String),
    #[error("tool execution failed: {0}")]
    ExecutionFailed(String),
}

/// A callable capability the decide node may invoke.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Stable identifier used in cache keys, guardrail detection tables, and prompts.
    fn name(&self) -> &str;

    fn spec(&self) -> ToolSpec;

    async fn call(
        &self,
        args: Value,
        ctx: Option<&ToolCallContext>,
    ) -> Result<ToolCallContent, ToolSourceError>;
}
