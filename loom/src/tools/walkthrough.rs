//! `walkthrough`: a meta-tool that writes a manual narrative entry to the walkthrough
//! store (§4.7 meta-tool guard, §4.9 per-request registry).

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::memory::{WalkthroughEntry, WalkthroughStore};
use crate::tool::{Tool, ToolCallContent, ToolCallContext, ToolSourceError, ToolSpec};

pub const TOOL_WALKTHROUGH: &str = "walkthrough";

pub struct WalkthroughTool {
    walkthrough_store: std::sync::Arc<dyn WalkthroughStore>,
    session_id: String,
}

impl WalkthroughTool {
    pub fn new(walkthrough_store: std::sync::Arc<dyn WalkthroughStore>, session_id: impl Into<String>) -> Self {
        Self { walkthrough_store, session_id: session_id.into() }
    }
}

#[async_trait]
impl Tool for WalkthroughTool {
    fn name(&self) -> &str {
        TOOL_WALKTHROUGH
    }

    fn spec(&self) -> ToolSpec {
        ToolSpec {
            description: "Record a note about what you've done so far, for your own later reference.".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {"note": {"type": "string"}},
                "required": ["note"],
            }),
        }
    }

    async fn call(&self, args: Value, _ctx: Option<&ToolCallContext>) -> Result<ToolCallContent, ToolSourceError> {
        let note = args
            .get("note")
            .and_then(|v| v.as_str())
            .ok_or_else(|| ToolSourceError::InvalidArguments("missing note".into()))?;
        self.walkthrough_store
            .append(&self.session_id, WalkthroughEntry { content: note.to_string(), auto: false })
            .await;
        Ok("noted".into())
    }
}
