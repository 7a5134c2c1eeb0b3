//! `mcp_server_list`: lists configured MCP servers. Deliberately excluded from
//! `CACHEABLE_TOOLS` (§9 open question) — server availability can change between calls,
//! so a cached answer could tell the model to use a server that's since gone away.

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::tool::{Tool, ToolCallContent, ToolCallContext, ToolSourceError, ToolSpec};

pub const TOOL_MCP_SERVER_LIST: &str = "mcp_server_list";

pub struct McpServerListTool {
    servers: Vec<String>,
}

impl McpServerListTool {
    pub fn new(servers: Vec<String>) -> Self {
        Self { servers }
    }
}

#[async_trait]
impl Tool for McpServerListTool {
    fn name(&self) -> &str {
        TOOL_MCP_SERVER_LIST
    }

    fn spec(&self) -> ToolSpec {
        ToolSpec {
            description: "List the MCP servers currently available to this session.".to_string(),
            input_schema: json!({"type": "object", "properties": {}}),
        }
    }

    async fn call(&self, _args: Value, _ctx: Option<&ToolCallContext>) -> Result<ToolCallContent, ToolSourceError> {
        if self.servers.is_empty() {
            return Ok("no MCP servers are configured".into());
        }
        Ok(self.servers.join("\n").into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn lists_configured_servers() {
        let tool = McpServerListTool::new(vec!["search".into(), "browser".into()]);
        let out = tool.call(json!({}), None).await.unwrap();
        assert_eq!(out.output, "search\nbrowser");
    }

    #[tokio::test]
    async fn empty_list_returns_informative_message() {
        let tool = McpServerListTool::new(vec![]);
        let out = tool.call(json!({}), None).await.unwrap();
        assert!(out.output.contains("no MCP servers"));
    }
}
