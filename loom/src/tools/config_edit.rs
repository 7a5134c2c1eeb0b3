//! `config_edit`: set a single key in a JSON config file under the working folder.
//! A write tool in spirit (it mutates persistent state) but outside `WRITE_TOOLS` since
//! it has no `file_read:<path>` counterpart to invalidate.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Map, Value};

use crate::tool::{Tool, ToolCallContent, ToolCallContext, ToolSourceError, ToolSpec};

use super::path::resolve_path_under;

pub const TOOL_CONFIG_EDIT: &str = "config_edit";
const CONFIG_FILE: &str = "agent_config.json";

pub struct ConfigEditTool {
    working_folder: Arc<PathBuf>,
}

impl ConfigEditTool {
    pub fn new(working_folder: Arc<PathBuf>) -> Self {
        Self { working_folder }
    }
}

#[async_trait]
impl Tool for ConfigEditTool {
    fn name(&self) -> &str {
        TOOL_CONFIG_EDIT
    }

    fn spec(&self) -> ToolSpec {
        ToolSpec {
            description: "Set a key/value pair in the session's config file.".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "key": {"type": "string"},
                    "value": {"type": "string"},
                },
                "required": ["key", "value"],
            }),
        }
    }

    async fn call(&self, args: Value, _ctx: Option<&ToolCallContext>) -> Result<ToolCallContent, ToolSourceError> {
        let key = args
            .get("key")
            .and_then(|v| v.as_str())
            .ok_or_else(|| ToolSourceError::InvalidArguments("missing key".into()))?;
        let value = args
            .get("value")
            .and_then(|v| v.as_str())
            .ok_or_else(|| ToolSourceError::InvalidArguments("missing value".into()))?;

        let resolved = resolve_path_under(&self.working_folder, CONFIG_FILE)?;
        let mut config: Map<String, Value> = match std::fs::read_to_string(&resolved) {
            Ok(text) => serde_json::from_str(&text)
                .map_err(|e| ToolSourceError::ExecutionFailed(format!("parse {CONFIG_FILE}: {e}")))?,
            Err(_) => Map::new(),
        };
        config.insert(key.to_string(), Value::String(value.to_string()));

        let serialized = serde_json::to_string_pretty(&config)
            .map_err(|e| ToolSourceError::ExecutionFailed(format!("serialize config: {e}")))?;
        std::fs::write(&resolved, serialized)
            .map_err(|e| ToolSourceError::ExecutionFailed(format!("write {CONFIG_FILE}: {e}")))?;
        Ok(format!("set {key} = {value}").into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn sets_new_key_in_fresh_config() {
        let dir = tempfile::tempdir().unwrap();
        let tool = ConfigEditTool::new(Arc::new(dir.path().to_path_buf()));
        tool.call(json!({"key": "timeout", "value": "30"}), None).await.unwrap();
        let content = std::fs::read_to_string(dir.path().join(CONFIG_FILE)).unwrap();
        assert!(content.contains("\"timeout\""));
        assert!(content.contains("\"30\""));
    }

    #[tokio::test]
    async fn preserves_existing_keys_when_adding_a_new_one() {
        let dir = tempfile::tempdir().unwrap();
        let tool = ConfigEditTool::new(Arc::new(dir.path().to_path_buf()));
        tool.call(json!({"key": "a", "value": "1"}), None).await.unwrap();
        tool.call(json!({"key": "b", "value": "2"}), None).await.unwrap();
        let content = std::fs::read_to_string(dir.path().join(CONFIG_FILE)).unwrap();
        assert!(content.contains("\"a\""));
        assert!(content.contains("\"b\""));
    }
}
