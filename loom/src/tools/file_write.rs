//! `file_write`: create or overwrite a file under the working folder.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::tool::{Tool, ToolCallContent, ToolCallContext, ToolSourceError, ToolSpec};

use super::path::resolve_path_under;

pub const TOOL_FILE_WRITE: &str = "file_write";

pub struct FileWriteTool {
    working_folder: Arc<PathBuf>,
}

impl FileWriteTool {
    pub fn new(working_folder: Arc<PathBuf>) -> Self {
        Self { working_folder }
    }
}

#[async_trait]
impl Tool for FileWriteTool {
    fn name(&self) -> &str {
        TOOL_FILE_WRITE
    }

    fn spec(&self) -> ToolSpec {
        ToolSpec {
            description: "Create or overwrite a file under the working folder with the given content.".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "path": {"type": "string"},
                    "content": {"type": "string"},
                },
                "required": ["path", "content"],
            }),
        }
    }

    async fn call(&self, args: Value, _ctx: Option<&ToolCallContext>) -> Result<ToolCallContent, ToolSourceError> {
        let path = args
            .get("path")
            .and_then(|v| v.as_str())
            .ok_or_else(|| ToolSourceError::InvalidArguments("missing path".into()))?;
        let content = args
            .get("content")
            .and_then(|v| v.as_str())
            .ok_or_else(|| ToolSourceError::InvalidArguments("missing content".into()))?;
        let resolved = resolve_path_under(&self.working_folder, path)?;
        if let Some(parent) = resolved.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| ToolSourceError::ExecutionFailed(format!("create parent dirs: {e}")))?;
        }
        std::fs::write(&resolved, content)
            .map_err(|e| ToolSourceError::ExecutionFailed(format!("write {path}: {e}")))?;
        Ok(format!("wrote {} bytes to {path}", content.len()).into())
    }
}
