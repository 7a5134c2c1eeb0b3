//! `file_read`: read a file's text content, relative to the working folder.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::tool::{Tool, ToolCallContent, ToolCallContext, ToolSourceError, ToolSpec};

use super::path::resolve_path_under;

pub const TOOL_FILE_READ: &str = "file_read";

pub struct FileReadTool {
    working_folder: Arc<PathBuf>,
}

impl FileReadTool {
    pub fn new(working_folder: Arc<PathBuf>) -> Self {
        Self { working_folder }
    }
}

#[async_trait]
impl Tool for FileReadTool {
    fn name(&self) -> &str {
        TOOL_FILE_READ
    }

    fn spec(&self) -> ToolSpec {
        ToolSpec {
            description: "Read the text content of a file under the working folder.".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {"path": {"type": "string"}},
                "required": ["path"],
            }),
        }
    }

    async fn call(&self, args: Value, _ctx: Option<&ToolCallContext>) -> Result<ToolCallContent, ToolSourceError> {
        let path = args
            .get("path")
            .and_then(|v| v.as_str())
            .ok_or_else(|| ToolSourceError::InvalidArguments("missing path".into()))?;
        let resolved = resolve_path_under(&self.working_folder, path)?;
        let content = std::fs::read_to_string(&resolved)
            .map_err(|e| ToolSourceError::ExecutionFailed(format!("read {path}: {e}")))?;
        Ok(content.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn reads_file_content() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), "hello").unwrap();
        let tool = FileReadTool::new(Arc::new(dir.path().to_path_buf()));
        let out = tool.call(json!({"path": "a.txt"}), None).await.unwrap();
        assert_eq!(out.output, "hello");
    }

    #[tokio::test]
    async fn missing_file_is_execution_error() {
        let dir = tempfile::tempdir().unwrap();
        let tool = FileReadTool::new(Arc::new(dir.path().to_path_buf()));
        let err = tool.call(json!({"path": "missing.txt"}), None).await.unwrap_err();
        assert!(matches!(err, ToolSourceError::ExecutionFailed(_)));
    }
}
