//! `file_delete`: delete a file under the working folder.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::tool::{Tool, ToolCallContent, ToolCallContext, ToolSourceError, ToolSpec};

use super::path::resolve_path_under;

pub const TOOL_FILE_DELETE: &str = "file_delete";

pub struct FileDeleteTool {
    working_folder: Arc<PathBuf>,
}

impl FileDeleteTool {
    pub fn new(working_folder: Arc<PathBuf>) -> Self {
        Self { working_folder }
    }
}

#[async_trait]
impl Tool for FileDeleteTool {
    fn name(&self) -> &str {
        TOOL_FILE_DELETE
    }

    fn spec(&self) -> ToolSpec {
        ToolSpec {
            description: "Delete a file under the working folder.".to_string(),
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
        std::fs::remove_file(&resolved)
            .map_err(|e| ToolSourceError::ExecutionFailed(format!("delete {path}: {e}")))?;
        Ok(format!("deleted {path}").into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn deletes_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), "x").unwrap();
        let tool = FileDeleteTool::new(Arc::new(dir.path().to_path_buf()));
        tool.call(json!({"path": "a.txt"}), None).await.unwrap();
        assert!(!dir.path().join("a.txt").exists());
    }
}
