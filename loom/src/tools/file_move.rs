//! `file_move`: rename/move a file within the working folder. A write tool (§4.7
//! `WRITE_TOOLS`) — invalidates the `file_read` cache entry of its source path.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::tool::{Tool, ToolCallContent, ToolCallContext, ToolSourceError, ToolSpec};

use super::path::resolve_path_under;

pub const TOOL_FILE_MOVE: &str = "file_move";

pub struct FileMoveTool {
    working_folder: Arc<PathBuf>,
}

impl FileMoveTool {
    pub fn new(working_folder: Arc<PathBuf>) -> Self {
        Self { working_folder }
    }
}

#[async_trait]
impl Tool for FileMoveTool {
    fn name(&self) -> &str {
        TOOL_FILE_MOVE
    }

    fn spec(&self) -> ToolSpec {
        ToolSpec {
            description: "Move or rename a file within the working folder.".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "path": {"type": "string", "description": "source path"},
                    "dest": {"type": "string", "description": "destination path"},
                },
                "required": ["path", "dest"],
            }),
        }
    }

    async fn call(&self, args: Value, _ctx: Option<&ToolCallContext>) -> Result<ToolCallContent, ToolSourceError> {
        let path = args
            .get("path")
            .and_then(|v| v.as_str())
            .ok_or_else(|| ToolSourceError::InvalidArguments("missing path".into()))?;
        let dest = args
            .get("dest")
            .and_then(|v| v.as_str())
            .ok_or_else(|| ToolSourceError::InvalidArguments("missing dest".into()))?;
        let resolved_src = resolve_path_under(&self.working_folder, path)?;
        let resolved_dest = resolve_path_under(&self.working_folder, dest)?;
        if let Some(parent) = resolved_dest.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| ToolSourceError::ExecutionFailed(format!("create parent dirs: {e}")))?;
        }
        std::fs::rename(&resolved_src, &resolved_dest)
            .map_err(|e| ToolSourceError::ExecutionFailed(format!("move {path} to {dest}: {e}")))?;
        Ok(format!("moved {path} to {dest}").into())
    }
}
