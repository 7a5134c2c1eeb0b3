//! `file_patch`: replace one exact occurrence of `find` with `replace` in a file.
//!
//! A minimal stand-in for a real apply-patch/multiedit tool — enough to exercise the
//! write-tool cache-invalidation path without a diff parser.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::tool::{Tool, ToolCallContent, ToolCallContext, ToolSourceError, ToolSpec};

use super::path::resolve_path_under;

pub const TOOL_FILE_PATCH: &str = "file_patch";

pub struct FilePatchTool {
    working_folder: Arc<PathBuf>,
}

impl FilePatchTool {
    pub fn new(working_folder: Arc<PathBuf>) -> Self {
        Self { working_folder }
    }
}

#[async_trait]
impl Tool for FilePatchTool {
    fn name(&self) -> &str {
        TOOL_FILE_PATCH
    }

    fn spec(&self) -> ToolSpec {
        ToolSpec {
            description: "Replace the first occurrence of `find` with `replace` in a file.".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "path": {"type": "string"},
                    "find": {"type": "string"},
                    "replace": {"type": "string"},
                },
                "required": ["path", "find", "replace"],
            }),
        }
    }

    async fn call(&self, args: Value, _ctx: Option<&ToolCallContext>) -> Result<ToolCallContent, ToolSourceError> {
        let path = args.get("path").and_then(|v| v.as_str()).ok_or_else(|| ToolSourceError::InvalidArguments("missing path".into()))?;
        let find = args.get("find").and_then(|v| v.as_str()).ok_or_else(|| ToolSourceError::InvalidArguments("missing find".into()))?;
        let replace = args.get("replace").and_then(|v| v.as_str()).unwrap_or("");
        let resolved = resolve_path_under(&self.working_folder, path)?;
        let content = std::fs::read_to_string(&resolved)
            .map_err(|e| ToolSourceError::ExecutionFailed(format!("read {path}: {e}")))?;
        let Some(pos) = content.find(find) else {
            return Err(ToolSourceError::ExecutionFailed(format!("{find:?} not found in {path}")));
        };
        let patched = format!("{}{}{}", &content[..pos], replace, &content[pos + find.len()..]);
        std::fs::write(&resolved, patched)
            .map_err(|e| ToolSourceError::ExecutionFailed(format!("write {path}: {e}")))?;
        Ok(format!("patched {path}").into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn replaces_first_occurrence() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), "foo bar foo").unwrap();
        let tool = FilePatchTool::new(Arc::new(dir.path().to_path_buf()));
        tool.call(json!({"path": "a.txt", "find": "foo", "replace": "baz"}), None).await.unwrap();
        assert_eq!(std::fs::read_to_string(dir.path().join("a.txt")).unwrap(), "baz bar foo");
    }

    #[tokio::test]
    async fn missing_find_text_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), "hello").unwrap();
        let tool = FilePatchTool::new(Arc::new(dir.path().to_path_buf()));
        let err = tool.call(json!({"path": "a.txt", "find": "nope", "replace": "x"}), None).await.unwrap_err();
        assert!(matches!(err, ToolSourceError::ExecutionFailed(_)));
    }
}
