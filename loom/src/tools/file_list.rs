//! `file_list`: list directory entries under the working folder.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::tool::{Tool, ToolCallContent, ToolCallContext, ToolSourceError, ToolSpec};

use super::path::resolve_path_under;

pub const TOOL_FILE_LIST: &str = "file_list";

pub struct FileListTool {
    working_folder: Arc<PathBuf>,
}

impl FileListTool {
    pub fn new(working_folder: Arc<PathBuf>) -> Self {
        Self { working_folder }
    }
}

#[async_trait]
impl Tool for FileListTool {
    fn name(&self) -> &str {
        TOOL_FILE_LIST
    }

    fn spec(&self) -> ToolSpec {
        ToolSpec {
            description: "List entries in a directory under the working folder.".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {"path": {"type": "string", "default": "."}},
            }),
        }
    }

    async fn call(&self, args: Value, _ctx: Option<&ToolCallContext>) -> Result<ToolCallContent, ToolSourceError> {
        let path = args.get("path").and_then(|v| v.as_str()).unwrap_or(".");
        let resolved = resolve_path_under(&self.working_folder, path)?;
        let mut names: Vec<String> = std::fs::read_dir(&resolved)
            .map_err(|e| ToolSourceError::ExecutionFailed(format!("list {path}: {e}")))?
            .filter_map(|entry| entry.ok())
            .map(|entry| {
                let name = entry.file_name().to_string_lossy().to_string();
                if entry.path().is_dir() {
                    format!("{name}/")
                } else {
                    name
                }
            })
            .collect();
        names.sort();
        Ok(names.join("\n").into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn lists_files_and_dirs_sorted_with_trailing_slash_on_dirs() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.txt"), "").unwrap();
        std::fs::create_dir(dir.path().join("a_dir")).unwrap();
        let tool = FileListTool::new(Arc::new(dir.path().to_path_buf()));
        let out = tool.call(json!({}), None).await.unwrap();
        assert_eq!(out.output, "a_dir/\nb.txt");
    }
}
