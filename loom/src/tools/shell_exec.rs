//! `shell_exec`: run a shell command under the working folder. A synchronous
//! `std::process::Command` invocation wrapped in `spawn_blocking` so it cannot stall the
//! async runtime.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::tool::{Tool, ToolCallContent, ToolCallContext, ToolSourceError, ToolSpec};

pub const TOOL_SHELL_EXEC: &str = "shell_exec";

/// Combined stdout+stderr output past this many bytes is truncated with a marker — a
/// runaway command (e.g. `find /`) must not blow up the prompt it later feeds into.
const MAX_OUTPUT_BYTES: usize = 20_000;

pub struct ShellExecTool {
    working_folder: Arc<PathBuf>,
    shell_cmd: String,
}

impl ShellExecTool {
    pub fn new(working_folder: Arc<PathBuf>, shell_cmd: impl Into<String>) -> Self {
        Self { working_folder, shell_cmd: shell_cmd.into() }
    }
}

#[async_trait]
impl Tool for ShellExecTool {
    fn name(&self) -> &str {
        TOOL_SHELL_EXEC
    }

    fn spec(&self) -> ToolSpec {
        ToolSpec {
            description: "Run a shell command in the working folder and return its combined output."
                .to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {"command": {"type": "string"}},
                "required": ["command"],
            }),
        }
    }

    async fn call(&self, args: Value, _ctx: Option<&ToolCallContext>) -> Result<ToolCallContent, ToolSourceError> {
        let command = args
            .get("command")
            .and_then(|v| v.as_str())
            .ok_or_else(|| ToolSourceError::InvalidArguments("missing command".into()))?
            .to_string();
        let working_folder = self.working_folder.clone();
        let shell_cmd = self.shell_cmd.clone();
        let shell_cmd_for_err = shell_cmd.clone();

        let output = tokio::task::spawn_blocking(move || {
            std::process::Command::new(&shell_cmd)
                .arg("-c")
                .arg(&command)
                .current_dir(working_folder.as_path())
                .output()
        })
        .await
        .map_err(|e| ToolSourceError::ExecutionFailed(format!("shell task panicked: {e}")))?
        .map_err(|e| ToolSourceError::ExecutionFailed(format!("spawn {shell_cmd_for_err}: {e}")))?;

        let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
        combined.push_str(&String::from_utf8_lossy(&output.stderr));
        if combined.len() > MAX_OUTPUT_BYTES {
            combined.truncate(MAX_OUTPUT_BYTES);
            combined.push_str("\n...[output truncated]");
        }
        if !output.status.success() {
            return Err(ToolSourceError::ExecutionFailed(format!(
                "exit status {}: {combined}",
                output.status
            )));
        }
        Ok(combined.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn runs_command_and_captures_stdout() {
        let dir = tempfile::tempdir().unwrap();
        let tool = ShellExecTool::new(Arc::new(dir.path().to_path_buf()), "sh".to_string());
        let out = tool.call(json!({"command": "echo hi"}), None).await.unwrap();
        assert_eq!(out.output.trim(), "hi");
    }

    #[tokio::test]
    async fn nonzero_exit_status_is_an_execution_error() {
        let dir = tempfile::tempdir().unwrap();
        let tool = ShellExecTool::new(Arc::new(dir.path().to_path_buf()), "sh".to_string());
        let err = tool.call(json!({"command": "exit 1"}), None).await.unwrap_err();
        assert!(matches!(err, ToolSourceError::ExecutionFailed(_)));
    }
}
