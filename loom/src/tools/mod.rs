//! Reference tool set exercising the decision core's tool node (§1 Non-goals: these are
//! a minimal reference set, not production-grade tool implementations).

mod path;

mod config_edit;
mod file_delete;
mod file_list;
mod file_move;
mod file_patch;
mod file_read;
mod file_write;
mod mcp_server_list;
mod shell_exec;
mod update_plan;
mod walkthrough;

pub use config_edit::{ConfigEditTool, TOOL_CONFIG_EDIT};
pub use file_delete::{FileDeleteTool, TOOL_FILE_DELETE};
pub use file_list::{FileListTool, TOOL_FILE_LIST};
pub use file_move::{FileMoveTool, TOOL_FILE_MOVE};
pub use file_patch::{FilePatchTool, TOOL_FILE_PATCH};
pub use file_read::{FileReadTool, TOOL_FILE_READ};
pub use file_write::{FileWriteTool, TOOL_FILE_WRITE};
pub use mcp_server_list::{McpServerListTool, TOOL_MCP_SERVER_LIST};
pub use path::resolve_path_under;
pub use shell_exec::{ShellExecTool, TOOL_SHELL_EXEC};
pub use update_plan::{UpdatePlanTool, TOOL_UPDATE_PLAN};
pub use walkthrough::{WalkthroughTool, TOOL_WALKTHROUGH};

use std::path::PathBuf;
use std::sync::Arc;

use crate::registry::ToolRegistry;

/// Builds the base registry of stateless reference tools (everything except the
/// session-scoped meta-tools, which are added per-request via `with_extra`, §4.9).
pub fn reference_registry(working_folder: Arc<PathBuf>, shell_cmd: impl Into<String>) -> ToolRegistry {
    let shell_cmd = shell_cmd.into();
    let mut registry = ToolRegistry::new();
    registry
        .register(Arc::new(FileReadTool::new(working_folder.clone())))
        .register(Arc::new(FileListTool::new(working_folder.clone())))
        .register(Arc::new(FileWriteTool::new(working_folder.clone())))
        .register(Arc::new(FilePatchTool::new(working_folder.clone())))
        .register(Arc::new(FileDeleteTool::new(working_folder.clone())))
        .register(Arc::new(FileMoveTool::new(working_folder.clone())))
        .register(Arc::new(ShellExecTool::new(working_folder.clone(), shell_cmd)))
        .register(Arc::new(ConfigEditTool::new(working_folder)));
    registry
}
