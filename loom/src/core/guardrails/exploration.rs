//! Exploration detector: flags a run that is only reading, never acting (§4.7).

use crate::core::state::StepRecord;

const INFO_GATHERING_TOOLS: &[&str] = &["file_read", "file_list", "file_grep", "file_find"];
const INFO_GATHERING_SHELL_PREFIXES: &[&str] =
    &["dir", "ls", "type", "cat", "find", "head", "tail", "tree"];

fn is_info_gathering(step: &StepRecord) -> bool {
    match step.tool_name.as_deref() {
        Some(name) if INFO_GATHERING_TOOLS.contains(&name) => true,
        Some("shell_exec") => {
            let command = step
                .input
                .as_deref()
                .and_then(|input| serde_json::from_str::<serde_json::Value>(input).ok())
                .and_then(|v| v.get("command").and_then(|c| c.as_str()).map(str::to_string))
                .unwrap_or_default();
            let command = command.to_lowercase();
            let trimmed = command.trim();
            INFO_GATHERING_SHELL_PREFIXES.iter().any(|prefix| {
                trimmed == *prefix || trimmed.starts_with(&format!("{prefix} "))
            })
        }
        _ => false,
    }
}

/// `len(steps) > MaxAgentSteps/3 && non_meta_tool_steps.len() >= 5 && last 5 are all
/// info-gathering`.
pub fn detect(total_steps: usize, max_agent_steps: u32, non_meta_tool_steps: &[&StepRecord]) -> bool {
    if total_steps as u32 <= max_agent_steps / 3 {
        return false;
    }
    if non_meta_tool_steps.len() < 5 {
        return false;
    }
    non_meta_tool_steps[non_meta_tool_steps.len() - 5..]
        .iter()
        .all(|s| is_info_gathering(s))
}
