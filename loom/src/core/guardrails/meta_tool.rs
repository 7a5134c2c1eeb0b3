//! Meta-tool guard: counts trailing consecutive meta-tool steps (§4.2 Post step 4).

use crate::core::state::StepRecord;

/// Counts how many of the most recent tool steps, walking backward, are meta-tools
/// (`update_plan`, `walkthrough`), stopping at the first non-meta tool step.
pub fn trailing_meta_tool_streak(tool_steps: &[&StepRecord]) -> u32 {
    let mut count = 0;
    for step in tool_steps.iter().rev() {
        if step.is_meta_tool() {
            count += 1;
        } else {
            break;
        }
    }
    count
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::state::StepType;

    fn step(tool: &str) -> StepRecord {
        StepRecord {
            step_number: 0,
            kind: StepType::Tool,
            action: "tool".into(),
            tool_name: Some(tool.into()),
            input: None,
            output: None,
            tool_call_id: None,
            is_error: false,
            duration_ms: 0,
        }
    }

    #[test]
    fn counts_trailing_meta_tools_only() {
        let steps = vec![step("file_read"), step("update_plan"), step("walkthrough")];
        let refs: Vec<&StepRecord> = steps.iter().collect();
        assert_eq!(trailing_meta_tool_streak(&refs), 2);
    }

    #[test]
    fn stops_counting_at_non_meta_tool() {
        let steps = vec![step("update_plan"), step("file_read"), step("update_plan")];
        let refs: Vec<&StepRecord> = steps.iter().collect();
        assert_eq!(trailing_meta_tool_streak(&refs), 1);
    }

    #[test]
    fn four_consecutive_meta_tools_counts_to_four() {
        let steps = vec![step("update_plan"), step("walkthrough"), step("update_plan"), step("walkthrough")];
        let refs: Vec<&StepRecord> = steps.iter().collect();
        assert_eq!(trailing_meta_tool_streak(&refs), 4);
    }
}
