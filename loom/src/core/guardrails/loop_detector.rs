//! Loop detector: three independent rules over recent tool-step history (§4.7).

use crate::core::dedup_key::dedup_key;
use crate::core::state::StepRecord;

use super::token_estimate::bigram_jaccard;

const SEARCH_TOOLS: &[&str] = &["file_grep", "file_find", "mcp_server_list"];
const FILE_TOOLS: &[&str] = &["file_read", "file_list", "file_patch", "file_write", "file_delete", "file_move"];

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LoopRule {
    SameToolFrequency,
    SimilarParameters,
    ConsecutiveErrors,
}

#[derive(Clone, Debug)]
pub struct LoopSignal {
    pub rule: LoopRule,
    /// The tool name the detector flagged — used by the decide Post's self-correction
    /// check (a different tool choice resets the streak).
    pub flagged_tool: String,
}

fn arg(input_json: &str, key: &str) -> Option<String> {
    serde_json::from_str::<serde_json::Value>(input_json)
        .ok()
        .and_then(|v| v.get(key).and_then(|v| v.as_str()).map(str::to_string))
}

/// Rule 1: in the last 8 tool steps, some `(tool, dedup-param)` appears ≥3 times.
fn rule1_same_tool_frequency(recent: &[&StepRecord]) -> Option<LoopSignal> {
    use std::collections::HashMap;
    let window = &recent[recent.len().saturating_sub(8)..];
    let mut counts: HashMap<(String, String), (u32, String)> = HashMap::new();
    for step in window {
        let input = step.input.clone().unwrap_or_default();
        let tool = step.tool_name.clone().unwrap_or_default();
        let key = dedup_key(&tool, &input);
        let entry = counts.entry(key).or_insert((0, tool));
        entry.0 += 1;
    }
    counts.into_iter().find(|(_, (count, _))| *count >= 3).map(|((tool, _), _)| LoopSignal {
        rule: LoopRule::SameToolFrequency,
        flagged_tool: tool,
    })
}

/// Rule 2: two consecutive same-tool calls with similar parameters.
fn rule2_similar_parameters(recent: &[&StepRecord]) -> Option<LoopSignal> {
    if recent.len() < 2 {
        return None;
    }
    let prev = recent[recent.len() - 2];
    let last = recent[recent.len() - 1];
    let (Some(prev_tool), Some(last_tool)) = (&prev.tool_name, &last.tool_name) else {
        return None;
    };
    if prev_tool != last_tool {
        return None;
    }
    let prev_input = prev.input.clone().unwrap_or_default();
    let last_input = last.input.clone().unwrap_or_default();

    let similar = if SEARCH_TOOLS.contains(&prev_tool.as_str()) {
        let prev_query = arg(&prev_input, "query").unwrap_or_default();
        let last_query = arg(&last_input, "query").unwrap_or_default();
        bigram_jaccard(&prev_query, &last_query) > 0.6
    } else if FILE_TOOLS.contains(&prev_tool.as_str()) {
        arg(&prev_input, "path") == arg(&last_input, "path") && arg(&prev_input, "path").is_some()
    } else {
        prev_input == last_input
    };

    if similar {
        Some(LoopSignal { rule: LoopRule::SimilarParameters, flagged_tool: prev_tool.clone() })
    } else {
        None
    }
}

/// Rule 3: the last 3 tool steps are all errors.
fn rule3_consecutive_errors(recent: &[&StepRecord]) -> Option<LoopSignal> {
    if recent.len() < 3 {
        return None;
    }
    let last3 = &recent[recent.len() - 3..];
    if last3.iter().all(|s| s.is_error) {
        let tool = last3.last().and_then(|s| s.tool_name.clone()).unwrap_or_default();
        Some(LoopSignal { rule: LoopRule::ConsecutiveErrors, flagged_tool: tool })
    } else {
        None
    }
}

/// Runs all three rules over `tool_steps` (already filtered to whatever population the
/// caller considers in-scope) and returns the first rule that fires, in priority order
/// 1 → 2 → 3.
pub fn detect(tool_steps: &[&StepRecord]) -> Option<LoopSignal> {
    rule1_same_tool_frequency(tool_steps)
        .or_else(|| rule2_similar_parameters(tool_steps))
        .or_else(|| rule3_consecutive_errors(tool_steps))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::state::StepType;

    fn tool_step(name: &str, input: &str, is_error: bool) -> StepRecord {
        StepRecord {
            step_number: 0,
            kind: StepType::Tool,
            action: "tool".into(),
            tool_name: Some(name.into()),
            input: Some(input.into()),
            output: None,
            tool_call_id: None,
            is_error,
            duration_ms: 0,
        }
    }

    #[test]
    fn rule1_fires_on_three_identical_calls_in_window() {
        let steps = vec![
            tool_step("file_read", r#"{"path":"a.go"}"#, false),
            tool_step("file_read", r#"{"path":"a.go"}"#, false),
            tool_step("file_read", r#"{"path":"a.go"}"#, false),
        ];
        let refs: Vec<&StepRecord> = steps.iter().collect();
        let signal = detect(&refs).unwrap();
        assert_eq!(signal.rule, LoopRule::SameToolFrequency);
        assert_eq!(signal.flagged_tool, "file_read");
    }

    #[test]
    fn rule2_fires_on_consecutive_identical_file_path() {
        let steps = vec![
            tool_step("file_read", r#"{"path":"a.go"}"#, false),
            tool_step("file_read", r#"{"path":"a.go"}"#, false),
        ];
        let refs: Vec<&StepRecord> = steps.iter().collect();
        let signal = detect(&refs).unwrap();
        assert_eq!(signal.rule, LoopRule::SimilarParameters);
    }

    #[test]
    fn rule2_does_not_fire_on_different_paths() {
        let steps = vec![
            tool_step("file_read", r#"{"path":"a.go"}"#, false),
            tool_step("file_read", r#"{"path":"b.go"}"#, false),
        ];
        let refs: Vec<&StepRecord> = steps.iter().collect();
        assert!(detect(&refs).is_none());
    }

    #[test]
    fn rule3_fires_on_three_consecutive_errors() {
        let steps = vec![
            tool_step("shell_exec", r#"{"command":"a"}"#, true),
            tool_step("shell_exec", r#"{"command":"b"}"#, true),
            tool_step("shell_exec", r#"{"command":"c"}"#, true),
        ];
        let refs: Vec<&StepRecord> = steps.iter().collect();
        let signal = detect(&refs).unwrap();
        assert_eq!(signal.rule, LoopRule::ConsecutiveErrors);
    }

    #[test]
    fn no_rule_fires_on_clean_varied_history() {
        let steps = vec![
            tool_step("file_read", r#"{"path":"a.go"}"#, false),
            tool_step("file_list", r#"{"path":"."}"#, false),
        ];
        let refs: Vec<&StepRecord> = steps.iter().collect();
        assert!(detect(&refs).is_none());
    }
}
