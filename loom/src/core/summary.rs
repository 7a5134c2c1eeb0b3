//! Dual-zone step-history rendering injected into the decide node's user prompt (§4.6).
//!
//! Pure function `(history, context_window) -> String`: no side effects, deterministic,
//! UTF-8 safe (truncation always happens on a rune slice, never a byte slice).

use std::collections::HashMap;

use crate::core::dedup_key::dedup_key;
use crate::core::decode::truncate_runes;
use crate::core::state::{StepHistory, StepType};

const HEADER_ZONE_A: &str = "--- 最近工具结果 ---";
const HEADER_ZONE_B: &str = "--- 执行历史 ---";

/// Per-step input preview length in Zone B's compressed rendering.
const ZONE_B_INPUT_PREVIEW_RUNES: usize = 80;

fn window_size(non_meta_count: usize) -> usize {
    if non_meta_count >= 20 {
        5
    } else {
        3
    }
}

fn zone_a_output_budget(context_window_tokens: u32, window: usize) -> usize {
    if context_window_tokens == 0 {
        return 8000;
    }
    let budget = (context_window_tokens as u64 * 2 * 40 / 100) as usize / window.max(1);
    budget.max(1000)
}

/// Builds a `(tool, dedup_key) -> first-seen step number` map over every tool step in
/// chronological order, for the inline duplicate-repeat warning.
fn first_seen_map(history: &StepHistory) -> HashMap<(String, String), u32> {
    let mut seen = HashMap::new();
    for step in history.tool_steps() {
        let tool = step.tool_name.clone().unwrap_or_default();
        let input = step.input.clone().unwrap_or_default();
        let key = dedup_key(&tool, &input);
        seen.entry(key).or_insert(step.step_number);
    }
    seen
}

fn repeat_suffix(
    tool: &str,
    input: &str,
    step_number: u32,
    first_seen: &HashMap<(String, String), u32>,
) -> String {
    let key = dedup_key(tool, input);
    match first_seen.get(&key) {
        Some(&first) if first != step_number => {
            format!(" ⚠️[repeats step {first}, reuse its result]")
        }
        _ => String::new(),
    }
}

/// Renders the dual-zone step summary for injection into the decide node's user prompt.
pub fn render(history: &StepHistory, context_window_tokens: u32) -> String {
    let non_meta: Vec<_> = history.non_meta_tool_steps().collect();
    let window = window_size(non_meta.len());
    let budget = zone_a_output_budget(context_window_tokens, window);
    let first_seen = first_seen_map(history);

    let zone_a_steps: Vec<u32> = non_meta
        .iter()
        .rev()
        .take(window)
        .map(|s| s.step_number)
        .collect();

    let mut zone_a_lines = Vec::new();
    for &step_number in &zone_a_steps {
        let step = history
            .as_slice()
            .iter()
            .find(|s| s.step_number == step_number)
            .expect("step_number came from this history");
        let tool = step.tool_name.as_deref().unwrap_or("?");
        let output = step.output.as_deref().unwrap_or("");
        let truncated = truncate_runes(output, budget);
        let suffix = repeat_suffix(tool, step.input.as_deref().unwrap_or(""), step.step_number, &first_seen);
        zone_a_lines.push(format!("step {} [{}]: {}{}", step.step_number, tool, truncated, suffix));
    }

    let mut zone_b_lines = Vec::new();
    for step in history.tool_steps() {
        if zone_a_steps.contains(&step.step_number) {
            continue;
        }
        let tool = step.tool_name.as_deref().unwrap_or("?");
        if step.is_meta_tool() {
            zone_b_lines.push(format!("step {} [{}]: ✓ invoked", step.step_number, tool));
            continue;
        }
        let input_preview = truncate_runes(step.input.as_deref().unwrap_or(""), ZONE_B_INPUT_PREVIEW_RUNES);
        let output_bytes = step.output.as_deref().unwrap_or("").len();
        let suffix = repeat_suffix(tool, step.input.as_deref().unwrap_or(""), step.step_number, &first_seen);
        zone_b_lines.push(format!(
            "step {} [tool {}]: executed ({}), output {} bytes{}",
            step.step_number, tool, input_preview, output_bytes, suffix
        ));
    }

    let mut out = Vec::new();
    if !zone_a_lines.is_empty() && !zone_b_lines.is_empty() {
        out.push(HEADER_ZONE_A.to_string());
        out.extend(zone_a_lines);
        out.push(String::new());
        out.push(HEADER_ZONE_B.to_string());
        out.extend(zone_b_lines);
    } else {
        out.extend(zone_a_lines);
        out.extend(zone_b_lines);
    }

    for step in history.as_slice() {
        if matches!(step.kind, StepType::Think | StepType::Answer) {
            let label = step.kind.as_str();
            let content = step.output.as_deref().unwrap_or("");
            out.push(format!("step {} [{}]: {}", step.step_number, label, content));
        }
    }

    out.join("\n")
}
