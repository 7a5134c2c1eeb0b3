//! The tool node: resolves and invokes the tool chosen by the last decision (§4.3).

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use serde_json::Value;

use crate::core::cache::{cache_key_for, ReadCacheEntry, WRITE_TOOLS};
use crate::core::decode::truncate_runes;
use crate::core::decision::DecisionAction;
use crate::core::nodes::decide::tool_key_param;
use crate::core::state::{AgentState, StepRecord, StepType};
use crate::error::AgentError;
use crate::flow::{Action, FlowNode};
use crate::memory::WalkthroughEntry;
use crate::stream::ToolStreamWriter;
use crate::tool::{Tool, ToolCallContext};

const META_TOOLS: &[&str] = &["update_plan", "walkthrough"];
const AUTO_MEMO_MAX_RUNES: usize = 150;

pub struct ToolPrep {
    tool_name: String,
    args: Value,
    args_json: String,
    tool_call_id: Option<String>,
    resolved: Option<Arc<dyn Tool>>,
    cache_key: Option<String>,
    cache_hit: Option<ReadCacheEntry>,
    stream_writer: ToolStreamWriter,
}

pub struct ToolExec {
    output: String,
    is_error: bool,
    duration_ms: u64,
    was_cache_hit: bool,
}

/// Tool node — executes the tool named by `state.last_decision`, or is a no-op when the
/// last decision was not a tool call.
pub struct ToolNode;

#[async_trait]
impl FlowNode<AgentState> for ToolNode {
    type Prep = Option<ToolPrep>;
    type Exec = ToolExec;

    fn id(&self) -> &str {
        "tool"
    }

    async fn prep(&self, state: &AgentState) -> Result<Option<ToolPrep>, AgentError> {
        let Some(decision) = &state.last_decision else { return Ok(None) };
        if decision.action != DecisionAction::Tool {
            return Ok(None);
        }
        let tool_name = decision.tool_name.clone().unwrap_or_default();
        let args = Value::Object(decision.tool_params.clone().into_iter().collect());
        let args_json = serde_json::to_string(&args).unwrap_or_else(|_| "{}".to_string());

        // The per-request registry is consulted first; the flow's build-time registry
        // never actually differs from it in this implementation (there is no separate
        // build-time registry object), so `state.tool_registry` already serves as both.
        let resolved = state.tool_registry.get(&tool_name);
        let cache_key = cache_key_for(&tool_name, &args);
        let cache_hit = cache_key.as_ref().and_then(|k| state.read_cache.get(k));

        Ok(Some(ToolPrep {
            tool_name,
            args,
            args_json,
            tool_call_id: decision.tool_call_id.clone(),
            resolved,
            cache_key,
            cache_hit,
            stream_writer: state.stream_writer.clone(),
        }))
    }

    async fn exec(&self, prep: &Option<ToolPrep>) -> Result<ToolExec, AgentError> {
        let Some(prep) = prep else {
            return Ok(ToolExec { output: String::new(), is_error: false, duration_ms: 0, was_cache_hit: false });
        };

        if let Some(hit) = &prep.cache_hit {
            return Ok(ToolExec {
                output: format!(
                    "⚠️ result reused from step {} (cached): {}",
                    hit.step_number, hit.output
                ),
                is_error: false,
                duration_ms: 0,
                was_cache_hit: true,
            });
        }

        let Some(tool) = &prep.resolved else {
            return Ok(ToolExec {
                output: format!("tool not found: {}", prep.tool_name),
                is_error: true,
                duration_ms: 0,
                was_cache_hit: false,
            });
        };

        let ctx = ToolCallContext {
            stream_writer: Some(prep.stream_writer.clone()),
            ..Default::default()
        };
        let start = Instant::now();
        let result = tool.call(prep.args.clone(), Some(&ctx)).await;
        let duration_ms = start.elapsed().as_millis() as u64;

        match result {
            Ok(content) => {
                Ok(ToolExec { output: content.output, is_error: false, duration_ms, was_cache_hit: false })
            }
            Err(err) => Ok(ToolExec { output: err.to_string(), is_error: true, duration_ms, was_cache_hit: false }),
        }
    }

    fn exec_fallback(&self, _prep: &Option<ToolPrep>, err: &AgentError) -> ToolExec {
        ToolExec {
            output: format!("tool node internal error: {err}"),
            is_error: true,
            duration_ms: 0,
            was_cache_hit: false,
        }
    }

    async fn post(&self, state: &mut AgentState, prep: Option<ToolPrep>, exec: ToolExec) -> Action {
        let Some(prep) = prep else { return Action::from("default") };

        let step_number = state.record_step(StepRecord {
            step_number: 0,
            kind: StepType::Tool,
            action: "tool".to_string(),
            tool_name: Some(prep.tool_name.clone()),
            input: Some(prep.args_json.clone()),
            output: Some(exec.output.clone()),
            tool_call_id: prep.tool_call_id.clone(),
            is_error: exec.is_error,
            duration_ms: exec.duration_ms,
        });

        if !exec.is_error && !exec.was_cache_hit {
            if let Some(key) = &prep.cache_key {
                state.read_cache.put(key.clone(), ReadCacheEntry { step_number, output: exec.output.clone() });
            }
        }

        if WRITE_TOOLS.contains(&prep.tool_name.as_str()) {
            if let Some(path) = prep.args.get("path").and_then(|v| v.as_str()) {
                state.read_cache.invalidate_file_read(path);
            }
        }

        let is_meta = META_TOOLS.contains(&prep.tool_name.as_str());
        if !is_meta && !exec.was_cache_hit {
            let first_line = exec.output.lines().next().unwrap_or("");
            let key_param = tool_key_param(&prep.tool_name, &prep.args_json);
            let memo = truncate_runes(&format!("{}({key_param}): {first_line}", prep.tool_name), AUTO_MEMO_MAX_RUNES);
            state
                .walkthrough_store
                .append(&state.session_id, WalkthroughEntry { content: memo, auto: true })
                .await;
        }

        Action::from("default")
    }

    fn successors(&self) -> std::collections::HashMap<Action, String> {
        let mut m = std::collections::HashMap::new();
        m.insert(Action::from("default"), "decide".to_string());
        m
    }
}
