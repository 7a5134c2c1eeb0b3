//! The think node: one synchronous reasoning call in `app` thinking mode (§4.4).

use std::sync::Arc;

use async_trait::async_trait;

use crate::core::state::{AgentState, StepRecord, StepType};
use crate::error::AgentError;
use crate::flow::{Action, FlowNode};
use crate::llm::LlmClient;
use crate::message::Message;

fn think_context(state: &AgentState) -> String {
    let mut lines = Vec::new();
    for step in state.history.as_slice() {
        match step.kind {
            StepType::Tool if !step.is_meta_tool() => {
                let tool = step.tool_name.as_deref().unwrap_or("?");
                let output = step.output.as_deref().unwrap_or("");
                lines.push(format!("tool {tool} result: {output}"));
            }
            StepType::Think => {
                lines.push(format!("earlier thought: {}", step.output.as_deref().unwrap_or("")));
            }
            _ => {}
        }
    }
    if let Some(hint) = state.last_decision.as_ref().and_then(|d| d.thinking.as_deref()) {
        if !hint.is_empty() {
            lines.push(format!("hint from the decide step: {hint}"));
        }
    }
    lines.join("\n")
}

pub struct ThinkPrep {
    system_prompt: String,
    user_prompt: String,
}

pub struct ThinkExec {
    content: String,
}

/// Think node — only reached when `thinking_mode` is `App`; a `Native` model answers
/// directly instead (the decide node rewrites a stray `think` choice to `answer`).
pub struct ThinkNode {
    llm: Arc<dyn LlmClient>,
}

impl ThinkNode {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl FlowNode<AgentState> for ThinkNode {
    type Prep = ThinkPrep;
    type Exec = ThinkExec;

    fn id(&self) -> &str {
        "think"
    }

    async fn prep(&self, state: &AgentState) -> Result<ThinkPrep, AgentError> {
        let context = think_context(state);
        let system_prompt =
            "Reason step by step about the problem using the context provided. Be concise.".to_string();
        let user_prompt = format!("Problem: {}\n\nContext so far:\n{}", state.problem, context);
        Ok(ThinkPrep { system_prompt, user_prompt })
    }

    async fn exec(&self, prep: &ThinkPrep) -> Result<ThinkExec, AgentError> {
        let messages =
            vec![Message::System(prep.system_prompt.clone()), Message::User(prep.user_prompt.clone())];
        let response = self.llm.invoke(&messages).await?;
        Ok(ThinkExec { content: response.content })
    }

    fn exec_fallback(&self, _prep: &ThinkPrep, err: &AgentError) -> ThinkExec {
        ThinkExec { content: format!("think step failed: {err}") }
    }

    async fn post(&self, state: &mut AgentState, _prep: ThinkPrep, exec: ThinkExec) -> Action {
        state.record_step(StepRecord {
            step_number: 0,
            kind: StepType::Think,
            action: "think".to_string(),
            tool_name: None,
            input: None,
            output: Some(exec.content),
            tool_call_id: None,
            is_error: false,
            duration_ms: 0,
        });
        Action::from("default")
    }

    fn successors(&self) -> std::collections::HashMap<Action, String> {
        let mut m = std::collections::HashMap::new();
        m.insert(Action::from("default"), "decide".to_string());
        m
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::cache::ReadCache;
    use crate::core::decision::Decision;
    use crate::core::state::{AgentCallbacks, CostGuard, GuardrailState, StepHistory, ThinkingMode, ToolCallMode};
    use crate::llm::MockLlm;
    use crate::memory::{InMemoryPlanStore, InMemoryWalkthroughStore};
    use crate::registry::ToolRegistry;
    use crate::stream::ToolStreamWriter;

    fn fresh_state() -> AgentState {
        AgentState {
            problem: "find the bug".into(),
            history: StepHistory::new(),
            tool_registry: ToolRegistry::new().into(),
            thinking_mode: ThinkingMode::App,
            tool_call_mode: ToolCallMode::Yaml,
            context_window_tokens: 0,
            os_name: "linux".into(),
            shell_cmd: "bash".into(),
            model_name: "m".into(),
            conversation_prefix: String::new(),
            working_folder: None,
            last_decision: None,
            guardrails: GuardrailState::default(),
            cost_guard: Arc::new(CostGuard::new(1_000_000, 0)),
            read_cache: ReadCache::new(),
            plan_store: Arc::new(InMemoryPlanStore::new()),
            walkthrough_store: Arc::new(InMemoryWalkthroughStore::new()),
            session_id: "s1".into(),
            callbacks: AgentCallbacks::default(),
            stream_writer: ToolStreamWriter::noop(),
            max_agent_steps: 40,
            prompt_tokens_total: 0,
            completion_tokens_total: 0,
        }
    }

    #[tokio::test]
    async fn appends_think_step_and_routes_to_decide() {
        let llm = Arc::new(MockLlm::new(vec![MockLlm::text("the bug is a race condition")]));
        let node = ThinkNode::new(llm);
        let mut state = fresh_state();
        state.last_decision = Some(Decision::think("consider the logs", "need to reason"));

        let prep = node.prep(&state).await.unwrap();
        let exec = node.exec(&prep).await.unwrap();
        let action = node.post(&mut state, prep, exec).await;

        assert_eq!(action, Action::from("default"));
        assert_eq!(state.history.len(), 1);
        assert_eq!(state.history.as_slice()[0].kind, StepType::Think);
        assert_eq!(state.history.as_slice()[0].output.as_deref(), Some("the bug is a race condition"));
    }

    #[tokio::test]
    async fn context_includes_prior_tool_output_and_thinking_hint() {
        let mut state = fresh_state();
        state.history.push(StepRecord {
            step_number: 0,
            kind: StepType::Tool,
            action: "tool".into(),
            tool_name: Some("file_read".into()),
            input: Some(r#"{"path":"a.rs"}"#.into()),
            output: Some("fn main() {}".into()),
            tool_call_id: None,
            is_error: false,
            duration_ms: 0,
        });
        state.last_decision = Some(Decision::think("look for deadlocks", "reasoning"));

        let context = think_context(&state);
        assert!(context.contains("fn main()"));
        assert!(context.contains("look for deadlocks"));
    }
}
