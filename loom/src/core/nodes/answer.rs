//! The answer node: terminal synthesis of the final response (§4.4).

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::core::decision::DecisionAction;
use crate::core::state::{AgentState, StepRecord, StepType};
use crate::error::AgentError;
use crate::flow::{Action, FlowNode};
use crate::llm::{LlmClient, MessageChunk};
use crate::message::Message;

const DIRECT_ANSWER_RUNE_BUDGET: usize = 500;

fn has_tool_step(state: &AgentState) -> bool {
    state.history.tool_steps().next().is_some()
}

/// Concatenates every tool output, think output, and non-answer decide reason recorded so
/// far, in step order, for use as model context when no direct answer text is available.
fn assemble_context(state: &AgentState) -> String {
    let mut lines = Vec::new();
    for step in state.history.as_slice() {
        match step.kind {
            StepType::Tool => {
                let tool = step.tool_name.as_deref().unwrap_or("?");
                lines.push(format!("tool {tool}: {}", step.output.as_deref().unwrap_or("")));
            }
            StepType::Think => {
                lines.push(format!("thought: {}", step.output.as_deref().unwrap_or("")));
            }
            StepType::Decide if step.action != "answer" => {
                lines.push(format!("reasoning: {}", step.output.as_deref().unwrap_or("")));
            }
            _ => {}
        }
    }
    lines.join("\n")
}

pub struct AnswerPrep {
    direct_answer: Option<String>,
    context: String,
    has_tool_step: bool,
    problem: String,
}

pub struct AnswerExec {
    content: String,
}

/// Answer node — terminal: always returns the `end` action.
pub struct AnswerNode {
    llm: Arc<dyn LlmClient>,
}

impl AnswerNode {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl FlowNode<AgentState> for AnswerNode {
    type Prep = AnswerPrep;
    type Exec = AnswerExec;

    fn id(&self) -> &str {
        "answer"
    }

    async fn prep(&self, state: &AgentState) -> Result<AnswerPrep, AgentError> {
        let used_tool = has_tool_step(state);
        let direct_answer = state
            .last_decision
            .as_ref()
            .filter(|d| d.action == DecisionAction::Answer && !used_tool)
            .and_then(|d| d.answer.clone());

        Ok(AnswerPrep {
            direct_answer,
            context: assemble_context(state),
            has_tool_step: used_tool,
            problem: state.problem.clone(),
        })
    }

    async fn exec(&self, prep: &AnswerPrep) -> Result<AnswerExec, AgentError> {
        if let Some(answer) = &prep.direct_answer {
            return Ok(AnswerExec { content: answer.clone() });
        }

        if !prep.has_tool_step && prep.context.chars().count() <= DIRECT_ANSWER_RUNE_BUDGET {
            return Ok(AnswerExec { content: prep.context.clone() });
        }

        let messages = vec![
            Message::System(
                "Synthesize a final answer to the user's problem from the context gathered below."
                    .to_string(),
            ),
            Message::User(format!("Problem: {}\n\nContext:\n{}", prep.problem, prep.context)),
        ];

        let (tx, mut rx) = mpsc::channel::<MessageChunk>(16);
        let collected = Arc::new(tokio::sync::Mutex::new(String::new()));
        let collected_writer = collected.clone();
        let forward = tokio::spawn(async move {
            while let Some(chunk) = rx.recv().await {
                collected_writer.lock().await.push_str(&chunk.content);
            }
        });

        let result = self.llm.invoke_stream(&messages, Some(tx)).await;
        let _ = forward.await;
        let partial = collected.lock().await.clone();

        let content = match result {
            Ok(response) if !response.content.is_empty() => response.content,
            Ok(_) => partial,
            Err(err) => {
                tracing::warn!(error = %err, "answer stream failed, keeping partial content");
                partial
            }
        };

        Ok(AnswerExec { content })
    }

    fn exec_fallback(&self, prep: &AnswerPrep, err: &AgentError) -> AnswerExec {
        if let Some(answer) = &prep.direct_answer {
            return AnswerExec { content: answer.clone() };
        }
        AnswerExec { content: format!("unable to produce a final answer: {err}") }
    }

    async fn post(&self, state: &mut AgentState, _prep: AnswerPrep, exec: AnswerExec) -> Action {
        if let Some(cb) = &state.callbacks.on_stream_chunk {
            cb(&exec.content);
        }
        state.record_step(StepRecord {
            step_number: 0,
            kind: StepType::Answer,
            action: "answer".to_string(),
            tool_name: None,
            input: None,
            output: Some(exec.content),
            tool_call_id: None,
            is_error: false,
            duration_ms: 0,
        });
        Action::from("end")
    }

    fn successors(&self) -> std::collections::HashMap<Action, String> {
        std::collections::HashMap::new()
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
            problem: "what is 2+2".into(),
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
    async fn direct_answer_passes_through_verbatim_without_model_call() {
        let llm = Arc::new(MockLlm::new(vec![]));
        let node = AnswerNode::new(llm);
        let mut state = fresh_state();
        state.last_decision = Some(Decision::answer("4", "simple arithmetic"));

        let prep = node.prep(&state).await.unwrap();
        let exec = node.exec(&prep).await.unwrap();
        let action = node.post(&mut state, prep, exec).await;

        assert_eq!(action, Action::from("end"));
        assert_eq!(state.history.as_slice()[0].output.as_deref(), Some("4"));
    }

    #[tokio::test]
    async fn short_context_without_tool_use_is_emitted_as_is() {
        let llm = Arc::new(MockLlm::new(vec![]));
        let node = AnswerNode::new(llm);
        let mut state = fresh_state();
        state.history.push(StepRecord {
            step_number: 0,
            kind: StepType::Think,
            action: "think".into(),
            tool_name: None,
            input: None,
            output: Some("the answer is four".into()),
            tool_call_id: None,
            is_error: false,
            duration_ms: 0,
        });
        state.last_decision = Some(Decision::think("pondered", "reasoning"));

        let prep = node.prep(&state).await.unwrap();
        assert!(prep.direct_answer.is_none());
        let exec = node.exec(&prep).await.unwrap();
        assert!(exec.content.contains("the answer is four"));
    }

    #[tokio::test]
    async fn long_context_calls_model_for_synthesis() {
        let llm = Arc::new(MockLlm::new(vec![MockLlm::text("synthesized final answer")]));
        let node = AnswerNode::new(llm);
        let mut state = fresh_state();
        let long_output = "x".repeat(600);
        state.history.push(StepRecord {
            step_number: 0,
            kind: StepType::Tool,
            action: "tool".into(),
            tool_name: Some("file_read".into()),
            input: Some(r#"{"path":"a"}"#.into()),
            output: Some(long_output),
            tool_call_id: None,
            is_error: false,
            duration_ms: 0,
        });
        state.last_decision = Some(Decision::answer("ignored", "tool was used"));

        let prep = node.prep(&state).await.unwrap();
        assert!(prep.direct_answer.is_none(), "direct answer is only used when no tool was called");
        let exec = node.exec(&prep).await.unwrap();
        assert_eq!(exec.content, "synthesized final answer");
    }
}
