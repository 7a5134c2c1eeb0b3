//! The decide node: the center of the ReAct loop (§4.2).

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::core::dedup_key::dedup_key;
use crate::core::decode::{decode_serialized, decode_structured, truncate_runes};
use crate::core::decision::{ContextStatus, Decision, DecisionAction};
use crate::core::guardrails::context_guard;
use crate::core::guardrails::exploration;
use crate::core::guardrails::loop_detector::{self, LoopRule};
use crate::core::guardrails::meta_tool::trailing_meta_tool_streak;
use crate::core::guardrails::token_estimate::estimate_tokens;
use crate::core::plan_sideband;
use crate::core::prompt::{self, PromptLoader};
use crate::core::state::{AgentState, StepRecord, StepType, ThinkingMode, ToolCallMode};
use crate::core::summary;
use crate::error::AgentError;
use crate::flow::{Action, FlowNode};
use crate::llm::LlmClient;
use crate::message::Message;
use crate::registry::ToolRegistry;

const META_TOOLS: &[&str] = &["update_plan", "walkthrough"];

fn tool_defs(registry: &ToolRegistry) -> Vec<Value> {
    registry
        .iter()
        .map(|tool| {
            let spec = tool.spec();
            serde_json::json!({
                "name": tool.name(),
                "description": spec.description,
                "parameters": spec.input_schema,
            })
        })
        .collect()
}

pub struct DecidePrep {
    system_prompt: String,
    user_prompt: String,
    tool_names: Vec<String>,
    tool_defs: Vec<Value>,
    tool_call_mode: ToolCallMode,
    thinking_mode: ThinkingMode,
    context_window_tokens: u32,
    cost_guard: Arc<crate::core::state::CostGuard>,
    loop_signal: Option<loop_detector::LoopSignal>,
    history_len: usize,
    max_agent_steps: u32,
}

pub struct DecideExec {
    decision: Decision,
}

/// Decide node — chooses the next action (tool / think / answer) each round of the loop.
pub struct DecideNode {
    llm: Arc<dyn LlmClient>,
    loader: Option<Arc<dyn PromptLoader>>,
}

impl DecideNode {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self { llm, loader: None }
    }

    pub fn with_loader(mut self, loader: Arc<dyn PromptLoader>) -> Self {
        self.loader = Some(loader);
        self
    }
}

#[async_trait]
impl FlowNode<AgentState> for DecideNode {
    type Prep = DecidePrep;
    type Exec = DecideExec;

    fn id(&self) -> &str {
        "decide"
    }

    async fn prep(&self, state: &AgentState) -> Result<DecidePrep, AgentError> {
        let step_summary = summary::render(&state.history, state.context_window_tokens);

        let last_tool_is_erroring_meta = state
            .history
            .tool_steps()
            .last()
            .map(|s| s.is_meta_tool() && s.is_error)
            .unwrap_or(false);
        let suppress = state.guardrails.suppress_meta_tools || last_tool_is_erroring_meta;

        let projection = if suppress {
            state.tool_registry.without(META_TOOLS)
        } else {
            state.tool_registry.as_registry().clone()
        };
        let tool_names = projection.names().to_vec();
        let tool_defs = tool_defs(&projection);

        let system_prompt = prompt::build_system_prompt(
            self.loader.as_deref(),
            &projection,
            state.tool_call_mode,
            state.thinking_mode,
            &state.os_name,
            &state.shell_cmd,
            &state.model_name,
            state.context_window_tokens,
            &state.problem,
        );

        let walkthrough_render = state.walkthrough_store.render(&state.session_id).await;
        let plan_render = state.plan_store.render(&state.session_id).await;

        let tool_steps: Vec<&StepRecord> = state.history.tool_steps().collect();
        let loop_signal = loop_detector::detect(&tool_steps);
        let non_meta: Vec<&StepRecord> = state.history.non_meta_tool_steps().collect();
        let exploration_fired =
            exploration::detect(state.history.len(), state.max_agent_steps, &non_meta);

        let mut loop_warning = None;
        if let Some(signal) = &loop_signal {
            loop_warning = Some(match signal.rule {
                LoopRule::SameToolFrequency => format!(
                    "Warning: you have called {} repeatedly with the same arguments. Try something different or answer now.",
                    signal.flagged_tool
                ),
                LoopRule::SimilarParameters => format!(
                    "Warning: your last two calls to {} used near-identical arguments. Reuse the prior result instead of repeating the call.",
                    signal.flagged_tool
                ),
                LoopRule::ConsecutiveErrors => format!(
                    "Warning: {} has failed three times in a row. Stop retrying it and reconsider your approach.",
                    signal.flagged_tool
                ),
            });
        }
        let exploration_warning = exploration_fired.then(|| {
            "You have spent many steps only gathering information. Act on what you already know.".to_string()
        });

        let mut user_prompt = prompt::build_user_prompt(
            &state.conversation_prefix,
            &state.problem,
            state.working_folder.as_deref(),
            &walkthrough_render,
            &plan_render,
            &step_summary,
            state.history.len(),
            state.max_agent_steps,
            &tool_names,
            loop_warning.as_deref(),
            exploration_warning.as_deref(),
            state.tool_call_mode,
        );
        if let Some(redirect) = &state.guardrails.meta_tool_redirect_msg {
            user_prompt.push_str("\n\n");
            user_prompt.push_str(redirect);
        }

        Ok(DecidePrep {
            system_prompt,
            user_prompt,
            tool_names,
            tool_defs,
            tool_call_mode: state.tool_call_mode,
            thinking_mode: state.thinking_mode,
            context_window_tokens: state.context_window_tokens,
            cost_guard: state.cost_guard.clone(),
            loop_signal,
            history_len: state.history.len(),
            max_agent_steps: state.max_agent_steps,
        })
    }

    async fn exec(&self, prep: &DecidePrep) -> Result<DecideExec, AgentError> {
        let messages = vec![
            Message::System(prep.system_prompt.clone()),
            Message::User(prep.user_prompt.clone()),
        ];

        let mut decision = match prep.tool_call_mode {
            ToolCallMode::Fc => {
                let response = self.llm.invoke_with_tools(&messages, &prep.tool_defs).await?;
                decode_structured(&response, &prep.tool_names)?
            }
            ToolCallMode::Auto => {
                if self.llm.is_tool_calling_enabled() {
                    let response = self.llm.invoke_with_tools(&messages, &prep.tool_defs).await?;
                    match decode_structured(&response, &prep.tool_names) {
                        Ok(decision) => decision,
                        Err(err) => {
                            tracing::warn!(error = %err, "structured decode failed, downgrading to serialized path");
                            let response = self.llm.invoke(&messages).await?;
                            decode_serialized(&response.content)?
                        }
                    }
                } else {
                    let response = self.llm.invoke(&messages).await?;
                    decode_serialized(&response.content)?
                }
            }
            ToolCallMode::Yaml => {
                let response = self.llm.invoke(&messages).await?;
                decode_serialized(&response.content)?
            }
        };

        let input_tokens = estimate_tokens(&prep.system_prompt) + estimate_tokens(&prep.user_prompt);
        let output_text = format!(
            "{}{}{}",
            decision.reason,
            decision.answer.as_deref().unwrap_or(""),
            decision.thinking.as_deref().unwrap_or("")
        );
        let output_tokens = estimate_tokens(&output_text);
        let total_tokens = input_tokens + output_tokens;

        prep.cost_guard.record_tokens(total_tokens as u64);
        decision.context_status = context_guard::classify(total_tokens, prep.context_window_tokens);

        Ok(DecideExec { decision })
    }

    fn exec_fallback(&self, _prep: &DecidePrep, err: &AgentError) -> DecideExec {
        DecideExec {
            decision: Decision::answer(
                String::new(),
                truncate_runes(&format!("decide step failed: {err}"), 200),
            ),
        }
    }

    async fn post(&self, state: &mut AgentState, prep: DecidePrep, exec: DecideExec) -> Action {
        let mut decision = exec.decision;

        if let Some((step_id, status)) = plan_sideband::extract(
            decision.plan_step.as_deref(),
            decision.plan_status.as_deref(),
            &decision.reason,
        ) {
            let plan_status = if status == "done" {
                crate::memory::PlanStatus::Done
            } else {
                crate::memory::PlanStatus::InProgress
            };
            state.plan_store.update(&state.session_id, &step_id, plan_status).await;
            if let Some(cb) = &state.callbacks.on_plan_update {
                cb(&step_id, &status);
            }
        }

        state.guardrails.meta_tool_redirect_msg = None;

        let step_number = state.record_step(StepRecord {
            step_number: 0,
            kind: StepType::Decide,
            action: match decision.action {
                DecisionAction::Tool => "tool".to_string(),
                DecisionAction::Think => "think".to_string(),
                DecisionAction::Answer => "answer".to_string(),
            },
            tool_name: decision.tool_name.clone(),
            input: None,
            output: Some(decision.reason.clone()),
            tool_call_id: decision.tool_call_id.clone(),
            is_error: false,
            duration_ms: 0,
        });
        let _ = step_number;

        if matches!(decision.context_status, ContextStatus::Critical) {
            state.guardrails.pending_compact = true;
        }

        // Precedence 1: step budget exhausted.
        if state.history.len() as u32 >= state.max_agent_steps.max(prep.max_agent_steps) {
            state.last_decision = Some(decision);
            return Action::from("answer");
        }

        // Precedence 2: cost guard.
        if state.cost_guard.is_exceeded() {
            state.last_decision = Some(decision);
            return Action::from("answer");
        }

        // Precedence 3: pending compaction.
        if state.guardrails.pending_compact {
            if let Some(cb) = &state.callbacks.on_context_overflow {
                let cb = cb.clone();
                let compacted = tokio::time::timeout(std::time::Duration::from_secs(60), async move { cb() })
                    .await
                    .unwrap_or(false);
                if compacted {
                    state.guardrails.pending_compact = false;
                }
            }
        }

        match decision.action {
            DecisionAction::Tool => {
                let tool_steps: Vec<&StepRecord> = state.history.tool_steps().collect();
                let meta_streak = trailing_meta_tool_streak(&tool_steps);
                let is_meta_choice =
                    decision.tool_name.as_deref().map(|n| META_TOOLS.contains(&n)).unwrap_or(false);

                if is_meta_choice {
                    if meta_streak >= 4 {
                        state.last_decision = Some(decision);
                        return Action::from("answer");
                    }
                    if meta_streak >= 2 {
                        state.guardrails.suppress_meta_tools = true;
                        state.guardrails.meta_tool_redirect_msg = Some(
                            "You have used planning/walkthrough tools several times in a row without making progress. Use a concrete action tool next.".to_string(),
                        );
                    }
                } else {
                    state.guardrails.suppress_meta_tools = false;
                }

                if let Some(signal) = &prep.loop_signal {
                    let flagged_differs =
                        decision.tool_name.as_deref() != Some(signal.flagged_tool.as_str());
                    if flagged_differs {
                        state.guardrails.loop_detection_streak = 0;
                    } else {
                        state.guardrails.loop_detection_streak += 1;
                        if state.guardrails.loop_detection_streak >= 2 {
                            state.last_decision = Some(decision);
                            return Action::from("answer");
                        }
                    }
                } else {
                    state.guardrails.loop_detection_streak = 0;
                }

                state.last_decision = Some(decision);
                Action::from("tool")
            }
            DecisionAction::Think => {
                if matches!(prep.thinking_mode, ThinkingMode::Native) {
                    decision.action = DecisionAction::Answer;
                    state.last_decision = Some(decision);
                    Action::from("answer")
                } else {
                    state.last_decision = Some(decision);
                    Action::from("think")
                }
            }
            DecisionAction::Answer => {
                state.last_decision = Some(decision);
                Action::from("answer")
            }
        }
    }

    fn successors(&self) -> std::collections::HashMap<Action, String> {
        let mut m = std::collections::HashMap::new();
        m.insert(Action::from("tool"), "tool".to_string());
        m.insert(Action::from("think"), "think".to_string());
        m.insert(Action::from("answer"), "answer".to_string());
        m
    }
}

/// Exposed so the tool/think/answer nodes' dedup-key-based memo formatting can reuse the
/// same extraction logic as the step summariser and loop detector.
pub fn tool_key_param(tool_name: &str, input_json: &str) -> String {
    dedup_key(tool_name, input_json).1
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::state::{AgentCallbacks, CostGuard, GuardrailState, ToolCallMode};
    use crate::llm::MockLlm;
    use crate::memory::{InMemoryPlanStore, InMemoryWalkthroughStore};
    use crate::registry::ToolRegistry;
    use crate::stream::ToolStreamWriter;

    fn fresh_state(registry: ToolRegistry) -> AgentState {
        AgentState {
            problem: "find the bug".to_string(),
            history: crate::core::state::StepHistory::new(),
            tool_registry: registry.into(),
            thinking_mode: ThinkingMode::App,
            tool_call_mode: ToolCallMode::Yaml,
            context_window_tokens: 0,
            os_name: "linux".to_string(),
            shell_cmd: "bash".to_string(),
            model_name: "test-model".to_string(),
            conversation_prefix: String::new(),
            working_folder: None,
            last_decision: None,
            guardrails: GuardrailState::default(),
            cost_guard: Arc::new(CostGuard::new(1_000_000, 0)),
            read_cache: crate::core::cache::ReadCache::new(),
            plan_store: Arc::new(InMemoryPlanStore::new()),
            walkthrough_store: Arc::new(InMemoryWalkthroughStore::new()),
            session_id: "s1".to_string(),
            callbacks: AgentCallbacks::default(),
            stream_writer: ToolStreamWriter::noop(),
            max_agent_steps: 40,
            prompt_tokens_total: 0,
            completion_tokens_total: 0,
        }
    }

    #[tokio::test]
    async fn direct_answer_routes_to_answer() {
        let llm = Arc::new(MockLlm::new(vec![MockLlm::text(
            "```yaml\naction: answer\nanswer: done\n```",
        )]));
        let node = DecideNode::new(llm);
        let mut state = fresh_state(ToolRegistry::new());

        let prep = node.prep(&state).await.unwrap();
        let exec = node.exec(&prep).await.unwrap();
        let action = node.post(&mut state, prep, exec).await;

        assert_eq!(action, Action::from("answer"));
        assert_eq!(state.history.len(), 1);
    }

    #[tokio::test]
    async fn step_budget_exhaustion_forces_answer_even_on_tool_choice() {
        let llm = Arc::new(MockLlm::new(vec![MockLlm::text(
            "```yaml\naction: tool\ntool: file_read\nparams:\n  path: a.txt\n```",
        )]));
        let node = DecideNode::new(llm);
        let mut state = fresh_state(ToolRegistry::new());
        state.max_agent_steps = 1;

        let prep = node.prep(&state).await.unwrap();
        let exec = node.exec(&prep).await.unwrap();
        let action = node.post(&mut state, prep, exec).await;

        assert_eq!(action, Action::from("answer"));
    }

    #[tokio::test]
    async fn cost_guard_exceeded_forces_answer() {
        let llm = Arc::new(MockLlm::new(vec![MockLlm::text(
            "```yaml\naction: tool\ntool: file_read\nparams:\n  path: a.txt\n```",
        )]));
        let node = DecideNode::new(llm);
        let mut state = fresh_state(ToolRegistry::new());
        state.cost_guard = Arc::new(CostGuard::new(1, 0));
        state.cost_guard.record_tokens(5);

        let prep = node.prep(&state).await.unwrap();
        let exec = node.exec(&prep).await.unwrap();
        let action = node.post(&mut state, prep, exec).await;

        assert_eq!(action, Action::from("answer"));
    }

    #[tokio::test]
    async fn native_thinking_mode_rewrites_think_to_answer() {
        let llm = Arc::new(MockLlm::new(vec![MockLlm::text(
            "```yaml\naction: think\nthinking: pondering\n```",
        )]));
        let node = DecideNode::new(llm);
        let mut state = fresh_state(ToolRegistry::new());
        state.thinking_mode = ThinkingMode::Native;

        let prep = node.prep(&state).await.unwrap();
        let exec = node.exec(&prep).await.unwrap();
        let action = node.post(&mut state, prep, exec).await;

        assert_eq!(action, Action::from("answer"));
    }
}
