//! Per-request agent state: the single mutable record carried through the flow.
//!
//! One [`AgentState`] exists per request, owned by the task that runs the flow (§5:
//! "never shared across threads"). It is created at request start and discarded at
//! request end; only the external stores (keyed by session id) outlive it.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use serde_json::Value;

use crate::core::cache::ReadCache;
use crate::core::decision::Decision;
use crate::memory::{PlanStore, WalkthroughStore};
use crate::registry::ToolRegistryLocked;
use crate::stream::ToolStreamWriter;

/// Decoding path selector for the decide node's Exec phase.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ToolCallMode {
    #[default]
    Auto,
    Fc,
    Yaml,
}

impl std::str::FromStr for ToolCallMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "fc" => Ok(Self::Fc),
            "yaml" => Ok(Self::Yaml),
            _ => Ok(Self::Yaml),
        }
    }
}

/// Whether the model does its own internal reasoning (`native`, e.g. an extended-thinking
/// model) or needs an explicit intermediate `think` step (`app`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ThinkingMode {
    Native,
    #[default]
    App,
}

impl std::str::FromStr for ThinkingMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "native" => Ok(Self::Native),
            _ => Ok(Self::App),
        }
    }
}

/// The kind of a recorded [`StepRecord`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StepType {
    Decide,
    Tool,
    Think,
    Answer,
}

impl StepType {
    pub fn as_str(&self) -> &'static str {
        match self {
            StepType::Decide => "decide",
            StepType::Tool => "tool",
            StepType::Think => "think",
            StepType::Answer => "answer",
        }
    }
}

/// One entry in the append-only step history (§3 invariant 1, 2).
///
/// A decide step records only the chosen action and reason, never a copy of tool output
/// (invariant 2) — `Output` is populated solely by tool/think/answer steps.
#[derive(Clone, Debug)]
pub struct StepRecord {
    pub step_number: u32,
    pub kind: StepType,
    pub action: String,
    pub tool_name: Option<String>,
    pub input: Option<String>,
    pub output: Option<String>,
    pub tool_call_id: Option<String>,
    pub is_error: bool,
    pub duration_ms: u64,
}

impl StepRecord {
    /// True for tool steps whose tool is one of the bookkeeping meta-tools
    /// (`update_plan`, `walkthrough`) — subject to the meta-tool guard and excluded from
    /// the step summariser's zone rendering/duplicate detection.
    pub fn is_meta_tool(&self) -> bool {
        self.kind == StepType::Tool
            && matches!(self.tool_name.as_deref(), Some("update_plan") | Some("walkthrough"))
    }
}

/// Append-only, densely 1-based-numbered record of everything this request has done.
#[derive(Default, Clone)]
pub struct StepHistory {
    steps: Vec<StepRecord>,
}

impl StepHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn as_slice(&self) -> &[StepRecord] {
        &self.steps
    }

    /// Appends a step, assigning the next dense `StepNumber`. Returns the assigned number.
    pub fn push(&mut self, mut step: StepRecord) -> u32 {
        let number = self.steps.len() as u32 + 1;
        step.step_number = number;
        self.steps.push(step);
        number
    }

    pub fn last(&self) -> Option<&StepRecord> {
        self.steps.last()
    }

    /// Tool steps only, in order, excluding meta-tools — the population the step
    /// summariser and loop/exploration detectors operate over.
    pub fn non_meta_tool_steps(&self) -> impl Iterator<Item = &StepRecord> {
        self.steps.iter().filter(|s| s.kind == StepType::Tool && !s.is_meta_tool())
    }

    pub fn tool_steps(&self) -> impl Iterator<Item = &StepRecord> {
        self.steps.iter().filter(|s| s.kind == StepType::Tool)
    }
}

/// Token-budget / wall-clock guard (§4.7, §9).
///
/// Holds an atomic counter so nested/concurrent `record_tokens` callers are safe even
/// though this crate's own scheduling model (§5) only ever calls it from a single
/// in-flight decide step; `exceeded` is a plain bool because it is only ever written and
/// read from that same single-threaded loop.
pub struct CostGuard {
    max_tokens: u64,
    max_duration_secs: u64,
    used_tokens: AtomicU64,
    started_at: Instant,
    exceeded: AtomicBool,
}

impl CostGuard {
    pub fn new(max_tokens: u64, max_duration_secs: u64) -> Self {
        Self {
            max_tokens,
            max_duration_secs,
            used_tokens: AtomicU64::new(0),
            started_at: Instant::now(),
            exceeded: AtomicBool::new(false),
        }
    }

    /// Records `tokens` spent and re-evaluates both the token budget and the wall-clock
    /// deadline. Once `exceeded` flips true it stays true for the life of the request.
    pub fn record_tokens(&self, tokens: u64) {
        let used = self.used_tokens.fetch_add(tokens, Ordering::Relaxed) + tokens;
        if used > self.max_tokens || self.elapsed_exceeded() {
            self.exceeded.store(true, Ordering::Relaxed);
        }
    }

    fn elapsed_exceeded(&self) -> bool {
        self.max_duration_secs > 0 && self.started_at.elapsed().as_secs() > self.max_duration_secs
    }

    pub fn is_exceeded(&self) -> bool {
        self.exceeded.load(Ordering::Relaxed) || self.elapsed_exceeded()
    }

    pub fn used_tokens(&self) -> u64 {
        self.used_tokens.load(Ordering::Relaxed)
    }
}

/// Best-effort hooks a host surface can bind. Every call is `Fn` over a channel/closure
/// that swallows its own errors — a callback must never block or abort the decision loop
/// (§9 "Event callbacks are best-effort").
#[derive(Clone, Default)]
pub struct AgentCallbacks {
    pub on_step_complete: Option<Arc<dyn Fn(&StepRecord) + Send + Sync>>,
    pub on_stream_chunk: Option<Arc<dyn Fn(&str) + Send + Sync>>,
    pub on_plan_update: Option<Arc<dyn Fn(&str, &str) + Send + Sync>>,
    pub on_context_overflow: Option<Arc<dyn Fn() -> bool + Send + Sync>>,
}

impl std::fmt::Debug for AgentCallbacks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentCallbacks").finish_non_exhaustive()
    }
}

/// Guardrail-related mutable state carried across decide rounds (§3).
#[derive(Default)]
pub struct GuardrailState {
    pub loop_detection_streak: u32,
    pub suppress_meta_tools: bool,
    /// One-shot: consumed by the next Prep, then cleared.
    pub meta_tool_redirect_msg: Option<String>,
    pub pending_compact: bool,
}

/// The full per-request mutable record the flow engine threads through every node.
pub struct AgentState {
    pub problem: String,
    pub history: StepHistory,
    pub tool_registry: ToolRegistryLocked,
    pub thinking_mode: ThinkingMode,
    pub tool_call_mode: ToolCallMode,
    pub context_window_tokens: u32,
    pub os_name: String,
    pub shell_cmd: String,
    pub model_name: String,
    pub conversation_prefix: String,
    /// Workspace directory note surfaced in the user prompt (§4.5); independent of
    /// whatever working folder the reference filesystem tools were constructed with.
    pub working_folder: Option<String>,
    pub last_decision: Option<Decision>,
    pub guardrails: GuardrailState,
    pub cost_guard: Arc<CostGuard>,
    pub read_cache: ReadCache,
    pub plan_store: Arc<dyn PlanStore>,
    pub walkthrough_store: Arc<dyn WalkthroughStore>,
    pub session_id: String,
    pub callbacks: AgentCallbacks,
    pub stream_writer: ToolStreamWriter,
    pub max_agent_steps: u32,
    /// Running totals for the terminal `done` event (§1.2 streaming usage accounting).
    pub prompt_tokens_total: u32,
    pub completion_tokens_total: u32,
}

impl AgentState {
    pub fn record_step(&mut self, step: StepRecord) -> u32 {
        let number = self.history.push(step);
        if let Some(cb) = &self.callbacks.on_step_complete {
            cb(self.history.as_slice().last().expect("just pushed"));
        }
        number
    }

    /// Per-request tool-params map value accessor, used by the tool node.
    pub fn args_json(params: &HashMap<String, Value>) -> String {
        serde_json::to_string(params).unwrap_or_else(|_| "{}".to_string())
    }
}
