//! The agent decision core: a ReAct-style decide → tool → think → answer loop built on
//! the generic [`crate::flow`] engine.

pub mod cache;
pub mod compaction;
pub mod config;
pub mod decision;
pub mod decode;
pub mod dedup_key;
pub mod guardrails;
pub mod mcp_intent;
pub mod nodes;
pub mod plan_sideband;
pub mod prompt;
pub mod state;
pub mod summary;
pub mod wiring;

pub use config::AgentConfig;
pub use decision::{ContextStatus, Decision, DecisionAction};
pub use state::{AgentCallbacks, AgentState, CostGuard, GuardrailState, StepHistory, StepRecord, StepType};
pub use wiring::build_flow;
