//! # Loom
//!
//! A ReAct-style agent decision core: one shared [`core::AgentState`] flows through a small
//! graph of nodes (decide, tool, think, answer) wired by a generic three-phase
//! (prep/exec/post) [`flow::Flow`] engine. The loop is decide → tool → think → answer,
//! with retry-with-fallback per node and guardrails (loop detection, exploration, cost,
//! context window) advising the decide node on what the model should do next.
//!
//! ## Design principles
//!
//! - **Single state type**: [`core::AgentState`] is the one struct every node reads from and
//!   writes to — no separate input/output types per node.
//! - **One step per run**: each [`flow::FlowNode`] implements prep/exec/post and returns an
//!   [`flow::Action`] used to look up its successor.
//! - **Decision is decoded, not executed, by the decide node**: [`core::nodes::DecideNode`]
//!   only produces a [`core::Decision`]; [`core::nodes::ToolNode`] is what actually calls a
//!   tool.
//! - **Per-request overlays over cross-request stores**: a single [`core::AgentState`] is
//!   owned by one request; [`memory::PlanStore`], [`memory::SessionStore`], and
//!   [`memory::WalkthroughStore`] are the cross-request shared state, reached through
//!   `Arc<dyn Trait>`.
//!
//! ## Main modules
//!
//! - [`core`]: state, config, decision decoding, guardrails, prompt assembly, step summary,
//!   caches, and the four flow nodes ([`core::nodes`]) plus [`core::build_flow`].
//! - [`flow`]: the generic [`flow::Flow`] engine, [`flow::FlowNode`] trait, [`flow::Action`].
//! - [`llm`]: [`llm::LlmClient`] trait and [`llm::MockLlm`].
//! - [`memory`]: [`memory::PlanStore`], [`memory::SessionStore`], [`memory::WalkthroughStore`]
//!   and their in-memory implementations.
//! - [`message`]: [`message::Message`] (System / User / Assistant / Tool).
//! - [`tool`]: the [`tool::Tool`] trait and its call types.
//! - [`tools`]: the reference tool set the decision core is exercised against.
//! - [`registry`]: [`registry::ToolRegistry`] and its per-request overlay.
//! - [`stream`]: [`stream::ToolStreamWriter`], [`stream::EventWriter`].
//! - [`error`]: [`error::AgentError`], [`error::FlowError`].
//!
//! ## Quick start
//!
//! Build a [`core::AgentState`] with a [`tools::reference_registry`] overlaid with the
//! session's meta-tools, hand it to [`core::build_flow`] along with an [`llm::LlmClient`],
//! and call [`flow::Flow::run`]. See the `cli` crate for a complete wiring example.

pub mod core;
pub mod error;
pub mod flow;
pub mod llm;
pub mod memory;
pub mod message;
pub mod registry;
pub mod stream;
pub mod tool;
pub mod tools;

pub use core::{build_flow, AgentConfig, AgentState};
pub use error::{AgentError, FlowError};
pub use flow::{Action, Flow, FlowNode};
pub use llm::{LlmClient, LlmResponse, MockLlm};
pub use message::Message;
pub use registry::ToolRegistry;
pub use tool::Tool;
