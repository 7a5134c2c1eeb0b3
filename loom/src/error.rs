//! Crate-wide error types.

use thiserror::Error;

/// Top-level error surfaced by a node or the flow engine.
#[derive(Error, Debug)]
pub enum AgentError {
    #[error("execution failed: {0}")]
    ExecutionFailed(String),

    #[error("tool source error: {0}")]
    ToolSource(#[from] crate::tool::ToolSourceError),

    #[error("llm error: {0}")]
    Llm(String),

    #[error("decode error: {0}")]
    Decode(#[from] crate::core::decode::DecodeError),

    #[error("store error: {0}")]
    Store(#[from] crate::memory::StoreError),
}

/// Errors raised by the generic flow engine, independent of any particular node's
/// business logic.
#[derive(Error, Debug)]
pub enum FlowError {
    #[error("flow cancelled")]
    Cancelled,

    #[error("flow exceeded {0} node transitions")]
    IterationBudgetExhausted(usize),

    #[error("no successor registered for action {0:?} from node {1}")]
    NoSuccessor(String, String),

    #[error(transparent)]
    Node(#[from] AgentError),
}
