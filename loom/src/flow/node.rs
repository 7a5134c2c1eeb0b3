use async_trait::async_trait;
use std::collections::HashMap;

use crate::error::AgentError;

/// The label a node's `post` phase returns to select its successor.
///
/// Plain newtype around a string so nodes can use `Action::from("tool")` or the
/// `action!("tool")` shorthand without an ever-growing shared enum.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Action(pub String);

impl Action {
    pub fn new(s: impl Into<String>) -> Self {
        Action(s.into())
    }
}

impl From<&str> for Action {
    fn from(s: &str) -> Self {
        Action(s.to_string())
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Default action used when a node's `post` just wants to continue the loop.
pub const DEFAULT_ACTION: &str = "default";

/// A node in the three-phase flow contract.
///
/// `Prep` gathers what `exec` needs from `state` without mutating it; `Exec` performs the
/// (possibly retried) fallible work, with no access to `state`; `Post` applies the result
/// back onto `state` and returns the [`Action`] used to pick the next node.
#[async_trait]
pub trait FlowNode<S>: Send + Sync {
    type Prep: Send + Sync;
    type Exec: Send + Sync;

    fn id(&self) -> &str;

    async fn prep(&self, state: &S) -> Result<Self::Prep, AgentError>;

    async fn exec(&self, prep: &Self::Prep) -> Result<Self::Exec, AgentError>;

    /// Invoked only when every `exec` attempt (up to [`FlowNode::max_retries`]) has failed.
    /// Must produce a usable value — the flow never aborts solely because `exec` failed.
    fn exec_fallback(&self, prep: &Self::Prep, err: &AgentError) -> Self::Exec;

    async fn post(&self, state: &mut S, prep: Self::Prep, exec: Self::Exec) -> Action;

    /// Number of `exec` attempts before falling back. Default: no retry.
    fn max_retries(&self) -> u32 {
        1
    }

    /// This node's own Action -> successor-node-id routing table, consulted before the
    /// flow's default table.
    fn successors(&self) -> HashMap<Action, String> {
        HashMap::new()
    }
}
