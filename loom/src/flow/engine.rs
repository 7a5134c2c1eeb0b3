use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{AgentError, FlowError};

use super::node::{Action, FlowNode};

/// Hard cap on node transitions within a single [`Flow::run`], independent of any
/// per-request step budget a node enforces on its own state.
pub const MAX_FLOW_ITERATIONS: usize = 200;

/// Object-safe adapter so heterogeneous [`FlowNode`] implementations (each with their own
/// `Prep`/`Exec` associated types) can be stored together in one flow.
#[async_trait]
trait ErasedFlowNode<S>: Send + Sync {
    fn id(&self) -> &str;
    fn successors(&self) -> HashMap<Action, String>;
    async fn step(&self, state: &mut S) -> Action;
}

#[async_trait]
impl<S, N> ErasedFlowNode<S> for N
where
    N: FlowNode<S>,
    S: Send + Sync,
{
    fn id(&self) -> &str {
        FlowNode::id(self)
    }

    fn successors(&self) -> HashMap<Action, String> {
        FlowNode::successors(self)
    }

    async fn step(&self, state: &mut S) -> Action {
        let prep = match self.prep(state).await {
            Ok(p) => p,
            Err(err) => {
                tracing::error!(node = self.id(), error = %err, "flow node prep failed");
                return Action::from("error");
            }
        };

        let retries = self.max_retries().max(1);
        let mut last_err: Option<AgentError> = None;
        let mut exec_out = None;
        for attempt in 0..retries {
            match self.exec(&prep).await {
                Ok(e) => {
                    exec_out = Some(e);
                    break;
                }
                Err(err) => {
                    tracing::warn!(node = self.id(), attempt, error = %err, "flow node exec failed");
                    last_err = Some(err);
                }
            }
        }

        let exec = match exec_out {
            Some(e) => e,
            None => {
                let err = last_err.expect("retries >= 1 guarantees at least one error");
                self.exec_fallback(&prep, &err)
            }
        };

        self.post(state, prep, exec).await
    }
}

/// A runnable graph of [`FlowNode`]s wired together by [`Action`].
pub struct Flow<S> {
    start: String,
    nodes: HashMap<String, Arc<dyn ErasedFlowNode<S> + 'static>>,
    default_successors: HashMap<Action, String>,
}

impl<S> Flow<S>
where
    S: Send + Sync + 'static,
{
    pub fn new(start: impl FlowNode<S> + 'static) -> Self {
        let mut flow = Flow {
            start: start.id().to_string(),
            nodes: HashMap::new(),
            default_successors: HashMap::new(),
        };
        flow.add_node(start);
        flow
    }

    pub fn add_node(&mut self, node: impl FlowNode<S> + 'static) -> &mut Self {
        self.nodes.insert(node.id().to_string(), Arc::new(node));
        self
    }

    pub fn with_default_successor(mut self, action: impl Into<Action>, node_id: impl Into<String>) -> Self {
        self.default_successors.insert(action.into(), node_id.into());
        self
    }

    /// Drives `state` through the flow until a node has no successor for its returned
    /// action, the iteration budget is exhausted, or `is_cancelled` reports true.
    pub async fn run(
        &self,
        state: &mut S,
        is_cancelled: impl Fn() -> bool,
    ) -> Result<(), FlowError> {
        let mut current = self.start.clone();
        for _ in 0..MAX_FLOW_ITERATIONS {
            if is_cancelled() {
                return Err(FlowError::Cancelled);
            }

            let node = self
                .nodes
                .get(&current)
                .unwrap_or_else(|| panic!("flow: unknown node id {current}"));

            let action = node.step(state).await;

            let next = node
                .successors()
                .get(&action)
                .or_else(|| self.default_successors.get(&action))
                .cloned();

            match next {
                Some(n) => current = n,
                None => return Ok(()),
            }
        }
        Err(FlowError::IterationBudgetExhausted(MAX_FLOW_ITERATIONS))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    #[derive(Default)]
    struct Counter {
        n: u32,
    }

    struct Increment;

    #[async_trait]
    impl FlowNode<Counter> for Increment {
        type Prep = u32;
        type Exec = u32;

        fn id(&self) -> &str {
            "increment"
        }

        async fn prep(&self, state: &Counter) -> Result<u32, AgentError> {
            Ok(state.n)
        }

        async fn exec(&self, prep: &u32) -> Result<u32, AgentError> {
            Ok(prep + 1)
        }

        fn exec_fallback(&self, prep: &u32, _err: &AgentError) -> u32 {
            *prep
        }

        async fn post(&self, state: &mut Counter, _prep: u32, exec: u32) -> Action {
            state.n = exec;
            if state.n >= 3 {
                Action::from("done")
            } else {
                Action::from("default")
            }
        }

        fn successors(&self) -> HashMap<Action, String> {
            let mut m = HashMap::new();
            m.insert(Action::from("default"), "increment".to_string());
            m
        }
    }

    #[tokio::test]
    async fn loops_until_terminal_action() {
        let flow = Flow::new(Increment);
        let mut state = Counter::default();
        flow.run(&mut state, || false).await.unwrap();
        assert_eq!(state.n, 3);
    }

    #[tokio::test]
    async fn cancellation_short_circuits() {
        let flow = Flow::new(Increment);
        let mut state = Counter::default();
        let result = flow.run(&mut state, || true).await;
        assert!(matches!(result, Err(FlowError::Cancelled)));
        assert_eq!(state.n, 0);
    }
}
