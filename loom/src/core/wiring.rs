//! Assembles the decision loop's flow graph from its four nodes (§4.1, §4.2–§4.4).

use std::sync::Arc;

use crate::core::nodes::{AnswerNode, DecideNode, ThinkNode, ToolNode};
use crate::core::prompt::PromptLoader;
use crate::core::state::AgentState;
use crate::flow::Flow;
use crate::llm::LlmClient;

/// Builds the standard decide → tool/think → answer loop.
///
/// `decide` routes to `tool`, `think`, or `answer` based on its decision; `tool` and
/// `think` always route back to `decide`; `answer` is terminal (its `end` action has no
/// registered successor, so [`Flow::run`] stops there).
pub fn build_flow(llm: Arc<dyn LlmClient>, loader: Option<Arc<dyn PromptLoader>>) -> Flow<AgentState> {
    let mut decide = DecideNode::new(llm.clone());
    if let Some(loader) = loader {
        decide = decide.with_loader(loader);
    }

    let mut flow = Flow::new(decide);
    flow.add_node(ToolNode);
    flow.add_node(ThinkNode::new(llm.clone()));
    flow.add_node(AnswerNode::new(llm));
    flow
}
