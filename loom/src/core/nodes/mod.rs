//! The four flow nodes that make up the decision loop (§4.2–§4.4).

pub mod answer;
pub mod decide;
pub mod think;
pub mod tool_node;

pub use answer::AnswerNode;
pub use decide::DecideNode;
pub use think::ThinkNode;
pub use tool_node::ToolNode;
