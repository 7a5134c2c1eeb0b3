//! Generic three-phase (Prep/Exec/Post) node runner.
//!
//! Unlike [`crate::message`]'s single-shot style, a [`FlowNode`] separates synchronous-ish
//! state preparation, fallible execution, and post-processing/routing into distinct phases
//! so that retries only re-run the fallible middle phase.

mod engine;
mod node;

pub use engine::{Flow, MAX_FLOW_ITERATIONS};
pub use node::{Action, FlowNode};
