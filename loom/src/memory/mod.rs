//! In-memory reference implementations of the session/plan/walkthrough stores.
//!
//! Production persistence is an external collaborator; these implementations exist so
//! the decision core is runnable and testable standalone: async trait, a shared
//! `StoreError` enum, and defensive-copy reads under concurrent writers.

mod plan_store;
mod session_store;
mod walkthrough_store;

pub use plan_store::{InMemoryPlanStore, PlanStatus, PlanStep, PlanStore};
pub use session_store::{InMemorySessionStore, SessionStore, Turn};
pub use walkthrough_store::{InMemoryWalkthroughStore, WalkthroughEntry, WalkthroughStore};

use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum StoreError {
    #[error("session not found: {0}")]
    NotFound(String),
    #[error("storage error: {0}")]
    Other(String),
}
