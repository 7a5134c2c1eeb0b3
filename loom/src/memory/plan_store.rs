use async_trait::async_trait;
use dashmap::DashMap;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlanStatus {
    InProgress,
    Done,
}

#[derive(Clone, Debug)]
pub struct PlanStep {
    pub id: String,
    pub description: String,
    pub status: PlanStatus,
}

/// The current plan for a session, as maintained by the `update_plan` tool and the
/// decide node's plan sideband.
#[async_trait]
pub trait PlanStore: Send + Sync {
    async fn set(&self, session_id: &str, steps: Vec<PlanStep>);

    /// Updates the status of one step by id. No-op if the step or session is unknown.
    async fn update(&self, session_id: &str, step_id: &str, status: PlanStatus);

    async fn get(&self, session_id: &str) -> Vec<PlanStep>;

    /// Renders the plan as a markdown checklist for prompt assembly.
    async fn render(&self, session_id: &str) -> String;

    async fn delete(&self, session_id: &str);
}

#[derive(Default)]
pub struct InMemoryPlanStore {
    plans: DashMap<String, Vec<PlanStep>>,
}

impl InMemoryPlanStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PlanStore for InMemoryPlanStore {
    async fn set(&self, session_id: &str, steps: Vec<PlanStep>) {
        self.plans.insert(session_id.to_string(), steps);
    }

    async fn update(&self, session_id: &str, step_id: &str, status: PlanStatus) {
        if let Some(mut steps) = self.plans.get_mut(session_id) {
            if let Some(step) = steps.iter_mut().find(|s| s.id == step_id) {
                step.status = status;
            }
        }
    }

    async fn get(&self, session_id: &str) -> Vec<PlanStep> {
        self.plans.get(session_id).map(|s| s.clone()).unwrap_or_default()
    }

    async fn render(&self, session_id: &str) -> String {
        let steps = self.get(session_id).await;
        if steps.is_empty() {
            return String::new();
        }
        steps
            .iter()
            .map(|s| {
                let mark = if s.status == PlanStatus::Done { "x" } else { " " };
                format!("- [{mark}] {}", s.description)
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    async fn delete(&self, session_id: &str) {
        self.plans.remove(session_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn set_then_update_changes_status() {
        let store = InMemoryPlanStore::new();
        store
            .set(
                "s1",
                vec![PlanStep { id: "a".into(), description: "do a".into(), status: PlanStatus::InProgress }],
            )
            .await;
        store.update("s1", "a", PlanStatus::Done).await;
        let steps = store.get("s1").await;
        assert_eq!(steps[0].status, PlanStatus::Done);
    }

    #[tokio::test]
    async fn update_on_unknown_step_is_noop() {
        let store = InMemoryPlanStore::new();
        store
            .set("s1", vec![PlanStep { id: "a".into(), description: "do a".into(), status: PlanStatus::InProgress }])
            .await;
        store.update("s1", "missing", PlanStatus::Done).await;
        let steps = store.get("s1").await;
        assert_eq!(steps[0].status, PlanStatus::InProgress);
    }

    #[tokio::test]
    async fn render_produces_markdown_checklist() {
        let store = InMemoryPlanStore::new();
        store
            .set(
                "s1",
                vec![
                    PlanStep { id: "a".into(), description: "first".into(), status: PlanStatus::Done },
                    PlanStep { id: "b".into(), description: "second".into(), status: PlanStatus::InProgress },
                ],
            )
            .await;
        let rendered = store.render("s1").await;
        assert_eq!(rendered, "- [x] first\n- [ ] second");
    }

    #[tokio::test]
    async fn render_empty_plan_is_empty_string() {
        let store = InMemoryPlanStore::new();
        assert_eq!(store.render("missing").await, "");
    }
}
