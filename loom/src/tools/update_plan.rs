//! `update_plan`: a meta-tool (§4.7 meta-tool guard) that replaces the session's plan.
//!
//! Constructed per-request with the session's id baked in, then added to the per-request
//! registry overlay via [`crate::registry::ToolRegistry::with_extra`] (§4.9).

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::memory::{PlanStatus, PlanStep, PlanStore};
use crate::tool::{Tool, ToolCallContent, ToolCallContext, ToolSourceError, ToolSpec};

pub const TOOL_UPDATE_PLAN: &str = "update_plan";

pub struct UpdatePlanTool {
    plan_store: std::sync::Arc<dyn PlanStore>,
    session_id: String,
}

impl UpdatePlanTool {
    pub fn new(plan_store: std::sync::Arc<dyn PlanStore>, session_id: impl Into<String>) -> Self {
        Self { plan_store, session_id: session_id.into() }
    }
}

fn parse_status(raw: &str) -> PlanStatus {
    if raw.eq_ignore_ascii_case("done") {
        PlanStatus::Done
    } else {
        PlanStatus::InProgress
    }
}

#[async_trait]
impl Tool for UpdatePlanTool {
    fn name(&self) -> &str {
        TOOL_UPDATE_PLAN
    }

    fn spec(&self) -> ToolSpec {
        ToolSpec {
            description: "Replace the current plan with a new ordered list of steps.".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "steps": {
                        "type": "array",
                        "items": {
                            "type": "object",
                            "properties": {
                                "id": {"type": "string"},
                                "description": {"type": "string"},
                                "status": {"type": "string", "enum": ["in_progress", "done"]},
                            },
                            "required": ["id", "description"],
                        },
                    },
                },
                "required": ["steps"],
            }),
        }
    }

    async fn call(&self, args: Value, _ctx: Option<&ToolCallContext>) -> Result<ToolCallContent, ToolSourceError> {
        let raw_steps = args
            .get("steps")
            .and_then(|v| v.as_array())
            .ok_or_else(|| ToolSourceError::InvalidArguments("missing steps array".into()))?;

        let mut steps = Vec::with_capacity(raw_steps.len());
        for raw in raw_steps {
            let id = raw
                .get("id")
                .and_then(|v| v.as_str())
                .ok_or_else(|| ToolSourceError::InvalidArguments("step missing id".into()))?;
            let description = raw
                .get("description")
                .and_then(|v| v.as_str())
                .ok_or_else(|| ToolSourceError::InvalidArguments("step missing description".into()))?;
            let status = raw.get("status").and_then(|v| v.as_str()).map(parse_status).unwrap_or(PlanStatus::InProgress);
            steps.push(PlanStep { id: id.to_string(), description: description.to_string(), status });
        }

        let count = steps.len();
        self.plan_store.set(&self.session_id, steps).await;
        Ok(format!("plan updated with {count} step(s)").into())
    }
}
