//! The [`Decision`] a decide-node Exec phase produces, independent of which decode path
//! (structured or serialized) produced it.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// What the decide node chose to do next.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecisionAction {
    Tool,
    Think,
    Answer,
}

/// Context-budget classification attached to a decision after the token estimate runs
/// (§4.2, §4.7 context guard).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ContextStatus {
    #[default]
    Ok,
    Warning,
    Critical,
}

/// The normalized output of a decide-node Exec phase, regardless of decode path.
#[derive(Clone, Debug)]
pub struct Decision {
    pub action: DecisionAction,
    pub reason: String,
    pub tool_name: Option<String>,
    pub tool_params: HashMap<String, Value>,
    pub thinking: Option<String>,
    pub answer: Option<String>,
    pub tool_call_id: Option<String>,
    pub context_status: ContextStatus,
    /// Plan sideband lifted from `reason`'s `[plan:<id>:(in_progress|done)]` token, or set
    /// directly by a structured decode path that surfaces the fields explicitly.
    pub plan_step: Option<String>,
    pub plan_status: Option<String>,
}

impl Decision {
    pub fn answer(text: impl Into<String>, reason: impl Into<String>) -> Self {
        Decision {
            action: DecisionAction::Answer,
            reason: reason.into(),
            tool_name: None,
            tool_params: HashMap::new(),
            thinking: None,
            answer: Some(text.into()),
            tool_call_id: None,
            context_status: ContextStatus::Ok,
            plan_step: None,
            plan_status: None,
        }
    }

    pub fn tool(
        name: impl Into<String>,
        params: HashMap<String, Value>,
        reason: impl Into<String>,
    ) -> Self {
        Decision {
            action: DecisionAction::Tool,
            reason: reason.into(),
            tool_name: Some(name.into()),
            tool_params: params,
            thinking: None,
            answer: None,
            tool_call_id: None,
            context_status: ContextStatus::Ok,
            plan_step: None,
            plan_status: None,
        }
    }

    pub fn think(text: impl Into<String>, reason: impl Into<String>) -> Self {
        Decision {
            action: DecisionAction::Think,
            reason: reason.into(),
            tool_name: None,
            tool_params: HashMap::new(),
            thinking: Some(text.into()),
            answer: None,
            tool_call_id: None,
            context_status: ContextStatus::Ok,
            plan_step: None,
            plan_status: None,
        }
    }
}

/// Shape of the serialized (`yaml`) decode path's fenced block, deserialized directly
/// with `serde_yaml` then normalized into a [`Decision`].
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct YamlDecision {
    pub action: String,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub tool: Option<String>,
    #[serde(default)]
    pub params: HashMap<String, Value>,
    #[serde(default)]
    pub thinking: Option<String>,
    #[serde(default)]
    pub answer: Option<String>,
    #[serde(default)]
    pub plan_step: Option<String>,
    #[serde(default)]
    pub plan_status: Option<String>,
}

impl YamlDecision {
    pub fn into_decision(self) -> Option<Decision> {
        let action = match self.action.to_lowercase().as_str() {
            "tool" => DecisionAction::Tool,
            "think" => DecisionAction::Think,
            "answer" => DecisionAction::Answer,
            _ => return None,
        };
        Some(Decision {
            action,
            reason: self.reason,
            tool_name: self.tool,
            tool_params: self.params,
            thinking: self.thinking,
            answer: self.answer,
            tool_call_id: None,
            context_status: ContextStatus::Ok,
            plan_step: self.plan_step,
            plan_status: self.plan_status,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn yaml_decision_rejects_unknown_action() {
        let y = YamlDecision { action: "bogus".into(), ..Default::default() };
        assert!(y.into_decision().is_none());
    }

    #[test]
    fn yaml_decision_normalizes_tool_action() {
        let y = YamlDecision {
            action: "Tool".into(),
            tool: Some("file_read".into()),
            ..Default::default()
        };
        let d = y.into_decision().unwrap();
        assert_eq!(d.action, DecisionAction::Tool);
        assert_eq!(d.tool_name.as_deref(), Some("file_read"));
    }
}
