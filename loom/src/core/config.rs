//! Runtime configuration for one agent instance, read from the environment (§6).
//!
//! The `config` crate is responsible for getting values *into* the environment (`.env`,
//! XDG `config.toml`); this module is only responsible for reading them back out with
//! defaults and bounds-clamping.

use std::time::Duration;

use crate::core::state::{ThinkingMode, ToolCallMode};

fn env_string(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

fn env_parsed<T: std::str::FromStr>(key: &str, default: T) -> T {
    env_string(key).and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn clamp_u32(value: u32, min: u32, max: u32) -> u32 {
    value.clamp(min, max)
}

/// Per-agent configuration assembled from the environment (§6 "Environment variables").
#[derive(Clone, Debug)]
pub struct AgentConfig {
    pub workspace_root: Option<String>,
    pub prompts_dir: Option<String>,
    pub user_rules_path: Option<String>,
    pub persona_path: Option<String>,
    pub session_ttl_minutes: u32,
    pub session_max_turns: u32,
    pub max_agent_steps: u32,
    pub agent_timeout_minutes: u32,
    pub agent_token_budget: u64,
    pub agent_duration_limit_secs: u64,
    pub model_name: String,
    pub context_window_tokens: u32,
    pub thinking_mode: ThinkingMode,
    pub tool_call_mode: ToolCallMode,
}

impl Default for AgentConfig {
    fn default() -> Self {
        AgentConfig {
            workspace_root: None,
            prompts_dir: None,
            user_rules_path: None,
            persona_path: None,
            session_ttl_minutes: 60,
            session_max_turns: 50,
            max_agent_steps: 40,
            agent_timeout_minutes: 10,
            agent_token_budget: 200_000,
            agent_duration_limit_secs: 0,
            model_name: "default".to_string(),
            context_window_tokens: 0,
            thinking_mode: ThinkingMode::App,
            tool_call_mode: ToolCallMode::Auto,
        }
    }
}

impl AgentConfig {
    /// Reads configuration from the process environment, applying documented defaults and
    /// bounds (e.g. `AGENT_TIMEOUT_MINUTES` is clamped to `[1, 30]`, §5).
    ///
    /// First applies `.env`/XDG `config.toml` values for keys not already set in the
    /// process environment, so a host binary doesn't have to call `env_config` itself.
    pub fn from_env() -> Self {
        let _ = env_config::load_and_apply("loom", None);
        let defaults = AgentConfig::default();
        AgentConfig {
            workspace_root: env_string("AGENT_WORKSPACE_ROOT"),
            prompts_dir: env_string("AGENT_PROMPTS_DIR"),
            user_rules_path: env_string("AGENT_USER_RULES_PATH"),
            persona_path: env_string("AGENT_PERSONA_PATH"),
            session_ttl_minutes: env_parsed("AGENT_SESSION_TTL_MINUTES", defaults.session_ttl_minutes),
            session_max_turns: env_parsed("AGENT_SESSION_MAX_TURNS", defaults.session_max_turns),
            max_agent_steps: clamp_u32(env_parsed("AGENT_MAX_STEPS", defaults.max_agent_steps), 1, 200),
            agent_timeout_minutes: clamp_u32(
                env_parsed("AGENT_TIMEOUT_MINUTES", defaults.agent_timeout_minutes),
                1,
                30,
            ),
            agent_token_budget: env_parsed("AGENT_TOKEN_BUDGET", defaults.agent_token_budget),
            agent_duration_limit_secs: env_parsed(
                "AGENT_DURATION_LIMIT_SECS",
                defaults.agent_duration_limit_secs,
            ),
            model_name: env_string("AGENT_MODEL_NAME").unwrap_or(defaults.model_name),
            context_window_tokens: env_parsed("AGENT_CONTEXT_WINDOW", defaults.context_window_tokens),
            thinking_mode: env_string("AGENT_THINKING_MODE")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.thinking_mode),
            tool_call_mode: env_string("AGENT_TOOL_CALL_MODE")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.tool_call_mode),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.agent_timeout_minutes as u64 * 60)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clear_env() {
        for key in [
            "AGENT_WORKSPACE_ROOT",
            "AGENT_PROMPTS_DIR",
            "AGENT_USER_RULES_PATH",
            "AGENT_PERSONA_PATH",
            "AGENT_SESSION_TTL_MINUTES",
            "AGENT_SESSION_MAX_TURNS",
            "AGENT_MAX_STEPS",
            "AGENT_TIMEOUT_MINUTES",
            "AGENT_TOKEN_BUDGET",
            "AGENT_DURATION_LIMIT_SECS",
            "AGENT_MODEL_NAME",
            "AGENT_CONTEXT_WINDOW",
            "AGENT_THINKING_MODE",
            "AGENT_TOOL_CALL_MODE",
        ] {
            std::env::remove_var(key);
        }
    }

    #[test]
    fn defaults_apply_when_env_unset() {
        clear_env();
        let config = AgentConfig::from_env();
        assert_eq!(config.max_agent_steps, 40);
        assert_eq!(config.agent_timeout_minutes, 10);
        assert_eq!(config.model_name, "default");
    }

    #[test]
    fn timeout_minutes_clamps_to_documented_bounds() {
        clear_env();
        std::env::set_var("AGENT_TIMEOUT_MINUTES", "999");
        let config = AgentConfig::from_env();
        assert_eq!(config.agent_timeout_minutes, 30);
        std::env::set_var("AGENT_TIMEOUT_MINUTES", "0");
        let config = AgentConfig::from_env();
        assert_eq!(config.agent_timeout_minutes, 1);
        clear_env();
    }

    #[test]
    fn tool_call_mode_parses_from_env() {
        clear_env();
        std::env::set_var("AGENT_TOOL_CALL_MODE", "fc");
        let config = AgentConfig::from_env();
        assert_eq!(config.tool_call_mode, ToolCallMode::Fc);
        clear_env();
    }
}
