//! System/user prompt assembly for the decide node (§4.5).

use crate::core::decode::truncate_runes;
use crate::core::guardrails::token_estimate::estimate_tokens;
use crate::core::mcp_intent::matches_mcp_intent;
use crate::core::state::{ThinkingMode, ToolCallMode};
use crate::registry::ToolRegistry;

/// Optional persona/knowledge/rule text a host surface can bind in. Every method defaults
/// to empty so a bare agent still assembles a complete, if minimal, prompt.
pub trait PromptLoader: Send + Sync {
    fn persona(&self) -> Option<String> {
        None
    }
    fn custom_rules(&self) -> Vec<String> {
        Vec::new()
    }
    fn knowledge(&self) -> Option<String> {
        None
    }
    fn decide_common(&self) -> Option<String> {
        None
    }
    fn answer_style(&self) -> Option<String> {
        None
    }
    fn rule_guide(&self) -> Option<String> {
        None
    }
    fn think_guide(&self) -> Option<String> {
        None
    }
    fn mcp_server_guide(&self) -> Option<String> {
        None
    }
    fn skill_doc_guide(&self) -> Option<String> {
        None
    }
}

/// The loader used when a host surface binds nothing.
pub struct NoopPromptLoader;
impl PromptLoader for NoopPromptLoader {}

const CUSTOM_RULES_HEADER: &str = "## User Rules";

/// Case-insensitive substrings that flag a custom rule as a prompt-injection attempt
/// against the agent's own system prompt (§4.5).
const INJECTION_PATTERNS: &[&str] =
    &["ignore previous", "disregard all", "from now on", "ignore all previous", "disregard the above"];

fn filter_injected_rules(rules: Vec<String>) -> Vec<String> {
    rules
        .into_iter()
        .filter(|r| {
            let lowered = r.to_lowercase();
            !INJECTION_PATTERNS.iter().any(|p| lowered.contains(p))
        })
        .collect()
}

const FC_PROTOCOL: &str = "You operate in a decide-act loop. To act, call exactly one tool from the \
offered definitions. To respond, return plain text with no tool call. Never repeat a call you already \
made with the same arguments. Produce a short plan before multi-step work, then execute it without \
asking for confirmation. End the task as soon as it is solved. Combine related shell operations into a \
single call rather than issuing them one at a time.";

const NATIVE_PROTOCOL: &str = "You operate in a decide-act loop. Reason internally before acting; do not \
narrate your reasoning in the response. To act, call exactly one tool from the offered definitions. To \
respond, return plain text with no tool call. Never repeat a call you already made with the same \
arguments. Produce a short plan before multi-step work, then execute it without asking for confirmation. \
End the task as soon as it is solved. Combine related shell operations into a single call rather than \
issuing them one at a time.";

const APP_PROTOCOL: &str = "You operate in a decide-act loop with three possible actions: tool, think, \
answer. Use think to reason explicitly before a tool call when the next step is not obvious; use tool to \
invoke exactly one tool; use answer to respond with the final result. Never repeat a tool call you already \
made with the same arguments. Produce a short plan before multi-step work, then execute it without asking \
for confirmation. End the task as soon as it is solved. Combine related shell operations into a single \
call rather than issuing them one at a time.";

fn l1_protocol(tool_call_mode: ToolCallMode, thinking_mode: ThinkingMode) -> &'static str {
    match tool_call_mode {
        ToolCallMode::Fc => FC_PROTOCOL,
        ToolCallMode::Auto | ToolCallMode::Yaml => match thinking_mode {
            ThinkingMode::Native => NATIVE_PROTOCOL,
            ThinkingMode::App => APP_PROTOCOL,
        },
    }
}

const CORE_TOOL_ORDER: &[&str] = &[
    "file_read",
    "file_list",
    "file_write",
    "file_patch",
    "file_delete",
    "file_move",
    "shell_exec",
    "config_edit",
];
const MANAGEMENT_TOOL_ORDER: &[&str] = &["update_plan", "walkthrough", "mcp_server_list"];

/// Orders tool names: core tools first (in their fixed order), then management tools, then
/// everything else alphabetically (§4.5 step 5).
fn ordered_tool_names(registry: &ToolRegistry) -> Vec<String> {
    let mut ordered = Vec::new();
    let mut seen = std::collections::HashSet::new();

    for name in CORE_TOOL_ORDER.iter().chain(MANAGEMENT_TOOL_ORDER) {
        if registry.contains(name) && seen.insert(name.to_string()) {
            ordered.push(name.to_string());
        }
    }
    let mut rest: Vec<String> =
        registry.names().iter().filter(|n| !seen.contains(*n)).cloned().collect();
    rest.sort();
    ordered.extend(rest);
    ordered
}

fn tool_summary_section(registry: &ToolRegistry) -> String {
    let mut lines = Vec::new();
    for name in ordered_tool_names(registry) {
        let Some(tool) = registry.get(&name) else { continue };
        let description = tool.spec().description;
        let first_line = description.lines().next().unwrap_or("").to_string();
        lines.push(format!("**{name}** — {first_line}"));
    }
    lines.join("\n")
}

fn runtime_line(os_name: &str, shell_cmd: &str, model_name: &str, context_window_tokens: u32, thinking_mode: ThinkingMode) -> String {
    let thinking = match thinking_mode {
        ThinkingMode::Native => "native",
        ThinkingMode::App => "app",
    };
    format!("Runtime: os={os_name} | shell={shell_cmd} | model={model_name} | ctx={context_window_tokens} | thinking={thinking}")
}

/// Caps `prompt` at `context_window_tokens * 2 * 25 / 100` runes (§4.5 token budget guard).
/// A zero window is treated as unbounded.
fn apply_token_budget(prompt: String, context_window_tokens: u32) -> String {
    if context_window_tokens == 0 {
        return prompt;
    }
    let cap = (context_window_tokens as u64 * 2 * 25 / 100) as usize;
    truncate_runes(&prompt, cap.max(1))
}

#[allow(clippy::too_many_arguments)]
pub fn build_system_prompt(
    loader: Option<&dyn PromptLoader>,
    registry: &ToolRegistry,
    tool_call_mode: ToolCallMode,
    thinking_mode: ThinkingMode,
    os_name: &str,
    shell_cmd: &str,
    model_name: &str,
    context_window_tokens: u32,
    problem: &str,
) -> String {
    let mut sections = Vec::new();

    if let Some(loader) = loader {
        if let Some(persona) = loader.persona() {
            sections.push(persona);
        }
        let rules = filter_injected_rules(loader.custom_rules());
        if !rules.is_empty() {
            let mut block = String::from(CUSTOM_RULES_HEADER);
            block.push('\n');
            for rule in rules {
                block.push_str("- ");
                block.push_str(&rule);
                block.push('\n');
            }
            sections.push(block.trim_end().to_string());
        }
    }

    sections.push(l1_protocol(tool_call_mode, thinking_mode).to_string());
    sections.push(runtime_line(os_name, shell_cmd, model_name, context_window_tokens, thinking_mode));

    let tool_summary = tool_summary_section(registry);
    if !tool_summary.is_empty() {
        sections.push(tool_summary);
    }

    if let Some(loader) = loader {
        if let Some(knowledge) = loader.knowledge() {
            sections.push(knowledge);
        }
        if let Some(decide_common) = loader.decide_common() {
            sections.push(decide_common);
        }
        if let Some(answer_style) = loader.answer_style() {
            sections.push(answer_style);
        }
        if let Some(rule_guide) = loader.rule_guide() {
            sections.push(rule_guide);
        }
        if !matches!(tool_call_mode, ToolCallMode::Fc) && !matches!(thinking_mode, ThinkingMode::Native) {
            if let Some(think_guide) = loader.think_guide() {
                sections.push(think_guide);
            }
        }
        if matches_mcp_intent(problem) {
            if let Some(mcp_guide) = loader.mcp_server_guide() {
                sections.push(mcp_guide);
            }
            if let Some(skill_guide) = loader.skill_doc_guide() {
                sections.push(skill_guide);
            }
        }
    }

    apply_token_budget(sections.join("\n\n"), context_window_tokens)
}

const RESPONSE_TEMPLATE_FC: &str = "Respond by calling exactly one of the tools above, or with plain \
text if you are done.";

const RESPONSE_TEMPLATE_YAML: &str = "Respond with a single fenced ```yaml block shaped exactly like:\n\
```yaml\n\
action: tool | think | answer\n\
reason: <why>\n\
tool: <tool name, when action is tool>\n\
params:\n\
  <key>: <value>\n\
thinking: <text, when action is think>\n\
answer: <text, when action is answer>\n\
```";

fn response_template(tool_call_mode: ToolCallMode) -> &'static str {
    match tool_call_mode {
        ToolCallMode::Fc => RESPONSE_TEMPLATE_FC,
        ToolCallMode::Auto | ToolCallMode::Yaml => RESPONSE_TEMPLATE_YAML,
    }
}

/// Assembles the decide node's user prompt (§4.5).
#[allow(clippy::too_many_arguments)]
pub fn build_user_prompt(
    conversation_prefix: &str,
    problem: &str,
    working_folder: Option<&str>,
    walkthrough_render: &str,
    plan_render: &str,
    step_summary: &str,
    step_count: usize,
    max_agent_steps: u32,
    tool_names: &[String],
    loop_warning: Option<&str>,
    exploration_warning: Option<&str>,
    tool_call_mode: ToolCallMode,
) -> String {
    let mut sections = Vec::new();

    if !conversation_prefix.is_empty() {
        sections.push(conversation_prefix.to_string());
    }
    sections.push(format!("Problem: {problem}"));

    if let Some(dir) = working_folder {
        sections.push(format!("Workspace directory: {dir}"));
    }
    if !walkthrough_render.is_empty() {
        sections.push(walkthrough_render.to_string());
    }
    if !plan_render.is_empty() {
        sections.push(plan_render.to_string());
    }
    if !step_summary.is_empty() {
        sections.push(step_summary.to_string());
    }

    if step_count > 3 && !tool_names.is_empty() {
        sections.push(format!("Available tools: {}", tool_names.join(", ")));
    }

    if max_agent_steps > 0 {
        let remaining = max_agent_steps.saturating_sub(step_count as u32);
        if remaining <= 5 {
            sections.push(format!(
                "Urgent: only {remaining} step(s) remain in this task's budget. Wrap up and answer."
            ));
        }
    }

    if let Some(warning) = loop_warning {
        sections.push(warning.to_string());
    }
    if let Some(warning) = exploration_warning {
        sections.push(warning.to_string());
    }

    sections.push(response_template(tool_call_mode).to_string());

    sections.join("\n\n")
}
