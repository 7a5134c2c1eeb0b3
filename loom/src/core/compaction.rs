//! Session compaction: merges the oldest turns of a conversation into a short running
//! summary so the live history stays bounded (§4.10).

use std::sync::Arc;
use std::time::Duration;

use crate::core::decode::truncate_runes;
use crate::error::AgentError;
use crate::llm::LlmClient;
use crate::memory::Turn;
use crate::message::Message;

/// Wall-clock budget for a single compaction call, independent of the outer request
/// deadline (§4.10, §5).
pub const COMPACTION_DEADLINE: Duration = Duration::from_secs(60);

const TURN_FIELD_TRUNCATE_RUNES: usize = 500;
const SUMMARY_TARGET_CHARS: usize = 200;

fn render_turns(turns: &[Turn]) -> String {
    turns
        .iter()
        .map(|t| {
            format!(
                "User: {}\nAssistant: {}",
                truncate_runes(&t.user, TURN_FIELD_TRUNCATE_RUNES),
                truncate_runes(&t.assistant, TURN_FIELD_TRUNCATE_RUNES)
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Builds the single-request prompt asking the model for a `<= 200`-character summary of
/// the turns being dropped, merging in `existing_summary` when present. Returns `None`
/// when there is nothing to summarize (`turns.len() <= keep_n`).
pub fn build_compact_prompt(turns: &[Turn], existing_summary: &str, keep_n: usize) -> Option<String> {
    if turns.len() <= keep_n {
        return None;
    }
    let to_summarize = &turns[..turns.len() - keep_n];
    let rendered = render_turns(to_summarize);

    let mut prompt = String::new();
    if !existing_summary.is_empty() {
        prompt.push_str(&format!(
            "Merge the following existing summary with the new conversation below into a single summary of at most {SUMMARY_TARGET_CHARS} characters.\n\nExisting summary:\n{existing_summary}\n\n"
        ));
    } else {
        prompt.push_str(&format!(
            "Summarize the following conversation in at most {SUMMARY_TARGET_CHARS} characters.\n\n"
        ));
    }
    prompt.push_str(&rendered);
    Some(prompt)
}

/// Runs one compaction round: builds the prompt, calls the model under a nested 60s
/// deadline, and returns the new summary text. Returns `Ok(None)` when there was nothing
/// to compact.
pub async fn compact(
    llm: &Arc<dyn LlmClient>,
    turns: &[Turn],
    existing_summary: &str,
    keep_n: usize,
) -> Result<Option<String>, AgentError> {
    let Some(prompt) = build_compact_prompt(turns, existing_summary, keep_n) else {
        return Ok(None);
    };

    let messages = vec![Message::User(prompt)];
    let response = tokio::time::timeout(COMPACTION_DEADLINE, llm.invoke(&messages))
        .await
        .map_err(|_| AgentError::ExecutionFailed("compaction timed out".to_string()))??;

    Ok(Some(truncate_runes(response.content.trim(), SUMMARY_TARGET_CHARS)))
}
