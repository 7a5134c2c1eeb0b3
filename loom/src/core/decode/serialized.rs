//! Serialized (`yaml`) decode path: extract a fenced YAML block and deserialize it into
//! a [`Decision`], with a Windows-path backslash recovery heuristic on first failure.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::core::decision::{Decision, YamlDecision};

use super::structured::{NATIVE_MARKER_BEGIN, NATIVE_MARKER_END};
use super::DecodeError;

static YAML_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)```yaml\s*\n(.*?)```").expect("valid regex"));
static ANY_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)```\w*\s*\n(.*?)```").expect("valid regex"));
/// Double-quoted value shaped like a Windows path: `"C:\foo\bar"`.
static WINDOWS_PATH_VALUE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""[A-Za-z]:\\[^"]*""#).expect("valid regex"));

fn extract_block(text: &str) -> (String, bool) {
    if let Some(caps) = YAML_FENCE.captures(text) {
        return (caps[1].to_string(), true);
    }
    if let Some(caps) = ANY_FENCE.captures(text) {
        return (caps[1].to_string(), true);
    }
    (text.to_string(), false)
}

/// Replaces backslashes with forward slashes inside any double-quoted Windows-path-shaped
/// value, leaving the rest of the YAML untouched.
fn recover_windows_paths(block: &str) -> String {
    WINDOWS_PATH_VALUE
        .replace_all(block, |caps: &regex::Captures| caps[0].replace('\\', "/"))
        .into_owned()
}

pub fn decode_serialized(text: &str) -> Result<Decision, DecodeError> {
    if let Some(idx) = text.find(NATIVE_MARKER_BEGIN) {
        if text[idx..].contains(NATIVE_MARKER_END) {
            return super::structured::decode_native_marker_pub(text, idx);
        }
    }

    let (block, had_fence) = extract_block(text);

    if let Some(decision) = try_parse(&block) {
        return Ok(decision);
    }

    let recovered = recover_windows_paths(&block);
    if let Some(decision) = try_parse(&recovered) {
        return Ok(decision);
    }

    if !text.trim().is_empty() && !had_fence {
        return Ok(Decision::answer(text.to_string(), ""));
    }

    Err(DecodeError::Unparseable(block))
}

fn try_parse(block: &str) -> Option<Decision> {
    let parsed: YamlDecision = serde_yaml::from_str(block).ok()?;
    parsed.into_decision()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::decision::DecisionAction;

    #[test]
    fn extracts_yaml_fenced_block() {
        let text = "some preamble\n```yaml\naction: answer\nanswer: hi\n```\ntrailer";
        let decision = decode_serialized(text).unwrap();
        assert_eq!(decision.action, DecisionAction::Answer);
        assert_eq!(decision.answer.as_deref(), Some("hi"));
    }

    #[test]
    fn falls_back_to_any_fenced_block_when_not_tagged_yaml() {
        let text = "```\naction: answer\nanswer: hi\n```";
        let decision = decode_serialized(text).unwrap();
        assert_eq!(decision.action, DecisionAction::Answer);
    }

    #[test]
    fn windows_path_recovery_converts_backslashes_in_quoted_value() {
        let text = "```yaml\naction: tool\ntool: file_read\nparams:\n  path: \"E:\\AI\\docs\"\n```";
        let decision = decode_serialized(text).unwrap();
        assert_eq!(
            decision.tool_params.get("path").and_then(|v| v.as_str()),
            Some("E:/AI/docs")
        );
    }

    #[test]
    fn unfenced_nonempty_text_becomes_a_direct_answer() {
        let decision = decode_serialized("just talk to me").unwrap();
        assert_eq!(decision.answer.as_deref(), Some("just talk to me"));
    }

    #[test]
    fn fenced_but_unparseable_block_fails_rather_than_becoming_an_answer() {
        let text = "```yaml\n: : not valid yaml : :\n```";
        let err = decode_serialized(text).unwrap_err();
        assert!(matches!(err, DecodeError::Unparseable(_)));
    }

    #[test]
    fn empty_text_fails() {
        let err = decode_serialized("   ").unwrap_err();
        assert!(matches!(err, DecodeError::Unparseable(_)));
    }

    #[test]
    fn native_marker_degenerate_case_is_honoured_in_serialized_path() {
        let content = format!(
            "列出目录 {}[{{\"name\":\"file_list\",\"parameters\":{{\"path\":\".\"}}}}]{}",
            NATIVE_MARKER_BEGIN, NATIVE_MARKER_END
        );
        let decision = decode_serialized(&content).unwrap();
        assert_eq!(decision.tool_name.as_deref(), Some("file_list"));
    }
}
