//! Dual decoding path: a structured tool-call response vs. a serialized text block, each
//! normalized into a [`Decision`] (§4.2).

mod serialized;
mod structured;

pub use serialized::decode_serialized;
pub use structured::decode_structured;

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("model returned an empty response")]
    Empty,
    #[error("tool {0:?} is not among the offered tool definitions")]
    UnknownTool(String),
    #[error("could not parse tool call arguments as a JSON object: {0}")]
    InvalidArguments(String),
    #[error("native tool-call marker present but embedded JSON was unparseable")]
    UnparseableNativeMarker,
    #[error("could not parse a decision from the model's text: {0}")]
    Unparseable(String),
}

/// Truncates `s` to at most `n` runes (never bytes — UTF-8 must stay valid, §4.5/§8).
pub fn truncate_runes(s: &str, n: usize) -> String {
    s.chars().take(n).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_runes_respects_utf8_boundaries() {
        let s = "你好世界hello";
        let truncated = truncate_runes(s, 3);
        assert_eq!(truncated, "你好世");
        assert!(!truncated.contains('\u{FFFD}'));
    }

    #[test]
    fn truncate_runes_shorter_than_limit_is_unchanged() {
        assert_eq!(truncate_runes("hi", 10), "hi");
    }
}
