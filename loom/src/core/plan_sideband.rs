//! Plan sideband extraction: a `[plan:<id>:(in_progress|done)]` token piggybacked on a
//! decide step's `Reason` text (§4.2).

use once_cell::sync::Lazy;
use regex::Regex;

static PLAN_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[plan:(\w+):(in_progress|done)\]").expect("valid regex"));

/// Extracts `(step_id, status)` from an explicit field pair, falling back to the
/// `[plan:<id>:<status>]` token embedded in `reason`.
pub fn extract(
    explicit_step: Option<&str>,
    explicit_status: Option<&str>,
    reason: &str,
) -> Option<(String, String)> {
    if let (Some(step), Some(status)) = (explicit_step, explicit_status) {
        return Some((step.to_string(), status.to_string()));
    }
    PLAN_TOKEN
        .captures(reason)
        .map(|caps| (caps[1].to_string(), caps[2].to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_token_embedded_in_reason() {
        let (step, status) = extract(None, None, "x [plan:stepA:done] y").unwrap();
        assert_eq!(step, "stepA");
        assert_eq!(status, "done");
    }

    #[test]
    fn prefers_explicit_fields_over_embedded_token() {
        let (step, status) =
            extract(Some("explicitStep"), Some("in_progress"), "ignored [plan:other:done]").unwrap();
        assert_eq!(step, "explicitStep");
        assert_eq!(status, "in_progress");
    }

    #[test]
    fn no_match_returns_none() {
        assert!(extract(None, None, "just a normal reason").is_none());
    }
}
