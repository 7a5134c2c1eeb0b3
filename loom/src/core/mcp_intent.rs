//! MCP intent detection (§4.8): gates inclusion of optional prompt sections only, never
//! routes or guards behaviour on its own.

const SUBSTRINGS: &[&str] = &["mcp", "技能", "自定义工具", "创建工具", "新建工具"];

/// Bag-of-words pairs where both terms must appear (in either order, anywhere in the text).
const WORD_PAIRS: &[(&str, &str)] = &[("build", "tool"), ("create", "tool"), ("custom", "tool")];

pub fn matches_mcp_intent(problem: &str) -> bool {
    let lowered = problem.to_lowercase();
    if SUBSTRINGS.iter().any(|s| lowered.contains(s)) {
        return true;
    }
    WORD_PAIRS
        .iter()
        .any(|(a, b)| lowered.contains(a) && lowered.contains(b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_mcp_substring_case_insensitively() {
        assert!(matches_mcp_intent("Can you set up an MCP server?"));
    }

    #[test]
    fn detects_chinese_skill_keyword() {
        assert!(matches_mcp_intent("帮我创建工具来做这件事"));
    }

    #[test]
    fn detects_bag_of_words_build_tool() {
        assert!(matches_mcp_intent("I want to build a custom tool for this"));
    }

    #[test]
    fn unrelated_text_does_not_match() {
        assert!(!matches_mcp_intent("what time is it"));
    }

    #[test]
    fn single_word_of_a_pair_alone_does_not_match() {
        assert!(!matches_mcp_intent("let's build something"));
    }
}
