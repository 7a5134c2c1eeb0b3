//! Cheap token estimator shared by prompt-budget, cost, and context guards (§4.7, §9).
//!
//! Intentionally imprecise — "treat ±25% error as normal" (§9) — but the same estimator
//! must be used on both sides of any threshold comparison.

/// CJK Unified Ideographs block, counted as "CJK" for the purposes of the estimator.
fn is_cjk(c: char) -> bool {
    ('\u{4E00}'..='\u{9FFF}').contains(&c)
}

/// `cjkChars/2 + otherChars/4 + 1`.
pub fn estimate_tokens(text: &str) -> u32 {
    let (cjk, other) = text.chars().fold((0u32, 0u32), |(cjk, other), c| {
        if is_cjk(c) {
            (cjk + 1, other)
        } else {
            (cjk, other + 1)
        }
    });
    cjk / 2 + other / 4 + 1
}

/// The set of rune-based bigrams (length-2 substrings) of `s`.
pub fn bigrams(s: &str) -> std::collections::HashSet<String> {
    let chars: Vec<char> = s.chars().collect();
    if chars.len() < 2 {
        return chars.iter().map(|c| c.to_string()).collect();
    }
    chars.windows(2).map(|w| w.iter().collect()).collect()
}

/// Jaccard similarity over bigram sets; two empty sets are defined as maximally similar.
pub fn bigram_jaccard(a: &str, b: &str) -> f64 {
    let sa = bigrams(a);
    let sb = bigrams(b);
    if sa.is_empty() && sb.is_empty() {
        return 1.0;
    }
    let intersection = sa.intersection(&sb).count();
    let union = sa.union(&sb).count();
    if union == 0 {
        return 1.0;
    }
    intersection as f64 / union as f64
}
