//! Lexical uncertainty detection for generated answers.
//!
//! An answer is flagged uncertain when it contains any phrase from a fixed
//! hedging vocabulary, matched case-insensitively. The heuristic is
//! over-inclusive on purpose: a false positive only costs the user an extra
//! escalation offer. Answers that hedge semantically without using one of
//! these phrases slip through; that is a known limitation of the substring
//! approach, not something to patch with more vocabulary.

/// Hedging phrases matched as substrings of the lower-cased answer.
const UNCERTAINTY_MARKERS: &[&str] = &[
    "i don't know",
    "i'm not sure",
    "not sure",
    "unsure",
    "unclear",
    "cannot find",
    "no information",
    "not mentioned",
];

/// Returns true when `answer` contains any hedging phrase.
pub fn is_uncertain(answer: &str) -> bool {
    let lowered = answer.to_lowercase();
    UNCERTAINTY_MARKERS
        .iter()
        .any(|marker| lowered.contains(marker))
}
