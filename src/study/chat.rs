use std::sync::OnceLock;

use regex::RegexSet;
use serde::Serialize;

const VAGUE_PATTERNS: &[&str] = &[
    r"\bit\b",
    r"explain this",
    r"explain it",
    r"in simple",
    r"understandable",
];

fn vague_patterns() -> &'static RegexSet {
    static PATTERNS: OnceLock<RegexSet> = OnceLock::new();
    PATTERNS.get_or_init(|| RegexSet::new(VAGUE_PATTERNS).expect("vague question patterns are valid"))
}

/// Questions like "explain it" or "in simple terms" that name no topic.
pub fn is_vague_question(question: &str) -> bool {
    vague_patterns().is_match(&question.to_lowercase())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatTurn {
    pub question: String,
    pub answer: String,
}
