//! Structured word-count report for a single source file.

use serde::{Deserialize, Serialize};

/// Counts as reported by the engine's counting tool.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WordCountReport {
    pub encode: String,
    pub text_words: u64,
    pub head_words: u64,
    pub outside: u64,
    pub headers: u64,
    pub elements: u64,
    pub math_inline: u64,
    pub math_display: u64,
    pub errors: u64,
    pub messages: String,
}
