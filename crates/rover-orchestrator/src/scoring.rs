//! Heuristic quality scoring for generated code.
//!
//! Both functions here are pure: they only look at the text, so the same
//! input always yields the same result. They are a ranking signal, not a
//! parser.

use once_cell::sync::Lazy;
use regex::Regex;

/// A `def`/`class` header ending in a colon with no body after it.
static OPEN_HEADER_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(def|class)\s+\w+.*:\s*$").expect("header regex should be valid")
});

/// A statement cut off after an assignment or attribute access.
static DANGLING_STATEMENT_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z_].*[=.]$").expect("dangling statement regex should be valid")
});

/// Line endings that close a statement or literal.
const STATEMENT_TERMINATORS: [char; 7] = [':', ',', ')', ']', '}', '"', '\''];

/// Base score every candidate starts from.
const BASE_SCORE: f64 = 0.5;

/// Returns true when `text` looks like it was cut off mid-generation.
pub fn is_truncated(text: &str) -> bool {
    let code = text.trim();

    if OPEN_HEADER_REGEX.is_match(code) {
        return true;
    }

    if code.matches("\"\"\"").count() % 2 != 0 {
        return true;
    }

    let unbalanced = |open: char, close: char| {
        code.chars().filter(|&c| c == open).count() != code.chars().filter(|&c| c == close).count()
    };
    if unbalanced('(', ')') || unbalanced('[', ']') || unbalanced('{', '}') {
        return true;
    }

    let last_line = code.rsplit('\n').next().unwrap_or_default().trim();
    !last_line.is_empty()
        && !last_line.ends_with(STATEMENT_TERMINATORS)
        && DANGLING_STATEMENT_REGEX.is_match(last_line)
}

/// Scores generated code in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Scorer {
    /// Token budget the text was generated under.
    max_tokens: u32,
}

impl Scorer {
    /// Creates a scorer for generations capped at `max_tokens`.
    pub fn new(max_tokens: u32) -> Self {
        Self { max_tokens }
    }

    /// Token budget used for the near-limit penalty.
    pub fn max_tokens(&self) -> u32 {
        self.max_tokens
    }

    /// Rates `text` from fixed surface signals, clamped to `[0, 1]`.
    pub fn score(&self, text: &str) -> f64 {
        let mut score = BASE_SCORE;

        if text.contains("\"\"\"") || text.contains("'''") {
            score += 0.1;
        }

        if text.contains("->") || text.contains(": ") {
            score += 0.1;
        }

        if text.contains("try:") || text.contains("except") || text.contains("raise") {
            score += 0.1;
        }

        if text.contains('#') {
            score += 0.05;
        }

        if text.chars().count() > 200 {
            score += 0.1;
        }

        let estimated_tokens = text.split_whitespace().count() as f64 * 1.3;
        if estimated_tokens > f64::from(self.max_tokens) * 0.95 {
            score -= 0.1;
        }

        if !is_truncated(text) {
            score += 0.15;
        }

        score.clamp(0.0, 1.0)
    }
}
