// crates/core/src/classifier.rs
//! Runner output line classifier.
//!
//! Rule-based only: each line is checked against an ordered rule list
//! (start rules first, then pass → fail → skip) and the first match wins.
//! A line that matches more than one result keyword therefore always
//! resolves to the highest-priority one.

use crate::types::Outcome;

/// What a single output line means for session progress.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineEvent {
    /// A case started. The name may be empty when none could be extracted.
    Start(String),
    /// A case finished with the given outcome.
    Result(Outcome),
    /// Anything else.
    Plain,
}

type StartRule = fn(line: &str, lowered: &str) -> bool;

const START_RULES: &[StartRule] = &[mentions_starting_test, robot_start_marker, start_test_prefix];

fn mentions_starting_test(_line: &str, lowered: &str) -> bool {
    lowered.contains("starting test")
}

fn robot_start_marker(line: &str, _lowered: &str) -> bool {
    line.starts_with("START /")
}

fn start_test_prefix(line: &str, _lowered: &str) -> bool {
    line.starts_with("Start test")
}

const RESULT_RULES: &[(&str, Outcome)] = &[
    ("pass", Outcome::Pass),
    ("fail", Outcome::Fail),
    ("skip", Outcome::Skip),
];

/// Classify one decoded, trimmed output line.
pub fn classify(line: &str) -> LineEvent {
    let lowered = line.to_lowercase();

    if START_RULES.iter().any(|rule| rule(line, &lowered)) {
        return LineEvent::Start(extract_case_name(line));
    }

    RESULT_RULES
        .iter()
        .find(|(keyword, _)| matches_keyword(&lowered, keyword))
        .map(|(_, outcome)| LineEvent::Result(*outcome))
        .unwrap_or(LineEvent::Plain)
}

/// Text after the first colon, or the last whitespace-delimited token.
fn extract_case_name(line: &str) -> String {
    match line.split_once(':') {
        Some((_, rest)) => rest.trim().to_string(),
        None => line
            .split_whitespace()
            .last()
            .unwrap_or_default()
            .to_string(),
    }
}

/// Keyword appears as a delimited token, or as the line's prefix or suffix.
fn matches_keyword(lowered: &str, keyword: &str) -> bool {
    lowered.starts_with(keyword)
        || lowered.ends_with(keyword)
        || lowered.match_indices(keyword).any(|(idx, _)| {
            let before = lowered[..idx].chars().next_back();
            let after = lowered[idx + keyword.len()..].chars().next();
            !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
        })
}
