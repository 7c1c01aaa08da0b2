//! Text extraction primitives shared by the scanners.
//!
//! Everything here is line-oriented: callers work with 1-based line numbers
//! and short context snippets rather than byte offsets.

use regex::Regex;

/// Longest context snippet kept for a finding.
const MAX_CONTEXT_CHARS: usize = 120;

/// Extract the first capture group of `pattern` in `content`.
pub fn extract_first(content: &str, pattern: &str) -> Option<String> {
    let re = Regex::new(pattern).ok()?;
    re.captures(content)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// 1-based line number of a byte offset.
pub fn line_at(content: &str, offset: usize) -> usize {
    let end = offset.min(content.len());
    content.as_bytes()[..end].iter().filter(|b| **b == b'\n').count() + 1
}

/// The trimmed text of a 1-based line, shortened for display.
pub fn line_snippet(content: &str, line: usize) -> String {
    content
        .lines()
        .nth(line.saturating_sub(1))
        .map(snippet)
        .unwrap_or_default()
}

/// Trim and truncate a line for display, respecting char boundaries.
pub fn snippet(line: &str) -> String {
    let trimmed = line.trim();
    if trimmed.chars().count() <= MAX_CONTEXT_CHARS {
        return trimmed.to_string();
    }
    let cut: String = trimmed.chars().take(MAX_CONTEXT_CHARS).collect();
    format!("{}...", cut)
}

/// Collapse runs of whitespace into single spaces.
pub fn collapse_whitespace(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}
