//! Editor template composition and comment stripping.
//!
//! # Responsibility
//! - Build the scratch text handed to the author's editor.
//! - Remove tool-inserted comment lines from the edited result.
//!
//! # Invariants
//! - `strip_comments` is idempotent.
//! - Lines are split on `\n` only, so stripping never rewrites line content.

/// Lines starting with this marker never reach the stored body.
pub const IGNORE_MARKER: &str = "#pb";

const BOILERPLATE: [&str; 2] = [
    "Place more detailed content in here",
    "Any lines beginning with #pb will be ignored",
];

/// Builds editor input from prior content plus commented guidance.
///
/// Without `existing`, the template starts with two blank lines for the
/// author to type into.
pub fn compose_template(existing: Option<&str>, comments: &[&str]) -> String {
    let mut lines: Vec<String> = match existing {
        Some(text) => text.split('\n').map(str::to_string).collect(),
        None => vec![String::new(), String::new()],
    };

    let commented = comments
        .iter()
        .copied()
        .flat_map(|comment| comment.split('\n'))
        .chain(BOILERPLATE);
    lines.extend(commented.map(|line| format!("{IGNORE_MARKER} {line}")));

    let mut text = lines.join("\n");
    text.push('\n');
    text
}

/// Drops marker lines and trims leading/trailing blank lines.
pub fn strip_comments(text: &str) -> String {
    let kept: Vec<&str> = text
        .split('\n')
        .filter(|line| !line.starts_with(IGNORE_MARKER))
        .collect();

    let Some(first) = kept.iter().position(|line| !line.trim().is_empty()) else {
        return String::new();
    };
    let last = kept
        .iter()
        .rposition(|line| !line.trim().is_empty())
        .unwrap_or(first);
    kept[first..=last].join("\n")
}
