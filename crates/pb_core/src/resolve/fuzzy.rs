//! Prefix-then-substring token matching.
//!
//! # Responsibility
//! - Resolve one user token to exactly one member of a choice set.
//! - Report ambiguity and misses with enough context for prompts/errors.
//!
//! # Invariants
//! - Exact membership always wins.
//! - The substring tier is consulted only when no choice has the prefix.
//! - Candidate lists in errors are sorted lexicographically.
//! - Callers lower-case both sides before matching.

use log::debug;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Resolution failure for a fuzzy token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchError {
    /// No choice equals, starts with, or contains the token.
    NotFound { given: String, choices: Vec<String> },
    /// More than one choice matched in the active tier.
    Ambiguous {
        given: String,
        candidates: Vec<String>,
    },
}

impl Display for MatchError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound { given, choices } => write!(
                f,
                "`{given}` matches none of [{}]",
                choices.join(", ")
            ),
            Self::Ambiguous { given, candidates } => write!(
                f,
                "`{given}` is ambiguous between [{}]",
                candidates.join(", ")
            ),
        }
    }
}

impl Error for MatchError {}

/// How a call site settles an ambiguous match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AmbiguityPolicy {
    /// Surface [`MatchError::Ambiguous`] to the caller.
    #[default]
    Fail,
    /// Pick the first candidate in lexicographic order.
    FirstSorted,
}

/// Resolves `given` to exactly one entry of `choices`.
///
/// # Errors
/// - [`MatchError::Ambiguous`] when the prefix (or, failing that, substring)
///   tier has more than one member.
/// - [`MatchError::NotFound`] when neither tier has a member.
pub fn fuzzy_match<S: AsRef<str>>(given: &str, choices: &[S]) -> Result<String, MatchError> {
    if let Some(exact) = choices.iter().find(|choice| choice.as_ref() == given) {
        return Ok(exact.as_ref().to_string());
    }

    let mut candidates = collect(choices, |choice| choice.starts_with(given));
    if candidates.is_empty() {
        candidates = collect(choices, |choice| choice.contains(given));
    }

    match candidates.len() {
        0 => Err(MatchError::NotFound {
            given: given.to_string(),
            choices: choices.iter().map(|c| c.as_ref().to_string()).collect(),
        }),
        1 => Ok(candidates.remove(0)),
        _ => {
            candidates.sort();
            Err(MatchError::Ambiguous {
                given: given.to_string(),
                candidates,
            })
        }
    }
}

/// Resolves `given` and settles ambiguity according to `policy`.
pub fn resolve_choice<S: AsRef<str>>(
    given: &str,
    choices: &[S],
    policy: AmbiguityPolicy,
) -> Result<String, MatchError> {
    match fuzzy_match(given, choices) {
        Err(MatchError::Ambiguous { given, candidates }) if policy == AmbiguityPolicy::FirstSorted => {
            let first = candidates[0].clone();
            debug!(
                "event=fuzzy_choose module=resolve status=ok given={} chosen={} candidates={}",
                given,
                first,
                candidates.len()
            );
            Ok(first)
        }
        other => other,
    }
}

fn collect<S: AsRef<str>>(choices: &[S], keep: impl Fn(&str) -> bool) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for choice in choices {
        let choice = choice.as_ref();
        if keep(choice) && !out.iter().any(|seen| seen == choice) {
            out.push(choice.to_string());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::{fuzzy_match, resolve_choice, AmbiguityPolicy, MatchError};

    const CATEGORIES: [&str; 3] = ["bugs", "features", "done"];

    #[test]
    fn unique_prefix_resolves() {
        assert_eq!(fuzzy_match("bug", &CATEGORIES).unwrap(), "bugs");
        assert_eq!(fuzzy_match("f", &CATEGORIES).unwrap(), "features");
    }

    #[test]
    fn exact_membership_beats_longer_prefix_matches() {
        let priorities = ["highest", "high", "normal"];
        assert_eq!(fuzzy_match("high", &priorities).unwrap(), "high");
    }

    #[test]
    fn substring_tier_is_used_only_without_prefix_hits() {
        assert_eq!(fuzzy_match("tur", &CATEGORIES).unwrap(), "features");
        let err = fuzzy_match("e", &CATEGORIES).unwrap_err();
        assert_eq!(
            err,
            MatchError::Ambiguous {
                given: "e".to_string(),
                candidates: vec!["done".to_string(), "features".to_string()],
            }
        );
    }

    #[test]
    fn miss_reports_full_choice_set() {
        let err = fuzzy_match("zzz", &CATEGORIES).unwrap_err();
        match err {
            MatchError::NotFound { given, choices } => {
                assert_eq!(given, "zzz");
                assert_eq!(choices.len(), 3);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn first_sorted_policy_picks_lexicographic_first() {
        let chosen = resolve_choice("e", &CATEGORIES, AmbiguityPolicy::FirstSorted).unwrap();
        assert_eq!(chosen, "done");
        assert!(resolve_choice("e", &CATEGORIES, AmbiguityPolicy::Fail).is_err());
    }
}
