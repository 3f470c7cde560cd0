//! Priority token normalization.
//!
//! # Responsibility
//! - Map user priority tokens (names, abbreviations or ranks) onto
//!   [`Priority`].
//!
//! # Invariants
//! - Integers outside the known ranks fall back to `Normal` without error.
//! - Unknown words fail unless the caller asked for the default fallback.

use crate::model::item::Priority;
use crate::resolve::fuzzy::{resolve_choice, AmbiguityPolicy, MatchError};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Priority resolution failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PriorityError {
    /// Token is neither a priority name nor an integer.
    Invalid(String),
    /// Abbreviation matched several priority names.
    Ambiguous(MatchError),
}

impl Display for PriorityError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Invalid(token) => write!(
                f,
                "invalid priority `{token}`; expected one of {}",
                scale_description()
            ),
            Self::Ambiguous(err) => write!(f, "{err}"),
        }
    }
}

impl Error for PriorityError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Invalid(_) => None,
            Self::Ambiguous(err) => Some(err),
        }
    }
}

/// Normalizes an exact priority name or rank.
///
/// `default_on_invalid` turns an unrecognized word into `Normal` instead of
/// an error. Out-of-range integers always fall back to `Normal`.
pub fn normalize(token: &str, default_on_invalid: bool) -> Result<Priority, PriorityError> {
    let cleaned = token.trim().to_lowercase();
    if let Some(priority) = Priority::from_name(&cleaned) {
        return Ok(priority);
    }

    if is_integer(&cleaned) {
        // Ranks too large for i64 are out of range like any other.
        let rank = cleaned.parse::<i64>().ok();
        return Ok(rank.and_then(Priority::from_rank).unwrap_or_default());
    }
    if default_on_invalid {
        Ok(Priority::default())
    } else {
        Err(PriorityError::Invalid(token.trim().to_string()))
    }
}

fn is_integer(token: &str) -> bool {
    let digits = token.strip_prefix(['+', '-']).unwrap_or(token);
    !digits.is_empty() && digits.bytes().all(|byte| byte.is_ascii_digit())
}

/// Resolves an option-style token, allowing unique abbreviations.
///
/// Tokens that match nothing are handed to [`normalize`] unchanged, so
/// `"7"` still lands on `Normal` and `"urgent"` still fails.
pub fn resolve(token: &str, policy: AmbiguityPolicy) -> Result<Priority, PriorityError> {
    let cleaned = token.trim().to_lowercase();
    let choices = priority_choices();
    match resolve_choice(&cleaned, &choices, policy) {
        Ok(matched) => normalize(&matched, false),
        Err(err @ MatchError::Ambiguous { .. }) => Err(PriorityError::Ambiguous(err)),
        Err(MatchError::NotFound { .. }) => normalize(&cleaned, false),
    }
}

/// All accepted exact tokens: names followed by rank digits.
pub fn priority_choices() -> Vec<String> {
    let mut choices: Vec<String> = Priority::ALL
        .iter()
        .map(|priority| priority.name().to_string())
        .collect();
    choices.extend(Priority::ALL.iter().map(|p| p.rank().to_string()));
    choices
}

/// Human-readable scale, e.g. `highest/1, high/2, ...`.
pub fn scale_description() -> String {
    Priority::ALL
        .iter()
        .map(|priority| format!("{}/{}", priority.name(), priority.rank()))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::{normalize, resolve, scale_description, PriorityError};
    use crate::model::item::Priority;
    use crate::resolve::fuzzy::AmbiguityPolicy;

    #[test]
    fn names_are_case_and_whitespace_insensitive() {
        assert_eq!(normalize(" HIGH ", false).unwrap(), Priority::High);
        assert_eq!(normalize("Lowest", false).unwrap(), Priority::Lowest);
    }

    #[test]
    fn out_of_range_rank_falls_back_to_normal() {
        assert_eq!(normalize("9", false).unwrap(), Priority::Normal);
        assert_eq!(normalize("-1", false).unwrap(), Priority::Normal);
    }

    #[test]
    fn unknown_word_respects_default_flag() {
        assert_eq!(normalize("urgent", true).unwrap(), Priority::Normal);
        assert_eq!(
            normalize("urgent", false).unwrap_err(),
            PriorityError::Invalid("urgent".to_string())
        );
    }

    #[test]
    fn resolve_accepts_unique_abbreviations() {
        assert_eq!(resolve("nor", AmbiguityPolicy::Fail).unwrap(), Priority::Normal);
        assert_eq!(resolve("lowe", AmbiguityPolicy::Fail).unwrap(), Priority::Lowest);
        assert_eq!(resolve("2", AmbiguityPolicy::Fail).unwrap(), Priority::High);
    }

    #[test]
    fn resolve_reports_ambiguous_abbreviation() {
        let err = resolve("hi", AmbiguityPolicy::Fail).unwrap_err();
        assert!(matches!(err, PriorityError::Ambiguous(_)));
        assert_eq!(resolve("hi", AmbiguityPolicy::FirstSorted).unwrap(), Priority::High);
    }

    #[test]
    fn scale_lists_every_rank() {
        assert_eq!(
            scale_description(),
            "highest/1, high/2, normal/3, low/4, lowest/5"
        );
    }
}
