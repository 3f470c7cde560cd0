use pb_core::resolve::priority::{normalize, resolve};
use pb_core::{fuzzy_match, resolve_choice, AmbiguityPolicy, MatchError, Priority, PriorityError};

const CATEGORIES: [&str; 3] = ["bugs", "features", "done"];

#[test]
fn prefix_expands_to_unique_category() {
    assert_eq!(fuzzy_match("bug", &CATEGORIES).unwrap(), "bugs");
    assert_eq!(fuzzy_match("done", &CATEGORIES).unwrap(), "done");
}

#[test]
fn substring_shared_by_two_categories_is_ambiguous() {
    let err = fuzzy_match("e", &CATEGORIES).unwrap_err();
    assert_eq!(
        err,
        MatchError::Ambiguous {
            given: "e".to_string(),
            candidates: vec!["done".to_string(), "features".to_string()],
        }
    );
    assert_eq!(
        resolve_choice("e", &CATEGORIES, AmbiguityPolicy::FirstSorted).unwrap(),
        "done"
    );
}

#[test]
fn prefix_tier_shadows_substring_tier() {
    let commands = ["add", "list", "close", "done", "do"];
    assert_eq!(fuzzy_match("ad", &commands).unwrap(), "add");
    assert_eq!(fuzzy_match("do", &commands).unwrap(), "do");
    assert!(matches!(
        fuzzy_match("zz", &commands),
        Err(MatchError::NotFound { .. })
    ));
}

#[test]
fn priority_names_and_ranks_agree() {
    for (token, expected) in [
        ("highest", Priority::Highest),
        ("1", Priority::Highest),
        ("HIGH", Priority::High),
        ("3", Priority::Normal),
        ("low", Priority::Low),
        ("5", Priority::Lowest),
    ] {
        assert_eq!(normalize(token, false).unwrap(), expected, "{token}");
    }
}

#[test]
fn out_of_range_rank_falls_back_to_normal() {
    assert_eq!(normalize("0", false).unwrap(), Priority::Normal);
    assert_eq!(normalize("42", false).unwrap(), Priority::Normal);
    assert_eq!(normalize("-3", false).unwrap(), Priority::Normal);
    assert_eq!(
        normalize("99999999999999999999", false).unwrap(),
        Priority::Normal
    );
    assert_eq!(
        normalize("-99999999999999999999", false).unwrap(),
        Priority::Normal
    );
    assert_eq!(normalize("+2", false).unwrap(), Priority::High);
    assert!(matches!(normalize("-", false), Err(PriorityError::Invalid(_))));
}

#[test]
fn unknown_priority_word_fails_unless_defaulted() {
    assert!(matches!(
        normalize("urgent", false),
        Err(PriorityError::Invalid(token)) if token == "urgent"
    ));
    assert_eq!(normalize("urgent", true).unwrap(), Priority::Normal);
}

#[test]
fn priority_abbreviations_resolve_or_report_ambiguity() {
    assert_eq!(resolve("lowe", AmbiguityPolicy::Fail).unwrap(), Priority::Lowest);
    assert_eq!(resolve("n", AmbiguityPolicy::Fail).unwrap(), Priority::Normal);
    assert!(matches!(
        resolve("h", AmbiguityPolicy::Fail),
        Err(PriorityError::Ambiguous(_))
    ));
    assert_eq!(resolve("h", AmbiguityPolicy::FirstSorted).unwrap(), Priority::High);
    assert_eq!(resolve("9", AmbiguityPolicy::Fail).unwrap(), Priority::Normal);
}
