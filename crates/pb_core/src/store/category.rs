//! Category directory resolution.
//!
//! # Responsibility
//! - Resolve a user token against the configured category vocabulary.
//! - Map the resolved name onto exactly one directory under the store root.
//!
//! # Invariants
//! - An exact-case directory name wins over a case-insensitive one.
//! - A non-directory entry with a matching name is fatal.
//! - Two case-variant directories without an exact match are fatal.
//! - New categories are created under their lower-case canonical name.

use crate::resolve::fuzzy::{resolve_choice, AmbiguityPolicy, MatchError};
use crate::store::{sorted_entries, StoreError, StoreResult};
use log::info;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Builds the sorted, lower-cased, de-duplicated category vocabulary.
pub fn known_categories<S: AsRef<str>>(pending: &[S], done: &str) -> Vec<String> {
    let mut set: BTreeSet<String> = pending
        .iter()
        .map(|category| clean(category.as_ref()))
        .filter(|category| !category.is_empty())
        .collect();
    let done = clean(done);
    if !done.is_empty() {
        set.insert(done);
    }
    set.into_iter().collect()
}

/// Finds the directory for `category` without creating anything.
///
/// # Errors
/// - [`StoreError::NameCollision`] when the matching entry is not a directory.
/// - [`StoreError::DuplicateCategory`] when only case variants exist and
///   there is more than one.
/// - [`StoreError::NotFound`] when nothing matches.
pub fn find_existing(store_root: &Path, category: &str) -> StoreResult<PathBuf> {
    let entries = sorted_entries(store_root)?;

    if let Some((_, path)) = entries.iter().find(|(name, _)| name == category) {
        return claim(path);
    }

    let wanted = clean(category);
    let folded: Vec<&(String, PathBuf)> = entries
        .iter()
        .filter(|(name, _)| clean(name) == wanted)
        .collect();
    match folded.as_slice() {
        [] => Err(StoreError::NotFound(category.to_string())),
        [(_, path)] => claim(path),
        many => {
            if let Some((_, path)) = many.iter().find(|(_, path)| !path.is_dir()) {
                return Err(StoreError::NameCollision(path.clone()));
            }
            Err(StoreError::DuplicateCategory {
                category: category.to_string(),
                entries: many.iter().map(|(name, _)| name.clone()).collect(),
            })
        }
    }
}

/// Resolves `token` to a category directory, creating it when absent.
///
/// # Errors
/// - [`StoreError::Match`] when the token is empty, unknown or ambiguous
///   under `policy`.
/// - Everything [`find_existing`] reports except `NotFound`.
/// - [`StoreError::Io`] when the directory cannot be created.
pub fn resolve_or_create(
    store_root: &Path,
    token: &str,
    known: &[String],
    policy: AmbiguityPolicy,
) -> StoreResult<PathBuf> {
    let given = clean(token);
    if given.is_empty() {
        return Err(StoreError::Match(MatchError::NotFound {
            given,
            choices: known.to_vec(),
        }));
    }
    let category = resolve_choice(&given, known, policy)?;
    info!(
        "event=category_resolve module=store status=ok given={} category={}",
        given, category
    );

    match find_existing(store_root, &category) {
        Ok(path) => Ok(path),
        Err(StoreError::NotFound(_)) => {
            let dest = store_root.join(&category);
            info!(
                "event=category_create module=store status=ok path={}",
                dest.display()
            );
            fs::create_dir(&dest).map_err(|err| StoreError::io(&dest, err))?;
            Ok(dest)
        }
        Err(err) => Err(err),
    }
}

fn claim(path: &Path) -> StoreResult<PathBuf> {
    if path.is_dir() {
        Ok(path.to_path_buf())
    } else {
        Err(StoreError::NameCollision(path.to_path_buf()))
    }
}

fn clean(value: &str) -> String {
    value.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::known_categories;

    #[test]
    fn known_categories_are_lowercased_sorted_and_unique() {
        let known = known_categories(&["Features", " bugs ", "features"], "Done");
        assert_eq!(known, vec!["bugs", "done", "features"]);
    }

    #[test]
    fn blank_entries_are_dropped() {
        let known = known_categories(&["", "bugs"], "");
        assert_eq!(known, vec!["bugs"]);
    }
}
