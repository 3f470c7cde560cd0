//! Collision-resistant tokens derived from item subjects.
//!
//! # Invariants
//! - Every call mixes in fresh entropy, so equal subjects yield different
//!   tokens.
//! - All-uppercase words keep their spelling (acronyms survive).
//! - A subject without word characters yields the bare hash.

use once_cell::sync::Lazy;
use regex::Regex;
use sha1::{Digest, Sha1};
use uuid::Uuid;

/// Number of hex digits kept from the subject hash.
pub const HASH_PREFIX_LEN: usize = 10;

static WORD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\w+").expect("valid word regex"));

/// Builds a token such as `FixCrashInHTTPClient-3fa94c01be`.
pub fn subject_to_token(subject: &str) -> String {
    let words = camel_join(subject);
    let hash = unique_hash(subject);
    if words.is_empty() {
        hash
    } else {
        format!("{words}-{hash}")
    }
}

/// Concatenates the subject's words, title-casing all but acronyms.
pub fn camel_join(subject: &str) -> String {
    WORD_RE
        .find_iter(subject)
        .map(|word| {
            let word = word.as_str();
            if is_all_upper(word) {
                word.to_string()
            } else {
                title_case(word)
            }
        })
        .collect()
}

fn unique_hash(subject: &str) -> String {
    let mut hasher = Sha1::new();
    hasher.update(subject.as_bytes());
    hasher.update(Uuid::new_v4().simple().to_string().as_bytes());
    let hex = format!("{:x}", hasher.finalize());
    hex[..HASH_PREFIX_LEN].to_string()
}

fn is_all_upper(word: &str) -> bool {
    word.chars().any(char::is_uppercase) && !word.chars().any(char::is_lowercase)
}

/// Upper-cases the first letter of every alphabetic run, lower-cases the rest.
fn title_case(word: &str) -> String {
    let mut out = String::with_capacity(word.len());
    let mut in_run = false;
    for ch in word.chars() {
        if ch.is_alphabetic() {
            if in_run {
                out.extend(ch.to_lowercase());
            } else {
                out.extend(ch.to_uppercase());
            }
            in_run = true;
        } else {
            out.push(ch);
            in_run = false;
        }
    }
    out
}
