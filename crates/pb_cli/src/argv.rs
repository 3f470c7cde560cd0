//! Command-word expansion ahead of clap parsing.
//!
//! # Responsibility
//! - Expand an abbreviated command word (`ad` -> `add`).
//! - Treat an unrecognized first word as search terms for `list`.
//!
//! # Invariants
//! - Option values of global flags are never mistaken for the command word.
//! - Arguments after `--` are left untouched.

use anyhow::{bail, Result};
use pb_core::{fuzzy_match, MatchError};
use std::ffi::OsString;

/// Every spelling clap accepts as a subcommand, aliases included.
pub const COMMAND_WORDS: [&str; 8] = ["add", "close", "do", "done", "help", "list", "search", "show"];

const DEFAULT_COMMAND: &str = "list";
const LONG_VALUE_FLAGS: [&str; 2] = ["config", "log-dir"];
const SHORT_VALUE_FLAGS: [char; 1] = ['c'];

/// Rewrites `args` (program name first) so clap sees a full command word.
pub fn expand_command(args: Vec<OsString>) -> Result<Vec<OsString>> {
    let Some(index) = command_index(&args) else {
        return Ok(args);
    };
    let Some(word) = args[index].to_str().map(str::to_lowercase) else {
        return Ok(args);
    };

    let mut args = args;
    match fuzzy_match(&word, &COMMAND_WORDS) {
        Ok(command) => args[index] = OsString::from(command),
        Err(MatchError::NotFound { .. }) => args.insert(index, OsString::from(DEFAULT_COMMAND)),
        Err(MatchError::Ambiguous { candidates, .. }) => bail!(
            "command `{word}` is ambiguous; did you mean one of: {}?",
            candidates.join(", ")
        ),
    }
    Ok(args)
}

fn command_index(args: &[OsString]) -> Option<usize> {
    let mut index = 1;
    while index < args.len() {
        let arg = args[index].to_string_lossy();
        if arg == "--" {
            return None;
        }
        if arg.starts_with('-') {
            index += if takes_next_value(&arg) { 2 } else { 1 };
            continue;
        }
        return Some(index);
    }
    None
}

/// Whether `arg` is a flag whose value is the following argument.
///
/// In a short cluster such as `-vc`, only a value flag in last position
/// reads the next argument; `-vcpath` carries its value inline.
fn takes_next_value(arg: &str) -> bool {
    if let Some(long) = arg.strip_prefix("--") {
        return LONG_VALUE_FLAGS.contains(&long);
    }
    let Some(cluster) = arg.strip_prefix('-') else {
        return false;
    };
    cluster
        .find(|flag| SHORT_VALUE_FLAGS.contains(&flag))
        .is_some_and(|position| position + 1 == cluster.len())
}
