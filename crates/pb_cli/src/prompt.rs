//! Interactive disambiguation.
//!
//! Prompts are shown only when stdin is a terminal; otherwise every helper
//! turns the unresolved case into an error naming the candidates.

use anyhow::{anyhow, bail, Context, Result};
use dialoguer::{Input, Select};
use pb_core::{fuzzy_match, MatchError};
use std::io::IsTerminal;

pub fn is_interactive() -> bool {
    std::io::stdin().is_terminal()
}

/// Resolves `given` against `choices`, asking the user on ambiguity.
///
/// With no `given`, the user picks from every choice.
pub fn choose(what: &str, given: Option<&str>, choices: &[String]) -> Result<String> {
    let Some(given) = given.map(str::trim).filter(|given| !given.is_empty()) else {
        if !is_interactive() {
            bail!("{what} required; expected one of: {}", choices.join(", "));
        }
        return select(what, choices);
    };

    match fuzzy_match(&given.to_lowercase(), choices) {
        Ok(choice) => Ok(choice),
        Err(MatchError::Ambiguous { candidates, .. }) if is_interactive() => {
            select(&format!("`{given}` is ambiguous; pick a {what}"), &candidates)
        }
        Err(err) => Err(anyhow!("{what} {err}")),
    }
}

/// Lets the user pick one of `candidates` (already sorted).
pub fn select(prompt: &str, candidates: &[String]) -> Result<String> {
    let index = Select::new()
        .with_prompt(prompt)
        .items(candidates)
        .default(0)
        .interact()
        .context("selection aborted")?;
    Ok(candidates[index].clone())
}

/// Asks for one line of free text, rejecting blank answers.
pub fn input(prompt: &str) -> Result<String> {
    if !is_interactive() {
        bail!("{} required", prompt.to_lowercase());
    }
    let value: String = Input::new()
        .with_prompt(prompt)
        .validate_with(|text: &String| -> std::result::Result<(), &'static str> {
            if text.trim().is_empty() {
                Err("cannot be empty")
            } else {
                Ok(())
            }
        })
        .interact_text()
        .context("input aborted")?;
    Ok(value.trim().to_string())
}
