//! Body gathering through an external editor or piped stdin.
//!
//! # Invariants
//! - The scratch file is removed on every exit path (dropped `NamedTempFile`).
//! - `#pb` comment lines never reach the returned body.

use anyhow::{bail, Context, Result};
use log::info;
use pb_core::codec::{compose_template, strip_comments};
use std::io::{Read, Write};
use std::process::Command;

const SCRATCH_PREFIX: &str = "pb";
const SCRATCH_SUFFIX: &str = ".txt";

/// Reads the whole of stdin as the body.
pub fn read_stdin() -> Result<String> {
    let mut text = String::new();
    std::io::stdin()
        .read_to_string(&mut text)
        .context("failed to read body from stdin")?;
    Ok(strip_comments(&text))
}

/// Opens `editor` on a commented template and returns the stripped result.
pub fn compose(editor: &str, comments: &[&str]) -> Result<String> {
    let mut scratch = tempfile::Builder::new()
        .prefix(SCRATCH_PREFIX)
        .suffix(SCRATCH_SUFFIX)
        .tempfile()
        .context("failed to create scratch file")?;
    scratch
        .write_all(compose_template(None, comments).as_bytes())
        .and_then(|()| scratch.flush())
        .context("failed to write scratch file")?;

    let mut parts = editor.split_whitespace();
    let Some(program) = parts.next() else {
        bail!("editor command is empty");
    };
    let status = Command::new(program)
        .args(parts)
        .arg(scratch.path())
        .status()
        .with_context(|| format!("failed to launch editor `{editor}`"))?;
    if !status.success() {
        bail!("editor `{editor}` exited with {status}");
    }

    // Editors may replace the file rather than rewrite it, so re-read by path.
    let edited = std::fs::read_to_string(scratch.path())
        .with_context(|| format!("failed to read `{}`", scratch.path().display()))?;
    info!(
        "event=body_edit module=cli status=ok editor={} bytes={}",
        program,
        edited.len()
    );
    Ok(strip_comments(&edited))
}

#[cfg(all(test, unix))]
mod tests {
    use super::compose;
    use std::fs;

    #[test]
    fn editor_output_is_stripped_of_comments() {
        let temp = tempfile::tempdir().unwrap();
        let script = temp.path().join("fake-editor");
        fs::write(
            &script,
            "printf 'typed body\\n#pb leftover\\n' > \"$1\"\n",
        )
        .unwrap();

        let editor = format!("sh {}", script.display());
        let body = compose(&editor, &["hint"]).unwrap();
        assert_eq!(body, "typed body");
    }

    #[test]
    fn untouched_template_yields_empty_body() {
        assert_eq!(compose("true", &["hint"]).unwrap(), "");
    }

    #[test]
    fn failing_editor_is_an_error() {
        let err = compose("false", &[]).unwrap_err();
        assert!(err.to_string().contains("exited with"));
    }
}
