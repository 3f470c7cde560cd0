//! Bounded subprocess execution for VCS queries.
//!
//! # Responsibility
//! - Run one VCS executable and return its trimmed stdout.
//! - Classify every failure as "unavailable" instead of an error.
//!
//! # Invariants
//! - A child that outlives the timeout is killed and reaped.
//! - Stdout is drained concurrently, so output size never causes a timeout.
//! - Empty output counts as unavailable.

use log::debug;
use std::fmt::{Display, Formatter};
use std::io::Read;
use std::path::Path;
use std::process::{Command, Stdio};
use std::thread;
use std::time::Duration;
use wait_timeout::ChildExt;

/// Default bound on one VCS subprocess.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Seam between identity resolution and the operating system.
pub trait CommandRunner {
    /// Returns trimmed stdout, or `None` when the tool is unavailable.
    fn output_of(&self, dir: &Path, program: &str, args: &[&str]) -> Option<String>;
}

/// Why a subprocess produced no usable output.
#[derive(Debug)]
pub enum SubprocessUnavailable {
    Spawn(std::io::Error),
    Wait(std::io::Error),
    TimedOut(Duration),
    ExitStatus(Option<i32>),
    InvalidOutput,
    EmptyOutput,
}

impl Display for SubprocessUnavailable {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Spawn(err) => write!(f, "spawn failed: {err}"),
            Self::Wait(err) => write!(f, "wait failed: {err}"),
            Self::TimedOut(timeout) => write!(f, "timed out after {}ms", timeout.as_millis()),
            Self::ExitStatus(Some(code)) => write!(f, "exited with status {code}"),
            Self::ExitStatus(None) => write!(f, "terminated by signal"),
            Self::InvalidOutput => write!(f, "output is not valid UTF-8"),
            Self::EmptyOutput => write!(f, "output is empty"),
        }
    }
}

/// Runner backed by real child processes.
#[derive(Debug, Clone, Copy)]
pub struct SystemRunner {
    timeout: Duration,
}

impl Default for SystemRunner {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT)
    }
}

impl SystemRunner {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Runs `program args...` in `dir` and returns its trimmed stdout.
    pub fn run(
        &self,
        dir: &Path,
        program: &str,
        args: &[&str],
    ) -> Result<String, SubprocessUnavailable> {
        let mut child = Command::new(program)
            .args(args)
            .current_dir(dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(SubprocessUnavailable::Spawn)?;

        // Drain stdout while waiting so a chatty child cannot fill the pipe.
        let reader = child.stdout.take().map(|mut stdout| {
            thread::spawn(move || {
                let mut buffer = Vec::new();
                stdout.read_to_end(&mut buffer).map(|_| buffer)
            })
        });

        let status = match child
            .wait_timeout(self.timeout)
            .map_err(SubprocessUnavailable::Wait)?
        {
            Some(status) => status,
            None => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(SubprocessUnavailable::TimedOut(self.timeout));
            }
        };
        if !status.success() {
            return Err(SubprocessUnavailable::ExitStatus(status.code()));
        }

        let buffer = match reader {
            Some(reader) => reader
                .join()
                .map_err(|_| SubprocessUnavailable::InvalidOutput)?
                .map_err(SubprocessUnavailable::Wait)?,
            None => Vec::new(),
        };
        let text = String::from_utf8(buffer).map_err(|_| SubprocessUnavailable::InvalidOutput)?;
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(SubprocessUnavailable::EmptyOutput);
        }
        Ok(trimmed.to_string())
    }
}

impl CommandRunner for SystemRunner {
    fn output_of(&self, dir: &Path, program: &str, args: &[&str]) -> Option<String> {
        match self.run(dir, program, args) {
            Ok(output) => Some(output),
            Err(reason) => {
                debug!(
                    "event=vcs_query module=identity status=unavailable program={} args={:?} reason={}",
                    program, args, reason
                );
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{CommandRunner, SubprocessUnavailable, SystemRunner};
    use std::time::Duration;

    #[test]
    fn missing_executable_is_unavailable() {
        let runner = SystemRunner::default();
        let dir = std::env::temp_dir();
        let err = runner
            .run(&dir, "pb-definitely-not-a-real-binary", &["--version"])
            .unwrap_err();
        assert!(matches!(err, SubprocessUnavailable::Spawn(_)));
        assert_eq!(
            runner.output_of(&dir, "pb-definitely-not-a-real-binary", &[]),
            None
        );
    }

    #[cfg(unix)]
    #[test]
    fn output_is_trimmed_and_failures_classified() {
        let runner = SystemRunner::new(Duration::from_secs(5));
        let dir = std::env::temp_dir();
        assert_eq!(
            runner.run(&dir, "sh", &["-c", "printf '  hello \\n'"]).unwrap(),
            "hello"
        );
        assert!(matches!(
            runner.run(&dir, "sh", &["-c", "exit 3"]).unwrap_err(),
            SubprocessUnavailable::ExitStatus(Some(3))
        ));
        assert!(matches!(
            runner.run(&dir, "sh", &["-c", "true"]).unwrap_err(),
            SubprocessUnavailable::EmptyOutput
        ));
    }

    #[cfg(unix)]
    #[test]
    fn hung_child_is_killed_after_timeout() {
        let runner = SystemRunner::new(Duration::from_millis(100));
        let err = runner
            .run(&std::env::temp_dir(), "sleep", &["5"])
            .unwrap_err();
        assert!(matches!(err, SubprocessUnavailable::TimedOut(_)));
    }

    #[cfg(unix)]
    #[test]
    fn large_output_is_read_before_timeout() {
        let runner = SystemRunner::new(Duration::from_secs(5));
        let output = runner
            .run(
                &std::env::temp_dir(),
                "sh",
                &["-c", "head -c 300000 /dev/zero | tr '\\0' x"],
            )
            .unwrap();
        assert_eq!(output.len(), 300_000);
        assert!(output.bytes().all(|byte| byte == b'x'));
    }
}
