//! One-shot command invocation.

use std::process::{Command, Stdio};

use tracing::debug;

/// Runs a short-lived command and hands back its standard output.
///
/// Implementations never fail: a command that cannot be started yields an
/// empty string, which callers treat as "no data".
pub trait CommandRunner: Send {
    fn run(&self, program: &str, args: &[&str]) -> String;
}

/// [`CommandRunner`] backed by real subprocesses.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemCommand;

impl CommandRunner for SystemCommand {
    fn run(&self, program: &str, args: &[&str]) -> String {
        run(program, args)
    }
}

/// Run `program` with `args`, wait for it to finish and return its stdout.
///
/// Invalid UTF-8 is replaced rather than rejected. The exit status is not
/// consulted; whatever the command printed is returned.
pub fn run(program: &str, args: &[&str]) -> String {
    let output = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stderr(Stdio::null())
        .output();

    match output {
        Ok(output) => String::from_utf8_lossy(&output.stdout).into_owned(),
        Err(e) => {
            debug!(program, ?args, error = %e, "command failed to start");
            String::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_program_returns_empty() {
        assert_eq!(run("/nonexistent/powerwatch-no-such-binary", &[]), "");
    }

    #[cfg(unix)]
    #[test]
    fn test_captures_stdout() {
        assert_eq!(run("echo", &["hello", "world"]), "hello world\n");
    }

    #[cfg(unix)]
    #[test]
    fn test_failed_status_still_returns_output() {
        let out = SystemCommand.run("sh", &["-c", "printf partial; exit 3"]);
        assert_eq!(out, "partial");
    }

    #[cfg(unix)]
    #[test]
    fn test_invalid_utf8_is_replaced() {
        let out = run("printf", &["a\\377b"]);
        assert_eq!(out, "a\u{FFFD}b");
    }
}
