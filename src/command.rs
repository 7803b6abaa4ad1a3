//! External command execution.
//!
//! Both the Markdown converter and the deploy stage shell out to third-party
//! tools. Every invocation goes through [`run`], which blocks until the
//! process exits, captures its output, and turns a spawn failure or a
//! non-zero exit into a [`CommandError`] carrying the captured stderr.
//! Nothing here terminates the process; callers propagate the error.

use std::ffi::OsStr;
use std::fmt::Write as _;
use std::path::Path;
use std::process::{Command, ExitStatus, Output};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CommandError {
    #[error("failed to execute `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },
    #[error("`{command}` exited with {status}{}", stderr_suffix(.stderr))]
    Failed {
        command: String,
        status: ExitStatus,
        stderr: String,
    },
}

fn stderr_suffix(stderr: &str) -> String {
    let trimmed = stderr.trim();
    if trimmed.is_empty() {
        String::new()
    } else {
        format!(": {trimmed}")
    }
}

/// Render a command line for logs and error messages.
pub fn display_command<S: AsRef<OsStr>>(program: &str, args: &[S]) -> String {
    let mut line = program.to_string();
    for arg in args {
        let arg = arg.as_ref().to_string_lossy();
        if arg.is_empty() || arg.contains(char::is_whitespace) || arg.contains('*') {
            let _ = write!(line, " \"{arg}\"");
        } else {
            let _ = write!(line, " {arg}");
        }
    }
    line
}

/// Run `program` with `args` and capture its output.
///
/// # Errors
/// Returns [`CommandError::Spawn`] if the program cannot be started and
/// [`CommandError::Failed`] if it exits unsuccessfully.
pub fn run<S: AsRef<OsStr>>(
    root: Option<&Path>,
    program: &str,
    args: &[S],
) -> Result<Output, CommandError> {
    let command = display_command(program, args);
    tracing::debug!("running `{command}`");

    let mut cmd = Command::new(program);
    cmd.args(args);
    if let Some(root) = root {
        cmd.current_dir(root);
    }

    let output = cmd.output().map_err(|source| CommandError::Spawn {
        command: command.clone(),
        source,
    })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        return Err(CommandError::Failed {
            command,
            status: output.status,
            stderr,
        });
    }

    let stderr = String::from_utf8_lossy(&output.stderr);
    for line in stderr.lines().filter(|l| !l.trim().is_empty()) {
        tracing::warn!("{program}: {line}");
    }
    Ok(output)
}
