//! Run an external program once, classifying how it failed.
//!
//! Used by the CLI to put arbitrary commands under a retry policy: a program
//! that cannot be started is never retried, a non-zero exit (or a signal)
//! is retried unless the caller restricts retries to specific exit codes.

use std::io;
use std::process::Command;

use thiserror::Error;

use crate::retry::RetryOn;

/// Program and arguments to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }
}

/// Why a single run of a command failed.
#[derive(Debug, Error)]
pub enum CommandError {
    /// The program could not be started (not found, not executable, ...).
    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },
    /// The program exited with a non-zero status.
    #[error("exited with status {code}")]
    Exit { code: i32 },
    /// The program was terminated by a signal.
    #[error("terminated by signal")]
    Signal,
}

impl CommandError {
    /// Process exit code to report for this failure.
    pub fn exit_code(&self) -> i32 {
        match self {
            CommandError::Spawn { source, .. } if source.kind() == io::ErrorKind::NotFound => 127,
            CommandError::Spawn { .. } => 126,
            CommandError::Exit { code } => *code,
            CommandError::Signal => 128,
        }
    }
}

/// Run the command to completion, inheriting stdio.
pub fn run_command(spec: &CommandSpec) -> Result<(), CommandError> {
    tracing::debug!(program = %spec.program, args = ?spec.args, "running command");
    let status = Command::new(&spec.program)
        .args(&spec.args)
        .status()
        .map_err(|source| CommandError::Spawn {
            program: spec.program.clone(),
            source,
        })?;
    if status.success() {
        return Ok(());
    }
    match status.code() {
        Some(code) => Err(CommandError::Exit { code }),
        None => Err(CommandError::Signal),
    }
}

/// Retry exit and signal failures; restrict to `codes` when non-empty.
///
/// Spawn failures are never retried.
pub fn exit_codes(codes: Vec<i32>) -> RetryOn<CommandError> {
    RetryOn::when(move |e: &CommandError| match e {
        CommandError::Spawn { .. } => false,
        CommandError::Exit { code } => codes.is_empty() || codes.contains(code),
        CommandError::Signal => codes.is_empty(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spawn_error() -> CommandError {
        CommandError::Spawn {
            program: "nope".to_string(),
            source: io::Error::new(io::ErrorKind::NotFound, "not found"),
        }
    }

    #[test]
    fn spawn_errors_are_never_retried() {
        assert!(!exit_codes(vec![]).matches(&spawn_error()));
        assert!(!exit_codes(vec![1]).matches(&spawn_error()));
    }

    #[test]
    fn empty_code_list_retries_any_exit() {
        let on = exit_codes(vec![]);
        assert!(on.matches(&CommandError::Exit { code: 1 }));
        assert!(on.matches(&CommandError::Exit { code: 75 }));
        assert!(on.matches(&CommandError::Signal));
    }

    #[test]
    fn code_list_restricts_retries() {
        let on = exit_codes(vec![75]);
        assert!(on.matches(&CommandError::Exit { code: 75 }));
        assert!(!on.matches(&CommandError::Exit { code: 1 }));
        assert!(!on.matches(&CommandError::Signal));
    }

    #[test]
    fn exit_code_mapping() {
        assert_eq!(spawn_error().exit_code(), 127);
        assert_eq!(CommandError::Exit { code: 3 }.exit_code(), 3);
        assert_eq!(CommandError::Signal.exit_code(), 128);
    }

    #[test]
    fn missing_program_is_a_spawn_error() {
        let spec = CommandSpec::new("lazykit-definitely-missing-program", vec![]);
        assert!(matches!(
            run_command(&spec),
            Err(CommandError::Spawn { .. })
        ));
    }

    #[cfg(unix)]
    #[test]
    fn exit_status_is_reported() {
        let spec = CommandSpec::new("sh", vec!["-c".to_string(), "exit 4".to_string()]);
        assert!(matches!(
            run_command(&spec),
            Err(CommandError::Exit { code: 4 })
        ));
        let ok = CommandSpec::new("sh", vec!["-c".to_string(), "true".to_string()]);
        assert!(run_command(&ok).is_ok());
    }
}
