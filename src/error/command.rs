//! Command execution errors

use super::BerthError;

/// Creates an error for a command that exited non-zero (or was killed)
pub fn failed(
    context: impl Into<String>,
    command: impl Into<String>,
    code: Option<i32>,
    stderr: impl Into<String>,
) -> BerthError {
    BerthError::ExternalCommandFailed {
        context: context.into(),
        command: command.into(),
        code,
        stderr: stderr.into(),
    }
}

/// Creates an error for a command that could not be spawned at all
pub fn spawn_failed(command: impl Into<String>, reason: impl std::fmt::Display) -> BerthError {
    BerthError::ExternalCommandFailed {
        context: "host".to_string(),
        command: command.into(),
        code: None,
        stderr: reason.to_string(),
    }
}
