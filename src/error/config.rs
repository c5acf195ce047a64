//! Configuration errors

use super::BerthError;

/// Creates an invalid config value error
pub fn invalid(
    key: impl Into<String>,
    value: impl Into<String>,
    reason: impl Into<String>,
) -> BerthError {
    BerthError::ConfigInvalid {
        key: key.into(),
        value: value.into(),
        reason: reason.into(),
    }
}

/// Creates a config parse failed error
pub fn parse_failed(path: impl Into<String>, reason: impl Into<String>) -> BerthError {
    BerthError::ConfigParseFailed {
        path: path.into(),
        reason: reason.into(),
    }
}

/// Creates an unsupported target error
pub fn unsupported_target(target: impl Into<String>) -> BerthError {
    BerthError::UnsupportedTarget {
        target: target.into(),
    }
}

/// Creates a precondition missing error with an optional hint
pub fn precondition(message: impl Into<String>, hint: Option<&str>) -> BerthError {
    BerthError::PreconditionMissing {
        message: message.into(),
        hint: hint.map(str::to_string),
    }
}
