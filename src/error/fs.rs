//! File system errors

use std::path::Path;

use super::BerthError;

/// Creates a file read failed error
pub fn read_failed(path: &Path, reason: impl std::fmt::Display) -> BerthError {
    BerthError::FileReadFailed {
        path: path.display().to_string(),
        reason: reason.to_string(),
    }
}

/// Creates a file write failed error
pub fn write_failed(path: &Path, reason: impl std::fmt::Display) -> BerthError {
    BerthError::FileWriteFailed {
        path: path.display().to_string(),
        reason: reason.to_string(),
    }
}

/// Creates an IO error
pub fn io_error(message: impl Into<String>) -> BerthError {
    BerthError::IoError {
        message: message.into(),
    }
}
