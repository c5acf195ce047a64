//! Idempotency guard
//!
//! A one-time action is described by a [`Marker`]: a file whose existence
//! means the action already completed. [`guarded`] skips the action when the
//! marker is present and otherwise records completion only after the action
//! returned `Ok`, so a failed or interrupted action is retried next run.

use std::path::{Path, PathBuf};

use crate::common::fs::write_atomic;
use crate::error::{Result, fs as fs_error};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Marker {
    /// A file the action itself produces (a certificate, a private key).
    /// The action must leave it in place last.
    Artifact(PathBuf),
    /// A stamp file the guard writes after the action succeeded
    Stamp(PathBuf),
}

impl Marker {
    pub fn path(&self) -> &Path {
        match self {
            Marker::Artifact(path) | Marker::Stamp(path) => path,
        }
    }

    pub fn is_present(&self) -> bool {
        self.path().is_file()
    }
}

/// Result of a guarded action
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Guarded<T> {
    /// The marker was present; the action did not run
    Skipped,
    Ran(T),
}

impl<T> Guarded<T> {
    #[cfg(test)]
    pub fn ran(&self) -> bool {
        matches!(self, Guarded::Ran(_))
    }
}

/// Run `action` unless `marker` is present
pub fn guarded<T>(marker: &Marker, action: impl FnOnce() -> Result<T>) -> Result<Guarded<T>> {
    if marker.is_present() {
        tracing::debug!("Skipping, {} exists", marker.path().display());
        return Ok(Guarded::Skipped);
    }

    let value = action()?;

    match marker {
        Marker::Stamp(path) => {
            let stamp = format!("{}\n", chrono::Local::now().to_rfc3339());
            write_atomic(path, stamp.as_bytes(), None)?;
        }
        Marker::Artifact(path) => {
            if !path.is_file() {
                return Err(fs_error::io_error(format!(
                    "expected {} to exist after a successful run",
                    path.display()
                )));
            }
        }
    }

    Ok(Guarded::Ran(value))
}
