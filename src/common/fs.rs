//! Common file system operations with unified error handling

use std::fs;
use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;

use crate::error::{Result, fs as fs_error};

/// Create a directory and its parents
pub fn ensure_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path).map_err(|e| fs_error::write_failed(path, e))
}

/// Write `bytes` to `path` atomically
///
/// The content goes to a temporary file in the target directory first and
/// is renamed over the target, so readers never observe a partial file.
/// `mode` applies unix permission bits before the rename.
pub fn write_atomic(path: &Path, bytes: &[u8], mode: Option<u32>) -> Result<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    ensure_dir(parent)?;

    let mut temp = NamedTempFile::new_in(parent).map_err(|e| fs_error::write_failed(path, e))?;
    temp.write_all(bytes)
        .and_then(|()| temp.as_file().sync_all())
        .map_err(|e| fs_error::write_failed(path, e))?;

    if let Some(mode) = mode {
        set_mode(temp.path(), mode)?;
    }

    temp.persist(path)
        .map_err(|e| fs_error::write_failed(path, e.error))?;
    Ok(())
}

/// Apply unix permission bits; a no-op elsewhere
#[cfg(unix)]
pub fn set_mode(path: &Path, mode: u32) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(mode))
        .map_err(|e| fs_error::write_failed(path, e))
}

#[cfg(not(unix))]
pub fn set_mode(_path: &Path, _mode: u32) -> Result<()> {
    Ok(())
}

/// Current unix permission bits of `path`
#[cfg(all(test, unix))]
pub fn mode_of(path: &Path) -> Result<u32> {
    use std::os::unix::fs::PermissionsExt;
    fs::metadata(path)
        .map(|meta| meta.permissions().mode() & 0o7777)
        .map_err(|e| fs_error::read_failed(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_write_atomic_creates_parents() {
        let temp = TempDir::new().unwrap();
        let target = temp.path().join("a/b/file.txt");

        write_atomic(&target, b"hello", None).unwrap();
        assert_eq!(fs::read(&target).unwrap(), b"hello");
    }

    #[test]
    fn test_write_atomic_replaces_content() {
        let temp = TempDir::new().unwrap();
        let target = temp.path().join("file.txt");
        fs::write(&target, "old").unwrap();

        write_atomic(&target, b"new", None).unwrap();
        assert_eq!(fs::read_to_string(&target).unwrap(), "new");
        assert_eq!(fs::read_dir(temp.path()).unwrap().count(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn test_write_atomic_applies_mode() {
        let temp = TempDir::new().unwrap();
        let target = temp.path().join("secret.pem");

        write_atomic(&target, b"key", Some(0o600)).unwrap();
        assert_eq!(mode_of(&target).unwrap(), 0o600);
    }
}
