//! `~/.ssh/config` entry for the tunnel

use std::fs;
use std::path::Path;

use crate::common::fs::{ensure_dir, set_mode, write_atomic};
use crate::error::{Result, fs as fs_error};

pub const TUNNEL_HOST: &str = "tunnel.berth.test";

const BEGIN: &str = "## berth START ##";
const END: &str = "## berth END ##";

/// The delimited block for the tunnel host
pub fn block(identity_file: &Path) -> String {
    format!(
        "{BEGIN}\nHost {TUNNEL_HOST}\n  HostName 127.0.0.1\n  User user\n  Port 2222\n  IdentityFile {}\n{END}\n",
        identity_file.display()
    )
}

/// Add or refresh the tunnel block in `config`. Returns whether the file changed.
pub fn install(config: &Path, identity_file: &Path) -> Result<bool> {
    let existing = if config.exists() {
        fs::read_to_string(config).map_err(|e| fs_error::read_failed(config, e))?
    } else {
        String::new()
    };

    let wanted = block(identity_file);
    let updated = match (existing.find(BEGIN), existing.find(END)) {
        (Some(start), Some(end)) if end > start => {
            let end = end + END.len();
            let end = if existing[end..].starts_with('\n') { end + 1 } else { end };
            if existing[start..end] == wanted {
                tracing::debug!("SSH config for {TUNNEL_HOST} is up to date");
                return Ok(false);
            }
            format!("{}{wanted}{}", &existing[..start], &existing[end..])
        }
        _ => {
            let mut text = existing;
            if !text.is_empty() && !text.ends_with('\n') {
                text.push('\n');
            }
            if !text.is_empty() {
                text.push('\n');
            }
            text.push_str(&wanted);
            text
        }
    };

    if let Some(dir) = config.parent() {
        if !dir.exists() {
            ensure_dir(dir)?;
            set_mode(dir, 0o700)?;
        }
    }
    write_atomic(config, updated.as_bytes(), Some(0o600))?;
    tracing::info!("Added {TUNNEL_HOST} to {}", config.display());
    Ok(true)
}
