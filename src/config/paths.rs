//! Per-user application paths
//!
//! Everything berth persists lives under the app home (`~/.berth`, or
//! `BERTH_HOME`), except the global config file (`~/.berth.yml`).

use std::path::{Path, PathBuf};

use crate::error::{Result, fs as fs_error};

/// Application name, used for the home directory, config keys and markers
pub const APP_NAME: &str = "berth";

/// Directory name of the certificate authority under `ssl/`
pub const CA_DIR: &str = "rootca";

/// Install marker file name under the app home
pub const INSTALL_MARKER: &str = ".installed";

#[derive(Debug, Clone)]
pub struct AppPaths {
    home: PathBuf,
    config_file: PathBuf,
}

impl AppPaths {
    pub fn new(home: impl Into<PathBuf>, config_file: impl Into<PathBuf>) -> Self {
        Self {
            home: home.into(),
            config_file: config_file.into(),
        }
    }

    /// Resolve paths from the environment
    ///
    /// `BERTH_HOME` overrides the app home; `config_override` (the `--config`
    /// flag) overrides the config file location.
    pub fn discover(config_override: Option<PathBuf>) -> Result<Self> {
        let user_home = dirs::home_dir()
            .ok_or_else(|| fs_error::io_error("Could not determine the user's home directory"))?;

        let home = match std::env::var_os("BERTH_HOME") {
            Some(dir) if !dir.is_empty() => PathBuf::from(dir),
            _ => user_home.join(format!(".{APP_NAME}")),
        };
        let config_file =
            config_override.unwrap_or_else(|| user_home.join(format!(".{APP_NAME}.yml")));

        Ok(Self::new(home, config_file))
    }

    pub fn home(&self) -> &Path {
        &self.home
    }

    pub fn config_file(&self) -> &Path {
        &self.config_file
    }

    pub fn ssl_dir(&self) -> PathBuf {
        self.home.join("ssl")
    }

    pub fn ca_dir(&self) -> PathBuf {
        self.ssl_dir().join(CA_DIR)
    }

    pub fn certs_dir(&self) -> PathBuf {
        self.ssl_dir().join("certs")
    }

    pub fn tunnel_dir(&self) -> PathBuf {
        self.home.join("tunnel")
    }

    pub fn ssh_key(&self) -> PathBuf {
        self.tunnel_dir().join("ssh_key")
    }

    pub fn services_compose_file(&self) -> PathBuf {
        self.home.join("services").join("docker-compose.yml")
    }

    pub fn templates_dir(&self) -> PathBuf {
        self.home.join("templates")
    }

    pub fn install_marker(&self) -> PathBuf {
        self.home.join(INSTALL_MARKER)
    }
}
