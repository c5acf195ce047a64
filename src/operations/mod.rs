//! Top-level scenarios
//!
//! Each operation is one entry point the CLI calls:
//! - [`BootstrapOperation`]: resolve and run the bootstrap plan of a project
//! - [`InstallOperation`]: prepare this machine (app home, trust, DNS, SSH)
//! - [`UninstallOperation`]: delete persisted state after confirmation
//! - [`sign_certificate`]: issue a leaf certificate from the local CA
//!
//! Operations receive their collaborators (runners, confirmer, provisioner)
//! from the command layer and return a single result.

pub mod bootstrap;
pub mod install;
pub mod sign_certificate;
pub mod uninstall;

use std::path::{Path, PathBuf};

use crate::config::{self, AppPaths, Settings};
use crate::error::{Result, fs as fs_error};
use crate::exec::Verbosity;
use crate::host::HostPlatform;
use crate::template::TemplateRenderer;

pub use bootstrap::{BootstrapOperation, BootstrapOptions};
pub use install::{InstallOperation, InstallOptions};
pub use uninstall::UninstallOperation;

/// How an operation ended when it did not fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Done,
    /// The operator declined a confirmation; nothing further was changed
    Declined,
}

/// Everything an operation needs to know about this invocation
#[derive(Debug, Clone)]
pub struct Session {
    pub paths: AppPaths,
    pub project_root: PathBuf,
    pub settings: Settings,
    pub platform: HostPlatform,
    pub user_home: PathBuf,
    pub verbosity: Verbosity,
}

impl Session {
    /// Load configuration for `project_root` and detect the host
    ///
    /// `overrides` come from command-line flags and win over both files.
    pub fn open(
        paths: AppPaths,
        project_root: &Path,
        overrides: &[(&str, String)],
        verbose: bool,
    ) -> Result<Self> {
        let project_root = dunce::canonicalize(project_root)
            .map_err(|e| fs_error::read_failed(project_root, e))?;
        let mut store = config::load_store(&paths, &project_root)?;
        for (key, value) in overrides {
            store.set(key, value.as_str());
        }
        let mut settings = Settings::from_store(&store, &project_name(&project_root))?;
        settings.debug |= verbose;

        let user_home = dirs::home_dir()
            .ok_or_else(|| fs_error::io_error("Could not determine the user's home directory"))?;

        Ok(Self {
            paths,
            project_root,
            verbosity: if settings.debug {
                Verbosity::Debug
            } else {
                Verbosity::Normal
            },
            settings,
            platform: HostPlatform::detect(),
            user_home,
        })
    }

    /// Embedded templates, overridden by files under `<app home>/templates`
    pub fn renderer(&self) -> Result<TemplateRenderer> {
        let overrides = self.paths.templates_dir();
        if overrides.is_dir() {
            TemplateRenderer::with_overrides(&overrides)
        } else {
            TemplateRenderer::embedded()
        }
    }

    pub fn is_installed(&self) -> bool {
        self.paths.install_marker().is_file()
    }
}

/// Directory name of the project, used for the default domain
pub fn project_name(root: &Path) -> String {
    root.file_name()
        .map(|name| name.to_string_lossy().to_lowercase())
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| "project".to_string())
}
