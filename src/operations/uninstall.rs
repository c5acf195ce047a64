//! Uninstall operation
//!
//! Deletes the app home and the global config file, each only after the
//! operator confirmed it. Nothing inside a project is touched.

use std::path::Path;

use crate::config::AppPaths;
use crate::error::{BerthError, Result, config as config_error, fs as fs_error};
use crate::prompt::Confirmer;

use super::Outcome;

pub struct UninstallOperation<'a> {
    paths: &'a AppPaths,
    confirmer: &'a dyn Confirmer,
}

impl<'a> UninstallOperation<'a> {
    pub fn new(paths: &'a AppPaths, confirmer: &'a dyn Confirmer) -> Self {
        Self { paths, confirmer }
    }

    pub fn execute(&self) -> Result<Outcome> {
        let home = self.paths.home();
        if home.parent().is_none() {
            return Err(config_error::precondition(
                format!("Refusing to delete {}", home.display()),
                Some("Point BERTH_HOME at the berth app home directory"),
            ));
        }
        if !home.exists() {
            return Err(BerthError::NotInstalled);
        }

        if !self.confirm_delete(home)? {
            return Ok(Outcome::Declined);
        }
        std::fs::remove_dir_all(home).map_err(|e| fs_error::write_failed(home, e))?;
        println!("Deleted {}", home.display());

        let config = self.paths.config_file();
        if config.is_file() && self.confirm_delete(config)? {
            std::fs::remove_file(config).map_err(|e| fs_error::write_failed(config, e))?;
            println!("Deleted {}", config.display());
        }

        Ok(Outcome::Done)
    }

    fn confirm_delete(&self, path: &Path) -> Result<bool> {
        self.confirmer.confirm(
            &format!("Are you sure you want to delete {}?", path.display()),
            false,
        )
    }
}
