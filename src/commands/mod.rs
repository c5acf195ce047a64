//! Command implementations for the berth CLI
//!
//! Commands are thin wrappers: they turn parsed arguments into a
//! [`Session`](crate::operations::Session), wire the real collaborators
//! (shell, docker compose, interactive prompts) and hand over to an operation.

pub mod bootstrap;
pub mod completions;
pub mod install;
pub mod sign_certificate;
pub mod uninstall;
pub mod version;

use std::path::PathBuf;

use crate::cli::Cli;
use crate::config::AppPaths;
use crate::error::{Result, fs as fs_error};
use crate::operations::Session;

/// Global flags shared by every command
#[derive(Debug, Clone, Default)]
pub struct Invocation {
    pub project: Option<PathBuf>,
    pub config: Option<PathBuf>,
    pub verbose: bool,
    pub no_interaction: bool,
}

impl From<&Cli> for Invocation {
    fn from(cli: &Cli) -> Self {
        Self {
            project: cli.project.clone(),
            config: cli.config.clone(),
            verbose: cli.verbose,
            no_interaction: cli.no_interaction,
        }
    }
}

impl Invocation {
    pub fn project_root(&self) -> Result<PathBuf> {
        match &self.project {
            Some(path) => Ok(path.clone()),
            None => std::env::current_dir()
                .map_err(|e| fs_error::io_error(format!("Failed to get current directory: {e}"))),
        }
    }

    pub fn paths(&self) -> Result<AppPaths> {
        AppPaths::discover(self.config.clone())
    }

    /// Open the session for the project, with flag overrides applied
    pub fn session(&self, overrides: &[(&str, String)]) -> Result<Session> {
        Session::open(self.paths()?, &self.project_root()?, overrides, self.verbose)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_invocation_from_cli() {
        let cli = Cli::try_parse_from([
            "berth",
            "version",
            "--project",
            "/work/shop",
            "--config",
            "/tmp/berth.yml",
            "-n",
        ])
        .unwrap();
        let invocation = Invocation::from(&cli);

        assert_eq!(invocation.project_root().unwrap(), PathBuf::from("/work/shop"));
        assert_eq!(invocation.config, Some(PathBuf::from("/tmp/berth.yml")));
        assert!(invocation.no_interaction);
        assert!(!invocation.verbose);
    }

    #[test]
    fn test_project_root_defaults_to_current_dir() {
        let invocation = Invocation::default();
        assert_eq!(
            invocation.project_root().unwrap(),
            std::env::current_dir().unwrap()
        );
    }
}
