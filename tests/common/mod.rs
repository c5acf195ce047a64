//! Common test utilities for berth integration tests

use std::path::PathBuf;

use assert_cmd::Command;
use tempfile::TempDir;

/// An isolated user home with an app home and a project directory
///
/// The binary only ever sees paths inside the temporary directory: `HOME`
/// and `BERTH_HOME` point into it and the working directory is the project.
pub struct TestEnv {
    #[allow(dead_code)]
    pub temp: TempDir,
    pub home: PathBuf,
    pub app_home: PathBuf,
    pub project: PathBuf,
}

impl TestEnv {
    pub fn new() -> Self {
        let temp = TempDir::new().expect("Failed to create temp directory");
        let home = temp.path().join("home");
        let project = temp.path().join("shop");
        std::fs::create_dir_all(&home).expect("Failed to create home directory");
        std::fs::create_dir_all(&project).expect("Failed to create project directory");
        Self {
            app_home: home.join(".berth"),
            temp,
            home,
            project,
        }
    }

    /// Command for the real binary, confined to this environment
    #[allow(deprecated)]
    pub fn berth(&self) -> Command {
        let mut cmd = Command::cargo_bin("berth").expect("berth binary");
        cmd.current_dir(&self.project)
            .env("HOME", &self.home)
            .env("BERTH_HOME", &self.app_home)
            .env_remove("RUST_LOG")
            .arg("--no-interaction");
        cmd
    }

    /// Pretend `berth install` completed
    #[allow(dead_code)]
    pub fn mark_installed(&self) {
        std::fs::create_dir_all(&self.app_home).expect("Failed to create app home");
        std::fs::write(self.app_home.join(".installed"), "2026-01-01T00:00:00Z\n")
            .expect("Failed to write install marker");
    }

    /// Write the project `.env`
    #[allow(dead_code)]
    pub fn write_env(&self, content: &str) {
        std::fs::write(self.project.join(".env"), content).expect("Failed to write .env");
    }
}

impl Default for TestEnv {
    fn default() -> Self {
        Self::new()
    }
}
