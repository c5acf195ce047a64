//! Docker Compose collaborator

use std::path::PathBuf;
use std::process::Command;

use super::host::run_command;
use super::{RawOutput, ServiceAction, ServiceControl, ServiceRunner, StackScope};
use crate::config::APP_NAME;
use crate::error::Result;

/// The project environment and the global services, driven through
/// `docker compose`
#[derive(Debug, Clone)]
pub struct ComposeStack {
    project_root: PathBuf,
    services_file: PathBuf,
}

impl ComposeStack {
    pub fn new(project_root: impl Into<PathBuf>, services_file: impl Into<PathBuf>) -> Self {
        Self {
            project_root: project_root.into(),
            services_file: services_file.into(),
        }
    }

    fn base_args(&self, scope: StackScope) -> Vec<String> {
        let mut args = vec!["compose".to_string()];
        match scope {
            StackScope::Environment => {
                args.push("--project-directory".to_string());
                args.push(self.project_root.display().to_string());
            }
            StackScope::Global => {
                args.extend(["-p".to_string(), APP_NAME.to_string(), "-f".to_string()]);
                args.push(self.services_file.display().to_string());
            }
        }
        args
    }

    fn exec_args(&self, service: &str, line: &str) -> Vec<String> {
        let mut args = self.base_args(StackScope::Environment);
        args.extend(
            ["exec", "-T", service, "bash", "-c", line]
                .into_iter()
                .map(str::to_string),
        );
        args
    }

    fn action_args(&self, scope: StackScope, action: ServiceAction) -> Vec<String> {
        let mut args = self.base_args(scope);
        match action {
            ServiceAction::Up => args.extend(["up".to_string(), "-d".to_string()]),
            ServiceAction::Build => args.push("build".to_string()),
            ServiceAction::Pull => args.push("pull".to_string()),
        }
        args
    }

    fn docker(args: &[String], capture: bool) -> Result<RawOutput> {
        let display = format!("docker {}", args.join(" "));
        let mut command = Command::new("docker");
        command.args(args);
        run_command(command, &display, capture)
    }
}

impl ServiceRunner for ComposeStack {
    fn run_in_service(&self, service: &str, line: &str, capture: bool) -> Result<RawOutput> {
        Self::docker(&self.exec_args(service, line), capture)
    }
}

impl ServiceControl for ComposeStack {
    fn control(&self, scope: StackScope, action: ServiceAction) -> Result<()> {
        let args = self.action_args(scope, action);
        tracing::debug!("Running docker {}", args.join(" "));
        Self::docker(&args, false)?
            .check("docker compose", &format!("docker {}", args.join(" ")))
            .map(|_| ())
    }
}
