//! Host command runner

use std::path::PathBuf;
use std::process::{Command, Stdio};

use super::{CommandLine, HostRunner, RawOutput};
use crate::error::{Result, command as command_error};

/// Runs commands with the host's process API
///
/// Shell lines go through `sh -c` (`cmd /C` on Windows); argv lines are
/// spawned directly.
#[derive(Debug, Clone, Default)]
pub struct SystemShell {
    cwd: Option<PathBuf>,
}

impl SystemShell {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn in_dir(cwd: impl Into<PathBuf>) -> Self {
        Self {
            cwd: Some(cwd.into()),
        }
    }

    fn command_for(line: &CommandLine) -> Result<Command> {
        match line {
            CommandLine::Argv(args) => {
                let (program, rest) = args
                    .split_first()
                    .ok_or_else(|| command_error::spawn_failed("", "empty command line"))?;
                let mut command = Command::new(program);
                command.args(rest);
                Ok(command)
            }
            CommandLine::Shell(text) => {
                let mut command = if cfg!(windows) {
                    let mut command = Command::new("cmd");
                    command.arg("/C");
                    command
                } else {
                    let mut command = Command::new("sh");
                    command.arg("-c");
                    command
                };
                command.arg(text);
                Ok(command)
            }
        }
    }
}

impl HostRunner for SystemShell {
    fn run(&self, line: &CommandLine, capture: bool) -> Result<RawOutput> {
        let mut command = Self::command_for(line)?;
        if let Some(cwd) = &self.cwd {
            command.current_dir(cwd);
        }
        run_command(command, &line.to_shell(), capture)
    }
}

/// Spawn `command` and wait for it, streaming or capturing its output
pub(crate) fn run_command(mut command: Command, display: &str, capture: bool) -> Result<RawOutput> {
    if capture {
        let output = command
            .stdin(Stdio::null())
            .output()
            .map_err(|e| command_error::spawn_failed(display, e))?;
        return Ok(RawOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        });
    }

    let status = command
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .status()
        .map_err(|e| command_error::spawn_failed(display, e))?;

    Ok(RawOutput {
        code: status.code(),
        ..RawOutput::default()
    })
}
