//! Command execution boundary
//!
//! A [`CommandSpec`] is a pure value describing one command: where it runs
//! (the host or a named service of the environment), what it runs and how
//! verbose the invoked tool should be. The [`Executor`] routes a spec to the
//! matching collaborator and turns a non-zero exit into
//! [`BerthError::ExternalCommandFailed`](crate::error::BerthError::ExternalCommandFailed).

pub mod compose;
pub mod host;

use std::fmt;

use crate::error::{BerthError, Result, command as command_error};

pub use compose::ComposeStack;
pub use host::SystemShell;

/// Service that runs PHP, composer and the platform CLI
pub const PHP_SERVICE: &str = "php-fpm";

/// Where a command runs
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Host,
    Service(String),
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Host => f.write_str("host"),
            Target::Service(name) => f.write_str(name),
        }
    }
}

/// What a command runs
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandLine {
    /// Program and arguments, passed without a shell
    Argv(Vec<String>),
    /// A line interpreted by the target's shell
    Shell(String),
}

impl CommandLine {
    /// The line as a shell would read it
    pub fn to_shell(&self) -> String {
        match self {
            CommandLine::Argv(args) => args
                .iter()
                .map(|arg| shell_quote(arg))
                .collect::<Vec<_>>()
                .join(" "),
            CommandLine::Shell(line) => line.clone(),
        }
    }
}

impl fmt::Display for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_shell())
    }
}

/// Placeholder for secrets in logged and reported command lines
pub const REDACTED: &str = "********";

/// Verbosity of invoked tools
///
/// Resolved into tool flags when the plan is built; never changes whether
/// or how a command's result is checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    #[default]
    Normal,
    Debug,
}

impl Verbosity {
    /// Pick the tool flag for this verbosity
    pub fn pick<'a>(self, normal: &'a str, debug: &'a str) -> &'a str {
        match self {
            Verbosity::Normal => normal,
            Verbosity::Debug => debug,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub target: Target,
    pub line: CommandLine,
    /// Values masked wherever the line is logged or reported
    pub secrets: Vec<String>,
    /// Capture output instead of streaming it to the terminal
    pub capture: bool,
}

impl CommandSpec {
    pub fn host<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            target: Target::Host,
            line: CommandLine::Argv(args.into_iter().map(Into::into).collect()),
            secrets: Vec::new(),
            capture: false,
        }
    }

    pub fn host_shell(line: impl Into<String>) -> Self {
        Self {
            target: Target::Host,
            line: CommandLine::Shell(line.into()),
            secrets: Vec::new(),
            capture: false,
        }
    }

    pub fn service(name: impl Into<String>, line: impl Into<String>) -> Self {
        Self {
            target: Target::Service(name.into()),
            line: CommandLine::Shell(line.into()),
            secrets: Vec::new(),
            capture: false,
        }
    }

    /// Mask `value` in logs and error reports
    pub fn with_secret(mut self, value: impl Into<String>) -> Self {
        let value = value.into();
        if !value.is_empty() {
            self.secrets.push(value);
        }
        self
    }

    /// The shell line with every secret masked
    pub fn redacted(&self) -> String {
        self.mask(self.line.to_shell())
    }

    fn mask(&self, text: String) -> String {
        self.secrets
            .iter()
            .fold(text, |text, secret| text.replace(secret.as_str(), REDACTED))
    }

    /// Mask secrets in an error raised by a runner, which only saw the raw line
    fn mask_error(&self, err: BerthError) -> BerthError {
        match err {
            BerthError::ExternalCommandFailed {
                context,
                command,
                code,
                stderr,
            } => BerthError::ExternalCommandFailed {
                context,
                command: self.mask(command),
                code,
                stderr: self.mask(stderr),
            },
            other => other,
        }
    }

    pub fn captured(mut self) -> Self {
        self.capture = true;
        self
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.target, self.redacted())
    }
}

/// Output of a successful command; empty when it was streamed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
}

/// What a collaborator reports back, before the exit status is checked
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawOutput {
    /// Exit code; `None` when the process was killed by a signal
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl RawOutput {
    /// Turn a non-zero exit into `ExternalCommandFailed`
    pub fn check(self, context: &str, command: &str) -> Result<CommandOutput> {
        if self.code == Some(0) {
            Ok(CommandOutput {
                stdout: self.stdout,
                stderr: self.stderr,
            })
        } else {
            Err(command_error::failed(
                context,
                command,
                self.code,
                self.stderr.trim(),
            ))
        }
    }
}

/// Runs commands on the operator's machine
pub trait HostRunner {
    fn run(&self, line: &CommandLine, capture: bool) -> Result<RawOutput>;
}

/// Runs a shell line inside a running service of the environment
pub trait ServiceRunner {
    fn run_in_service(&self, service: &str, line: &str, capture: bool) -> Result<RawOutput>;
}

/// Which compose stack a lifecycle action applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StackScope {
    /// Shared services (proxy, DNS, tunnel, mail) under the app home
    Global,
    /// The project's own environment
    Environment,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceAction {
    Up,
    Build,
    Pull,
}

impl fmt::Display for ServiceAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ServiceAction::Up => "up",
            ServiceAction::Build => "build",
            ServiceAction::Pull => "pull",
        })
    }
}

/// Brings a compose stack to the requested lifecycle state
pub trait ServiceControl {
    fn control(&self, scope: StackScope, action: ServiceAction) -> Result<()>;
}

/// Routes command specs to the host or service collaborator
pub struct Executor<'a> {
    host: &'a dyn HostRunner,
    services: &'a dyn ServiceRunner,
}

impl<'a> Executor<'a> {
    pub fn new(host: &'a dyn HostRunner, services: &'a dyn ServiceRunner) -> Self {
        Self { host, services }
    }

    pub fn execute(&self, spec: &CommandSpec) -> Result<CommandOutput> {
        tracing::debug!("Running {spec}");

        let raw = match &spec.target {
            Target::Host => self.host.run(&spec.line, spec.capture),
            Target::Service(name) => {
                self.services
                    .run_in_service(name, &spec.line.to_shell(), spec.capture)
            }
        }
        .map_err(|e| spec.mask_error(e))?;
        raw.check(&spec.target.to_string(), &spec.redacted())
    }
}

/// Quote an argument for a POSIX shell when it needs it
pub fn shell_quote(arg: &str) -> String {
    let is_plain = !arg.is_empty()
        && arg.bytes().all(|b| {
            b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.' | b'/' | b':' | b'=' | b',' | b'@' | b'+')
        });
    if is_plain {
        arg.to_string()
    } else {
        format!("'{}'", arg.replace('\'', r"'\''"))
    }
}


#[cfg(test)]
mod tests {
    use super::testing::{Call, RecordingRunner};
    use super::*;
    use crate::error::BerthError;

    #[test]
    fn test_routes_by_target() {
        let runner = RecordingRunner::new();
        let executor = Executor::new(&runner, &runner);

        executor.execute(&CommandSpec::host(["echo", "hi"])).unwrap();
        executor
            .execute(&CommandSpec::service(PHP_SERVICE, "composer --version"))
            .unwrap();

        assert_eq!(
            runner.calls(),
            vec![
                Call::Host("echo hi".to_string()),
                Call::Service {
                    service: "php-fpm".to_string(),
                    line: "composer --version".to_string(),
                },
            ]
        );
    }

    #[test]
    fn test_non_zero_exit_is_error() {
        let runner = RecordingRunner::new().with_exit_codes(&[3]);
        let executor = Executor::new(&runner, &runner);

        let err = executor
            .execute(&CommandSpec::service(PHP_SERVICE, "bin/magento setup:upgrade"))
            .unwrap_err();
        match err {
            BerthError::ExternalCommandFailed {
                context,
                command,
                code,
                ..
            } => {
                assert_eq!(context, "php-fpm");
                assert_eq!(command, "bin/magento setup:upgrade");
                assert_eq!(code, Some(3));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_captured_output() {
        let runner = RecordingRunner::new().with_stdout(&["2.4.3\n"]);
        let executor = Executor::new(&runner, &runner);

        let output = executor
            .execute(&CommandSpec::service(PHP_SERVICE, "bin/magento --version").captured())
            .unwrap();
        assert_eq!(output.stdout, "2.4.3\n");
    }

    #[test]
    fn test_secrets_are_masked_in_logs_and_errors() {
        let runner = RecordingRunner::new().with_exit_codes(&[1]);
        let executor = Executor::new(&runner, &runner);
        let spec = CommandSpec::service(
            PHP_SERVICE,
            "bin/magento admin:user:create --admin-password=s3cretPassw0rdXy",
        )
        .with_secret("s3cretPassw0rdXy");

        assert_eq!(
            spec.to_string(),
            "[php-fpm] bin/magento admin:user:create --admin-password=********"
        );
        let err = executor.execute(&spec).unwrap_err();
        assert!(!err.to_string().contains("s3cretPassw0rdXy"));
        // The real line still reaches the service
        assert!(runner.lines()[0].ends_with("--admin-password=s3cretPassw0rdXy"));
    }

    #[test]
    fn test_secrets_are_masked_when_spawn_fails() {
        struct Unspawnable;
        impl HostRunner for Unspawnable {
            fn run(&self, line: &CommandLine, _capture: bool) -> Result<RawOutput> {
                Err(command_error::spawn_failed(line.to_shell(), "not found"))
            }
        }
        impl ServiceRunner for Unspawnable {
            fn run_in_service(&self, service: &str, line: &str, _capture: bool) -> Result<RawOutput> {
                Err(command_error::spawn_failed(
                    format!("docker compose exec {service} sh -c {line}"),
                    "No such file or directory",
                ))
            }
        }

        let executor = Executor::new(&Unspawnable, &Unspawnable);
        let spec = CommandSpec::service(PHP_SERVICE, "admin:user:create localadmin hunter2pass")
            .with_secret("hunter2pass");
        match executor.execute(&spec).unwrap_err() {
            BerthError::ExternalCommandFailed { command, .. } => {
                assert_eq!(
                    command,
                    "docker compose exec php-fpm sh -c admin:user:create localadmin ********"
                );
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_shell_quote() {
        assert_eq!(shell_quote("plain-arg_1.0"), "plain-arg_1.0");
        assert_eq!(shell_quote("two words"), "'two words'");
        assert_eq!(shell_quote("it's"), r"'it'\''s'");
        assert_eq!(shell_quote(""), "''");
    }

    #[test]
    fn test_verbosity_pick() {
        assert_eq!(Verbosity::Normal.pick("", "-vvv"), "");
        assert_eq!(Verbosity::Debug.pick("", "-vvv"), "-vvv");
    }
}
