//! Error types and handling for berth
//!
//! Uses `thiserror` for error definitions and `miette` for pretty diagnostics.
//!
//! This module is organized into sub-modules by error domain:
//! - [`command`]: host and in-service command failures
//! - [`config`]: configuration errors
//! - [`fs`]: file system errors
//! - [`plan`]: plan step failures
//! - [`template`]: template lookup and rendering errors
//! - [`trust`]: certificate, key and trust-store errors
//!
//! An operator declining a confirmation is not an error. The sequencer
//! reports it as [`crate::plan::RunOutcome::Declined`].

pub mod command;
pub mod config;
pub mod fs;
pub mod plan;
pub mod template;
pub mod trust;


use miette::Diagnostic;
use thiserror::Error;

/// Main error type for berth operations
#[derive(Error, Diagnostic, Debug)]
pub enum BerthError {
    // Target errors
    #[error("Unsupported environment type: {target}")]
    #[diagnostic(
        code(berth::target::unsupported),
        help("Set BERTH_ENV_TYPE in the project .env to one of: magento2, magento1, wordpress")
    )]
    UnsupportedTarget { target: String },

    #[error("Precondition missing: {message}")]
    #[diagnostic(code(berth::precondition::missing))]
    PreconditionMissing {
        message: String,
        #[help]
        hint: Option<String>,
    },

    // Command errors
    #[error("Command failed in {context} ({}): {command}", exit_label(.code))]
    #[diagnostic(
        code(berth::command::failed),
        help("Re-run with --verbose to see the full output of the failing command")
    )]
    ExternalCommandFailed {
        context: String,
        command: String,
        code: Option<i32>,
        stderr: String,
    },

    // Plan errors
    #[error("Step {index} ({label}) failed: {source}")]
    #[diagnostic(code(berth::plan::step_failed))]
    StepFailed {
        index: usize,
        label: String,
        #[source]
        source: Box<BerthError>,
    },

    // Template errors
    #[error("Template not found: {name}")]
    #[diagnostic(
        code(berth::template::not_found),
        help("Templates are embedded in the binary or loaded from <app home>/templates")
    )]
    TemplateNotFound { name: String },

    #[error("Failed to render template {name}: {reason}")]
    #[diagnostic(code(berth::template::render_failed))]
    TemplateRenderFailed { name: String, reason: String },

    // Trust errors
    #[error("Failed to provision {artifact}: {source}")]
    #[diagnostic(
        code(berth::trust::provisioning_failed),
        help("Already created material is kept; re-run 'berth install' to retry")
    )]
    TrustProvisioningFailed {
        artifact: String,
        #[source]
        source: Box<BerthError>,
    },

    // Configuration errors
    #[error("Invalid value {value:?} for configuration key '{key}': {reason}")]
    #[diagnostic(code(berth::config::invalid))]
    ConfigInvalid {
        key: String,
        value: String,
        reason: String,
    },

    #[error("Failed to parse configuration file: {path}")]
    #[diagnostic(code(berth::config::parse_failed))]
    ConfigParseFailed { path: String, reason: String },

    #[error("berth is not installed")]
    #[diagnostic(
        code(berth::install::not_installed),
        help("Run 'berth install' first")
    )]
    NotInstalled,

    // File system errors
    #[error("Failed to read file: {path}")]
    #[diagnostic(code(berth::fs::read_failed))]
    FileReadFailed { path: String, reason: String },

    #[error("Failed to write file: {path}")]
    #[diagnostic(code(berth::fs::write_failed))]
    FileWriteFailed { path: String, reason: String },

    #[error("IO error: {message}")]
    #[diagnostic(code(berth::fs::io_error))]
    IoError { message: String },

    #[error("Failed to read confirmation: {message}")]
    #[diagnostic(code(berth::prompt::failed))]
    PromptFailed { message: String },
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {code}"),
        None => "terminated by signal".to_string(),
    }
}

impl BerthError {
    /// Index of the plan step that failed, if this error came out of the sequencer
    pub fn step_index(&self) -> Option<usize> {
        match self {
            BerthError::StepFailed { index, .. } => Some(*index),
            _ => None,
        }
    }

    /// The error with any step context removed
    pub fn root_cause(&self) -> &BerthError {
        match self {
            BerthError::StepFailed { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

impl From<std::io::Error> for BerthError {
    fn from(err: std::io::Error) -> Self {
        BerthError::IoError {
            message: err.to_string(),
        }
    }
}

impl From<serde_yaml::Error> for BerthError {
    fn from(err: serde_yaml::Error) -> Self {
        BerthError::ConfigParseFailed {
            path: "unknown".to_string(),
            reason: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for BerthError {
    fn from(err: serde_json::Error) -> Self {
        BerthError::ConfigParseFailed {
            path: "unknown".to_string(),
            reason: err.to_string(),
        }
    }
}

impl From<inquire::InquireError> for BerthError {
    fn from(err: inquire::InquireError) -> Self {
        BerthError::PromptFailed {
            message: err.to_string(),
        }
    }
}

/// Result type alias using miette for error handling
pub type Result<T> = miette::Result<T, BerthError>;
