//! Provisioning plans
//!
//! A [`ProvisioningPlan`] is the ordered list of steps for one invocation.
//! It is resolved up front by the [`resolver`], can be printed (`--dry-run`)
//! and is then executed by the [`sequencer`]. Every conditional in a
//! provisioning flow is evaluated while resolving; nothing is decided while
//! the plan runs.

pub mod params;
pub mod resolver;
pub mod sequencer;

use std::fmt;
use std::path::PathBuf;

use crate::exec::{CommandSpec, ServiceAction, StackScope};
use crate::template::TemplateContext;

pub use resolver::{Credentials, ProjectFacts, Resolver};
pub use sequencer::{RunOutcome, Sequencer};

/// One-time trust operations a plan can request
#[derive(Debug, Clone, PartialEq)]
pub enum TrustAction {
    IssueCertificate { hostnames: Vec<String> },
}

#[derive(Debug, Clone, PartialEq)]
pub enum StepKind {
    Confirm {
        prompt: String,
        default_yes: bool,
    },
    ServiceControl {
        scope: StackScope,
        action: ServiceAction,
    },
    Exec(CommandSpec),
    RenderTemplate {
        templates: Vec<String>,
        target: PathBuf,
        context: TemplateContext,
    },
    ProvisionTrust(TrustAction),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    pub kind: StepKind,
    pub label: String,
    /// A declined confirmation ends the whole plan successfully
    pub abort_on_decline: bool,
}

impl Step {
    pub fn confirm(prompt: impl Into<String>, default_yes: bool) -> Self {
        let prompt = prompt.into();
        Self {
            label: "Confirm".to_string(),
            kind: StepKind::Confirm {
                prompt,
                default_yes,
            },
            abort_on_decline: true,
        }
    }

    pub fn service(scope: StackScope, action: ServiceAction) -> Self {
        let target = match scope {
            StackScope::Global => "global services",
            StackScope::Environment => "environment",
        };
        Self {
            label: format!("{action} {target}"),
            kind: StepKind::ServiceControl { scope, action },
            abort_on_decline: false,
        }
    }

    pub fn exec(label: impl Into<String>, spec: CommandSpec) -> Self {
        Self {
            label: label.into(),
            kind: StepKind::Exec(spec),
            abort_on_decline: false,
        }
    }

    pub fn render(
        label: impl Into<String>,
        templates: &[&str],
        target: impl Into<PathBuf>,
        context: TemplateContext,
    ) -> Self {
        Self {
            label: label.into(),
            kind: StepKind::RenderTemplate {
                templates: templates.iter().map(|s| (*s).to_string()).collect(),
                target: target.into(),
                context,
            },
            abort_on_decline: false,
        }
    }

    pub fn issue_certificate(hostnames: Vec<String>) -> Self {
        Self {
            label: format!("Sign certificate for {}", hostnames.join(", ")),
            kind: StepKind::ProvisionTrust(TrustAction::IssueCertificate { hostnames }),
            abort_on_decline: false,
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            StepKind::Confirm { prompt, .. } => write!(f, "confirm: {prompt}"),
            StepKind::ServiceControl { .. } => f.write_str(&self.label),
            StepKind::Exec(spec) => write!(f, "{spec}"),
            StepKind::RenderTemplate {
                templates, target, ..
            } => write!(f, "render {} -> {}", templates.join(" + "), target.display()),
            StepKind::ProvisionTrust(_) => f.write_str(&self.label),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProvisioningPlan {
    steps: Vec<Step>,
    summary: Vec<String>,
}

impl ProvisioningPlan {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, step: Step) {
        self.steps.push(step);
    }

    /// Append a shell line run in `service`
    pub fn exec_in(&mut self, service: &str, label: impl Into<String>, line: impl Into<String>) {
        self.push(Step::exec(label, CommandSpec::service(service, line)));
    }

    /// Like [`exec_in`](Self::exec_in), masking `secret` wherever the line is shown
    pub fn exec_in_masked(
        &mut self,
        service: &str,
        label: impl Into<String>,
        line: impl Into<String>,
        secret: &str,
    ) {
        self.push(Step::exec(
            label,
            CommandSpec::service(service, line).with_secret(secret),
        ));
    }

    pub fn add_summary(&mut self, line: impl Into<String>) {
        self.summary.push(line.into());
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn summary(&self) -> &[String] {
        &self.summary
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Shell lines of every `Exec` step, in order
    #[cfg(test)]
    pub fn command_lines(&self) -> Vec<String> {
        self.steps
            .iter()
            .filter_map(|step| match &step.kind {
                StepKind::Exec(spec) => Some(spec.line.to_shell()),
                _ => None,
            })
            .collect()
    }
}
