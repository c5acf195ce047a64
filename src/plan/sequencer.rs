//! Plan execution
//!
//! Steps run strictly in order. The first failing step stops the run and
//! its error comes back wrapped in `StepFailed` with the step's index. A
//! declined confirmation that aborts on decline ends the run without error.
//! Nothing is retried.

use std::path::Path;

use console::style;

use crate::common::fs::ensure_dir;
use crate::error::{Result, plan as plan_error};
use crate::exec::{Executor, ServiceControl};
use crate::progress::StepProgress;
use crate::prompt::Confirmer;
use crate::template::{TemplateContext, TemplateRenderer, write_if_absent};
use crate::trust::TrustProvisioner;
use crate::trust::guard::Guarded;

use super::{ProvisioningPlan, Step, StepKind, TrustAction};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// Every step ran; `skipped` lists the steps that had nothing to do
    Completed { skipped: Vec<usize> },
    /// The operator declined the confirmation at `step`
    Declined { step: usize },
}

enum StepResult {
    Done,
    Skipped,
    Declined,
}

pub struct Sequencer<'a> {
    executor: &'a Executor<'a>,
    services: &'a dyn ServiceControl,
    confirmer: &'a dyn Confirmer,
    renderer: &'a TemplateRenderer,
    trust: &'a TrustProvisioner<'a>,
    show_progress: bool,
}

impl<'a> Sequencer<'a> {
    pub fn new(
        executor: &'a Executor<'a>,
        services: &'a dyn ServiceControl,
        confirmer: &'a dyn Confirmer,
        renderer: &'a TemplateRenderer,
        trust: &'a TrustProvisioner<'a>,
    ) -> Self {
        Self {
            executor,
            services,
            confirmer,
            renderer,
            trust,
            show_progress: false,
        }
    }

    /// Draw a progress bar while running
    pub fn with_progress(mut self) -> Self {
        self.show_progress = true;
        self
    }

    pub fn run(&self, plan: &ProvisioningPlan) -> Result<RunOutcome> {
        let total = plan.len();
        let progress = if self.show_progress {
            StepProgress::new(total as u64)
        } else {
            StepProgress::hidden()
        };
        let mut skipped = Vec::new();

        for (index, step) in plan.steps().iter().enumerate() {
            progress.start_step(&step.label);
            progress.suspend(|| {
                println!(
                    "{} {}",
                    style(format!("[{}/{total}]", index + 1)).cyan().bold(),
                    step.label
                );
            });
            tracing::debug!(index, "{step}");

            match self.run_step(step, &progress) {
                Ok(StepResult::Done) => {}
                Ok(StepResult::Skipped) => {
                    tracing::info!("Skipped: {}", step.label);
                    skipped.push(index);
                }
                Ok(StepResult::Declined) => {
                    progress.finish();
                    tracing::info!("Declined at step {}, nothing else was run", index + 1);
                    return Ok(RunOutcome::Declined { step: index });
                }
                Err(e) => {
                    progress.abandon();
                    return Err(plan_error::step_failed(index, step.label.as_str(), e));
                }
            }
            progress.inc();
        }

        progress.finish();
        Ok(RunOutcome::Completed { skipped })
    }

    fn run_step(&self, step: &Step, progress: &StepProgress) -> Result<StepResult> {
        match &step.kind {
            StepKind::Confirm {
                prompt,
                default_yes,
            } => {
                let accepted = progress.suspend(|| self.confirmer.confirm(prompt, *default_yes))?;
                Ok(match (accepted, step.abort_on_decline) {
                    (true, _) => StepResult::Done,
                    (false, true) => StepResult::Declined,
                    (false, false) => StepResult::Skipped,
                })
            }
            StepKind::ServiceControl { scope, action } => {
                progress.suspend(|| self.services.control(*scope, *action))?;
                Ok(StepResult::Done)
            }
            StepKind::Exec(spec) => {
                progress.suspend(|| self.executor.execute(spec))?;
                Ok(StepResult::Done)
            }
            StepKind::RenderTemplate {
                templates,
                target,
                context,
            } => progress.suspend(|| self.render(templates, target, context)),
            StepKind::ProvisionTrust(TrustAction::IssueCertificate { hostnames }) => {
                match self.trust.issue_certificate(hostnames)? {
                    Guarded::Ran(path) => {
                        tracing::info!("Signed {}", path.display());
                        Ok(StepResult::Done)
                    }
                    Guarded::Skipped => Ok(StepResult::Skipped),
                }
            }
        }
    }

    fn render(
        &self,
        templates: &[String],
        target: &Path,
        context: &TemplateContext,
    ) -> Result<StepResult> {
        let bytes = self.renderer.render(templates, context)?;
        if let Some(dir) = target.parent() {
            ensure_dir(dir)?;
        }
        if write_if_absent(target, &bytes, self.confirmer)? {
            Ok(StepResult::Done)
        } else {
            Ok(StepResult::Skipped)
        }
    }
}
