//! Bootstrap command CLI wrapper
//!
//! Resolves the plan through [`BootstrapOperation`] and runs it against the
//! real shell and docker compose.

use console::style;

use crate::cli::BootstrapArgs;
use crate::error::{BerthError, Result};
use crate::exec::{ComposeStack, Executor, SystemShell};
use crate::operations::bootstrap::print_plan;
use crate::operations::{BootstrapOperation, BootstrapOptions};
use crate::plan::{ProvisioningPlan, RunOutcome, Sequencer};
use crate::prompt;
use crate::trust::{RcgenIssuer, RsaKeyGenerator, TrustProvisioner};

use super::Invocation;

/// Run bootstrap command
pub fn run(invocation: &Invocation, args: BootstrapArgs) -> Result<()> {
    let session = invocation.session(&args.overrides())?;
    let operation = BootstrapOperation::new(
        &session,
        BootstrapOptions {
            dry_run: args.dry_run,
        },
    );
    let plan = operation.resolve(&operation.detector())?;
    tracing::debug!("Resolved {} step(s)", plan.len());

    if operation.is_dry_run() {
        print_plan(&plan);
        return Ok(());
    }

    let confirmer = prompt::confirmer(invocation.no_interaction);
    let renderer = session.renderer()?;
    let shell = SystemShell::in_dir(&session.project_root);
    let stack = ComposeStack::new(&session.project_root, session.paths.services_compose_file());
    let executor = Executor::new(&shell, &stack);
    let trust = TrustProvisioner::new(
        &session.paths,
        session.platform,
        &executor,
        &RcgenIssuer,
        &RsaKeyGenerator,
        &session.user_home,
    );
    let sequencer =
        Sequencer::new(&executor, &stack, confirmer.as_ref(), &renderer, &trust).with_progress();

    let outcome = operation.execute(&plan, &sequencer).inspect_err(|e| {
        if let Some(message) = failed_step(&plan, e) {
            tracing::error!("{message}");
        }
    })?;
    match outcome {
        RunOutcome::Completed { skipped } if !skipped.is_empty() => {
            tracing::info!("Skipped {} step(s) on request", skipped.len());
        }
        RunOutcome::Completed { .. } => {}
        RunOutcome::Declined { step } => {
            tracing::debug!("Declined at step {step}");
            println!("{}", style("Bootstrap cancelled.").yellow());
        }
    }
    Ok(())
}

/// Which step of `plan` failed and why, for errors raised while running it
fn failed_step(plan: &ProvisioningPlan, err: &BerthError) -> Option<String> {
    let index = err.step_index()?;
    let step = plan.steps().get(index)?;
    Some(format!(
        "Step {} of {} failed ({step}): {}",
        index + 1,
        plan.len(),
        err.root_cause()
    ))
}
