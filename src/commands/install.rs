//! Install command CLI wrapper
//!
//! Prepares this machine through [`InstallOperation`]:
//! 1. App home, default config and the install marker
//! 2. Local CA, trusted by the host
//! 3. DNS resolver for `.test`
//! 4. Tunnel SSH key and `~/.ssh/config` entry
//! 5. Global services, started unless `--ignore-init-svcs`

use crate::cli::InstallArgs;
use crate::error::Result;
use crate::exec::{ComposeStack, Executor, SystemShell};
use crate::operations::{InstallOperation, InstallOptions, Outcome};
use crate::prompt;
use crate::trust::{RcgenIssuer, RsaKeyGenerator, TrustProvisioner};

use super::Invocation;

impl From<&InstallArgs> for InstallOptions {
    fn from(args: &InstallArgs) -> Self {
        Self {
            reinstall: args.reinstall,
            ca_cert: args.install_ca_cert,
            dns: args.install_dns,
            ssh_key: args.install_ssh_key,
            ssh_config: args.install_ssh_config,
            ignore_init_services: args.ignore_init_services,
        }
    }
}

fn overrides(args: &InstallArgs) -> Vec<(&'static str, String)> {
    args.app_home_mode
        .iter()
        .map(|mode| ("berth_install_app_home_mode", mode.clone()))
        .collect()
}

/// Run install command
pub fn run(invocation: &Invocation, args: InstallArgs) -> Result<()> {
    let session = invocation.session(&overrides(&args))?;
    let confirmer = prompt::confirmer(invocation.no_interaction);
    let renderer = session.renderer()?;

    let shell = SystemShell::new();
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

    let operation = InstallOperation::new(
        &session,
        InstallOptions::from(&args),
        confirmer.as_ref(),
        &renderer,
    );
    if operation.execute(&trust, &stack)? == Outcome::Declined {
        println!("Install cancelled.");
    }
    Ok(())
}
