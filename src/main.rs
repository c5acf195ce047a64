//! berth - local development environment provisioning
//!
//! Prepares the operator's machine (local CA, DNS for `.test`, tunnel SSH key,
//! global services) and bootstraps Magento 2, Magento 1 and WordPress projects
//! running in docker compose from a resolved, ordered plan of steps.

use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;
mod common;
mod config;
mod error;
mod exec;
mod host;
mod interrupt;
mod operations;
mod plan;
mod progress;
mod prompt;
mod target;
mod template;
mod trust;
mod version;

use cli::{Cli, Commands};
use commands::Invocation;

/// `log_level` from the config files, read before the session exists
fn configured_log_level(invocation: &Invocation) -> Option<String> {
    let paths = invocation.paths().ok()?;
    let root = invocation.project_root().ok()?;
    let store = config::load_store(&paths, &root).ok()?;
    store.get("log_level").map(str::to_string)
}

fn init_logging(invocation: &Invocation) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = if invocation.verbose {
            "debug".to_string()
        } else {
            configured_log_level(invocation).unwrap_or_else(|| "info".to_string())
        };
        EnvFilter::try_new(&level).unwrap_or_else(|_| EnvFilter::new("info"))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .with_target(false)
        .compact()
        .init();
}

fn main() {
    let cli = Cli::parse();
    let invocation = Invocation::from(&cli);
    init_logging(&invocation);

    if let Err(e) = interrupt::install_handler() {
        tracing::warn!("{e}");
    }

    let result = match cli.command {
        Commands::Bootstrap(args) => commands::bootstrap::run(&invocation, args),
        Commands::Install(args) => commands::install::run(&invocation, args),
        Commands::Uninstall => commands::uninstall::run(&invocation),
        Commands::SignCertificate(args) => commands::sign_certificate::run(&invocation, args),
        Commands::Version => commands::version::run(),
        Commands::Completions(args) => commands::completions::run(args),
    };
    interrupt::run_cleanup();

    if let Err(e) = result {
        eprintln!("{:?}", miette::Report::new(e));
        std::process::exit(1);
    }
}
