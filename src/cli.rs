//! CLI definitions using clap derive API

use clap::builder::{Styles, styling::AnsiColor};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// berth - local development environments
///
/// Provision and reconcile Magento and WordPress environments on this machine.
#[derive(Parser, Debug)]
#[command(
    name = "berth",
    author,
    version,
    color = clap::ColorChoice::Always,
    styles = Styles::styled()
        .header(AnsiColor::Green.on_default().bold())
        .usage(AnsiColor::Green.on_default().bold())
        .literal(AnsiColor::Cyan.on_default().bold())
        .placeholder(AnsiColor::Cyan.on_default()),
    about = "Provision and reconcile local multi-service development environments",
    long_about = "berth prepares this machine (local CA, DNS for .test, SSH tunnel key, global \
                  services) and bootstraps Magento 2, Magento 1 and WordPress projects running \
                  in docker compose.",
    after_help = "\x1b[1m\x1b[32mExamples:\x1b[0m\n    \
                  berth install\n    \
                  berth bootstrap --dry-run\n    \
                  berth bootstrap --full\n    \
                  berth sign-certificate shop.test\n    \
                  berth uninstall"
)]
pub struct Cli {
    /// Project directory (defaults to current directory)
    #[arg(long, short = 'p', global = true)]
    pub project: Option<PathBuf>,

    /// Global configuration file (defaults to ~/.berth.yml)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose output and debug flags of invoked tools
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Answer every confirmation with its default
    #[arg(long, short = 'n', global = true)]
    pub no_interaction: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Bootstrap the environment of the current project
    Bootstrap(BootstrapArgs),

    /// Prepare this machine for berth environments
    Install(InstallArgs),

    /// Delete the berth app home and global configuration
    Uninstall,

    /// Sign a certificate for hostnames with the local CA
    SignCertificate(SignCertificateArgs),

    /// Show version information
    Version,

    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Arguments for the bootstrap command
#[derive(Parser, Debug, Default)]
#[command(after_help = "EXAMPLES:\n  \
                  Show what would run:\n    berth bootstrap --dry-run\n\n\
                  Fresh Magento install with sample data and reindex:\n    berth bootstrap --full\n\n\
                  Reuse vendor/ and skip image pulls:\n    berth bootstrap --skip-composer-install --no-pull\n\n\
                  Enterprise edition in production mode:\n    berth bootstrap --magento-type enterprise --magento-mode production")]
pub struct BootstrapArgs {
    /// Print the resolved plan without running it
    #[arg(long)]
    pub dry_run: bool,

    /// Do not pull images before building
    #[arg(long)]
    pub no_pull: bool,

    /// Sample data and reindex on top of the regular bootstrap
    #[arg(long)]
    pub full: bool,

    /// Skip composer create-project and install
    #[arg(long)]
    pub skip_composer_install: bool,

    /// Do not use the parallel download plugin with Composer 1
    #[arg(long)]
    pub composer_no_parallel: bool,

    /// Deploy sample data on fresh installs
    #[arg(long = "with-sampledata")]
    pub with_sample_data: bool,

    /// Disable the two-factor auth module
    #[arg(long)]
    pub disable_tfa: bool,

    /// Reset a custom admin URL to the default
    #[arg(long)]
    pub reset_admin_url: bool,

    /// Database table prefix
    #[arg(long, value_name = "PREFIX")]
    pub db_prefix: Option<String>,

    /// Magento edition (community, enterprise)
    #[arg(long, value_name = "TYPE")]
    pub magento_type: Option<String>,

    /// Magento deploy mode (developer, production)
    #[arg(long, value_name = "MODE")]
    pub magento_mode: Option<String>,
}

impl BootstrapArgs {
    /// Configuration keys set by these flags
    pub fn overrides(&self) -> Vec<(&'static str, String)> {
        let mut overrides = Vec::new();
        let flags = [
            ("berth_no_pull", self.no_pull),
            ("berth_full_bootstrap", self.full),
            ("berth_skip_composer_install", self.skip_composer_install),
            ("berth_composer_no_parallel", self.composer_no_parallel),
            ("berth_with_sampledata", self.with_sample_data),
            ("berth_magento_disable_tfa", self.disable_tfa),
            ("berth_reset_admin_url", self.reset_admin_url),
        ];
        for (key, set) in flags {
            if set {
                overrides.push((key, "1".to_string()));
            }
        }
        let values = [
            ("berth_db_prefix", &self.db_prefix),
            ("berth_magento_type", &self.magento_type),
            ("berth_magento_mode", &self.magento_mode),
        ];
        for (key, value) in values {
            if let Some(value) = value {
                overrides.push((key, value.clone()));
            }
        }
        overrides
    }
}

/// Arguments for the install command
#[derive(Parser, Debug, Default)]
#[command(after_help = "EXAMPLES:\n  \
                  Install everything:\n    berth install\n\n\
                  Reinstall without asking:\n    berth install --reinstall\n\n\
                  Only (re)trust the local CA:\n    berth install --install-ca-cert\n\n\
                  Install without starting global services:\n    berth install --ignore-init-svcs")]
pub struct InstallArgs {
    /// Reinstall without asking when already installed
    #[arg(long)]
    pub reinstall: bool,

    /// Only create and trust the local CA
    #[arg(long)]
    pub install_ca_cert: bool,

    /// Only register the DNS resolver for .test
    #[arg(long)]
    pub install_dns: bool,

    /// Only create the tunnel SSH key
    #[arg(long)]
    pub install_ssh_key: bool,

    /// Only add the tunnel host to ~/.ssh/config
    #[arg(long)]
    pub install_ssh_config: bool,

    /// Do not start global services
    #[arg(long = "ignore-init-svcs")]
    pub ignore_init_services: bool,

    /// Permission bits of the app home, in octal
    #[arg(long, value_name = "OCTAL")]
    pub app_home_mode: Option<String>,
}

/// Arguments for the sign-certificate command
#[derive(Parser, Debug)]
#[command(after_help = "EXAMPLES:\n  \
                  Sign for a domain and its subdomains:\n    berth sign-certificate shop.test\n\n\
                  Several domains in one certificate:\n    berth sign-certificate shop.test blog.test")]
pub struct SignCertificateArgs {
    /// Hostnames; each also gets a wildcard entry
    #[arg(required = true, value_name = "HOSTNAME")]
    pub hostnames: Vec<String>,
}

/// Arguments for completions command
#[derive(Parser, Debug)]
#[command(after_help = "EXAMPLES:\n  \
                  Generate bash completions:\n    berth completions --shell bash > ~/.bash_completion.d/berth\n\n\
                  Generate zsh completions:\n    berth completions --shell zsh > ~/.zfunc/_berth\n\n\
                  Generate fish completions:\n    berth completions --shell fish > ~/.config/fish/completions/berth.fish\n\n\
                  Generate PowerShell completions:\n    berth completions --shell powershell")]
pub struct CompletionsArgs {
    /// Shell type (bash, elvish, fish, powershell, zsh)
    #[arg(long)]
    pub shell: String,
}
