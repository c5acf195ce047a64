//! Plan resolution
//!
//! The [`Resolver`] turns settings, a detected platform version and a few
//! facts about the project tree into a [`ProvisioningPlan`]. All branching
//! happens here, once, so the same inputs always produce the same plan.

mod magento1;
mod magento2;
mod wordpress;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use rand::Rng;
use rand::distributions::Alphanumeric;
use rand::seq::SliceRandom;

use crate::config::Settings;
use crate::error::{Result, config as config_error};
use crate::exec::{ServiceAction, StackScope, Verbosity};
use crate::target::PlatformKind;
use crate::trust::ca::leaf_paths;
use crate::version::PlatformVersion;

use super::{ProvisioningPlan, Step};

/// Admin user created on Magento installs
pub const ADMIN_USER: &str = "localadmin";
pub const ADMIN_EMAIL: &str = "admin@example.com";

const PASSWORD_LENGTH: usize = 16;
const PASSWORD_DIGITS: usize = 2;

/// Observations about the project tree, taken before resolving
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectFacts {
    pub root: PathBuf,
    pub has_composer_json: bool,
    pub has_index_php: bool,
    /// A leaf certificate for the environment domain already exists
    pub has_certificate: bool,
}

impl ProjectFacts {
    pub fn inspect(root: &Path, certs_dir: &Path, domain: &str) -> Self {
        Self {
            root: root.to_path_buf(),
            has_composer_json: root.join("composer.json").is_file(),
            has_index_php: root.join("index.php").is_file(),
            // An unusable domain is rejected when the certificate is signed
            has_certificate: leaf_paths(certs_dir, domain).is_ok_and(|(cert, _)| cert.is_file()),
        }
    }
}

/// Secrets generated for one bootstrap
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub admin_password: String,
    /// Magento 1 encryption key
    pub crypt_key: String,
    /// WordPress authentication keys and salts
    pub salts: BTreeMap<String, String>,
}

const WORDPRESS_SALTS: &[&str] = &[
    "AUTH_KEY",
    "SECURE_AUTH_KEY",
    "LOGGED_IN_KEY",
    "NONCE_KEY",
    "AUTH_SALT",
    "SECURE_AUTH_SALT",
    "LOGGED_IN_SALT",
    "NONCE_SALT",
];

impl Credentials {
    pub fn generate() -> Self {
        let mut rng = rand::thread_rng();
        Self {
            admin_password: generate_password(&mut rng),
            crypt_key: random_alphanumeric(&mut rng, 32),
            salts: WORDPRESS_SALTS
                .iter()
                .map(|name| ((*name).to_string(), random_alphanumeric(&mut rng, 64)))
                .collect(),
        }
    }
}

/// 16 alphanumeric characters, at least two of them digits
pub fn generate_password(rng: &mut impl Rng) -> String {
    let mut chars: Vec<char> = (0..PASSWORD_DIGITS)
        .map(|_| char::from(b'0' + rng.gen_range(0..10u8)))
        .collect();
    chars.extend(
        (PASSWORD_DIGITS..PASSWORD_LENGTH).map(|_| char::from(rng.sample(Alphanumeric))),
    );
    chars.shuffle(rng);
    chars.into_iter().collect()
}

fn random_alphanumeric(rng: &mut impl Rng, len: usize) -> String {
    (0..len).map(|_| char::from(rng.sample(Alphanumeric))).collect()
}

pub struct Resolver<'a> {
    settings: &'a Settings,
    facts: &'a ProjectFacts,
    credentials: &'a Credentials,
    verbosity: Verbosity,
}

impl<'a> Resolver<'a> {
    pub fn new(settings: &'a Settings, facts: &'a ProjectFacts, credentials: &'a Credentials) -> Self {
        let verbosity = if settings.debug {
            Verbosity::Debug
        } else {
            Verbosity::Normal
        };
        Self {
            settings,
            facts,
            credentials,
            verbosity,
        }
    }

    pub fn with_verbosity(mut self, verbosity: Verbosity) -> Self {
        self.verbosity = verbosity;
        self
    }

    /// Build the bootstrap plan for `kind`
    ///
    /// Magento targets need a detected version; WordPress ignores it.
    pub fn resolve(
        &self,
        kind: PlatformKind,
        version: Option<&PlatformVersion>,
    ) -> Result<ProvisioningPlan> {
        let required = || {
            version.ok_or_else(|| {
                config_error::precondition(
                    format!("{} bootstrap needs the platform version", kind.as_str()),
                    Some("Set MAGENTO_VERSION in the project .env"),
                )
            })
        };

        let plan = match kind {
            PlatformKind::Magento2 => magento2::plan(self, required()?)?,
            PlatformKind::Magento1 => magento1::plan(self, required()?),
            PlatformKind::Wordpress => wordpress::plan(self),
        };
        tracing::debug!("Resolved {} plan with {} steps", kind.as_str(), plan.len());
        Ok(plan)
    }

    /// Confirmation, global services, certificate and environment lifecycle
    fn prelude(&self, plan: &mut ProvisioningPlan, prompt: String) {
        plan.push(Step::confirm(prompt, true));
        plan.push(Step::service(StackScope::Global, ServiceAction::Up));

        if self.facts.has_certificate {
            tracing::debug!("Certificate for {} exists, not signing", self.settings.domain);
        } else {
            plan.push(Step::issue_certificate(vec![self.settings.domain.clone()]));
        }

        if !self.settings.bootstrap.no_pull {
            plan.push(Step::service(StackScope::Environment, ServiceAction::Pull));
        }
        plan.push(Step::service(StackScope::Environment, ServiceAction::Build));
        plan.push(Step::service(StackScope::Environment, ServiceAction::Up));
    }

    /// Parallel download plugin (Composer 1 only)
    fn parallel_downloads(&self) -> bool {
        !self.settings.bootstrap.composer_no_parallel
    }

    fn pick(&self, normal: &'static str, debug: &'static str) -> &'static str {
        self.verbosity.pick(normal, debug)
    }
}
