//! Bootstrap operation
//!
//! Resolves the plan for the project's environment type and either prints
//! it (`--dry-run`) or runs it through the sequencer.

use console::style;

use crate::error::{Result, config as config_error};
use crate::plan::{Credentials, ProjectFacts, ProvisioningPlan, Resolver, RunOutcome, Sequencer};
use crate::target::PlatformKind;
use crate::version::{ProjectVersionDetector, VersionDetector};

use super::Session;

#[derive(Debug, Clone, Default)]
pub struct BootstrapOptions {
    pub dry_run: bool,
}

pub struct BootstrapOperation<'a> {
    session: &'a Session,
    options: BootstrapOptions,
}

impl<'a> BootstrapOperation<'a> {
    pub fn new(session: &'a Session, options: BootstrapOptions) -> Self {
        Self { session, options }
    }

    pub fn is_dry_run(&self) -> bool {
        self.options.dry_run
    }

    /// Check preconditions and resolve the plan for this project
    pub fn resolve(&self, detector: &dyn VersionDetector) -> Result<ProvisioningPlan> {
        let session = self.session;
        if !session.is_installed() {
            return Err(config_error::precondition(
                format!("{} was not found", session.paths.install_marker().display()),
                Some("Run 'berth install' first"),
            ));
        }

        let kind = PlatformKind::from_setting(session.settings.env_type.as_deref())?;
        let version = if kind.requires_version() {
            Some(detector.detect()?)
        } else {
            None
        };

        let facts = ProjectFacts::inspect(
            &session.project_root,
            &session.paths.certs_dir(),
            &session.settings.domain,
        );
        let credentials = Credentials::generate();

        Resolver::new(&session.settings, &facts, &credentials)
            .with_verbosity(session.verbosity)
            .resolve(kind, version.as_ref())
    }

    /// Version detector reading the project tree and configuration
    pub fn detector(&self) -> ProjectVersionDetector {
        ProjectVersionDetector::new(
            self.session.project_root.clone(),
            self.session.settings.magento_version.clone(),
        )
    }

    pub fn execute(&self, plan: &ProvisioningPlan, sequencer: &Sequencer<'_>) -> Result<RunOutcome> {
        if self.options.dry_run {
            print_plan(plan);
            return Ok(RunOutcome::Completed { skipped: Vec::new() });
        }

        let outcome = sequencer.run(plan)?;
        if let RunOutcome::Completed { .. } = outcome {
            println!();
            for line in plan.summary() {
                println!("{}", style(line).green());
            }
        }
        Ok(outcome)
    }
}

pub fn print_plan(plan: &ProvisioningPlan) {
    println!("{}", style("Bootstrap plan:").bold());
    let width = plan.len().to_string().len();
    for (index, step) in plan.steps().iter().enumerate() {
        println!("  {:>width$}. {step}", index + 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BerthError;
    use crate::operations::testing::session;
    use crate::plan::StepKind;
    use crate::version::PlatformVersion;
    use tempfile::TempDir;

    struct FixedVersion(&'static str);

    impl VersionDetector for FixedVersion {
        fn detect(&self) -> Result<PlatformVersion> {
            PlatformVersion::parse(self.0)
        }
    }

    fn mark_installed(session: &Session) {
        std::fs::create_dir_all(session.paths.home()).unwrap();
        std::fs::write(session.paths.install_marker(), "2026-01-01T00:00:00Z\n").unwrap();
    }

    #[test]
    fn test_requires_install_marker() {
        let temp = TempDir::new().unwrap();
        let session = session(temp.path(), &[("berth_env_type", "wordpress")]);
        let operation = BootstrapOperation::new(&session, BootstrapOptions::default());

        let err = operation.resolve(&FixedVersion("2.4.3")).unwrap_err();
        assert!(matches!(err, BerthError::PreconditionMissing { .. }));
    }

    #[test]
    fn test_unsupported_target() {
        let temp = TempDir::new().unwrap();
        let session = session(temp.path(), &[("berth_env_type", "drupal")]);
        mark_installed(&session);

        let err = BootstrapOperation::new(&session, BootstrapOptions::default())
            .resolve(&FixedVersion("2.4.3"))
            .unwrap_err();
        assert!(matches!(err, BerthError::UnsupportedTarget { target } if target == "drupal"));
    }

    #[test]
    fn test_resolves_magento2_with_detected_version() {
        let temp = TempDir::new().unwrap();
        let session = session(
            temp.path(),
            &[("berth_env_type", "magento2"), ("berth_elasticsearch", "1")],
        );
        mark_installed(&session);

        let plan = BootstrapOperation::new(&session, BootstrapOptions { dry_run: true })
            .resolve(&FixedVersion("2.4.2"))
            .unwrap();

        match &plan.steps()[0].kind {
            StepKind::Confirm { prompt, .. } => {
                assert_eq!(prompt, "Would you like to bootstrap Magento v2.4.2?");
            }
            other => panic!("unexpected first step {other:?}"),
        }
        assert!(
            plan.command_lines()
                .iter()
                .any(|l| l.contains("--search-engine=elasticsearch7"))
        );
    }

    #[test]
    fn test_wordpress_needs_no_version() {
        struct NoVersion;
        impl VersionDetector for NoVersion {
            fn detect(&self) -> Result<PlatformVersion> {
                panic!("WordPress must not detect a version")
            }
        }

        let temp = TempDir::new().unwrap();
        let session = session(temp.path(), &[("berth_env_type", "wordpress")]);
        mark_installed(&session);

        let plan = BootstrapOperation::new(&session, BootstrapOptions::default())
            .resolve(&NoVersion)
            .unwrap();
        assert_eq!(plan.summary(), &["Base Url: https://app.shop.test".to_string()]);
    }
}
