//! Install operation
//!
//! Prepares the machine: app home, default config, local CA, DNS resolver,
//! tunnel SSH key and config, the global services compose file and the
//! install marker. Every action is idempotent, so re-running only repeats
//! what is missing. The `--install-*` flags restrict a run to the named
//! actions and never touch the marker.

use crate::common::fs::{ensure_dir, set_mode, write_atomic};
use crate::error::{Result, fs as fs_error};
use crate::exec::{ServiceAction, ServiceControl, StackScope};
use crate::prompt::Confirmer;
use crate::template::{TemplateContext, TemplateRenderer, write_if_absent};
use crate::trust::TrustProvisioner;
use crate::trust::guard::{Marker, guarded};

use super::{Outcome, Session};

#[derive(Debug, Clone, Default)]
pub struct InstallOptions {
    /// Reinstall without asking when already installed
    pub reinstall: bool,
    pub ca_cert: bool,
    pub dns: bool,
    pub ssh_key: bool,
    pub ssh_config: bool,
    pub ignore_init_services: bool,
}

impl InstallOptions {
    /// Whether only some actions were requested
    pub fn is_selective(&self) -> bool {
        self.ca_cert || self.dns || self.ssh_key || self.ssh_config
    }
}

pub struct InstallOperation<'a> {
    session: &'a Session,
    options: InstallOptions,
    confirmer: &'a dyn Confirmer,
    renderer: &'a TemplateRenderer,
}

impl<'a> InstallOperation<'a> {
    pub fn new(
        session: &'a Session,
        options: InstallOptions,
        confirmer: &'a dyn Confirmer,
        renderer: &'a TemplateRenderer,
    ) -> Self {
        Self {
            session,
            options,
            confirmer,
            renderer,
        }
    }

    pub fn execute(
        &self,
        trust: &TrustProvisioner<'_>,
        services: &dyn ServiceControl,
    ) -> Result<Outcome> {
        let session = self.session;
        let paths = &session.paths;
        let options = &self.options;
        let full = !options.is_selective();

        if session.platform.is_windows() {
            tracing::warn!(
                "Trust store and DNS changes need an elevated shell; run 'berth install' as Administrator"
            );
        }

        let marker = paths.install_marker();
        if full && marker.is_file() {
            if !options.reinstall
                && !self.confirmer.confirm(
                    "berth is already installed. Would you like to reinstall?",
                    false,
                )?
            {
                return Ok(Outcome::Declined);
            }
            // Written again once everything below succeeded
            std::fs::remove_file(&marker).map_err(|e| fs_error::write_failed(&marker, e))?;
        }

        ensure_dir(paths.home())?;
        set_mode(paths.home(), session.settings.install.app_home_mode)?;

        if full {
            self.write_default_config()?;
        }
        if full || options.ca_cert {
            trust.ensure_ca()?;
        }
        if full || options.dns {
            if session.settings.global_services.dnsmasq {
                trust.ensure_dns()?;
            } else {
                tracing::info!("dnsmasq is disabled, not registering a DNS resolver");
            }
        }
        if full || options.ssh_key {
            trust.ensure_ssh_key()?;
        }
        if !session.platform.is_windows() {
            if full || options.ssh_config {
                trust.ensure_ssh_config()?;
            }
            if full {
                ensure_dir(&session.user_home.join(".composer"))?;
            }
        }

        if !full {
            return Ok(Outcome::Done);
        }

        self.write_services_compose()?;
        guarded(&Marker::Stamp(marker), || Ok(()))?;
        println!("berth was installed to {}", paths.home().display());

        if options.ignore_init_services || session.settings.install.ignore_init_services {
            tracing::info!("Not starting global services");
        } else {
            services.control(StackScope::Global, ServiceAction::Up)?;
        }
        Ok(Outcome::Done)
    }

    fn write_default_config(&self) -> Result<()> {
        let paths = &self.session.paths;
        let context = TemplateContext::new().with("app_home", paths.home().display().to_string());
        let bytes = self
            .renderer
            .render(&["config/berth.yml".to_string()], &context)?;
        if write_if_absent(paths.config_file(), &bytes, self.confirmer)? {
            tracing::info!("Wrote {}", paths.config_file().display());
        }
        Ok(())
    }

    fn write_services_compose(&self) -> Result<()> {
        let session = self.session;
        let paths = &session.paths;
        let global = session.settings.global_services;
        let context = TemplateContext::new()
            .with("ssl_dir", paths.ssl_dir().display().to_string())
            .with("tunnel_dir", paths.tunnel_dir().display().to_string())
            .with("service_domain", format!("{}.test", crate::config::APP_NAME))
            .with("dnsmasq", global.dnsmasq)
            .with("tunnel", global.tunnel)
            .with("mailhog", global.mailhog);
        let bytes = self
            .renderer
            .render(&["services/docker-compose.yml".to_string()], &context)?;
        write_atomic(&paths.services_compose_file(), &bytes, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exec::Executor;
    use crate::exec::testing::{Call, RecordingRunner};
    use crate::operations::testing::session;
    use crate::prompt::testing::ScriptedConfirmer;
    use crate::trust::ca::RcgenIssuer;
    use crate::trust::testing::StubKeys;
    use serial_test::serial;
    use tempfile::TempDir;

    fn install(
        session: &Session,
        options: InstallOptions,
        confirmer: &ScriptedConfirmer,
        runner: &RecordingRunner,
    ) -> Result<Outcome> {
        let renderer = TemplateRenderer::embedded().unwrap();
        let executor = Executor::new(runner, runner);
        let trust = TrustProvisioner::new(
            &session.paths,
            session.platform,
            &executor,
            &RcgenIssuer,
            &StubKeys,
            &session.user_home,
        )
        .with_fs_root(session.user_home.join("root"));
        InstallOperation::new(session, options, confirmer, &renderer).execute(&trust, runner)
    }

    #[test]
    #[serial]
    fn test_full_install_then_rerun_is_quiet() {
        let temp = TempDir::new().unwrap();
        let session = session(temp.path(), &[]);
        let runner = RecordingRunner::new();

        let outcome = install(
            &session,
            InstallOptions::default(),
            &ScriptedConfirmer::new(&[]),
            &runner,
        )
        .unwrap();
        assert_eq!(outcome, Outcome::Done);

        let paths = &session.paths;
        assert!(paths.install_marker().is_file());
        assert!(paths.config_file().is_file());
        assert!(paths.services_compose_file().is_file());
        assert!(paths.ca_dir().join("certs/ca.cert.pem").is_file());
        assert!(paths.ssh_key().is_file());
        assert!(temp.path().join(".ssh/config").is_file());
        assert!(temp.path().join(".composer").is_dir());
        assert_eq!(
            runner.calls().last(),
            Some(&Call::Control(StackScope::Global, ServiceAction::Up))
        );

        let compose = std::fs::read_to_string(paths.services_compose_file()).unwrap();
        assert!(compose.contains("traefik.berth.test"));
        assert!(compose.contains("mailhog:"));

        // The recorded `sudo tee` never ran, so register the resolver by hand
        let resolver = temp.path().join("root/etc/resolver/test");
        std::fs::create_dir_all(resolver.parent().unwrap()).unwrap();
        std::fs::write(&resolver, "nameserver 127.0.0.1\n").unwrap();

        // Second run: confirm reinstall; trust material is already in place
        let rerun = RecordingRunner::new();
        let confirmer = ScriptedConfirmer::new(&[true]);
        install(&session, InstallOptions::default(), &confirmer, &rerun).unwrap();
        assert_eq!(
            rerun.calls(),
            vec![Call::Control(StackScope::Global, ServiceAction::Up)]
        );
        assert_eq!(
            confirmer.asked()[0],
            "berth is already installed. Would you like to reinstall?"
        );
        assert!(paths.install_marker().is_file());
    }

    #[test]
    fn test_declined_reinstall_changes_nothing() {
        let temp = TempDir::new().unwrap();
        let session = session(temp.path(), &[]);
        std::fs::create_dir_all(session.paths.home()).unwrap();
        std::fs::write(session.paths.install_marker(), "then\n").unwrap();
        let runner = RecordingRunner::new();

        let outcome = install(
            &session,
            InstallOptions::default(),
            &ScriptedConfirmer::new(&[false]),
            &runner,
        )
        .unwrap();

        assert_eq!(outcome, Outcome::Declined);
        assert!(runner.calls().is_empty());
        assert!(!session.paths.ca_dir().exists());
        assert_eq!(
            std::fs::read_to_string(session.paths.install_marker()).unwrap(),
            "then\n"
        );
    }

    #[test]
    fn test_selective_install_skips_marker_and_services() {
        let temp = TempDir::new().unwrap();
        let session = session(temp.path(), &[]);
        let runner = RecordingRunner::new();
        let options = InstallOptions {
            ssh_key: true,
            ..InstallOptions::default()
        };

        install(&session, options, &ScriptedConfirmer::new(&[]), &runner).unwrap();

        assert!(session.paths.ssh_key().is_file());
        assert!(!session.paths.install_marker().exists());
        assert!(!session.paths.config_file().exists());
        assert!(!session.paths.ca_dir().exists());
        assert!(runner.calls().is_empty());
    }

    #[test]
    #[serial]
    fn test_failed_trust_leaves_no_marker() {
        let temp = TempDir::new().unwrap();
        let session = session(temp.path(), &[("berth_install_ignore_init_svcs", "1")]);
        // macOS trust store install exits 1
        let runner = RecordingRunner::new().with_exit_codes(&[1]);

        let err = install(
            &session,
            InstallOptions::default(),
            &ScriptedConfirmer::new(&[]),
            &runner,
        )
        .unwrap_err();

        assert!(err.to_string().contains("CA trust"));
        assert!(!session.paths.install_marker().exists());
        assert!(session.paths.ca_dir().join("certs/ca.cert.pem").is_file());
    }

    #[cfg(unix)]
    #[test]
    fn test_app_home_mode() {
        let temp = TempDir::new().unwrap();
        let session = session(temp.path(), &[("berth_install_app_home_mode", "0700")]);
        let options = InstallOptions {
            ssh_config: true,
            ..InstallOptions::default()
        };

        install(&session, options, &ScriptedConfirmer::new(&[]), &RecordingRunner::new()).unwrap();
        assert_eq!(
            crate::common::fs::mode_of(session.paths.home()).unwrap(),
            0o700
        );
    }
}
