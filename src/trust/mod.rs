//! Trust and identity provisioning
//!
//! Each artifact (the local CA, the tunnel SSH keypair) moves through
//! `Absent -> Created -> Installed`. Both transitions go through the same
//! [`guard::guarded`] helper:
//!
//! - creation is guarded by the artifact itself (CA certificate, private
//!   key), which only appears once the material is complete
//! - installation (trust store, key ownership) is guarded by a stamp file
//!
//! A failed creation leaves nothing behind so the next run retries it; a
//! failed installation keeps the created material so only the installation
//! is retried.

pub mod ca;
pub mod dns;
pub mod guard;
pub mod ssh;
pub mod ssh_config;
pub mod store;

use std::path::PathBuf;

use crate::config::AppPaths;
use crate::error::{BerthError, Result, trust as trust_error};
use crate::exec::{CommandSpec, Executor};
use crate::host::HostPlatform;

pub use ca::{CaFiles, CaIssuer, RcgenIssuer};
pub use guard::{Guarded, Marker, guarded};
pub use ssh::{KeyGenerator, RsaKeyGenerator};

/// Lifecycle state of a trust artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactState {
    Absent,
    Created,
    Installed,
}

/// Comment embedded in the tunnel public key
const SSH_KEY_COMMENT: &str = "berth-tunnel";

pub struct TrustProvisioner<'a> {
    paths: &'a AppPaths,
    platform: HostPlatform,
    executor: &'a Executor<'a>,
    issuer: &'a dyn CaIssuer,
    keys: &'a dyn KeyGenerator,
    user_home: PathBuf,
    fs_root: PathBuf,
}

impl<'a> TrustProvisioner<'a> {
    pub fn new(
        paths: &'a AppPaths,
        platform: HostPlatform,
        executor: &'a Executor<'a>,
        issuer: &'a dyn CaIssuer,
        keys: &'a dyn KeyGenerator,
        user_home: impl Into<PathBuf>,
    ) -> Self {
        Self {
            paths,
            platform,
            executor,
            issuer,
            keys,
            user_home: user_home.into(),
            fs_root: PathBuf::from("/"),
        }
    }

    /// Resolve host files (DNS resolver configuration) under `root` instead of `/`
    #[cfg(test)]
    pub fn with_fs_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.fs_root = root.into();
        self
    }

    pub fn ca_files(&self) -> CaFiles {
        CaFiles::new(self.paths.ca_dir())
    }

    pub fn ca_state(&self) -> ArtifactState {
        let files = self.ca_files();
        state_of(
            &Marker::Artifact(files.cert()),
            &Marker::Stamp(files.trusted_marker()),
        )
    }

    pub fn ssh_key_state(&self) -> ArtifactState {
        state_of(
            &Marker::Artifact(self.paths.ssh_key()),
            &Marker::Stamp(self.ssh_key_marker()),
        )
    }

    fn ssh_key_marker(&self) -> PathBuf {
        self.paths.tunnel_dir().join(".ssh_key.installed")
    }

    /// Create the CA if absent and register it with the host trust store
    /// if not yet registered
    pub fn ensure_ca(&self) -> Result<ArtifactState> {
        if self.ca_state() == ArtifactState::Installed {
            tracing::debug!("Local CA already created and trusted");
            return Ok(ArtifactState::Installed);
        }
        let files = self.ca_files();

        guarded(&Marker::Artifact(files.cert()), || {
            ca::create(&files, self.issuer)
        })
        .map_err(|e| wrap("certificate authority", e))?;

        guarded(&Marker::Stamp(files.trusted_marker()), || {
            tracing::info!("Adding the local CA to the host trust store");
            for spec in store::install_commands(self.platform, &files.cert())? {
                self.executor.execute(&spec)?;
            }
            Ok(())
        })
        .map_err(|e| wrap("CA trust", e))?;

        Ok(ArtifactState::Installed)
    }

    /// Sign a leaf certificate for `hostnames` unless one exists already
    pub fn issue_certificate(&self, hostnames: &[String]) -> Result<Guarded<PathBuf>> {
        let first = hostnames.first().map(String::as_str).unwrap_or_default();
        let (cert_path, _) = ca::leaf_paths(&self.paths.certs_dir(), first)?;

        guarded(&Marker::Artifact(cert_path), || {
            ca::issue_leaf(
                &self.ca_files(),
                &self.paths.certs_dir(),
                hostnames,
                self.issuer,
            )
        })
        .map_err(|e| wrap("certificate", e))
    }

    /// Create the tunnel keypair if absent and hand the public key to the
    /// tunnel container
    pub fn ensure_ssh_key(&self) -> Result<ArtifactState> {
        if self.ssh_key_state() == ArtifactState::Installed {
            tracing::debug!("Tunnel SSH key already installed");
            return Ok(ArtifactState::Installed);
        }
        let key = self.paths.ssh_key();

        guarded(&Marker::Artifact(key.clone()), || {
            ssh::create(&key, self.keys, SSH_KEY_COMMENT)
        })
        .map_err(|e| wrap("SSH key", e))?;

        guarded(&Marker::Stamp(self.ssh_key_marker()), || {
            // The bind-mounted authorized_keys must be owned by root inside
            // the tunnel container
            if self.platform.is_linux() {
                let public = ssh::public_key_path(&key);
                self.executor.execute(&CommandSpec::host([
                    "sudo".to_string(),
                    "chown".to_string(),
                    "0:0".to_string(),
                    public.display().to_string(),
                ]))?;
            }
            Ok(())
        })
        .map_err(|e| wrap("SSH key ownership", e))?;

        Ok(ArtifactState::Installed)
    }

    /// Register the `test` TLD resolver unless already registered.
    /// Returns whether anything was changed.
    pub fn ensure_dns(&self) -> Result<bool> {
        let registration = dns::DnsRegistration::for_platform(self.platform, &self.fs_root);

        let registered = match &registration.check {
            dns::DnsCheck::File { path, content } => dns::file_matches(path, content),
            dns::DnsCheck::Query(spec) => !self
                .executor
                .execute(spec)
                .map_err(|e| wrap("DNS resolver", e))?
                .stdout
                .trim()
                .is_empty(),
            dns::DnsCheck::Unsupported(reason) => {
                tracing::warn!("Skipping DNS resolver setup: {reason}");
                return Ok(false);
            }
        };
        if registered {
            tracing::debug!("DNS resolver for .{} already registered", dns::TLD);
            return Ok(false);
        }

        tracing::info!("Registering DNS resolver for .{}", dns::TLD);
        for spec in &registration.commands {
            self.executor
                .execute(spec)
                .map_err(|e| wrap("DNS resolver", e))?;
        }
        Ok(true)
    }

    /// Add the tunnel host to `~/.ssh/config`
    pub fn ensure_ssh_config(&self) -> Result<bool> {
        let config = self.user_home.join(".ssh").join("config");
        ssh_config::install(&config, &self.paths.ssh_key()).map_err(|e| wrap("SSH config", e))
    }
}

fn state_of(created: &Marker, installed: &Marker) -> ArtifactState {
    if !created.is_present() {
        ArtifactState::Absent
    } else if installed.is_present() {
        ArtifactState::Installed
    } else {
        ArtifactState::Created
    }
}

fn wrap(artifact: &str, err: BerthError) -> BerthError {
    match err {
        err @ BerthError::TrustProvisioningFailed { .. } => err,
        other => trust_error::provisioning_failed(artifact, other),
    }
}
