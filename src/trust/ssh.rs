//! SSH keypair for the tunnel service

use std::path::{Path, PathBuf};

use rand::rngs::OsRng;
use ssh_key::private::{KeypairData, RsaKeypair};
use ssh_key::{LineEnding, PrivateKey};

use crate::common::fs::write_atomic;
use crate::error::{Result, trust as trust_error};

/// RSA modulus size of generated keys
pub const KEY_BITS: usize = 2048;

/// OpenSSH-encoded keypair
#[derive(Debug, Clone)]
pub struct KeyMaterial {
    pub private_openssh: String,
    pub public_openssh: String,
}

pub trait KeyGenerator {
    fn generate(&self, comment: &str) -> Result<KeyMaterial>;
}

/// RSA keys via ssh-key
#[derive(Debug, Default)]
pub struct RsaKeyGenerator;

impl KeyGenerator for RsaKeyGenerator {
    fn generate(&self, comment: &str) -> Result<KeyMaterial> {
        let keypair = RsaKeypair::random(&mut OsRng, KEY_BITS)
            .map_err(|e| trust_error::generation_failed("SSH key", e))?;
        let private = PrivateKey::new(KeypairData::from(keypair), comment)
            .map_err(|e| trust_error::generation_failed("SSH key", e))?;

        let private_openssh = private
            .to_openssh(LineEnding::LF)
            .map_err(|e| trust_error::generation_failed("SSH key", e))?
            .to_string();
        let public_openssh = private
            .public_key()
            .to_openssh()
            .map_err(|e| trust_error::generation_failed("SSH public key", e))?;

        Ok(KeyMaterial {
            private_openssh,
            public_openssh,
        })
    }
}

/// `<key>.pub` next to the private key
pub fn public_key_path(private: &Path) -> PathBuf {
    let mut name = private.as_os_str().to_owned();
    name.push(".pub");
    PathBuf::from(name)
}

/// Generate a keypair and write it to `path` (0600) and `path.pub` (0644)
///
/// The private key is written last: its existence marks the pair complete.
pub fn create(path: &Path, generator: &dyn KeyGenerator, comment: &str) -> Result<()> {
    let material = generator.generate(comment)?;

    let mut public = material.public_openssh;
    if !public.ends_with('\n') {
        public.push('\n');
    }
    write_atomic(&public_key_path(path), public.as_bytes(), Some(0o644))?;
    write_atomic(path, material.private_openssh.as_bytes(), Some(0o600))?;

    tracing::info!("Generated SSH key {}", path.display());
    Ok(())
}
