//! Sign a leaf certificate with the local CA
//!
//! Unlike the bootstrap step this always signs, replacing an existing
//! certificate for the same first hostname.

use std::path::PathBuf;

use crate::config::AppPaths;
use crate::error::Result;
use crate::trust::ca::{self, CaFiles, CaIssuer};

pub fn sign_certificate(
    paths: &AppPaths,
    hostnames: &[String],
    issuer: &dyn CaIssuer,
) -> Result<PathBuf> {
    let cert = ca::issue_leaf(
        &CaFiles::new(paths.ca_dir()),
        &paths.certs_dir(),
        hostnames,
        issuer,
    )?;
    println!("Signed certificate {}", cert.display());
    Ok(cert)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BerthError;
    use crate::trust::ca::RcgenIssuer;
    use serial_test::serial;
    use tempfile::TempDir;

    #[test]
    fn test_requires_ca() {
        let temp = TempDir::new().unwrap();
        let paths = AppPaths::new(temp.path().join(".berth"), temp.path().join(".berth.yml"));

        let err = sign_certificate(&paths, &["shop.test".to_string()], &RcgenIssuer).unwrap_err();
        assert!(matches!(err.root_cause(), BerthError::PreconditionMissing { .. }));
    }

    #[test]
    #[serial]
    fn test_resigns_existing_certificate() {
        let temp = TempDir::new().unwrap();
        let paths = AppPaths::new(temp.path().join(".berth"), temp.path().join(".berth.yml"));
        ca::create(&CaFiles::new(paths.ca_dir()), &RcgenIssuer).unwrap();
        let hosts = vec!["shop.test".to_string(), "blog.test".to_string()];

        let first = sign_certificate(&paths, &hosts, &RcgenIssuer).unwrap();
        let before = std::fs::read(&first).unwrap();
        let second = sign_certificate(&paths, &hosts, &RcgenIssuer).unwrap();

        assert_eq!(first, paths.certs_dir().join("shop.test.crt.pem"));
        assert_eq!(first, second);
        assert_ne!(std::fs::read(&second).unwrap(), before);
    }
}
