//! Host trust store registration

use std::path::Path;

use crate::error::{Result, config as config_error};
use crate::exec::CommandSpec;
use crate::host::{HostPlatform, LinuxFamily};

/// File name the CA certificate is installed under in anchor directories
const ANCHOR_NAME: &str = "berth-local-ca.crt";

/// Commands that add `ca_cert` to the host's trust store
///
/// Every tool used here replaces an existing entry for the same certificate,
/// so running the commands again is harmless.
pub fn install_commands(platform: HostPlatform, ca_cert: &Path) -> Result<Vec<CommandSpec>> {
    let cert = ca_cert.display().to_string();

    let commands = match platform {
        HostPlatform::Linux(LinuxFamily::Debian) => vec![
            CommandSpec::host([
                "sudo".to_string(),
                "cp".to_string(),
                cert,
                format!("/usr/local/share/ca-certificates/{ANCHOR_NAME}"),
            ]),
            CommandSpec::host(["sudo", "update-ca-certificates"]),
        ],
        HostPlatform::Linux(LinuxFamily::RedHat) => vec![
            CommandSpec::host([
                "sudo".to_string(),
                "cp".to_string(),
                cert,
                format!("/etc/pki/ca-trust/source/anchors/{ANCHOR_NAME}"),
            ]),
            CommandSpec::host(["sudo", "update-ca-trust"]),
        ],
        HostPlatform::Linux(LinuxFamily::Arch) => vec![CommandSpec::host([
            "sudo".to_string(),
            "trust".to_string(),
            "anchor".to_string(),
            "--store".to_string(),
            cert,
        ])],
        HostPlatform::Linux(LinuxFamily::Unknown) => {
            return Err(config_error::precondition(
                "Unrecognized Linux distribution, cannot add the CA to the trust store",
                Some("Add ~/.berth/ssl/rootca/certs/ca.cert.pem to your system trust store manually"),
            ));
        }
        HostPlatform::MacOs => vec![CommandSpec::host([
            "sudo".to_string(),
            "security".to_string(),
            "add-trusted-cert".to_string(),
            "-d".to_string(),
            "-r".to_string(),
            "trustRoot".to_string(),
            "-k".to_string(),
            "/Library/Keychains/System.keychain".to_string(),
            cert,
        ])],
        HostPlatform::Windows => vec![CommandSpec::host([
            "certutil".to_string(),
            "-addstore".to_string(),
            "-f".to_string(),
            "ROOT".to_string(),
            cert,
        ])],
    };

    Ok(commands)
}
