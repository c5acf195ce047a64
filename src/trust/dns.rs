//! DNS resolver registration for the `test` TLD
//!
//! Queries for `*.test` are sent to the dnsmasq global service on
//! 127.0.0.1. Each platform has its own mechanism; all of them are checked
//! first so that a registered resolver is never touched again.

use std::fs;
use std::path::{Path, PathBuf};

use crate::exec::CommandSpec;
use crate::host::HostPlatform;

pub const TLD: &str = "test";

/// How to tell whether the resolver is already registered
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DnsCheck {
    /// A file with exactly this content
    File { path: PathBuf, content: String },
    /// A command whose captured output is non-empty once registered
    Query(CommandSpec),
    /// The mechanism is unavailable on this host
    Unsupported(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DnsRegistration {
    pub check: DnsCheck,
    pub commands: Vec<CommandSpec>,
}

impl DnsRegistration {
    /// Registration steps for `platform`; `root` is the filesystem root
    pub fn for_platform(platform: HostPlatform, root: &Path) -> Self {
        match platform {
            HostPlatform::MacOs => {
                let path = root.join("etc/resolver").join(TLD);
                let content = "nameserver 127.0.0.1\n".to_string();
                Self {
                    commands: vec![
                        CommandSpec::host(["sudo", "mkdir", "-p", "/etc/resolver"]),
                        CommandSpec::host_shell(format!(
                            "echo 'nameserver 127.0.0.1' | sudo tee /etc/resolver/{TLD} > /dev/null"
                        )),
                    ],
                    check: DnsCheck::File { path, content },
                }
            }
            HostPlatform::Linux(_) => {
                if !root.join("run/systemd/resolve").is_dir() {
                    return Self {
                        check: DnsCheck::Unsupported(
                            "systemd-resolved is not running; point your resolver at 127.0.0.1 for .test domains"
                                .to_string(),
                        ),
                        commands: Vec::new(),
                    };
                }
                let path = root.join("etc/systemd/resolved.conf.d/berth.conf");
                let content = format!("[Resolve]\nDNS=127.0.0.1\nDomains=~{TLD}\n");
                Self {
                    commands: vec![
                        CommandSpec::host(["sudo", "mkdir", "-p", "/etc/systemd/resolved.conf.d"]),
                        CommandSpec::host_shell(format!(
                            "printf '[Resolve]\\nDNS=127.0.0.1\\nDomains=~{TLD}\\n' | sudo tee /etc/systemd/resolved.conf.d/berth.conf > /dev/null"
                        )),
                        CommandSpec::host(["sudo", "systemctl", "restart", "systemd-resolved"]),
                    ],
                    check: DnsCheck::File { path, content },
                }
            }
            HostPlatform::Windows => Self {
                check: DnsCheck::Query(
                    CommandSpec::host([
                        "powershell".to_string(),
                        "-NoProfile".to_string(),
                        "-Command".to_string(),
                        format!("Get-DnsClientNrptRule | Where-Object {{ $_.Namespace -eq '.{TLD}' }}"),
                    ])
                    .captured(),
                ),
                commands: vec![CommandSpec::host([
                    "powershell".to_string(),
                    "-NoProfile".to_string(),
                    "-Command".to_string(),
                    format!("Add-DnsClientNrptRule -Namespace '.{TLD}' -NameServers '127.0.0.1'"),
                ])],
            },
        }
    }
}

/// Whether a file check is already satisfied
pub fn file_matches(path: &Path, content: &str) -> bool {
    fs::read_to_string(path).is_ok_and(|existing| existing == content)
}
