//! Host operating system detection
//!
//! Privileged operations (trust store, DNS, key ownership) differ per host,
//! so they are selected from a [`HostPlatform`] value rather than `cfg!`
//! checks scattered through the provisioner.

use std::path::Path;

/// Linux distribution family, as far as trust-store tooling is concerned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinuxFamily {
    Debian,
    RedHat,
    Arch,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostPlatform {
    Linux(LinuxFamily),
    MacOs,
    Windows,
}

impl HostPlatform {
    /// Detect the platform this process runs on
    pub fn detect() -> Self {
        if cfg!(target_os = "macos") {
            HostPlatform::MacOs
        } else if cfg!(windows) {
            HostPlatform::Windows
        } else {
            HostPlatform::Linux(LinuxFamily::detect_in(Path::new("/")))
        }
    }

    pub fn is_linux(self) -> bool {
        matches!(self, HostPlatform::Linux(_))
    }

    pub fn is_windows(self) -> bool {
        matches!(self, HostPlatform::Windows)
    }
}

impl LinuxFamily {
    /// Detect the distribution family from release files under `root`
    pub fn detect_in(root: &Path) -> Self {
        let etc = root.join("etc");
        if etc.join("debian_version").exists() {
            LinuxFamily::Debian
        } else if etc.join("redhat-release").exists() || etc.join("fedora-release").exists() {
            LinuxFamily::RedHat
        } else if etc.join("arch-release").exists() {
            LinuxFamily::Arch
        } else {
            LinuxFamily::Unknown
        }
    }
}
