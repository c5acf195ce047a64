//! Platform stack variants that can be bootstrapped

use std::fmt;
use std::str::FromStr;

use crate::error::{BerthError, config as config_error};

/// The application stack an environment runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlatformKind {
    Magento2,
    Magento1,
    Wordpress,
}

impl PlatformKind {
    pub const ALL: [PlatformKind; 3] = [
        PlatformKind::Magento2,
        PlatformKind::Magento1,
        PlatformKind::Wordpress,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            PlatformKind::Magento2 => "magento2",
            PlatformKind::Magento1 => "magento1",
            PlatformKind::Wordpress => "wordpress",
        }
    }

    /// Resolve the configured environment type; unset counts as unsupported
    pub fn from_setting(env_type: Option<&str>) -> Result<Self, BerthError> {
        env_type
            .ok_or_else(|| config_error::unsupported_target("(unset)"))?
            .parse()
    }

    /// Whether bootstrapping needs a detected platform version
    pub fn requires_version(self) -> bool {
        matches!(self, PlatformKind::Magento2 | PlatformKind::Magento1)
    }
}

impl FromStr for PlatformKind {
    type Err = BerthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        PlatformKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == normalized)
            .ok_or_else(|| config_error::unsupported_target(s.trim()))
    }
}

impl fmt::Display for PlatformKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_kinds() {
        assert_eq!("magento2".parse::<PlatformKind>().unwrap(), PlatformKind::Magento2);
        assert_eq!(" Magento1 ".parse::<PlatformKind>().unwrap(), PlatformKind::Magento1);
        assert_eq!("WORDPRESS".parse::<PlatformKind>().unwrap(), PlatformKind::Wordpress);
    }

    #[test]
    fn test_unknown_kind_is_unsupported_target() {
        let err = "laravel".parse::<PlatformKind>().unwrap_err();
        assert!(matches!(err, BerthError::UnsupportedTarget { ref target } if target == "laravel"));
    }

    #[test]
    fn test_unset_kind_is_unsupported_target() {
        let err = PlatformKind::from_setting(None).unwrap_err();
        assert!(matches!(err, BerthError::UnsupportedTarget { .. }));
    }
}
