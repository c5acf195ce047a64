//! Platform version model
//!
//! Platform releases are not strict semver: Magento ships security patches
//! as `2.4.2-p1`, which semver would read as a pre-release of `2.4.2`.
//! [`PlatformVersion`] uses one total order for every comparison:
//!
//! - `-pN` (or a fourth numeric component, `1.9.4.5`) is a patch level and
//!   sorts after the base release: `2.4.2 < 2.4.2-p1 < 2.4.2-p2 < 2.4.3`
//! - any other suffix is a pre-release and sorts before the base release:
//!   `2.4.2-beta1 < 2.4.2`
//!
//! Thresholds are therefore written against clean releases (`>= 2.4.2`)
//! so that patch levels of an older release never cross them.

pub mod detect;

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use semver::{Prerelease, Version};

use crate::error::{BerthError, Result, config as config_error};

pub use detect::{ProjectVersionDetector, VersionDetector};

#[derive(Debug, Clone)]
pub struct PlatformVersion {
    raw: String,
    release: Version,
    patch_level: u64,
    pre: Prerelease,
}

impl PlatformVersion {
    /// A clean release version
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            raw: format!("{major}.{minor}.{patch}"),
            release: Version::new(major, minor, patch),
            patch_level: 0,
            pre: Prerelease::EMPTY,
        }
    }

    /// Parse a version as written in `.env`, `composer.json` or config
    pub fn parse(text: &str) -> Result<Self> {
        let invalid = |reason: &str| config_error::invalid("version", text, reason);

        let cleaned = text
            .trim()
            .trim_start_matches(|c: char| matches!(c, 'v' | 'V' | '^' | '~' | '=' | ' '));
        let (core, suffix) = match cleaned.split_once('-') {
            Some((core, suffix)) => (core, Some(suffix)),
            None => (cleaned, None),
        };

        let parts = core
            .split('.')
            .map(|part| part.parse::<u64>().map_err(|_| invalid("expected numeric components")))
            .collect::<Result<Vec<_>>>()?;
        if parts.is_empty() || parts.len() > 4 {
            return Err(invalid("expected between one and four components"));
        }

        let component = |index: usize| parts.get(index).copied().unwrap_or(0);
        let mut patch_level = component(3);
        let mut pre = Prerelease::EMPTY;

        if let Some(suffix) = suffix {
            match parse_patch_level(suffix) {
                Some(level) if parts.len() < 4 => patch_level = level,
                Some(_) => return Err(invalid("patch level given twice")),
                None => {
                    pre = Prerelease::new(suffix)
                        .map_err(|e| invalid(&format!("invalid pre-release suffix: {e}")))?;
                }
            }
        }

        Ok(Self {
            raw: cleaned.to_string(),
            release: Version::new(component(0), component(1), component(2)),
            patch_level,
            pre,
        })
    }
}

fn parse_patch_level(suffix: &str) -> Option<u64> {
    let digits = suffix.strip_prefix('p')?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

impl Ord for PlatformVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        self.release
            .cmp(&other.release)
            .then_with(|| match (self.pre.is_empty(), other.pre.is_empty()) {
                (true, true) => Ordering::Equal,
                (true, false) => Ordering::Greater,
                (false, true) => Ordering::Less,
                (false, false) => self.pre.cmp(&other.pre),
            })
            .then_with(|| self.patch_level.cmp(&other.patch_level))
    }
}

impl PartialOrd for PlatformVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for PlatformVersion {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for PlatformVersion {}

impl FromStr for PlatformVersion {
    type Err = BerthError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for PlatformVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Lower bound on a platform version, e.g. `>= 2.4.2`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionConstraint {
    minimum: PlatformVersion,
}

impl VersionConstraint {
    /// `>= major.minor.patch`
    pub fn at_least(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            minimum: PlatformVersion::new(major, minor, patch),
        }
    }

    pub fn matches(&self, candidate: &PlatformVersion) -> bool {
        candidate >= &self.minimum
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(text: &str) -> PlatformVersion {
        PlatformVersion::parse(text).unwrap()
    }

    #[test]
    fn test_patch_levels_sort_after_release() {
        assert!(v("2.4.2") < v("2.4.2-p1"));
        assert!(v("2.4.2-p1") < v("2.4.2-p2"));
        assert!(v("2.4.2-p2") < v("2.4.3"));
        assert!(v("2.4.1-p1") < v("2.4.2"));
    }

    #[test]
    fn test_prereleases_sort_before_release() {
        assert!(v("2.4.2-beta1") < v("2.4.2"));
        assert!(v("2.4.2-alpha") < v("2.4.2-beta"));
        assert!(v("2.4.1") < v("2.4.2-beta1"));
    }

    #[test]
    fn test_short_and_prefixed_forms() {
        assert_eq!(v("2"), PlatformVersion::new(2, 0, 0));
        assert_eq!(v("2.4"), PlatformVersion::new(2, 4, 0));
        assert_eq!(v("^2.4.2"), PlatformVersion::new(2, 4, 2));
        assert_eq!(v("v1.10.0"), PlatformVersion::new(1, 10, 0));
    }

    #[test]
    fn test_fourth_component_is_patch_level() {
        let version = v("1.9.4.5");
        assert_eq!(version, v("1.9.4-p5"));
        assert!(v("1.9.4") < version);
        assert!(version < v("1.9.4.6"));
        assert!(PlatformVersion::parse("1.9.4.5-p1").is_err());
    }

    #[test]
    fn test_display_keeps_original_text() {
        assert_eq!(v("2.4.2-p1").to_string(), "2.4.2-p1");
        assert_eq!(v("^2.4").to_string(), "2.4");
    }

    #[test]
    fn test_invalid_versions() {
        assert!(PlatformVersion::parse("").is_err());
        assert!(PlatformVersion::parse("two.four").is_err());
        assert!(PlatformVersion::parse("1.2.3.4.5").is_err());
    }

    #[test]
    fn test_composer_two_boundary() {
        let composer2 = VersionConstraint::at_least(2, 4, 2);
        assert!(composer2.matches(&v("2.4.2")));
        assert!(composer2.matches(&v("2.4.2-p1")));
        assert!(composer2.matches(&v("2.4.3")));
        assert!(!composer2.matches(&v("2.4.1")));
        assert!(!composer2.matches(&v("2.4.1-p1")));
        assert!(!composer2.matches(&v("2.4.2-beta1")));
    }
}
