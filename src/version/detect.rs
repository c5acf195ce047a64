//! Platform version detection

use std::fs;
use std::path::PathBuf;

use serde::Deserialize;
use std::collections::BTreeMap;

use super::PlatformVersion;
use crate::error::{Result, config as config_error, fs as fs_error};

/// Packages whose `require` constraint pins the platform release
const PLATFORM_PACKAGES: &[&str] = &[
    "magento/product-community-edition",
    "magento/product-enterprise-edition",
    "magento/magento2-base",
];

/// Reports the platform version of the current project
pub trait VersionDetector {
    fn detect(&self) -> Result<PlatformVersion>;
}

#[derive(Debug, Deserialize, Default)]
struct ComposerManifest {
    #[serde(default)]
    require: BTreeMap<String, String>,
}

/// Reads `composer.json` in the project root, falling back to the
/// configured `magento_version`
#[derive(Debug, Clone)]
pub struct ProjectVersionDetector {
    project_root: PathBuf,
    configured: Option<String>,
}

impl ProjectVersionDetector {
    pub fn new(project_root: impl Into<PathBuf>, configured: Option<String>) -> Self {
        Self {
            project_root: project_root.into(),
            configured,
        }
    }

    fn from_manifest(&self) -> Result<Option<PlatformVersion>> {
        let path = self.project_root.join("composer.json");
        if !path.is_file() {
            return Ok(None);
        }

        let content = fs::read_to_string(&path).map_err(|e| fs_error::read_failed(&path, e))?;
        let manifest: ComposerManifest = serde_json::from_str(&content)
            .map_err(|e| config_error::parse_failed(path.display().to_string(), e.to_string()))?;

        for package in PLATFORM_PACKAGES {
            let Some(constraint) = manifest.require.get(*package) else {
                continue;
            };
            match PlatformVersion::parse(constraint) {
                Ok(version) => {
                    tracing::debug!("Detected {package} {version} from composer.json");
                    return Ok(Some(version));
                }
                Err(e) => tracing::debug!("Ignoring {package} constraint {constraint:?}: {e}"),
            }
        }

        Ok(None)
    }
}

impl VersionDetector for ProjectVersionDetector {
    fn detect(&self) -> Result<PlatformVersion> {
        if let Some(version) = self.from_manifest()? {
            return Ok(version);
        }

        match self.configured.as_deref() {
            Some(text) => PlatformVersion::parse(text)
                .map_err(|_| config_error::invalid("magento_version", text, "not a version")),
            None => Err(config_error::precondition(
                "Could not determine the platform version",
                Some("Set MAGENTO_VERSION in the project .env"),
            )),
        }
    }
}
